use serde_json::json;

use super::common::*;
use crate::rules::domain::{AdvancePaymentSettings, MethodTarget, PaymentMethod, RuleAction};
use crate::rules::validation::validate;

#[test]
fn accepts_complete_force_advance_rule() {
    let draft = validate(advance_input()).expect("rule is valid");

    assert_eq!(draft.name, "Advance on large COD orders");
    assert_eq!(draft.priority, 100);
    assert_eq!(draft.payment_method, MethodTarget::Only(PaymentMethod::Cod));
    assert_eq!(draft.action, RuleAction::ForceAdvance);
    assert_eq!(
        draft.advance_payment_settings,
        Some(AdvancePaymentSettings::Percentage { percentage: 20.0 })
    );
    assert_eq!(draft.is_active, None);
}

#[test]
fn rejects_force_advance_without_settings() {
    let input = rule_input(json!({
        "name": "Advance everything",
        "priority": 10,
        "action": "FORCE_ADVANCE"
    }));

    let errors = validate(input).expect_err("settings are required");
    assert_eq!(errors.fields(), vec!["advancePaymentSettings"]);
}

#[test]
fn names_the_inconsistent_settings_field() {
    let percentage = rule_input(json!({
        "name": "Too much",
        "priority": 10,
        "action": "FORCE_ADVANCE",
        "advancePaymentSettings": { "type": "PERCENTAGE", "percentage": 120 }
    }));
    let errors = validate(percentage).expect_err("percentage out of range");
    assert!(errors.has_field("advancePaymentSettings.percentage"));

    let fixed = rule_input(json!({
        "name": "Nothing",
        "priority": 10,
        "action": "FORCE_ADVANCE",
        "advancePaymentSettings": { "type": "FIXED" }
    }));
    let errors = validate(fixed).expect_err("amount missing");
    assert!(errors.has_field("advancePaymentSettings.amount"));

    let unknown = rule_input(json!({
        "name": "Mystery",
        "priority": 10,
        "action": "FORCE_ADVANCE",
        "advancePaymentSettings": { "type": "HALF" }
    }));
    let errors = validate(unknown).expect_err("type unknown");
    assert!(errors.has_field("advancePaymentSettings.type"));
}

#[test]
fn reports_every_violation_in_order() {
    let input = rule_input(json!({
        "name": "   ",
        "priority": 1.5,
        "paymentMethod": "CRYPTO",
        "action": "BLOCK",
        "conditions": { "minAmount": 900, "maxAmount": 100 }
    }));

    let errors = validate(input).expect_err("input is invalid");
    assert_eq!(
        errors.fields(),
        vec![
            "name",
            "priority",
            "paymentMethod",
            "action",
            "conditions.minAmount"
        ]
    );
}

#[test]
fn parses_serialized_condition_and_settings_text() {
    let input = rule_input(json!({
        "name": "Legacy rule",
        "priority": -5,
        "paymentMethod": "online",
        "action": "force_advance",
        "conditions": "{\"categories\":[\" Fashion \",\"\"],\"userRoles\":[\"vendor\"]}",
        "advancePaymentSettings": "{\"type\":\"FIXED\",\"amount\":75}"
    }));

    let draft = validate(input).expect("legacy text parses");
    assert_eq!(draft.priority, -5);
    assert_eq!(draft.payment_method, MethodTarget::Only(PaymentMethod::Online));
    assert_eq!(draft.conditions.categories, names(&["Fashion"]));
    assert_eq!(draft.conditions.user_roles, names(&["VENDOR"]));
    assert_eq!(
        draft.advance_payment_settings,
        Some(AdvancePaymentSettings::Fixed { amount: 75.0 })
    );
}

#[test]
fn rejects_unparseable_conditions_text() {
    let input = rule_input(json!({
        "name": "Broken",
        "priority": 1,
        "action": "ALLOW",
        "conditions": "{minAmount: 5"
    }));

    let errors = validate(input).expect_err("conditions unparseable");
    assert_eq!(errors.fields(), vec!["conditions"]);
}

#[test]
fn drops_advance_settings_for_other_actions() {
    let input = rule_input(json!({
        "name": "Allow online",
        "priority": 3,
        "paymentMethod": "ONLINE",
        "action": "ALLOW",
        "advancePaymentSettings": { "type": "FIXED", "amount": 10 },
        "isActive": false
    }));

    let draft = validate(input).expect("allow rule is valid");
    assert!(draft.advance_payment_settings.is_none());
    assert_eq!(draft.is_active, Some(false));
}

#[test]
fn missing_priority_defaults_to_zero_but_strings_are_rejected() {
    let missing = rule_input(json!({ "name": "No priority", "action": "ALLOW" }));
    assert_eq!(validate(missing).expect("valid").priority, 0);

    let text = rule_input(json!({ "name": "Text priority", "priority": "7", "action": "ALLOW" }));
    let errors = validate(text).expect_err("string priority rejected");
    assert_eq!(errors.fields(), vec!["priority"]);
}

#[test]
fn rejects_unknown_condition_keys() {
    let input = rule_input(json!({
        "name": "Admins only",
        "priority": 5,
        "action": "RESTRICT",
        "conditions": { "userRole": ["ADMIN"] }
    }));

    let errors = validate(input).expect_err("unknown key rejected");
    assert_eq!(errors.fields(), vec!["conditions"]);
}

#[test]
fn mistyped_nested_fields_are_reported_with_other_violations() {
    let input = rule_input(json!({
        "name": "",
        "priority": 1,
        "action": "FORCE_ADVANCE",
        "conditions": { "minAmount": "abc" },
        "advancePaymentSettings": { "type": "FIXED", "amount": "ten" }
    }));

    let errors = validate(input).expect_err("input is invalid");
    assert_eq!(
        errors.fields(),
        vec!["name", "advancePaymentSettings", "conditions"]
    );
}

//! Write-side validation for payment rule definitions.
//!
//! Admin payloads arrive loosely typed (and may still carry the legacy serialized text
//! for conditions and advance settings). Everything is parsed and checked here once so
//! the evaluation engine only ever sees typed rules.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{
    AdvancePaymentSettings, ConditionSet, MethodTarget, PaymentMethod, PaymentRule, RuleAction,
    RuleId,
};

/// Decodes an inline JSON value, or the same value serialized into a string.
fn decode_field<T: DeserializeOwned>(value: Value) -> Result<Option<T>, serde_json::Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => serde_json::from_str(&raw).map(Some),
        other => serde_json::from_value(other).map(Some),
    }
}

/// Raw advance settings as typed into the admin form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdvanceSettingsInput {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Create-or-update payload for a payment rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRuleInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub conditions: Option<Value>,
    #[serde(default)]
    pub advance_payment_settings: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every violation found in one input, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|error| error.field.as_str()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(f, "invalid payment rule ({})", details.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validated rule definition, ready to be stamped with an id and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub name: String,
    pub description: Option<String>,
    pub priority: i64,
    pub payment_method: MethodTarget,
    pub action: RuleAction,
    pub conditions: ConditionSet,
    pub advance_payment_settings: Option<AdvancePaymentSettings>,
    /// `None` when the input left activation unspecified.
    pub is_active: Option<bool>,
}

impl RuleDraft {
    pub fn into_rule(self, id: RuleId, created_at: DateTime<Utc>) -> PaymentRule {
        PaymentRule {
            id,
            name: self.name,
            description: self.description,
            priority: self.priority,
            payment_method: self.payment_method,
            action: self.action,
            conditions: self.conditions,
            advance_payment_settings: self.advance_payment_settings,
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at: created_at,
        }
    }
}

pub fn validate(input: PaymentRuleInput) -> Result<RuleDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = input.name.trim().to_string();
    if name.is_empty() {
        errors.push("name", "must not be empty");
    }

    let priority = match &input.priority {
        None | Some(Value::Null) => 0,
        Some(Value::Number(number)) => number.as_i64().unwrap_or_else(|| {
            errors.push("priority", format!("must be an integer, got {number}"));
            0
        }),
        Some(other) => {
            errors.push("priority", format!("must be an integer, got {other}"));
            0
        }
    };

    let payment_method = match input.payment_method.as_deref().map(str::trim) {
        None | Some("") => MethodTarget::AnyMethod,
        Some(raw) => match PaymentMethod::parse(raw) {
            Some(method) => MethodTarget::Only(method),
            None => {
                errors.push(
                    "paymentMethod",
                    format!("unknown payment method '{raw}' (expected COD, ADVANCE or ONLINE)"),
                );
                MethodTarget::AnyMethod
            }
        },
    };

    let action = RuleAction::parse(&input.action);
    if action.is_none() {
        errors.push(
            "action",
            format!(
                "unknown action '{}' (expected ALLOW, RESTRICT or FORCE_ADVANCE)",
                input.action.trim()
            ),
        );
    }

    let advance_payment_settings = match action {
        Some(RuleAction::ForceAdvance) => {
            validate_advance_settings(input.advance_payment_settings, &mut errors)
        }
        _ => None,
    };

    let conditions = input.conditions.unwrap_or(Value::Null);
    let conditions = match decode_field::<ConditionSet>(conditions) {
        Ok(None) => ConditionSet::default(),
        Ok(Some(conditions)) => validate_conditions(conditions, &mut errors),
        Err(err) => {
            errors.push("conditions", format!("could not be parsed: {err}"));
            ConditionSet::default()
        }
    };

    match action {
        Some(action) if errors.is_empty() => Ok(RuleDraft {
            name,
            description: input
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            priority,
            payment_method,
            action,
            conditions,
            advance_payment_settings,
            is_active: input.is_active,
        }),
        _ => Err(errors),
    }
}

fn validate_advance_settings(
    settings: Option<Value>,
    errors: &mut ValidationErrors,
) -> Option<AdvancePaymentSettings> {
    let settings = settings.unwrap_or(Value::Null);
    let settings = match decode_field::<AdvanceSettingsInput>(settings) {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            errors.push(
                "advancePaymentSettings",
                "required when action is FORCE_ADVANCE",
            );
            return None;
        }
        Err(err) => {
            errors.push(
                "advancePaymentSettings",
                format!("could not be parsed: {err}"),
            );
            return None;
        }
    };

    let kind = settings
        .kind
        .as_deref()
        .map(|kind| kind.trim().to_ascii_uppercase());

    match kind.as_deref() {
        Some("PERCENTAGE") | Some("PARTIAL") => match settings.percentage {
            None => {
                errors.push(
                    "advancePaymentSettings.percentage",
                    "required for PERCENTAGE advances",
                );
                None
            }
            Some(percentage) => {
                let parsed = AdvancePaymentSettings::Percentage { percentage };
                if parsed.integrity_issue().is_some() {
                    errors.push(
                        "advancePaymentSettings.percentage",
                        format!("must be greater than 0 and at most 100, got {percentage}"),
                    );
                    None
                } else {
                    Some(parsed)
                }
            }
        },
        Some("FIXED") => match settings.amount {
            None => {
                errors.push(
                    "advancePaymentSettings.amount",
                    "required for FIXED advances",
                );
                None
            }
            Some(amount) => {
                let parsed = AdvancePaymentSettings::Fixed { amount };
                if parsed.integrity_issue().is_some() {
                    errors.push(
                        "advancePaymentSettings.amount",
                        format!("must be greater than 0, got {amount}"),
                    );
                    None
                } else {
                    Some(parsed)
                }
            }
        },
        _ => {
            errors.push(
                "advancePaymentSettings.type",
                "must be PERCENTAGE or FIXED",
            );
            None
        }
    }
}

fn validate_conditions(conditions: ConditionSet, errors: &mut ValidationErrors) -> ConditionSet {
    for (field, bound) in [
        ("conditions.minAmount", conditions.min_amount),
        ("conditions.maxAmount", conditions.max_amount),
    ] {
        if let Some(value) = bound {
            if !value.is_finite() || value < 0.0 {
                errors.push(field, format!("must be a non-negative amount, got {value}"));
            }
        }
    }

    if let (Some(min), Some(max)) = (conditions.min_amount, conditions.max_amount) {
        if min > max {
            errors.push(
                "conditions.minAmount",
                format!("must not exceed maxAmount ({min} > {max})"),
            );
        }
    }

    ConditionSet {
        min_amount: conditions.min_amount,
        max_amount: conditions.max_amount,
        categories: normalize_names(conditions.categories, |name| name.to_string()),
        user_roles: normalize_names(conditions.user_roles, |role| role.to_ascii_uppercase()),
    }
}

fn normalize_names(
    names: Option<BTreeSet<String>>,
    normalize: impl Fn(&str) -> String,
) -> Option<BTreeSet<String>> {
    let names: BTreeSet<String> = names?
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(normalize)
        .collect();
    (!names.is_empty()).then_some(names)
}

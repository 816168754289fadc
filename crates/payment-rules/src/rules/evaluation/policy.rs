use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::advance::{compute_advance, AdvancePaymentRequirement};
use super::super::domain::{PaymentMethod, PaymentRule, RuleAction, RuleId};
use super::{AppliedRule, MethodResult};

/// Final availability of a payment method for one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodStatus {
    Allowed,
    Restricted,
    RequiresAdvance,
}

impl MethodStatus {
    /// Advance-gated methods are still offered to the shopper.
    pub const fn is_offered(self) -> bool {
        !matches!(self, MethodStatus::Restricted)
    }

    pub const fn label(self) -> &'static str {
        match self {
            MethodStatus::Allowed => "allowed",
            MethodStatus::Restricted => "restricted",
            MethodStatus::RequiresAdvance => "requires advance",
        }
    }
}

/// Corrupt rule data skipped during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAnomaly {
    pub rule_id: RuleId,
    pub method: PaymentMethod,
    pub reason: String,
}

/// Resolves a method's status from its matching rules, already in precedence order.
pub(crate) fn decide_method(
    method: PaymentMethod,
    matched: &[&PaymentRule],
    order_total: f64,
    anomalies: &mut Vec<RuleAnomaly>,
) -> MethodResult {
    let mut decision: Option<(MethodStatus, Option<AdvancePaymentRequirement>)> = None;
    let mut applied_rules = Vec::with_capacity(matched.len());

    for rule in matched {
        let status = match rule.action {
            RuleAction::Allow => MethodStatus::Allowed,
            RuleAction::Restrict => MethodStatus::Restricted,
            RuleAction::ForceAdvance => match advance_settings_issue(rule) {
                None => MethodStatus::RequiresAdvance,
                Some(reason) => {
                    warn!(
                        rule_id = %rule.id,
                        method = %method,
                        %reason,
                        "skipping FORCE_ADVANCE rule with unusable advance settings"
                    );
                    anomalies.push(RuleAnomaly {
                        rule_id: rule.id.clone(),
                        method,
                        reason,
                    });
                    continue;
                }
            },
        };

        applied_rules.push(AppliedRule::from_rule(rule));
        if decision.is_none() {
            // Only the deciding rule sizes an advance.
            let requirement = match status {
                MethodStatus::RequiresAdvance => rule
                    .advance_payment_settings
                    .as_ref()
                    .map(|settings| compute_advance(settings, order_total)),
                _ => None,
            };
            decision = Some((status, requirement));
        }
    }

    let (status, advance_payment_requirement) = decision.unwrap_or((MethodStatus::Allowed, None));

    MethodResult {
        status,
        applied_rules,
        advance_payment_requirement,
    }
}

fn advance_settings_issue(rule: &PaymentRule) -> Option<String> {
    match &rule.advance_payment_settings {
        None => Some("missing advance payment settings".to_string()),
        Some(settings) => settings.integrity_issue(),
    }
}

mod policy;
mod selection;

pub use policy::{MethodStatus, RuleAnomaly};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::advance::AdvancePaymentRequirement;
use super::domain::{CheckoutContext, PaymentMethod, PaymentRule, RuleAction, RuleId};
use policy::decide_method;
use selection::matching_rules;

/// Stateless evaluator over an immutable rule catalog snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    catalog: Arc<[PaymentRule]>,
}

impl EvaluationEngine {
    pub fn new(catalog: Vec<PaymentRule>) -> Self {
        Self {
            catalog: catalog.into(),
        }
    }

    pub fn catalog(&self) -> &[PaymentRule] {
        &self.catalog
    }

    pub fn evaluate(&self, ctx: &CheckoutContext) -> EvaluationResult {
        let mut anomalies = Vec::new();
        let mut methods = BTreeMap::new();

        for method in PaymentMethod::ALL {
            let matched = matching_rules(&self.catalog, method, ctx);
            let result = decide_method(method, &matched, ctx.order_total, &mut anomalies);
            debug!(
                method = %method,
                status = result.status.label(),
                applied = result.applied_rules.len(),
                "payment method evaluated"
            );
            methods.insert(method, result);
        }

        EvaluationResult::assemble(methods, anomalies)
    }
}

/// Audit summary of a rule that matched a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub id: RuleId,
    pub name: String,
    pub priority: i64,
    pub action: RuleAction,
}

impl AppliedRule {
    pub fn from_rule(rule: &PaymentRule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority,
            action: rule.action,
        }
    }
}

/// Outcome for a single payment method, with the rules that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResult {
    pub status: MethodStatus,
    pub applied_rules: Vec<AppliedRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_payment_requirement: Option<AdvancePaymentRequirement>,
}

impl MethodResult {
    /// The rule whose action decided the status, if any matched.
    pub fn deciding_rule(&self) -> Option<&AppliedRule> {
        self.applied_rules.first()
    }
}

/// Payment options for a checkout, as returned to the checkout API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub methods: BTreeMap<PaymentMethod, MethodResult>,
    pub allowed_methods: Vec<PaymentMethod>,
    pub restricted_methods: Vec<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<RuleAnomaly>,
}

impl EvaluationResult {
    fn assemble(methods: BTreeMap<PaymentMethod, MethodResult>, anomalies: Vec<RuleAnomaly>) -> Self {
        let (allowed_methods, restricted_methods) = methods
            .iter()
            .map(|(method, result)| (*method, result.status))
            .partition::<Vec<_>, _>(|(_, status)| status.is_offered());

        Self {
            allowed_methods: allowed_methods.into_iter().map(|(method, _)| method).collect(),
            restricted_methods: restricted_methods
                .into_iter()
                .map(|(method, _)| method)
                .collect(),
            methods,
            anomalies,
        }
    }

    pub fn method(&self, method: PaymentMethod) -> Option<&MethodResult> {
        self.methods.get(&method)
    }

    pub fn status(&self, method: PaymentMethod) -> MethodStatus {
        self.method(method)
            .map(|result| result.status)
            .unwrap_or(MethodStatus::Allowed)
    }

    pub fn advance_for(&self, method: PaymentMethod) -> Option<AdvancePaymentRequirement> {
        self.method(method)
            .and_then(|result| result.advance_payment_requirement)
    }

    pub fn summary(&self) -> String {
        PaymentMethod::ALL
            .into_iter()
            .map(|method| match self.advance_for(method) {
                Some(advance) => format!(
                    "{method}: {} ({:.2})",
                    self.status(method).label(),
                    advance.amount
                ),
                None => format!("{method}: {}", self.status(method).label()),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

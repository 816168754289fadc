use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CheckoutContext, OrderId, PaymentMethod};
use super::evaluation::{AppliedRule, EvaluationResult};

/// Decision captured when an order was checked out. Never re-evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDecisionRecord {
    pub order_id: OrderId,
    pub recorded_at: DateTime<Utc>,
    pub context: CheckoutContext,
    pub result: EvaluationResult,
}

impl PaymentDecisionRecord {
    /// Rules that matched `method` at the time of checkout.
    pub fn applied_rules(&self, method: PaymentMethod) -> &[AppliedRule] {
        self.result
            .method(method)
            .map(|result| result.applied_rules.as_slice())
            .unwrap_or_default()
    }
}

/// Append-only store for decision snapshots, keyed by order.
pub trait DecisionAuditLog: Send + Sync {
    fn append(&self, record: PaymentDecisionRecord) -> Result<(), AuditError>;
    fn fetch(&self, order_id: &OrderId) -> Result<Option<PaymentDecisionRecord>, AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("payment decision already recorded for order {0}")]
    AlreadyRecorded(String),
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}

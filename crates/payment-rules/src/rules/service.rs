use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::audit::{AuditError, DecisionAuditLog, PaymentDecisionRecord};
use super::catalog::SeedRule;
use super::domain::{CheckoutContext, OrderId, PaymentRule, RuleId};
use super::evaluation::{EvaluationEngine, EvaluationResult};
use super::repository::{RepositoryError, RuleRepository};
use super::validation::{validate, PaymentRuleInput, RuleDraft, ValidationErrors};

/// Service composing the validator, rule repository, evaluation engine, and audit log.
pub struct PaymentRuleService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

static RULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_rule_id() -> RuleId {
    let id = RULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RuleId(format!("rule-{id:06}"))
}

/// Keeps generated ids clear of caller-chosen ids in the `rule-NNNNNN` namespace.
fn reserve_rule_id(id: &RuleId) {
    let sequence = id
        .0
        .strip_prefix("rule-")
        .and_then(|digits| digits.parse::<u64>().ok());
    if let Some(sequence) = sequence {
        RULE_SEQUENCE.fetch_max(sequence.saturating_add(1), Ordering::Relaxed);
    }
}

impl<R, A> PaymentRuleService<R, A>
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    /// Validate and store a new rule under a generated id.
    pub fn create(&self, input: PaymentRuleInput) -> Result<PaymentRule, PaymentRuleServiceError> {
        let draft = validate(input)?;
        self.store_draft(next_rule_id(), draft)
    }

    /// Store an already validated rule under a caller-chosen id (catalog seeding).
    pub fn store_draft(
        &self,
        id: RuleId,
        draft: RuleDraft,
    ) -> Result<PaymentRule, PaymentRuleServiceError> {
        reserve_rule_id(&id);
        let rule = draft.into_rule(id, Utc::now());
        let stored = self.repository.insert(rule)?;
        info!(rule_id = %stored.id, priority = stored.priority, "payment rule created");
        Ok(stored)
    }

    /// Store the entries of a seed catalog, returning how many were written.
    pub fn seed(&self, seeds: Vec<SeedRule>) -> Result<usize, PaymentRuleServiceError> {
        let mut stored = 0;
        for seed in seeds {
            let id = seed.id.unwrap_or_else(next_rule_id);
            self.store_draft(id, seed.draft)?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Replace a rule's definition, keeping its id and creation time.
    pub fn update(
        &self,
        id: &RuleId,
        input: PaymentRuleInput,
    ) -> Result<PaymentRule, PaymentRuleServiceError> {
        let existing = self.get(id)?;
        let draft = validate(input)?;
        let is_active = draft.is_active.unwrap_or(existing.is_active);

        let mut rule = draft.into_rule(existing.id, existing.created_at);
        rule.is_active = is_active;
        rule.updated_at = Utc::now();

        let stored = self.repository.update(rule)?;
        info!(rule_id = %stored.id, "payment rule updated");
        Ok(stored)
    }

    pub fn set_active(
        &self,
        id: &RuleId,
        is_active: bool,
    ) -> Result<PaymentRule, PaymentRuleServiceError> {
        let mut rule = self.get(id)?;
        rule.is_active = is_active;
        rule.updated_at = Utc::now();

        let stored = self.repository.update(rule)?;
        info!(rule_id = %stored.id, is_active, "payment rule activation changed");
        Ok(stored)
    }

    pub fn delete(&self, id: &RuleId) -> Result<(), PaymentRuleServiceError> {
        self.repository.delete(id)?;
        info!(rule_id = %id, "payment rule deleted");
        Ok(())
    }

    pub fn get(&self, id: &RuleId) -> Result<PaymentRule, PaymentRuleServiceError> {
        let rule = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(rule)
    }

    /// All rules, strongest first.
    pub fn list(&self) -> Result<Vec<PaymentRule>, PaymentRuleServiceError> {
        let mut rules = self.repository.list()?;
        rules.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(rules)
    }

    /// Evaluate a checkout against the current active catalog.
    pub fn evaluate(
        &self,
        ctx: &CheckoutContext,
    ) -> Result<EvaluationResult, PaymentRuleServiceError> {
        let engine = EvaluationEngine::new(self.repository.list_active()?);
        let result = engine.evaluate(ctx);

        if !result.anomalies.is_empty() {
            warn!(
                anomalies = result.anomalies.len(),
                "checkout evaluated with corrupt payment rules"
            );
        }
        info!(
            order_total = ctx.order_total,
            rules = engine.catalog().len(),
            outcome = %result.summary(),
            "checkout payment options evaluated"
        );
        Ok(result)
    }

    /// Evaluate a checkout and keep the decision as the order's immutable audit snapshot.
    pub fn evaluate_for_order(
        &self,
        order_id: OrderId,
        ctx: CheckoutContext,
    ) -> Result<PaymentDecisionRecord, PaymentRuleServiceError> {
        if self.audit.fetch(&order_id)?.is_some() {
            return Err(AuditError::AlreadyRecorded(order_id.0).into());
        }

        let result = self.evaluate(&ctx)?;
        let record = PaymentDecisionRecord {
            order_id,
            recorded_at: Utc::now(),
            context: ctx,
            result,
        };

        self.audit.append(record.clone())?;
        info!(order_id = %record.order_id.0, "payment decision recorded");
        Ok(record)
    }

    /// The decision captured at checkout, without re-evaluating against today's rules.
    pub fn decision_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentDecisionRecord>, PaymentRuleServiceError> {
        Ok(self.audit.fetch(order_id)?)
    }
}

/// Error raised by the payment rule service.
#[derive(Debug, thiserror::Error)]
pub enum PaymentRuleServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}

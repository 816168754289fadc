use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::rules::audit::{AuditError, DecisionAuditLog, PaymentDecisionRecord};
use crate::rules::domain::{
    AdvancePaymentSettings, ConditionSet, MethodTarget, OrderId, PaymentMethod, PaymentRule,
    RuleAction, RuleId,
};
use crate::rules::repository::{RepositoryError, RuleRepository};
use crate::rules::validation::PaymentRuleInput;
use crate::rules::{payment_rules_router, PaymentRuleService};

pub(super) fn names(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|value| value.to_string()).collect())
}

pub(super) fn rule(
    id: &str,
    priority: i64,
    method: Option<PaymentMethod>,
    action: RuleAction,
    conditions: ConditionSet,
) -> PaymentRule {
    let stamp = Utc
        .with_ymd_and_hms(2025, 1, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    PaymentRule {
        id: RuleId(id.to_string()),
        name: format!("{id} rule"),
        description: None,
        priority,
        payment_method: MethodTarget::from(method),
        action,
        conditions,
        advance_payment_settings: None,
        is_active: true,
        created_at: stamp,
        updated_at: stamp,
    }
}

pub(super) fn advance_rule(
    id: &str,
    priority: i64,
    method: Option<PaymentMethod>,
    conditions: ConditionSet,
    settings: Option<AdvancePaymentSettings>,
) -> PaymentRule {
    let mut rule = rule(id, priority, method, RuleAction::ForceAdvance, conditions);
    rule.advance_payment_settings = settings;
    rule
}

/// COD advance of 20% for orders of 500 or more, outranking an electronics COD ban.
pub(super) fn large_order_catalog() -> Vec<PaymentRule> {
    vec![
        advance_rule(
            "cod-advance",
            100,
            Some(PaymentMethod::Cod),
            ConditionSet {
                min_amount: Some(500.0),
                ..ConditionSet::default()
            },
            Some(AdvancePaymentSettings::Percentage { percentage: 20.0 }),
        ),
        rule(
            "cod-electronics",
            50,
            Some(PaymentMethod::Cod),
            RuleAction::Restrict,
            ConditionSet {
                categories: names(&["Electronics"]),
                ..ConditionSet::default()
            },
        ),
    ]
}

pub(super) fn rule_input(value: Value) -> PaymentRuleInput {
    serde_json::from_value(value).expect("rule input deserializes")
}

pub(super) fn electronics_restriction_input() -> PaymentRuleInput {
    rule_input(json!({
        "name": "No COD for electronics",
        "priority": 50,
        "paymentMethod": "COD",
        "action": "RESTRICT",
        "conditions": { "categories": ["Electronics"] }
    }))
}

pub(super) fn advance_input() -> PaymentRuleInput {
    rule_input(json!({
        "name": "Advance on large COD orders",
        "priority": 100,
        "paymentMethod": "COD",
        "action": "FORCE_ADVANCE",
        "conditions": { "minAmount": 500 },
        "advancePaymentSettings": { "type": "PERCENTAGE", "percentage": 20 }
    }))
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    rules: Mutex<HashMap<RuleId, PaymentRule>>,
}

impl RuleRepository for MemoryRepository {
    fn insert(&self, rule: PaymentRule) -> Result<PaymentRule, RepositoryError> {
        let mut guard = self.rules.lock().expect("repository mutex poisoned");
        if guard.contains_key(&rule.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(rule.id.clone(), rule.clone());
        Ok(rule)
    }

    fn update(&self, rule: PaymentRule) -> Result<PaymentRule, RepositoryError> {
        let mut guard = self.rules.lock().expect("repository mutex poisoned");
        match guard.get_mut(&rule.id) {
            Some(slot) => {
                *slot = rule.clone();
                Ok(rule)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete(&self, id: &RuleId) -> Result<(), RepositoryError> {
        let mut guard = self.rules.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &RuleId) -> Result<Option<PaymentRule>, RepositoryError> {
        let guard = self.rules.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<PaymentRule>, RepositoryError> {
        let guard = self.rules.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryAuditLog {
    records: Mutex<BTreeMap<OrderId, PaymentDecisionRecord>>,
}

impl MemoryAuditLog {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("audit mutex poisoned").len()
    }
}

impl DecisionAuditLog for MemoryAuditLog {
    fn append(&self, record: PaymentDecisionRecord) -> Result<(), AuditError> {
        let mut guard = self.records.lock().expect("audit mutex poisoned");
        if guard.contains_key(&record.order_id) {
            return Err(AuditError::AlreadyRecorded(record.order_id.0));
        }
        guard.insert(record.order_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, order_id: &OrderId) -> Result<Option<PaymentDecisionRecord>, AuditError> {
        let guard = self.records.lock().expect("audit mutex poisoned");
        Ok(guard.get(order_id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl RuleRepository for UnavailableRepository {
    fn insert(&self, _rule: PaymentRule) -> Result<PaymentRule, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _rule: PaymentRule) -> Result<PaymentRule, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &RuleId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RuleId) -> Result<Option<PaymentRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<PaymentRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService = PaymentRuleService<MemoryRepository, MemoryAuditLog>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryAuditLog>) {
    let repository = Arc::new(MemoryRepository::default());
    let audit = Arc::new(MemoryAuditLog::default());
    let service = PaymentRuleService::new(repository.clone(), audit.clone());
    (service, repository, audit)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    payment_rules_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

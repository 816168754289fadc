use metrics_exporter_prometheus::PrometheusHandle;
use payment_rules::rules::{
    AuditError, DecisionAuditLog, OrderId, PaymentDecisionRecord, PaymentRule,
    PaymentRuleService, RepositoryError, RuleId, RuleRepository,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryPaymentRuleService =
    PaymentRuleService<InMemoryRuleRepository, InMemoryAuditLog>;

pub(crate) fn in_memory_service() -> InMemoryPaymentRuleService {
    PaymentRuleService::new(
        Arc::new(InMemoryRuleRepository::default()),
        Arc::new(InMemoryAuditLog::default()),
    )
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRuleRepository {
    rules: Arc<Mutex<HashMap<RuleId, PaymentRule>>>,
}

impl RuleRepository for InMemoryRuleRepository {
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
        if guard.contains_key(&rule.id) {
            guard.insert(rule.id.clone(), rule.clone());
            Ok(rule)
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &RuleId) -> Result<(), RepositoryError> {
        let mut guard = self.rules.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditLog {
    records: Arc<Mutex<HashMap<OrderId, PaymentDecisionRecord>>>,
}

impl DecisionAuditLog for InMemoryAuditLog {
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

#[cfg(test)]
mod tests {
    use super::*;
    use payment_rules::rules::{CheckoutContext, PaymentMethod, PaymentRuleInput};
    use serde_json::json;

    #[test]
    fn in_memory_service_records_one_decision_per_order() {
        let service = in_memory_service();
        let input: PaymentRuleInput = serde_json::from_value(json!({
            "name": "No COD for electronics",
            "priority": 50,
            "paymentMethod": "COD",
            "action": "RESTRICT",
            "conditions": { "categories": ["Electronics"] }
        }))
        .expect("input deserializes");
        service.create(input).expect("rule stored");

        let order = OrderId("order-1".to_string());
        let record = service
            .evaluate_for_order(order.clone(), CheckoutContext::guest(80.0, &["Electronics"]))
            .expect("decision recorded");
        assert_eq!(record.result.restricted_methods, vec![PaymentMethod::Cod]);

        assert!(service
            .evaluate_for_order(order, CheckoutContext::guest(80.0, &[]))
            .is_err());
    }
}

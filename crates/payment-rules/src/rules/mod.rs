//! Checkout payment policy: rule definitions, validation, evaluation, and the audit trail.

pub mod advance;
pub mod audit;
pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod matcher;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use advance::{compute_advance, AdvancePaymentRequirement};
pub use audit::{AuditError, DecisionAuditLog, PaymentDecisionRecord};
pub use catalog::{load_catalog, parse_catalog, CatalogError, SeedRule};
pub use domain::{
    AdvancePaymentSettings, CheckoutContext, CheckoutUser, ConditionSet, MethodTarget, OrderId,
    PaymentMethod, PaymentRule, RuleAction, RuleId,
};
pub use evaluation::{
    AppliedRule, EvaluationEngine, EvaluationResult, MethodResult, MethodStatus, RuleAnomaly,
};
pub use matcher::matches;
pub use repository::{RepositoryError, RuleRepository};
pub use router::payment_rules_router;
pub use service::{PaymentRuleService, PaymentRuleServiceError};
pub use validation::{
    validate, AdvanceSettingsInput, FieldError, PaymentRuleInput, RuleDraft,
    ValidationErrors,
};

use super::domain::{PaymentRule, RuleId};

/// Storage abstraction for rule definitions so the service can be exercised in isolation.
pub trait RuleRepository: Send + Sync {
    fn insert(&self, rule: PaymentRule) -> Result<PaymentRule, RepositoryError>;
    fn update(&self, rule: PaymentRule) -> Result<PaymentRule, RepositoryError>;
    fn delete(&self, id: &RuleId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RuleId) -> Result<Option<PaymentRule>, RepositoryError>;
    fn list(&self) -> Result<Vec<PaymentRule>, RepositoryError>;

    /// Catalog snapshot handed to the evaluation engine.
    fn list_active(&self) -> Result<Vec<PaymentRule>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|rule| rule.is_active)
            .collect())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("rule already exists")]
    Conflict,
    #[error("rule not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

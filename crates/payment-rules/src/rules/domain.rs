use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored payment rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the order a recorded payment decision belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    Advance,
    Online,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cod,
        PaymentMethod::Advance,
        PaymentMethod::Online,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Advance => "ADVANCE",
            PaymentMethod::Online => "ONLINE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which payment methods a rule governs. Serialized as a nullable method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<PaymentMethod>", into = "Option<PaymentMethod>")]
pub enum MethodTarget {
    #[default]
    AnyMethod,
    Only(PaymentMethod),
}

impl MethodTarget {
    pub fn covers(self, method: PaymentMethod) -> bool {
        match self {
            MethodTarget::AnyMethod => true,
            MethodTarget::Only(target) => target == method,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MethodTarget::AnyMethod => "ANY",
            MethodTarget::Only(method) => method.label(),
        }
    }
}

impl From<Option<PaymentMethod>> for MethodTarget {
    fn from(value: Option<PaymentMethod>) -> Self {
        match value {
            Some(method) => MethodTarget::Only(method),
            None => MethodTarget::AnyMethod,
        }
    }
}

impl From<MethodTarget> for Option<PaymentMethod> {
    fn from(value: MethodTarget) -> Self {
        match value {
            MethodTarget::AnyMethod => None,
            MethodTarget::Only(method) => Some(method),
        }
    }
}

/// Effect a matching rule has on its payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    Allow,
    Restrict,
    ForceAdvance,
}

impl RuleAction {
    pub const fn label(self) -> &'static str {
        match self {
            RuleAction::Allow => "ALLOW",
            RuleAction::Restrict => "RESTRICT",
            RuleAction::ForceAdvance => "FORCE_ADVANCE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        [RuleAction::Allow, RuleAction::Restrict, RuleAction::ForceAdvance]
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(raw))
    }
}

/// Predicate over a checkout. Absent (or empty) fields place no constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_roles: Option<BTreeSet<String>>,
}

/// How a forced advance is sized relative to the order total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvancePaymentSettings {
    #[serde(alias = "PARTIAL")]
    Percentage { percentage: f64 },
    Fixed { amount: f64 },
}

impl AdvancePaymentSettings {
    /// Checks the sizing is usable: percentages in (0, 100], fixed amounts positive.
    pub fn integrity_issue(&self) -> Option<String> {
        match *self {
            AdvancePaymentSettings::Percentage { percentage }
                if !(percentage.is_finite() && percentage > 0.0 && percentage <= 100.0) =>
            {
                Some(format!("percentage {percentage} outside (0, 100]"))
            }
            AdvancePaymentSettings::Fixed { amount } if !(amount.is_finite() && amount > 0.0) => {
                Some(format!("fixed amount {amount} must be positive"))
            }
            _ => None,
        }
    }
}

/// Stored payment rule as read by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: i64,
    #[serde(default)]
    pub payment_method: MethodTarget,
    pub action: RuleAction,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_payment_settings: Option<AdvancePaymentSettings>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated shopper attached to a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutUser {
    pub id: String,
    pub role: String,
    #[serde(default = "authenticated_by_default")]
    pub is_authenticated: bool,
}

fn authenticated_by_default() -> bool {
    true
}

/// Facts about an in-progress order needed to decide payment options.
///
/// `order_total` is expected to be non-negative; callers validate it upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutContext {
    pub order_total: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub user: Option<CheckoutUser>,
}

impl CheckoutContext {
    pub fn guest(order_total: f64, categories: &[&str]) -> Self {
        Self {
            order_total,
            categories: categories.iter().map(|name| name.to_string()).collect(),
            user: None,
        }
    }

    pub fn with_user(mut self, id: &str, role: &str) -> Self {
        self.user = Some(CheckoutUser {
            id: id.to_string(),
            role: role.to_string(),
            is_authenticated: true,
        });
        self
    }

    /// Role of the shopper, or `None` for guests and unauthenticated sessions.
    pub fn authenticated_role(&self) -> Option<&str> {
        self.user
            .as_ref()
            .filter(|user| user.is_authenticated)
            .map(|user| user.role.as_str())
    }
}

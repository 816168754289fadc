use std::cmp::Ordering;

use super::super::domain::{CheckoutContext, PaymentMethod, PaymentRule};
use super::super::matcher::matches;

/// Active rules targeting `method` whose conditions hold, strongest first.
pub(crate) fn matching_rules<'a>(
    catalog: &'a [PaymentRule],
    method: PaymentMethod,
    ctx: &CheckoutContext,
) -> Vec<&'a PaymentRule> {
    let mut matched: Vec<&PaymentRule> = catalog
        .iter()
        .filter(|rule| rule.is_active)
        .filter(|rule| rule.payment_method.covers(method))
        .filter(|rule| matches(&rule.conditions, ctx))
        .collect();

    matched.sort_by(|left, right| precedence(left, right));
    matched
}

/// Higher priority first; equal priorities fall back to the lowest rule id.
pub(crate) fn precedence(left: &PaymentRule, right: &PaymentRule) -> Ordering {
    right
        .priority
        .cmp(&left.priority)
        .then_with(|| left.id.cmp(&right.id))
}

use super::domain::{CheckoutContext, ConditionSet};

/// Returns true when every constraint present in `conditions` holds for the checkout.
pub fn matches(conditions: &ConditionSet, ctx: &CheckoutContext) -> bool {
    within_amount_bounds(conditions, ctx.order_total)
        && shares_category(conditions, &ctx.categories)
        && role_permitted(conditions, ctx.authenticated_role())
}

fn within_amount_bounds(conditions: &ConditionSet, order_total: f64) -> bool {
    let above_min = conditions
        .min_amount
        .map(|min| order_total >= min)
        .unwrap_or(true);
    let below_max = conditions
        .max_amount
        .map(|max| order_total <= max)
        .unwrap_or(true);
    above_min && below_max
}

fn shares_category(conditions: &ConditionSet, categories: &[String]) -> bool {
    match &conditions.categories {
        Some(required) if !required.is_empty() => categories
            .iter()
            .any(|category| required.contains(category.as_str())),
        _ => true,
    }
}

fn role_permitted(conditions: &ConditionSet, role: Option<&str>) -> bool {
    match &conditions.user_roles {
        Some(roles) if !roles.is_empty() => match role {
            Some(role) => roles
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(role.trim())),
            None => false,
        },
        _ => true,
    }
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::audit::{AuditError, DecisionAuditLog};
use super::domain::{CheckoutContext, OrderId, RuleId};
use super::repository::{RepositoryError, RuleRepository};
use super::service::{PaymentRuleService, PaymentRuleServiceError};
use super::validation::PaymentRuleInput;

type SharedService<R, A> = Arc<PaymentRuleService<R, A>>;

/// Router builder exposing rule administration, checkout evaluation, and the audit read path.
pub fn payment_rules_router<R, A>(service: SharedService<R, A>) -> Router
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/payment-rules",
            get(list_handler::<R, A>).post(create_handler::<R, A>),
        )
        .route(
            "/api/v1/payment-rules/:rule_id",
            get(get_handler::<R, A>)
                .put(update_handler::<R, A>)
                .delete(delete_handler::<R, A>),
        )
        .route(
            "/api/v1/payment-rules/:rule_id/activation",
            post(activation_handler::<R, A>),
        )
        .route(
            "/api/v1/checkout/payment-options",
            post(evaluate_handler::<R, A>),
        )
        .route(
            "/api/v1/orders/:order_id/payment-decision",
            get(decision_handler::<R, A>).post(record_decision_handler::<R, A>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivationRequest {
    pub(crate) is_active: bool,
}

pub(crate) async fn create_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    axum::Json(input): axum::Json<PaymentRuleInput>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.create(input) {
        Ok(rule) => (StatusCode::CREATED, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, A>(State(service): State<SharedService<R, A>>) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.list() {
        Ok(rules) => (StatusCode::OK, axum::Json(rules)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(rule_id): Path<String>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.get(&RuleId(rule_id)) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(rule_id): Path<String>,
    axum::Json(input): axum::Json<PaymentRuleInput>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.update(&RuleId(rule_id), input) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(rule_id): Path<String>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.delete(&RuleId(rule_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activation_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(rule_id): Path<String>,
    axum::Json(request): axum::Json<ActivationRequest>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.set_active(&RuleId(rule_id), request.is_active) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    axum::Json(ctx): axum::Json<CheckoutContext>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.evaluate(&ctx) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_decision_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(order_id): Path<String>,
    axum::Json(ctx): axum::Json<CheckoutContext>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    match service.evaluate_for_order(OrderId(order_id), ctx) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<R, A>(
    State(service): State<SharedService<R, A>>,
    Path(order_id): Path<String>,
) -> Response
where
    R: RuleRepository + 'static,
    A: DecisionAuditLog + 'static,
{
    let order_id = OrderId(order_id);
    match service.decision_for_order(&order_id) {
        Ok(Some(record)) => (StatusCode::OK, axum::Json(record)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": format!("no payment decision recorded for order {}", order_id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: PaymentRuleServiceError) -> Response {
    match error {
        PaymentRuleServiceError::Validation(errors) => {
            let payload = json!({
                "error": errors.to_string(),
                "fieldErrors": errors.0,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        PaymentRuleServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "payment rule not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        PaymentRuleServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "payment rule already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        PaymentRuleServiceError::Audit(error @ AuditError::AlreadyRecorded(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

use axum::{
    body::{to_bytes, Body},
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::{AppError, Result},
    payments::webhook::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
    service::{
        CreateOrderRequest, CreatedOrder, PaymentStatusView, ReconcileOutcome, StatusRequester,
        WebhookDelivery,
    },
};

pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreatedOrder>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let created = state.service_context.order_service
        .create_order(user.user_id, request)
        .await?;

    Ok(Json(created))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    received: bool,
    status: &'static str,
}

/// Provider webhook. Always answers 200 so the provider never retries into a
/// second credit; what happened is in the logs and the `status` field. The
/// body is read here rather than through an extractor so that an oversized
/// body is still acknowledged.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> (StatusCode, Json<WebhookAck>) {
    let limit = state.settings.payments.webhook_max_body_bytes;
    let body = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(limit_bytes = limit, error = %e, "Discarding unreadable or oversized webhook body");
            return ack(ReconcileOutcome::Malformed);
        }
    };

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let outcome = state.service_context.reconciler
        .handle_webhook(WebhookDelivery {
            body: &body,
            signature: header(SIGNATURE_HEADER),
            timestamp: header(TIMESTAMP_HEADER),
        })
        .await;

    ack(outcome)
}

fn ack(outcome: ReconcileOutcome) -> (StatusCode, Json<WebhookAck>) {
    tracing::debug!(outcome = outcome.label(), "Webhook acknowledged");
    (StatusCode::OK, Json(WebhookAck { received: true, status: outcome.label() }))
}

pub async fn status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentStatusView>> {
    let view = state.service_context.status_prober
        .get_status(&order_id, StatusRequester {
            user_id: user.user_id,
            is_admin: user.is_admin(),
        })
        .await?;

    Ok(Json(view))
}

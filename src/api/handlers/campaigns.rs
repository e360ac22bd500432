use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Campaign, CampaignLedger, CreateCampaignRequest, UpdateCampaignRequest},
    error::Result,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>> {
    let campaigns = state.service_context.campaign_service.list().await?;
    Ok(Json(campaigns))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>> {
    let campaign = state.service_context.campaign_service.get(id).await?;
    Ok(Json(campaign))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>)> {
    let campaign = state.service_context.campaign_service
        .create(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>> {
    let campaign = state.service_context.campaign_service
        .update(id, request)
        .await?;

    Ok(Json(campaign))
}

pub async fn ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignLedger>> {
    let ledger = state.service_context.campaign_service.ledger(id).await?;
    Ok(Json(ledger))
}

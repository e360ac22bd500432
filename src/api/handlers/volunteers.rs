use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Volunteer, VolunteerApplication, VolunteerStatus},
    error::Result,
};

pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(application): Json<VolunteerApplication>,
) -> Result<(StatusCode, Json<Volunteer>)> {
    let volunteer = state.service_context.volunteer_service
        .apply(user.user_id, application)
        .await?;

    Ok((StatusCode::CREATED, Json(volunteer)))
}

pub async fn my_applications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Volunteer>>> {
    let applications = state.service_context.volunteer_service
        .list_mine(user.user_id)
        .await?;

    Ok(Json(applications))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Volunteer>>> {
    let applications = state.service_context.volunteer_service.list_all().await?;
    Ok(Json(applications))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: VolunteerStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Volunteer>> {
    let volunteer = state.service_context.volunteer_service
        .update_status(id, update.status)
        .await?;

    Ok(Json(volunteer))
}

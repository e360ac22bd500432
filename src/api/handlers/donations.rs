use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::Donation,
    error::Result,
};

pub async fn my_donations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Donation>>> {
    let donations = state.service_context.donation_repo
        .list_by_user(user.user_id)
        .await?;

    Ok(Json(donations))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Donation>>> {
    let donations = state.service_context.donation_repo.list_all().await?;
    Ok(Json(donations))
}

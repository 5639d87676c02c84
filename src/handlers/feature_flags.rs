use crate::db::models::FeatureFlag;
use crate::error::SubtrackError;
use crate::middleware::OnboardedUser;
use crate::router::SubtrackState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FlagState {
    pub name: String,
    pub enabled: bool,
}

pub async fn list(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<Vec<FeatureFlag>>, SubtrackError> {
    Ok(Json(state.storage.feature_flags_for(&user.id).await?))
}

/// Unknown flags report as disabled rather than 404.
pub async fn get_one(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Path(name): Path<String>,
) -> Result<Json<FlagState>, SubtrackError> {
    let enabled = state.storage.flag_enabled(&user.id, &name).await?;
    Ok(Json(FlagState { name, enabled }))
}

use crate::db::models::Notification;
use crate::error::SubtrackError;
use crate::middleware::OnboardedUser;
use crate::router::SubtrackState;
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

pub async fn list(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<Vec<Notification>>, SubtrackError> {
    Ok(Json(state.storage.list_notifications(&user.id).await?))
}

pub async fn mark_read(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Path(id): Path<String>,
) -> Result<Json<Notification>, SubtrackError> {
    state
        .storage
        .mark_notification_read(&user.id, &id, Utc::now())
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("notification"))
}

use crate::error::SubtrackError;
use crate::middleware::OnboardedUser;
use crate::router::SubtrackState;
use crate::service::dashboard::{DashboardSummary, build_summary};
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub greeting_name: String,
    pub avatar_initial: char,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

pub async fn summary(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<DashboardResponse>, SubtrackError> {
    let subs = state.storage.user_subscriptions(&user.id).await?;
    let summary = build_summary(
        &subs,
        state.today(),
        state.config.defaults.upcoming_window_days,
    );
    Ok(Json(DashboardResponse {
        greeting_name: user.display_name(),
        avatar_initial: user.avatar_initial(),
        summary,
    }))
}

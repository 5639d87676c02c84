use crate::db::models::{Currency, ProfilePatch};
use crate::error::SubtrackError;
use crate::handlers::google_oauth::next_route;
use crate::middleware::CurrentUser;
use crate::router::SubtrackState;
use crate::service::onboarding::{DraftPatch, onboarding_monthly_total};
use crate::service::onboarding_flow::{
    ALREADY_COMPLETED_MESSAGE, CompletedOnboarding, complete_onboarding_flow,
};
use crate::service::{OnboardingCommand, OnboardingState, SubscriptionDraft};
use crate::types::currency::format_currency;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct OnboardingView {
    #[serde(flatten)]
    pub state: OnboardingState,
    pub current_route: &'static str,
}

impl From<OnboardingState> for OnboardingView {
    fn from(state: OnboardingState) -> Self {
        Self {
            current_route: state.current_route(),
            state,
        }
    }
}

async fn apply(
    state: &SubtrackState,
    user: &CurrentUser,
    command: OnboardingCommand,
) -> Result<Json<OnboardingView>, SubtrackError> {
    let next = state.onboarding.apply(&user.user.id, command).await?;
    Ok(Json(next.into()))
}

pub async fn state(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingView>, SubtrackError> {
    let current = state.onboarding.state(&user.user.id).await?;
    Ok(Json(current.into()))
}

#[derive(Debug, Serialize)]
pub struct OnboardingStatus {
    pub onboarding_completed: bool,
    pub next_route: &'static str,
}

pub async fn status(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingStatus>, SubtrackError> {
    let done = state.storage.has_completed_onboarding(&user.user.id).await?;
    Ok(Json(OnboardingStatus {
        onboarding_completed: done,
        next_route: next_route(done),
    }))
}

pub async fn next(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingView>, SubtrackError> {
    apply(&state, &user, OnboardingCommand::Next).await
}

pub async fn previous(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingView>, SubtrackError> {
    apply(&state, &user, OnboardingCommand::Previous).await
}

#[derive(Debug, Deserialize)]
pub struct GoToBody {
    pub step: i64,
}

pub async fn go_to(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Json(body): Json<GoToBody>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    apply(&state, &user, OnboardingCommand::GoTo(body.step)).await
}

#[derive(Debug, Deserialize)]
pub struct RouteBody {
    pub route: String,
}

pub async fn route(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Json(body): Json<RouteBody>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    apply(&state, &user, OnboardingCommand::Route(body.route)).await
}

pub async fn update_profile(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    if let Some(Some(currency_id)) = patch.currency_id.as_ref()
        && state.storage.currency_by_id(currency_id).await?.is_none()
    {
        return Err(SubtrackError::Validation(format!(
            "unknown currency `{currency_id}`"
        )));
    }
    apply(&state, &user, OnboardingCommand::UpdateProfile(patch)).await
}

#[derive(Debug, Deserialize)]
pub struct ProvidersBody {
    pub provider_ids: Vec<String>,
}

/// Replace the selection and re-derive the drafts from it.
pub async fn select_providers(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Json(body): Json<ProvidersBody>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    let mut ids = body.provider_ids;
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));

    let providers = state.storage.providers_by_ids(&ids).await?;
    let default_currency = state
        .storage
        .default_currency(&state.config.defaults.currency_code)
        .await?;
    let monthly = state.storage.default_billing_cycle().await?;
    let command = OnboardingCommand::SelectProviders {
        providers,
        default_currency_id: default_currency.map(|c| c.id),
        monthly_cycle_id: monthly.map(|c| c.id),
        today: state.today(),
    };
    apply(&state, &user, command).await
}

pub async fn set_drafts(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Json(drafts): Json<Vec<SubscriptionDraft>>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    apply(&state, &user, OnboardingCommand::SetDrafts(drafts)).await
}

pub async fn update_draft(
    State(state): State<SubtrackState>,
    user: CurrentUser,
    Path(index): Path<usize>,
    Json(patch): Json<DraftPatch>,
) -> Result<Json<OnboardingView>, SubtrackError> {
    if matches!(patch.amount, Some(a) if a < 0.0 || !a.is_finite()) {
        return Err(SubtrackError::Validation(
            "amount must be a positive number".to_string(),
        ));
    }
    apply(&state, &user, OnboardingCommand::UpdateDraft(index, patch)).await
}

#[derive(Debug, Serialize)]
pub struct OnboardingPreview {
    pub monthly_total: f64,
    pub currency: Option<Currency>,
    pub formatted_monthly_total: Option<String>,
    pub subscriptions: usize,
}

pub async fn preview(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingPreview>, SubtrackError> {
    let wizard = state.onboarding.state(&user.user.id).await?;
    let cycles = state.storage.list_billing_cycles().await?;
    let monthly_total = onboarding_monthly_total(&wizard.subscriptions, &cycles);
    let currency = match wizard.profile_currency() {
        Some(id) => state.storage.currency_by_id(id).await?,
        None => {
            state
                .storage
                .default_currency(&state.config.defaults.currency_code)
                .await?
        }
    };
    Ok(Json(OnboardingPreview {
        monthly_total,
        formatted_monthly_total: currency.as_ref().map(|c| format_currency(monthly_total, c)),
        currency,
        subscriptions: wizard.subscriptions.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    #[serde(flatten)]
    pub completed: CompletedOnboarding,
    pub next_route: &'static str,
}

/// Persist the wizard and hand the user over to the dashboard.
pub async fn complete(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<CompletionResponse>), SubtrackError> {
    if state.storage.has_completed_onboarding(&user.user.id).await? {
        return Err(SubtrackError::Validation(
            ALREADY_COMPLETED_MESSAGE.to_string(),
        ));
    }
    let wizard = state.onboarding.state(&user.user.id).await?;
    let completed = complete_onboarding_flow(
        &state.storage,
        &user.user,
        &wizard.profile_data,
        &wizard.subscriptions,
        &state.config.defaults,
        state.today(),
    )
    .await?;
    state
        .onboarding
        .apply(&user.user.id, OnboardingCommand::Complete)
        .await?;
    info!(user_id = %user.user.id, "wizard committed");

    Ok((
        StatusCode::CREATED,
        Json(CompletionResponse {
            completed,
            next_route: next_route(true),
        }),
    ))
}

pub async fn reset(
    State(state): State<SubtrackState>,
    user: CurrentUser,
) -> Result<Json<OnboardingView>, SubtrackError> {
    state.onboarding.reset(&user.user.id).await;
    let current = state.onboarding.state(&user.user.id).await?;
    Ok(Json(current.into()))
}

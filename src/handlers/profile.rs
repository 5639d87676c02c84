use crate::db::models::{NotificationPreferences, ProfilePatch, UserProfile, UserWithCurrency};
use crate::error::SubtrackError;
use crate::middleware::OnboardedUser;
use crate::router::SubtrackState;
use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::info;

async fn ensure_currency(state: &SubtrackState, currency_id: &str) -> Result<(), SubtrackError> {
    match state.storage.currency_by_id(currency_id).await? {
        Some(c) if c.is_active => Ok(()),
        _ => Err(SubtrackError::Validation(format!(
            "unknown currency `{currency_id}`"
        ))),
    }
}

fn ensure_preferences(prefs: &NotificationPreferences) -> Result<(), SubtrackError> {
    if prefs.days_before < 0 {
        return Err(SubtrackError::Validation(
            "days_before cannot be negative".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_profile(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<UserWithCurrency>, SubtrackError> {
    state
        .storage
        .user_profile(&user.id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("profile"))
}

pub async fn update_profile(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserWithCurrency>, SubtrackError> {
    if let Some(Some(currency_id)) = patch.currency_id.as_ref() {
        ensure_currency(&state, currency_id).await?;
    }
    if let Some(prefs) = patch.notification_preferences.as_ref() {
        ensure_preferences(prefs)?;
    }
    if matches!(patch.timezone.as_deref(), Some(tz) if tz.trim().is_empty()) {
        return Err(SubtrackError::Validation("timezone cannot be empty".to_string()));
    }
    if !patch.is_empty() {
        state
            .storage
            .update_profile(&user.id, patch)
            .await?
            .ok_or(SubtrackError::NotFound("profile"))?;
        info!(user_id = %user.id, "profile updated");
    }
    get_profile(State(state), OnboardedUser(user)).await
}

pub async fn notification_preferences(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<NotificationPreferences>, SubtrackError> {
    state
        .storage
        .notification_preferences(&user.id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("profile"))
}

pub async fn set_notification_preferences(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Json(prefs): Json<NotificationPreferences>,
) -> Result<Json<NotificationPreferences>, SubtrackError> {
    ensure_preferences(&prefs)?;
    let profile = state
        .storage
        .set_notification_preferences(&user.id, prefs)
        .await?
        .ok_or(SubtrackError::NotFound("profile"))?;
    Ok(Json(profile.notification_preferences.0))
}

#[derive(Debug, Deserialize)]
pub struct CurrencyBody {
    pub currency_id: String,
}

pub async fn set_currency(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Json(body): Json<CurrencyBody>,
) -> Result<Json<UserProfile>, SubtrackError> {
    ensure_currency(&state, &body.currency_id).await?;
    state
        .storage
        .set_default_currency(&user.id, &body.currency_id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("profile"))
}

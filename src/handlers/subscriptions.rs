use crate::db::NewNotification;
use crate::db::models::{
    NewSubscription, SubscriptionPatch, SubscriptionWithDetails, UserTotals,
};
use crate::error::SubtrackError;
use crate::middleware::OnboardedUser;
use crate::router::SubtrackState;
use crate::service::dashboard::{MAX_UPCOMING_WINDOW_DAYS, calculate_user_totals};
use crate::types::dates::add_days;
use crate::types::{NotificationType, SubscriptionStatus};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

fn ensure_amount(amount: f64) -> Result<(), SubtrackError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SubtrackError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn ensure_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), SubtrackError> {
    if let Some(end) = end
        && end < start
    {
        return Err(SubtrackError::Validation(
            "end_date cannot be before start_date".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_references(
    state: &SubtrackState,
    currency_id: Option<&str>,
    billing_cycle_id: Option<&str>,
) -> Result<(), SubtrackError> {
    if let Some(id) = currency_id
        && state.storage.currency_by_id(id).await?.is_none()
    {
        return Err(SubtrackError::Validation(format!("unknown currency `{id}`")));
    }
    if let Some(id) = billing_cycle_id
        && state.storage.billing_cycle_by_id(id).await?.is_none()
    {
        return Err(SubtrackError::Validation(format!(
            "unknown billing cycle `{id}`"
        )));
    }
    Ok(())
}

/// Provider's name when `name` is blank; errors when neither is usable.
async fn resolve_name(
    state: &SubtrackState,
    name: &str,
    provider_id: Option<&str>,
) -> Result<String, SubtrackError> {
    let provider = match provider_id {
        Some(id) => Some(
            state
                .storage
                .provider_by_id(id)
                .await?
                .ok_or_else(|| SubtrackError::Validation(format!("unknown provider `{id}`")))?,
        ),
        None => None,
    };
    let name = name.trim();
    if !name.is_empty() {
        return Ok(name.to_string());
    }
    provider
        .map(|p| p.provider.name)
        .ok_or_else(|| SubtrackError::Validation("name is required".to_string()))
}

async fn load(
    state: &SubtrackState,
    user_id: &str,
    id: &str,
) -> Result<SubscriptionWithDetails, SubtrackError> {
    state
        .storage
        .subscription_by_id(user_id, id)
        .await?
        .ok_or(SubtrackError::NotFound("subscription"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SubscriptionWithDetails>>, SubtrackError> {
    let subs = match query.status.as_deref() {
        Some(raw) => {
            let status: SubscriptionStatus = raw.parse()?;
            state.storage.subscriptions_by_status(&user.id, status).await?
        }
        None => state.storage.user_subscriptions(&user.id).await?,
    };
    Ok(Json(subs))
}

pub async fn create(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Json(mut new): Json<NewSubscription>,
) -> Result<(StatusCode, Json<SubscriptionWithDetails>), SubtrackError> {
    ensure_amount(new.amount)?;
    let today = state.today();
    ensure_dates(new.start_date.unwrap_or(today), new.end_date)?;
    ensure_references(
        &state,
        Some(new.currency_id.as_str()),
        Some(new.billing_cycle_id.as_str()),
    )
    .await?;
    new.name = resolve_name(&state, &new.name, new.provider_id.as_deref()).await?;

    let created = state
        .storage
        .create_subscription(&user.id, new, today)
        .await?;
    info!(user_id = %user.id, subscription_id = %created.id, "subscription created");
    let details = load(&state, &user.id, &created.id).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn get_one(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionWithDetails>, SubtrackError> {
    Ok(Json(load(&state, &user.id, &id).await?))
}

pub async fn update(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Path(id): Path<String>,
    Json(mut patch): Json<SubscriptionPatch>,
) -> Result<Json<SubscriptionWithDetails>, SubtrackError> {
    let current = load(&state, &user.id, &id).await?;

    if let Some(amount) = patch.amount {
        ensure_amount(amount)?;
    }
    let start = patch
        .start_date
        .unwrap_or(current.subscription.start_date);
    let end = match patch.end_date {
        Some(end) => end,
        None => current.subscription.end_date,
    };
    ensure_dates(start, end)?;
    ensure_references(
        &state,
        patch.currency_id.as_deref(),
        patch.billing_cycle_id.as_deref(),
    )
    .await?;
    if let Some(name) = patch.name.as_deref() {
        let provider_id = match patch.provider_id.as_ref() {
            Some(p) => p.as_deref(),
            None => current.subscription.provider_id.as_deref(),
        };
        patch.name = Some(resolve_name(&state, name, provider_id).await?);
    } else if let Some(Some(provider_id)) = patch.provider_id.as_ref()
        && state.storage.provider_by_id(provider_id).await?.is_none()
    {
        return Err(SubtrackError::Validation(format!(
            "unknown provider `{provider_id}`"
        )));
    }

    let new_status = patch.status;
    state
        .storage
        .update_subscription(&user.id, &id, patch)
        .await?
        .ok_or(SubtrackError::NotFound("subscription"))?;

    let kind = match new_status {
        Some(s) if s == current.subscription.status => None,
        Some(SubscriptionStatus::Cancelled) => Some(NotificationType::SubscriptionCancelled),
        Some(SubscriptionStatus::Expired) => Some(NotificationType::SubscriptionExpired),
        _ => None,
    };
    let updated = load(&state, &user.id, &id).await?;
    if let Some(kind) = kind {
        let notification = NewNotification::composed(
            &user.id,
            Some(&id),
            kind,
            &updated.subscription.name,
            None,
        );
        if let Err(e) = state.storage.insert_notification(notification).await {
            warn!(subscription_id = %id, "status notification failed: {e}");
        }
    }
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, SubtrackError> {
    if !state.storage.delete_subscription(&user.id, &id).await? {
        return Err(SubtrackError::NotFound("subscription"));
    }
    info!(user_id = %user.id, subscription_id = %id, "subscription deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<i64>,
}

pub async fn upcoming(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<SubscriptionWithDetails>>, SubtrackError> {
    let days = query
        .days
        .unwrap_or(state.config.defaults.upcoming_window_days)
        .clamp(0, MAX_UPCOMING_WINDOW_DAYS);
    let until = add_days(state.today(), days)
        .ok_or_else(|| SubtrackError::Validation("days is out of range".to_string()))?;
    Ok(Json(state.storage.upcoming_renewals(&user.id, until).await?))
}

pub async fn totals(
    State(state): State<SubtrackState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<UserTotals>, SubtrackError> {
    let subs = state.storage.user_subscriptions(&user.id).await?;
    Ok(Json(calculate_user_totals(&subs)))
}

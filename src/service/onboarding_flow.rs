use crate::config::DefaultsConfig;
use crate::db::models::{
    AuthUser, NotificationPreferences, ProfilePatch, Subscription, UserProfile,
};
use crate::db::notifications::insert_notification_on;
use crate::db::subscriptions::insert_subscription_on;
use crate::db::users::{mark_onboarding_completed_on, upsert_profile_on};
use crate::db::{NewNotification, Storage};
use crate::error::SubtrackError;
use crate::service::onboarding::{SubscriptionDraft, validate_drafts};
use crate::types::NotificationType;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::types::Json;
use tracing::info;

pub const ALREADY_COMPLETED_MESSAGE: &str = "onboarding already completed";

#[derive(Debug, Clone, Serialize)]
pub struct CompletedOnboarding {
    pub profile: UserProfile,
    pub subscriptions: Vec<Subscription>,
}

/// Persist the wizard: profile, drafted subscriptions, the completion flag
/// and a welcome notification, all in one transaction.
pub async fn complete_onboarding_flow(
    storage: &Storage,
    user: &AuthUser,
    profile_data: &ProfilePatch,
    drafts: &[SubscriptionDraft],
    defaults: &DefaultsConfig,
    today: NaiveDate,
) -> Result<CompletedOnboarding, SubtrackError> {
    validate_drafts(drafts)?;

    let currency_id = match profile_data.currency_id.as_ref().and_then(|c| c.as_deref()) {
        Some(id) => storage
            .currency_by_id(id)
            .await?
            .ok_or_else(|| SubtrackError::Validation(format!("unknown currency `{id}`")))?
            .id,
        None => storage
            .default_currency(&defaults.currency_code)
            .await?
            .ok_or(SubtrackError::NotFound("default currency"))?
            .id,
    };

    let cycles = storage.list_billing_cycles().await?;
    let mut new_subscriptions = Vec::with_capacity(drafts.len());
    for draft in drafts.iter().cloned() {
        let new = draft.into_new_subscription(&currency_id)?;
        if !cycles.iter().any(|c| c.id == new.billing_cycle_id) {
            return Err(SubtrackError::Validation(format!(
                "unknown billing cycle `{}`",
                new.billing_cycle_id
            )));
        }
        if new.currency_id != currency_id
            && storage.currency_by_id(&new.currency_id).await?.is_none()
        {
            return Err(SubtrackError::Validation(format!(
                "unknown currency `{}`",
                new.currency_id
            )));
        }
        if let Some(provider_id) = new.provider_id.as_deref()
            && storage.provider_by_id(provider_id).await?.is_none()
        {
            return Err(SubtrackError::Validation(format!(
                "unknown provider `{provider_id}`"
            )));
        }
        new_subscriptions.push(new);
    }

    let now = Utc::now();
    let existing = storage.profile_row(&user.id).await?;
    let full_name = match profile_data.full_name.clone() {
        Some(name) => name,
        None => Some(user.display_name()),
    };
    let avatar_url = match profile_data.avatar_url.clone() {
        Some(url) => url,
        None => user.avatar_url.clone(),
    };
    let profile = UserProfile {
        id: user.id.clone(),
        email: user.email.clone(),
        full_name,
        avatar_url,
        currency_id: Some(currency_id),
        timezone: profile_data
            .timezone
            .clone()
            .unwrap_or_else(|| defaults.timezone.clone()),
        notification_preferences: Json(
            profile_data
                .notification_preferences
                .unwrap_or_else(NotificationPreferences::default),
        ),
        onboarding_completed: false,
        created_at: existing.as_ref().map(|p| p.created_at).unwrap_or(now),
        updated_at: now,
    };

    // The upsert takes the write lock, so a concurrent completion waits here
    // and then loses the flag below.
    let mut tx = storage.pool().begin().await?;
    upsert_profile_on(&mut *tx, &profile).await?;
    if !mark_onboarding_completed_on(&mut *tx, &user.id).await? {
        return Err(SubtrackError::Validation(
            ALREADY_COMPLETED_MESSAGE.to_string(),
        ));
    }
    let mut subscriptions = Vec::with_capacity(new_subscriptions.len());
    for new in new_subscriptions {
        subscriptions.push(insert_subscription_on(&mut *tx, &user.id, new, today).await?);
    }
    insert_notification_on(
        &mut *tx,
        NewNotification::composed(&user.id, None, NotificationType::Welcome, "", None),
        now,
    )
    .await?;
    tx.commit().await?;

    info!(
        user_id = %user.id,
        subscriptions = subscriptions.len(),
        "onboarding completed"
    );

    Ok(CompletedOnboarding {
        profile: UserProfile {
            onboarding_completed: true,
            ..profile
        },
        subscriptions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::IdentityClaims;

    async fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let storage = crate::db::connect(&url).await.unwrap();
        (dir, storage)
    }

    async fn signed_in(storage: &Storage) -> AuthUser {
        storage
            .upsert_auth_user(
                &IdentityClaims {
                    provider: "google".into(),
                    subject: "sub-1".into(),
                    email: "maria@example.com".into(),
                    full_name: None,
                    avatar_url: None,
                },
                Utc::now(),
            )
            .await
            .unwrap()
    }

    fn draft(amount: f64, cycle: &str) -> SubscriptionDraft {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        SubscriptionDraft {
            provider_id: Some("prov-netflix".into()),
            custom_provider_name: Some("Netflix".into()),
            name: "Netflix".into(),
            description: None,
            amount,
            currency_id: None,
            billing_cycle_id: Some(cycle.into()),
            start_date: today,
            next_billing_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            auto_renew: true,
        }
    }

    #[tokio::test]
    async fn commits_profile_subscriptions_and_welcome() {
        let (_dir, storage) = storage().await;
        let user = signed_in(&storage).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let done = complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &[draft(49.99, "cycle-monthly")],
            &DefaultsConfig::default(),
            today,
        )
        .await
        .unwrap();

        assert!(done.profile.onboarding_completed);
        assert_eq!(done.profile.full_name.as_deref(), Some("maria"));
        assert_eq!(done.profile.currency_id.as_deref(), Some("cur-ron"));
        assert_eq!(done.subscriptions.len(), 1);
        assert_eq!(done.subscriptions[0].currency_id, "cur-ron");
        assert!(storage.has_completed_onboarding(&user.id).await.unwrap());

        let notes = storage.list_notifications(&user.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationType::Welcome);
    }

    #[tokio::test]
    async fn invalid_drafts_write_nothing() {
        let (_dir, storage) = storage().await;
        let user = signed_in(&storage).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let err = complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &[draft(10.0, "cycle-monthly"), draft(0.0, "cycle-monthly")],
            &DefaultsConfig::default(),
            today,
        )
        .await;
        assert!(matches!(err, Err(SubtrackError::Validation(_))));

        let err = complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &[draft(10.0, "cycle-fortnightly")],
            &DefaultsConfig::default(),
            today,
        )
        .await;
        assert!(matches!(err, Err(SubtrackError::Validation(_))));

        let mut unknown = draft(10.0, "cycle-monthly");
        unknown.provider_id = Some("prov-does-not-exist".into());
        let err = complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &[unknown],
            &DefaultsConfig::default(),
            today,
        )
        .await;
        assert!(matches!(err, Err(SubtrackError::Validation(msg)) if msg.contains("prov-does-not-exist")));

        assert!(!storage.has_completed_onboarding(&user.id).await.unwrap());
        assert!(storage.user_subscriptions(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_completion_is_rejected_and_writes_nothing() {
        let (_dir, storage) = storage().await;
        let user = signed_in(&storage).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let drafts = [draft(49.99, "cycle-monthly")];

        complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &drafts,
            &DefaultsConfig::default(),
            today,
        )
        .await
        .unwrap();
        let again = complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &drafts,
            &DefaultsConfig::default(),
            today,
        )
        .await;
        assert!(matches!(again, Err(SubtrackError::Validation(msg)) if msg == ALREADY_COMPLETED_MESSAGE));

        assert!(storage.has_completed_onboarding(&user.id).await.unwrap());
        assert_eq!(storage.user_subscriptions(&user.id).await.unwrap().len(), 1);
        assert_eq!(storage.list_notifications(&user.id).await.unwrap().len(), 1);
    }
}

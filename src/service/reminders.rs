//! Renewal reminders. A sweep walks every onboarded user's active
//! subscriptions and records at most one reminder per billing date.

use crate::db::models::{NotificationPreferences, SubscriptionWithDetails};
use crate::db::{NewNotification, Storage};
use crate::error::SubtrackError;
use crate::types::NotificationType;
use crate::types::dates::days_until;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub created: usize,
}

/// Which reminder, if any, `sub` is due for on `today`.
pub fn reminder_for(
    sub: &SubscriptionWithDetails,
    prefs: &NotificationPreferences,
    today: NaiveDate,
) -> Option<(NotificationType, i64)> {
    if !sub.is_active() || !prefs.any_channel() {
        return None;
    }
    match days_until(sub.subscription.next_billing_date, today) {
        0 => Some((NotificationType::PaymentDue, 0)),
        d if d > 0 && d <= prefs.days_before => Some((NotificationType::RenewalReminder, d)),
        _ => None,
    }
}

pub async fn sweep_renewal_reminders(
    storage: &Storage,
    today: NaiveDate,
) -> Result<SweepReport, SubtrackError> {
    let mut report = SweepReport::default();

    for profile in storage.list_profiles().await? {
        let prefs = profile.notification_preferences.0;
        if !prefs.any_channel() {
            continue;
        }
        for sub in storage.active_subscriptions(&profile.id).await? {
            report.scanned += 1;
            let Some((kind, days)) = reminder_for(&sub, &prefs, today) else {
                continue;
            };
            let billing_date = sub.subscription.next_billing_date;
            if storage
                .reminder_exists(&sub.subscription.id, kind, billing_date)
                .await?
            {
                continue;
            }
            let notification = NewNotification::composed(
                &profile.id,
                Some(&sub.subscription.id),
                kind,
                &sub.subscription.name,
                Some(days),
            )
            .with_metadata(json!({
                "next_billing_date": billing_date.format("%Y-%m-%d").to_string(),
                "amount": sub.subscription.amount,
                "currency": sub.currency.code,
            }));
            storage.insert_notification(notification).await?;
            debug!(subscription_id = %sub.subscription.id, kind = kind.as_str(), "reminder queued");
            report.created += 1;
        }
    }

    Ok(report)
}

/// Run the sweep every `period` until the runtime shuts down. Expired
/// sessions are purged on the same tick.
pub fn spawn_reminder_task(storage: Storage, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            match sweep_renewal_reminders(&storage, now.date_naive()).await {
                Ok(report) => info!(
                    scanned = report.scanned,
                    created = report.created,
                    "reminder sweep finished"
                ),
                Err(e) => warn!("reminder sweep failed: {e}"),
            }
            if let Err(e) = storage.purge_expired_sessions(now).await {
                warn!("session purge failed: {e}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{IdentityClaims, NewSubscription, ProfilePatch};
    use crate::service::dashboard::fixtures::{currency, sub};
    use crate::service::onboarding::SubscriptionDraft;
    use crate::service::onboarding_flow::complete_onboarding_flow;
    use crate::types::{BillingCycleType, SubscriptionStatus};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reminder_windows() {
        let today = d(2026, 10, 19);
        let prefs = NotificationPreferences::default();
        let ron = currency("RON", "lei");
        let at = |date, status| {
            sub("Netflix", 10.0, BillingCycleType::Monthly, ron.clone(), date, status)
        };

        assert_eq!(
            reminder_for(&at(today, SubscriptionStatus::Active), &prefs, today),
            Some((NotificationType::PaymentDue, 0))
        );
        assert_eq!(
            reminder_for(&at(d(2026, 10, 22), SubscriptionStatus::Active), &prefs, today),
            Some((NotificationType::RenewalReminder, 3))
        );
        assert_eq!(reminder_for(&at(d(2026, 10, 23), SubscriptionStatus::Active), &prefs, today), None);
        assert_eq!(reminder_for(&at(d(2026, 10, 18), SubscriptionStatus::Active), &prefs, today), None);
        assert_eq!(reminder_for(&at(today, SubscriptionStatus::Paused), &prefs, today), None);

        let silent = NotificationPreferences {
            push: false,
            email: false,
            days_before: 3,
        };
        assert_eq!(reminder_for(&at(today, SubscriptionStatus::Active), &silent, today), None);
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("sweep.db").display());
        let storage = crate::db::connect(&url).await.unwrap();
        let today = d(2026, 10, 19);

        let user = storage
            .upsert_auth_user(
                &IdentityClaims {
                    provider: "google".into(),
                    subject: "sweeper".into(),
                    email: "sweeper@example.com".into(),
                    full_name: Some("Sweeper".into()),
                    avatar_url: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        complete_onboarding_flow(
            &storage,
            &user,
            &ProfilePatch::default(),
            &[] as &[SubscriptionDraft],
            &Default::default(),
            today,
        )
        .await
        .unwrap();

        for (name, next) in [("Due", today), ("Soon", d(2026, 10, 21)), ("Later", d(2026, 11, 30))] {
            storage
                .create_subscription(
                    &user.id,
                    NewSubscription {
                        provider_id: None,
                        custom_provider_name: None,
                        name: name.into(),
                        description: None,
                        amount: 9.99,
                        currency_id: "cur-ron".into(),
                        billing_cycle_id: "cycle-monthly".into(),
                        status: None,
                        start_date: None,
                        next_billing_date: next,
                        end_date: None,
                        auto_renew: None,
                        notes: None,
                    },
                    today,
                )
                .await
                .unwrap();
        }

        let first = sweep_renewal_reminders(&storage, today).await.unwrap();
        assert_eq!(first, SweepReport { scanned: 3, created: 2 });
        let second = sweep_renewal_reminders(&storage, today).await.unwrap();
        assert_eq!(second.created, 0);

        let kinds: Vec<NotificationType> = storage
            .list_notifications(&user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(kinds.iter().filter(|k| **k == NotificationType::PaymentDue).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == NotificationType::RenewalReminder).count(), 1);
    }
}

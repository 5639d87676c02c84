use crate::types::{BillingCycleType, NotificationType, SubscriptionStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Currency {
    pub id: String,
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct BillingCycle {
    pub id: String,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub cycle_type: BillingCycleType,
    pub days: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub category_id: Option<String>,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderWithCategory {
    #[serde(flatten)]
    pub provider: Provider,
    pub category: Option<Category>,
}

/// Row shape of the popular-provider catalog used by onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct PopularProvider {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub category_name: String,
    pub category_color: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub push: bool,
    pub email: bool,
    pub days_before: i64,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push: true,
            email: true,
            days_before: 3,
        }
    }
}

impl NotificationPreferences {
    pub fn any_channel(&self) -> bool {
        self.push || self.email
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub currency_id: Option<String>,
    pub timezone: String,
    pub notification_preferences: Json<NotificationPreferences>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserWithCurrency {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub currency: Option<Currency>,
}

/// Partial profile update. Nullable columns use `Option<Option<_>>`:
/// absent leaves the column alone, `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub currency_id: Option<Option<String>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub notification_preferences: Option<NotificationPreferences>,
}

impl ProfilePatch {
    /// Field-wise merge, later values win.
    pub fn merge(&mut self, other: ProfilePatch) {
        if other.full_name.is_some() {
            self.full_name = other.full_name;
        }
        if other.avatar_url.is_some() {
            self.avatar_url = other.avatar_url;
        }
        if other.currency_id.is_some() {
            self.currency_id = other.currency_id;
        }
        if other.timezone.is_some() {
            self.timezone = other.timezone;
        }
        if other.notification_preferences.is_some() {
            self.notification_preferences = other.notification_preferences;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.avatar_url.is_none()
            && self.currency_id.is_none()
            && self.timezone.is_none()
            && self.notification_preferences.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub provider_id: Option<String>,
    pub custom_provider_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency_id: String,
    pub billing_cycle_id: String,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub next_billing_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionWithDetails {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub provider: Option<Provider>,
    pub category: Option<Category>,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
}

impl SubscriptionWithDetails {
    pub fn is_active(&self) -> bool {
        self.subscription.status.is_active()
    }
}

/// Insert payload. `start_date` defaults to today, `status` to active,
/// `auto_renew` to true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSubscription {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub custom_provider_name: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub currency_id: String,
    pub billing_cycle_id: String,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub next_billing_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub auto_renew: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub provider_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub custom_provider_name: Option<Option<String>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub billing_cycle_id: Option<String>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_billing_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub auto_renew: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub subscription_id: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub metadata: Option<Json<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct FeatureFlag {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_enabled: bool,
    pub user_id: Option<String>,
    pub metadata: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity established by the OAuth sign-in, independent of the profile
/// row created at the end of onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct AuthUser {
    pub id: String,
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: DateTime<Utc>,
}

impl AuthUser {
    /// Full name from the identity provider, else the email local part.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string())
    }

    pub fn avatar_initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Identity claims handed over by the OAuth callback.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserTotals {
    pub monthly_total: f64,
    pub yearly_projection: f64,
    pub active_subscriptions: i64,
    pub next_payment_date: Option<NaiveDate>,
    pub next_payment_amount: Option<f64>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: SubscriptionPatch =
            serde_json::from_str(r#"{"notes": null, "amount": 5.5}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.amount, Some(5.5));
    }

    #[test]
    fn profile_patch_merge_keeps_earlier_fields() {
        let mut base: ProfilePatch =
            serde_json::from_str(r#"{"currency_id": "cur-ron", "timezone": "UTC"}"#).unwrap();
        base.merge(serde_json::from_str(r#"{"timezone": "Europe/Paris"}"#).unwrap());
        assert_eq!(base.currency_id, Some(Some("cur-ron".to_string())));
        assert_eq!(base.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let now = Utc::now();
        let mut user = AuthUser {
            id: "u1".into(),
            provider: "google".into(),
            subject: "123".into(),
            email: "ana.pop@example.com".into(),
            full_name: None,
            avatar_url: None,
            created_at: now,
            last_sign_in_at: now,
        };
        assert_eq!(user.display_name(), "ana.pop");
        assert_eq!(user.avatar_initial(), 'A');
        user.full_name = Some("Ioana".into());
        assert_eq!(user.display_name(), "Ioana");
    }
}

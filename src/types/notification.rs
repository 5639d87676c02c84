use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
    RenewalReminder,
    PaymentDue,
    SubscriptionCancelled,
    SubscriptionExpired,
    Welcome,
    FeatureUpdate,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RenewalReminder => "renewal_reminder",
            NotificationType::PaymentDue => "payment_due",
            NotificationType::SubscriptionCancelled => "subscription_cancelled",
            NotificationType::SubscriptionExpired => "subscription_expired",
            NotificationType::Welcome => "welcome",
            NotificationType::FeatureUpdate => "feature_update",
        }
    }

    /// Title and body shown to the user.
    pub fn compose(&self, subscription_name: &str, days_until: Option<i64>) -> (String, String) {
        match self {
            NotificationType::RenewalReminder => (
                "Subscription Renewal Reminder".to_string(),
                format!(
                    "Your {subscription_name} subscription will renew in {} days.",
                    days_until.unwrap_or_default()
                ),
            ),
            NotificationType::PaymentDue => (
                "Payment Due".to_string(),
                format!("Payment for {subscription_name} is due today."),
            ),
            NotificationType::SubscriptionCancelled => (
                "Subscription Cancelled".to_string(),
                format!("Your {subscription_name} subscription has been cancelled."),
            ),
            NotificationType::SubscriptionExpired => (
                "Subscription Expired".to_string(),
                format!("Your {subscription_name} subscription has expired."),
            ),
            NotificationType::Welcome => (
                "Welcome to Subscription Tracker!".to_string(),
                "Start tracking your subscriptions and never miss a renewal again.".to_string(),
            ),
            NotificationType::FeatureUpdate => (
                "New Feature Available".to_string(),
                "Check out the latest features in your subscription tracker.".to_string(),
            ),
        }
    }
}

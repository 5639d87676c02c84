pub mod catalog;
pub mod dashboard;
pub mod feature_flags;
pub mod google_oauth;
pub mod notifications;
pub mod onboarding;
pub mod profile;
pub mod subscriptions;

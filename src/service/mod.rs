pub mod dashboard;
pub mod onboarding;
pub mod onboarding_actor;
pub mod onboarding_flow;
pub mod reminders;

pub use onboarding::{OnboardingCommand, OnboardingState, SubscriptionDraft};
pub use onboarding_actor::OnboardingHandle;

//! First-run wizard state: a linear step tracker plus the profile and
//! subscription drafts collected along the way.

use crate::db::models::{BillingCycle, NewSubscription, ProfilePatch, ProviderWithCategory};
use crate::error::SubtrackError;
use crate::types::dates::first_of_next_month;
use crate::types::{SubscriptionStatus, convert_to_monthly};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Route name to step index. Unknown routes map to the first step.
pub const STEP_ROUTES: [(&str, usize); 5] = [
    ("index", 0),
    ("profile", 1),
    ("providers", 2),
    ("setup", 3),
    ("complete", 4),
];

const STEPS: [(&str, &str, &str); 5] = [
    ("welcome", "Welcome", "Let's get you started"),
    ("profile", "Profile Setup", "Set your preferences"),
    ("providers", "Select Providers", "Choose your subscriptions"),
    ("setup", "Quick Setup", "Add subscription details"),
    ("complete", "Complete", "You're all set!"),
];

pub const MISSING_AMOUNT_MESSAGE: &str =
    "Please enter the monthly cost for all selected providers.";

pub fn step_index_for_route(route: &str) -> usize {
    STEP_ROUTES
        .iter()
        .find(|(name, _)| *name == route)
        .map(|(_, index)| *index)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// A subscription assembled during onboarding, persisted only on completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionDraft {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub custom_provider_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub billing_cycle_id: Option<String>,
    pub start_date: NaiveDate,
    pub next_billing_date: NaiveDate,
    #[serde(default = "default_true")]
    pub auto_renew: bool,
}

fn default_true() -> bool {
    true
}

impl SubscriptionDraft {
    pub fn for_provider(
        provider: &ProviderWithCategory,
        currency_id: Option<&str>,
        cycle_id: Option<&str>,
        today: NaiveDate,
    ) -> Self {
        Self {
            provider_id: Some(provider.provider.id.clone()),
            custom_provider_name: Some(provider.provider.name.clone()),
            name: provider.provider.name.clone(),
            description: provider.provider.description.clone(),
            amount: 0.0,
            currency_id: currency_id.map(str::to_string),
            billing_cycle_id: cycle_id.map(str::to_string),
            start_date: today,
            next_billing_date: first_of_next_month(today),
            auto_renew: true,
        }
    }

    /// Convert into an insert payload, filling a missing currency from `fallback_currency`.
    pub fn into_new_subscription(
        self,
        fallback_currency: &str,
    ) -> Result<NewSubscription, SubtrackError> {
        let billing_cycle_id = self
            .billing_cycle_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SubtrackError::Validation(format!("{} has no billing cycle", self.name))
            })?;
        Ok(NewSubscription {
            provider_id: self.provider_id,
            custom_provider_name: self.custom_provider_name,
            name: self.name,
            description: self.description,
            amount: self.amount,
            currency_id: self
                .currency_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| fallback_currency.to_string()),
            billing_cycle_id,
            status: Some(SubscriptionStatus::Active),
            start_date: Some(self.start_date),
            next_billing_date: self.next_billing_date,
            end_date: None,
            auto_renew: Some(self.auto_renew),
            notes: None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DraftPatch {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub billing_cycle_id: Option<String>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub next_billing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingState {
    pub current_step: usize,
    pub total_steps: usize,
    pub steps: Vec<OnboardingStep>,
    pub profile_data: ProfilePatch,
    pub selected_providers: Vec<ProviderWithCategory>,
    pub subscriptions: Vec<SubscriptionDraft>,
    pub is_completed: bool,
}

impl Default for OnboardingState {
    fn default() -> Self {
        let steps: Vec<OnboardingStep> = STEPS
            .iter()
            .map(|(id, title, description)| OnboardingStep {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                completed: false,
            })
            .collect();
        Self {
            current_step: 0,
            total_steps: steps.len(),
            steps,
            profile_data: ProfilePatch::default(),
            selected_providers: Vec::new(),
            subscriptions: Vec::new(),
            is_completed: false,
        }
    }
}

impl OnboardingState {
    fn last_index(&self) -> usize {
        self.total_steps.saturating_sub(1)
    }

    pub fn current_route(&self) -> &'static str {
        STEP_ROUTES
            .iter()
            .find(|(_, index)| *index == self.current_step)
            .map(|(name, _)| *name)
            .unwrap_or("index")
    }

    pub fn next_step(&mut self) {
        if let Some(step) = self.steps.get_mut(self.current_step) {
            step.completed = true;
        }
        self.current_step = (self.current_step + 1).min(self.last_index());
    }

    pub fn previous_step(&mut self) {
        self.current_step = self.current_step.saturating_sub(1);
    }

    pub fn go_to_step(&mut self, index: i64) {
        self.current_step = index.clamp(0, self.last_index() as i64) as usize;
    }

    pub fn set_step_by_route(&mut self, route: &str) {
        self.go_to_step(step_index_for_route(route) as i64);
    }

    pub fn update_profile_data(&mut self, patch: ProfilePatch) {
        self.profile_data.merge(patch);
    }

    pub fn update_selected_providers(&mut self, providers: Vec<ProviderWithCategory>) {
        self.selected_providers = providers;
    }

    pub fn update_subscriptions(&mut self, drafts: Vec<SubscriptionDraft>) {
        self.subscriptions = drafts;
    }

    pub fn update_draft(
        &mut self,
        index: usize,
        patch: DraftPatch,
    ) -> Result<&SubscriptionDraft, SubtrackError> {
        let draft = self
            .subscriptions
            .get_mut(index)
            .ok_or(SubtrackError::NotFound("subscription draft"))?;
        if let Some(amount) = patch.amount {
            draft.amount = amount;
        }
        if let Some(cycle) = patch.billing_cycle_id {
            draft.billing_cycle_id = Some(cycle);
        }
        if let Some(currency) = patch.currency_id {
            draft.currency_id = Some(currency);
        }
        if let Some(date) = patch.next_billing_date {
            draft.next_billing_date = date;
        }
        Ok(draft)
    }

    /// Currency chosen in the profile step, if any.
    pub fn profile_currency(&self) -> Option<&str> {
        self.profile_data
            .currency_id
            .as_ref()
            .and_then(|c| c.as_deref())
    }

    pub fn complete(&mut self) {
        self.is_completed = true;
        for step in &mut self.steps {
            step.completed = true;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One draft per selected provider. Drafts already present for a provider
/// are carried over unchanged.
pub fn drafts_for_providers(
    providers: &[ProviderWithCategory],
    existing: &[SubscriptionDraft],
    currency_id: Option<&str>,
    monthly_cycle_id: Option<&str>,
    today: NaiveDate,
) -> Vec<SubscriptionDraft> {
    providers
        .iter()
        .map(|provider| {
            existing
                .iter()
                .find(|d| d.provider_id.as_deref() == Some(provider.provider.id.as_str()))
                .cloned()
                .unwrap_or_else(|| {
                    SubscriptionDraft::for_provider(provider, currency_id, monthly_cycle_id, today)
                })
        })
        .collect()
}

pub fn validate_drafts(drafts: &[SubscriptionDraft]) -> Result<(), SubtrackError> {
    if drafts.iter().any(|d| !(d.amount > 0.0)) {
        return Err(SubtrackError::Validation(MISSING_AMOUNT_MESSAGE.to_string()));
    }
    if let Some(d) = drafts
        .iter()
        .find(|d| d.billing_cycle_id.as_deref().is_none_or(str::is_empty))
    {
        return Err(SubtrackError::Validation(format!(
            "{} has no billing cycle",
            d.name
        )));
    }
    Ok(())
}

/// Preview of the monthly spend the drafts add up to.
pub fn onboarding_monthly_total(drafts: &[SubscriptionDraft], cycles: &[BillingCycle]) -> f64 {
    drafts
        .iter()
        .filter(|d| d.amount > 0.0)
        .filter_map(|d| {
            let cycle_id = d.billing_cycle_id.as_deref()?;
            let cycle = cycles.iter().find(|c| c.id == cycle_id)?;
            Some(convert_to_monthly(d.amount, cycle.cycle_type))
        })
        .sum()
}

/// A single mutation of the wizard state.
#[derive(Debug, Clone)]
pub enum OnboardingCommand {
    Next,
    Previous,
    GoTo(i64),
    Route(String),
    UpdateProfile(ProfilePatch),
    SelectProviders {
        providers: Vec<ProviderWithCategory>,
        default_currency_id: Option<String>,
        monthly_cycle_id: Option<String>,
        today: NaiveDate,
    },
    SetDrafts(Vec<SubscriptionDraft>),
    UpdateDraft(usize, DraftPatch),
    Complete,
}

impl OnboardingCommand {
    /// Apply to `state`. On error the state is left untouched.
    pub fn apply(self, state: &mut OnboardingState) -> Result<(), SubtrackError> {
        match self {
            OnboardingCommand::Next => state.next_step(),
            OnboardingCommand::Previous => state.previous_step(),
            OnboardingCommand::GoTo(index) => state.go_to_step(index),
            OnboardingCommand::Route(route) => state.set_step_by_route(&route),
            OnboardingCommand::UpdateProfile(patch) => state.update_profile_data(patch),
            OnboardingCommand::SelectProviders {
                providers,
                default_currency_id,
                monthly_cycle_id,
                today,
            } => {
                let currency = state
                    .profile_currency()
                    .map(str::to_string)
                    .or(default_currency_id);
                let drafts = drafts_for_providers(
                    &providers,
                    &state.subscriptions,
                    currency.as_deref(),
                    monthly_cycle_id.as_deref(),
                    today,
                );
                state.update_selected_providers(providers);
                state.update_subscriptions(drafts);
            }
            OnboardingCommand::SetDrafts(drafts) => state.update_subscriptions(drafts),
            OnboardingCommand::UpdateDraft(index, patch) => {
                state.update_draft(index, patch)?;
            }
            OnboardingCommand::Complete => state.complete(),
        }
        Ok(())
    }
}

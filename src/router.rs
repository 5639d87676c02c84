use crate::config::Config;
use crate::db::Storage;
use crate::error::SubtrackError;
use crate::google_oauth::GoogleOauthService;
use crate::handlers::{
    catalog, dashboard, feature_flags, google_oauth, notifications, onboarding, profile,
    subscriptions,
};
use crate::service::OnboardingHandle;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, patch, post, put},
};
use axum_extra::extract::cookie::Key;
use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

const BODY_LIMIT: usize = 256 * 1024;

#[derive(Clone)]
pub struct SubtrackState {
    pub storage: Storage,
    pub config: Arc<Config>,
    pub oauth: GoogleOauthService,
    pub onboarding: OnboardingHandle,
    key: Key,
}

impl SubtrackState {
    pub fn new(
        storage: Storage,
        config: Config,
        onboarding: OnboardingHandle,
    ) -> Result<Self, SubtrackError> {
        let oauth = GoogleOauthService::new(&config.oauth)?;
        let key = cookie_key(&config.basic.cookie_secret);
        Ok(Self {
            storage,
            config: Arc::new(config),
            oauth,
            onboarding,
            key,
        })
    }

    /// Calendar day used for all date arithmetic of a request.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

impl FromRef<SubtrackState> for Key {
    fn from_ref(state: &SubtrackState) -> Self {
        state.key.clone()
    }
}

fn cookie_key(secret: &str) -> Key {
    match Key::try_from(secret.as_bytes()) {
        Ok(key) => key,
        Err(_) => {
            if !secret.is_empty() {
                warn!("cookie_secret shorter than 64 bytes, using a random key");
            }
            Key::generate()
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn subtrack_router(state: SubtrackState) -> Router {
    let auth_routes = Router::new()
        .route("/google", get(google_oauth::google_oauth_entry))
        .route("/callback", get(google_oauth::google_oauth_callback))
        .route("/me", get(google_oauth::me))
        .route("/logout", post(google_oauth::logout));

    let catalog_routes = Router::new()
        .route("/currencies", get(catalog::list_currencies))
        .route("/currencies/default", get(catalog::default_currency))
        .route("/currencies/code/{code}", get(catalog::currency_by_code))
        .route("/currencies/{id}", get(catalog::currency_by_id))
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{id}", get(catalog::category_by_id))
        .route("/billing-cycles", get(catalog::list_billing_cycles))
        .route("/billing-cycles/default", get(catalog::default_billing_cycle))
        .route("/billing-cycles/type/{kind}", get(catalog::billing_cycle_by_type))
        .route("/billing-cycles/{id}", get(catalog::billing_cycle_by_id))
        .route("/providers", get(catalog::list_providers))
        .route("/providers/popular", get(catalog::popular_providers))
        .route("/providers/{id}", get(catalog::provider_by_id));

    let onboarding_routes = Router::new()
        .route("/", get(onboarding::state))
        .route("/status", get(onboarding::status))
        .route("/next", post(onboarding::next))
        .route("/previous", post(onboarding::previous))
        .route("/goto", post(onboarding::go_to))
        .route("/route", post(onboarding::route))
        .route("/profile", put(onboarding::update_profile))
        .route("/providers", put(onboarding::select_providers))
        .route("/subscriptions", put(onboarding::set_drafts))
        .route("/subscriptions/{index}", patch(onboarding::update_draft))
        .route("/preview", get(onboarding::preview))
        .route("/complete", post(onboarding::complete))
        .route("/reset", post(onboarding::reset));

    let profile_routes = Router::new()
        .route("/", get(profile::get_profile).patch(profile::update_profile))
        .route(
            "/notification-preferences",
            get(profile::notification_preferences).put(profile::set_notification_preferences),
        )
        .route("/currency", put(profile::set_currency));

    let subscription_routes = Router::new()
        .route(
            "/",
            get(subscriptions::list).post(subscriptions::create),
        )
        .route("/upcoming", get(subscriptions::upcoming))
        .route("/totals", get(subscriptions::totals))
        .route(
            "/{id}",
            get(subscriptions::get_one)
                .patch(subscriptions::update)
                .delete(subscriptions::remove),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .merge(catalog_routes)
        .nest("/onboarding", onboarding_routes)
        .nest("/profile", profile_routes)
        .nest("/subscriptions", subscription_routes)
        .route("/dashboard", get(dashboard::summary))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/feature-flags", get(feature_flags::list))
        .route("/feature-flags/{name}", get(feature_flags::get_one))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

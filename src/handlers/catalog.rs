//! Public, read-only catalog endpoints.

use crate::db::models::{
    BillingCycle, Category, Currency, PopularProvider, ProviderWithCategory,
};
use crate::error::SubtrackError;
use crate::router::SubtrackState;
use crate::types::BillingCycleType;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

pub async fn list_currencies(
    State(state): State<SubtrackState>,
) -> Result<Json<Vec<Currency>>, SubtrackError> {
    Ok(Json(state.storage.list_currencies().await?))
}

pub async fn default_currency(
    State(state): State<SubtrackState>,
) -> Result<Json<Currency>, SubtrackError> {
    state
        .storage
        .default_currency(&state.config.defaults.currency_code)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("currency"))
}

pub async fn currency_by_code(
    State(state): State<SubtrackState>,
    Path(code): Path<String>,
) -> Result<Json<Currency>, SubtrackError> {
    state
        .storage
        .currency_by_code(&code)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("currency"))
}

pub async fn currency_by_id(
    State(state): State<SubtrackState>,
    Path(id): Path<String>,
) -> Result<Json<Currency>, SubtrackError> {
    state
        .storage
        .currency_by_id(&id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("currency"))
}

pub async fn list_categories(
    State(state): State<SubtrackState>,
) -> Result<Json<Vec<Category>>, SubtrackError> {
    Ok(Json(state.storage.list_categories().await?))
}

pub async fn category_by_id(
    State(state): State<SubtrackState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, SubtrackError> {
    state
        .storage
        .category_by_id(&id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("category"))
}

pub async fn list_billing_cycles(
    State(state): State<SubtrackState>,
) -> Result<Json<Vec<BillingCycle>>, SubtrackError> {
    Ok(Json(state.storage.list_billing_cycles().await?))
}

pub async fn default_billing_cycle(
    State(state): State<SubtrackState>,
) -> Result<Json<BillingCycle>, SubtrackError> {
    state
        .storage
        .default_billing_cycle()
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("billing cycle"))
}

pub async fn billing_cycle_by_type(
    State(state): State<SubtrackState>,
    Path(kind): Path<String>,
) -> Result<Json<BillingCycle>, SubtrackError> {
    let kind: BillingCycleType = kind.parse()?;
    state
        .storage
        .billing_cycle_by_type(kind)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("billing cycle"))
}

pub async fn billing_cycle_by_id(
    State(state): State<SubtrackState>,
    Path(id): Path<String>,
) -> Result<Json<BillingCycle>, SubtrackError> {
    state
        .storage
        .billing_cycle_by_id(&id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("billing cycle"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderQuery {
    pub category_id: Option<String>,
    pub q: Option<String>,
}

/// `?q=` searches by name, `?category_id=` filters; without either the
/// whole active catalog is returned.
pub async fn list_providers(
    State(state): State<SubtrackState>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<Vec<ProviderWithCategory>>, SubtrackError> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let providers = match (q, query.category_id.as_deref()) {
        (Some(q), category) => {
            let mut found = state.storage.search_providers(q).await?;
            if let Some(category) = category {
                found.retain(|p| p.provider.category_id.as_deref() == Some(category));
            }
            found
        }
        (None, Some(category)) => state.storage.providers_by_category(category).await?,
        (None, None) => state.storage.list_providers().await?,
    };
    Ok(Json(providers))
}

pub async fn popular_providers(
    State(state): State<SubtrackState>,
) -> Result<Json<Vec<PopularProvider>>, SubtrackError> {
    Ok(Json(state.storage.popular_providers().await?))
}

pub async fn provider_by_id(
    State(state): State<SubtrackState>,
    Path(id): Path<String>,
) -> Result<Json<ProviderWithCategory>, SubtrackError> {
    state
        .storage
        .provider_by_id(&id)
        .await?
        .map(Json)
        .ok_or(SubtrackError::NotFound("provider"))
}

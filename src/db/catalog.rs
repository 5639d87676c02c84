//! Read-only catalog: currencies, categories, billing cycles, providers.

use super::Storage;
use crate::db::models::{
    BillingCycle, Category, Currency, PopularProvider, Provider, ProviderWithCategory,
};
use crate::error::SubtrackError;
use crate::types::BillingCycleType;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

const SEARCH_LIMIT: i64 = 20;

const CURRENCY_COLUMNS: &str = "SELECT id, code, name, symbol, is_active, created_at FROM currencies";
const CATEGORY_COLUMNS: &str =
    "SELECT id, name, description, icon, color, is_active, created_at FROM categories";
const BILLING_CYCLE_COLUMNS: &str =
    "SELECT id, name, type, days, is_active, created_at FROM billing_cycles";

const PROVIDER_WITH_CATEGORY: &str = r#"
    SELECT p.id, p.name, p.description, p.website_url, p.logo_url, p.category_id,
           p.is_popular, p.is_active, p.created_at, p.updated_at,
           c.id AS c_id, c.name AS c_name, c.description AS c_description, c.icon AS c_icon,
           c.color AS c_color, c.is_active AS c_is_active, c.created_at AS c_created_at
    FROM subscription_providers p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

impl Storage {
    pub async fn list_currencies(&self) -> Result<Vec<Currency>, SubtrackError> {
        let rows = sqlx::query_as::<_, Currency>(&format!(
            "{CURRENCY_COLUMNS} WHERE is_active = 1 ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn currency_by_code(&self, code: &str) -> Result<Option<Currency>, SubtrackError> {
        let row = sqlx::query_as::<_, Currency>(&format!(
            "{CURRENCY_COLUMNS} WHERE code = ? AND is_active = 1"
        ))
        .bind(code.trim().to_ascii_uppercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn currency_by_id(&self, id: &str) -> Result<Option<Currency>, SubtrackError> {
        let row = sqlx::query_as::<_, Currency>(&format!("{CURRENCY_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// The configured default currency (RON unless overridden).
    pub async fn default_currency(&self, code: &str) -> Result<Option<Currency>, SubtrackError> {
        self.currency_by_code(code).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, SubtrackError> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_COLUMNS} WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn category_by_id(&self, id: &str) -> Result<Option<Category>, SubtrackError> {
        let row = sqlx::query_as::<_, Category>(&format!("{CATEGORY_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_billing_cycles(&self) -> Result<Vec<BillingCycle>, SubtrackError> {
        let rows = sqlx::query_as::<_, BillingCycle>(&format!(
            "{BILLING_CYCLE_COLUMNS} WHERE is_active = 1 ORDER BY days"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn billing_cycle_by_id(&self, id: &str) -> Result<Option<BillingCycle>, SubtrackError> {
        let row = sqlx::query_as::<_, BillingCycle>(&format!("{BILLING_CYCLE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn billing_cycle_by_type(
        &self,
        cycle_type: BillingCycleType,
    ) -> Result<Option<BillingCycle>, SubtrackError> {
        let row = sqlx::query_as::<_, BillingCycle>(&format!(
            "{BILLING_CYCLE_COLUMNS} WHERE type = ? AND is_active = 1 ORDER BY days LIMIT 1"
        ))
        .bind(cycle_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn default_billing_cycle(&self) -> Result<Option<BillingCycle>, SubtrackError> {
        self.billing_cycle_by_type(BillingCycleType::Monthly).await
    }

    pub async fn list_providers(&self) -> Result<Vec<ProviderWithCategory>, SubtrackError> {
        let rows = sqlx::query(&format!(
            "{PROVIDER_WITH_CATEGORY} WHERE p.is_active = 1 ORDER BY p.name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(provider_with_category_from_row).collect()
    }

    pub async fn providers_by_category(
        &self,
        category_id: &str,
    ) -> Result<Vec<ProviderWithCategory>, SubtrackError> {
        let rows = sqlx::query(&format!(
            "{PROVIDER_WITH_CATEGORY} WHERE p.category_id = ? AND p.is_active = 1 ORDER BY p.name"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(provider_with_category_from_row).collect()
    }

    /// Case-insensitive substring match on the provider name, at most 20 rows.
    pub async fn search_providers(
        &self,
        query: &str,
    ) -> Result<Vec<ProviderWithCategory>, SubtrackError> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let rows = sqlx::query(&format!(
            r"{PROVIDER_WITH_CATEGORY} WHERE p.name LIKE ? ESCAPE '\' AND p.is_active = 1 ORDER BY p.name LIMIT ?"
        ))
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(provider_with_category_from_row).collect()
    }

    pub async fn provider_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ProviderWithCategory>, SubtrackError> {
        let row = sqlx::query(&format!("{PROVIDER_WITH_CATEGORY} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(provider_with_category_from_row).transpose()
    }

    pub async fn providers_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<ProviderWithCategory>, SubtrackError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match self.provider_by_id(id).await? {
                Some(p) if p.provider.is_active => found.push(p),
                _ => return Err(SubtrackError::NotFound("provider")),
            }
        }
        Ok(found)
    }

    pub async fn popular_providers(&self) -> Result<Vec<PopularProvider>, SubtrackError> {
        let rows = sqlx::query_as::<_, PopularProvider>(
            r#"SELECT p.id, p.name, p.description, p.website_url,
                      COALESCE(c.name, 'Other') AS category_name, c.color AS category_color
               FROM subscription_providers p
               LEFT JOIN categories c ON c.id = p.category_id
               WHERE p.is_popular = 1 AND p.is_active = 1
               ORDER BY p.name"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub(super) fn provider_with_category_from_row(
    row: &SqliteRow,
) -> Result<ProviderWithCategory, SubtrackError> {
    let provider = Provider::from_row(row)?;
    let category = category_from_prefixed(row, "c_")?;
    Ok(ProviderWithCategory { provider, category })
}

/// Category columns selected under a prefix by a LEFT JOIN; `None` when the
/// join found nothing.
pub(super) fn category_from_prefixed(
    row: &SqliteRow,
    prefix: &str,
) -> Result<Option<Category>, SubtrackError> {
    let col = |name: &str| format!("{prefix}{name}");
    let Some(id) = row.try_get::<Option<String>, _>(col("id").as_str())? else {
        return Ok(None);
    };
    Ok(Some(Category {
        id,
        name: row.try_get(col("name").as_str())?,
        description: row.try_get(col("description").as_str())?,
        icon: row.try_get(col("icon").as_str())?,
        color: row.try_get(col("color").as_str())?,
        is_active: row.try_get(col("is_active").as_str())?,
        created_at: row.try_get::<DateTime<Utc>, _>(col("created_at").as_str())?,
    }))
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_off"), r"100\%\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}

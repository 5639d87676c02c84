use super::Storage;
use crate::db::models::FeatureFlag;
use crate::error::SubtrackError;
use std::collections::BTreeMap;

impl Storage {
    /// Global flags overlaid with the user's own rows of the same name,
    /// ordered by name.
    pub async fn feature_flags_for(&self, user_id: &str) -> Result<Vec<FeatureFlag>, SubtrackError> {
        let rows = sqlx::query_as::<_, FeatureFlag>(
            r#"SELECT id, name, description, is_enabled, user_id, metadata, created_at, updated_at
               FROM feature_flags
               WHERE user_id IS NULL OR user_id = ?
               ORDER BY name, user_id IS NOT NULL"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // global rows sort first within a name, so the user row lands last and wins
        let merged: BTreeMap<String, FeatureFlag> = rows
            .into_iter()
            .map(|flag| (flag.name.clone(), flag))
            .collect();
        Ok(merged.into_values().collect())
    }

    /// Unknown flags are disabled.
    pub async fn flag_enabled(&self, user_id: &str, name: &str) -> Result<bool, SubtrackError> {
        Ok(self
            .feature_flags_for(user_id)
            .await?
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| f.is_enabled)
            .unwrap_or(false))
    }
}

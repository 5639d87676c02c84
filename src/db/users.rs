use super::Storage;
use crate::db::models::{NotificationPreferences, ProfilePatch, UserProfile, UserWithCurrency};
use crate::error::SubtrackError;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const PROFILE_COLUMNS: &str = r#"SELECT id, email, full_name, avatar_url, currency_id, timezone,
    notification_preferences, onboarding_completed, created_at, updated_at FROM users"#;

impl Storage {
    pub async fn user_profile(&self, id: &str) -> Result<Option<UserWithCurrency>, SubtrackError> {
        let Some(profile) = self.profile_row(id).await? else {
            return Ok(None);
        };
        let currency = match profile.currency_id.as_deref() {
            Some(currency_id) => self.currency_by_id(currency_id).await?,
            None => None,
        };
        Ok(Some(UserWithCurrency { profile, currency }))
    }

    pub async fn profile_row(&self, id: &str) -> Result<Option<UserProfile>, SubtrackError> {
        let row = sqlx::query_as::<_, UserProfile>(&format!("{PROFILE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, SubtrackError> {
        let rows = sqlx::query_as::<_, UserProfile>(&format!(
            "{PROFILE_COLUMNS} WHERE onboarding_completed = 1 ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert or replace the editable profile columns keyed by `id`.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), SubtrackError> {
        let mut conn = self.pool.acquire().await?;
        upsert_profile_on(&mut conn, profile).await
    }

    /// Apply a partial update. `None` when the profile does not exist.
    pub async fn update_profile(
        &self,
        id: &str,
        patch: ProfilePatch,
    ) -> Result<Option<UserProfile>, SubtrackError> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(full_name) = patch.full_name {
            qb.push(", full_name = ").push_bind(full_name);
        }
        if let Some(avatar_url) = patch.avatar_url {
            qb.push(", avatar_url = ").push_bind(avatar_url);
        }
        if let Some(currency_id) = patch.currency_id {
            qb.push(", currency_id = ").push_bind(currency_id);
        }
        if let Some(timezone) = patch.timezone {
            qb.push(", timezone = ").push_bind(timezone);
        }
        if let Some(prefs) = patch.notification_preferences {
            qb.push(", notification_preferences = ").push_bind(Json(prefs));
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let res = qb.build().execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.profile_row(id).await
    }

    pub async fn notification_preferences(
        &self,
        id: &str,
    ) -> Result<Option<NotificationPreferences>, SubtrackError> {
        Ok(self
            .profile_row(id)
            .await?
            .map(|p| p.notification_preferences.0))
    }

    pub async fn set_notification_preferences(
        &self,
        id: &str,
        prefs: NotificationPreferences,
    ) -> Result<Option<UserProfile>, SubtrackError> {
        let patch = ProfilePatch {
            notification_preferences: Some(prefs),
            ..Default::default()
        };
        self.update_profile(id, patch).await
    }

    pub async fn set_default_currency(
        &self,
        id: &str,
        currency_id: &str,
    ) -> Result<Option<UserProfile>, SubtrackError> {
        let patch = ProfilePatch {
            currency_id: Some(Some(currency_id.to_string())),
            ..Default::default()
        };
        self.update_profile(id, patch).await
    }

    pub async fn has_completed_onboarding(&self, id: &str) -> Result<bool, SubtrackError> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT onboarding_completed FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0).unwrap_or(false))
    }
}

pub(crate) async fn upsert_profile_on(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
) -> Result<(), SubtrackError> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, email, full_name, avatar_url, currency_id, timezone,
            notification_preferences, onboarding_completed, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            full_name = excluded.full_name,
            avatar_url = excluded.avatar_url,
            currency_id = excluded.currency_id,
            timezone = excluded.timezone,
            notification_preferences = excluded.notification_preferences,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.email)
    .bind(&profile.full_name)
    .bind(&profile.avatar_url)
    .bind(&profile.currency_id)
    .bind(&profile.timezone)
    .bind(&profile.notification_preferences)
    .bind(profile.onboarding_completed)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Flip the completion flag. Returns `false` when the profile was already
/// completed (or is missing), so only one caller can ever win.
pub(crate) async fn mark_onboarding_completed_on(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<bool, SubtrackError> {
    let result = sqlx::query(
        "UPDATE users SET onboarding_completed = 1, updated_at = ? \
         WHERE id = ? AND onboarding_completed = 0",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::IdentityClaims;

    async fn storage_with_profile() -> (tempfile::TempDir, Storage, UserProfile) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("users.db").display());
        let storage = crate::db::connect(&url).await.unwrap();
        let now = Utc::now();
        let user = storage
            .upsert_auth_user(
                &IdentityClaims {
                    provider: "google".into(),
                    subject: "u-1".into(),
                    email: "ioana@example.com".into(),
                    full_name: None,
                    avatar_url: None,
                },
                now,
            )
            .await
            .unwrap();
        let profile = UserProfile {
            id: user.id,
            email: user.email,
            full_name: Some("Ioana".into()),
            avatar_url: None,
            currency_id: Some("cur-ron".into()),
            timezone: "Europe/Bucharest".into(),
            notification_preferences: Json(NotificationPreferences::default()),
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        };
        storage.upsert_profile(&profile).await.unwrap();
        (dir, storage, profile)
    }

    #[tokio::test]
    async fn completion_flag_is_claimed_once() {
        let (_dir, storage, profile) = storage_with_profile().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        assert!(mark_onboarding_completed_on(&mut conn, &profile.id).await.unwrap());
        assert!(!mark_onboarding_completed_on(&mut conn, &profile.id).await.unwrap());
        assert!(!mark_onboarding_completed_on(&mut conn, "nobody").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_never_clears_completion() {
        let (_dir, storage, profile) = storage_with_profile().await;
        let mut conn = storage.pool().acquire().await.unwrap();
        mark_onboarding_completed_on(&mut conn, &profile.id).await.unwrap();
        drop(conn);

        let renamed = UserProfile {
            full_name: Some("Ioana P.".into()),
            ..profile.clone()
        };
        storage.upsert_profile(&renamed).await.unwrap();

        let stored = storage.profile_row(&profile.id).await.unwrap().unwrap();
        assert_eq!(stored.full_name.as_deref(), Some("Ioana P."));
        assert!(stored.onboarding_completed);
    }
}

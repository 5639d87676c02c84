use super::Storage;
use crate::db::models::{AuthUser, IdentityClaims, Session};
use crate::error::SubtrackError;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const AUTH_USER_COLUMNS: &str = r#"SELECT id, provider, subject, email, full_name, avatar_url,
    created_at, last_sign_in_at FROM auth_users"#;

impl Storage {
    /// Upsert by (provider, subject); the stored row is refreshed with the
    /// latest claims on every sign-in.
    pub async fn upsert_auth_user(
        &self,
        claims: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> Result<AuthUser, SubtrackError> {
        sqlx::query(
            r#"
            INSERT INTO auth_users (
                id, provider, subject, email, full_name, avatar_url, created_at, last_sign_in_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(provider, subject) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                avatar_url = excluded.avatar_url,
                last_sign_in_at = excluded.last_sign_in_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&claims.provider)
        .bind(&claims.subject)
        .bind(&claims.email)
        .bind(&claims.full_name)
        .bind(&claims.avatar_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, AuthUser>(&format!(
            "{AUTH_USER_COLUMNS} WHERE provider = ? AND subject = ?"
        ))
        .bind(&claims.provider)
        .bind(&claims.subject)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn auth_user_by_id(&self, id: &str) -> Result<Option<AuthUser>, SubtrackError> {
        let row = sqlx::query_as::<_, AuthUser>(&format!("{AUTH_USER_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        token: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Session, SubtrackError> {
        let session = Session {
            token,
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(session)
    }

    /// Resolve a session token to its user. Expired sessions are removed and
    /// resolve to `None`.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthUser>, SubtrackError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        let Some(session) = session else {
            return Ok(None);
        };
        if session.expires_at <= now {
            self.delete_session(token).await?;
            return Ok(None);
        }
        self.auth_user_by_id(&session.user_id).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool, SubtrackError> {
        let res = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, SubtrackError> {
        let res = sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) <= julianday(?)")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

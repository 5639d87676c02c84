use super::Storage;
use crate::db::models::Notification;
use crate::error::SubtrackError;
use crate::types::NotificationType;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::SqliteConnection;
use sqlx::types::Json;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = r#"SELECT id, user_id, subscription_id, type, title, message,
    sent_at, read_at, metadata FROM notifications"#;

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub subscription_id: Option<String>,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub metadata: Option<Value>,
}

impl NewNotification {
    /// Build a notification whose text comes from [`NotificationType::compose`].
    pub fn composed(
        user_id: &str,
        subscription_id: Option<&str>,
        kind: NotificationType,
        subscription_name: &str,
        days_until: Option<i64>,
    ) -> Self {
        let (title, message) = kind.compose(subscription_name, days_until);
        Self {
            user_id: user_id.to_string(),
            subscription_id: subscription_id.map(str::to_string),
            kind,
            title,
            message,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl Storage {
    /// Newest first.
    pub async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, SubtrackError> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            "{NOTIFICATION_COLUMNS} WHERE user_id = ? ORDER BY sent_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_notification(
        &self,
        new: NewNotification,
    ) -> Result<Notification, SubtrackError> {
        let mut conn = self.pool.acquire().await?;
        insert_notification_on(&mut conn, new, Utc::now()).await
    }

    /// Sets `read_at` once; re-reading keeps the first timestamp.
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, SubtrackError> {
        let res = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, ?) WHERE id = ? AND user_id = ?",
        )
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, Notification>(&format!(
            "{NOTIFICATION_COLUMNS} WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Whether a reminder of `kind` was already sent for this billing date.
    pub async fn reminder_exists(
        &self,
        subscription_id: &str,
        kind: NotificationType,
        billing_date: NaiveDate,
    ) -> Result<bool, SubtrackError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM notifications
               WHERE subscription_id = ? AND type = ?
                 AND json_extract(metadata, '$.next_billing_date') = ?"#,
        )
        .bind(subscription_id)
        .bind(kind)
        .bind(billing_date.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

pub(crate) async fn insert_notification_on(
    conn: &mut SqliteConnection,
    new: NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification, SubtrackError> {
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        user_id: new.user_id,
        subscription_id: new.subscription_id,
        kind: new.kind,
        title: new.title,
        message: new.message,
        sent_at: now,
        read_at: None,
        metadata: new.metadata.map(Json),
    };
    sqlx::query(
        r#"INSERT INTO notifications (
            id, user_id, subscription_id, type, title, message, sent_at, read_at, metadata
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&notification.id)
    .bind(&notification.user_id)
    .bind(&notification.subscription_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.sent_at)
    .bind(notification.read_at)
    .bind(&notification.metadata)
    .execute(&mut *conn)
    .await?;
    Ok(notification)
}

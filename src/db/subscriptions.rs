use super::Storage;
use super::catalog::category_from_prefixed;
use crate::db::models::{
    BillingCycle, Currency, NewSubscription, Provider, Subscription, SubscriptionPatch,
    SubscriptionWithDetails,
};
use crate::error::SubtrackError;
use crate::types::SubscriptionStatus;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = r#"SELECT id, user_id, provider_id, custom_provider_name, name,
    description, amount, currency_id, billing_cycle_id, status, start_date, next_billing_date,
    end_date, auto_renew, notes, created_at, updated_at FROM subscriptions"#;

const SUBSCRIPTION_WITH_DETAILS: &str = r#"
    SELECT s.id, s.user_id, s.provider_id, s.custom_provider_name, s.name, s.description,
           s.amount, s.currency_id, s.billing_cycle_id, s.status, s.start_date,
           s.next_billing_date, s.end_date, s.auto_renew, s.notes, s.created_at, s.updated_at,
           p.id AS p_id, p.name AS p_name, p.description AS p_description,
           p.website_url AS p_website_url, p.logo_url AS p_logo_url,
           p.category_id AS p_category_id, p.is_popular AS p_is_popular,
           p.is_active AS p_is_active, p.created_at AS p_created_at,
           p.updated_at AS p_updated_at,
           c.id AS c_id, c.name AS c_name, c.description AS c_description, c.icon AS c_icon,
           c.color AS c_color, c.is_active AS c_is_active, c.created_at AS c_created_at,
           cur.id AS cur_id, cur.code AS cur_code, cur.name AS cur_name,
           cur.symbol AS cur_symbol, cur.is_active AS cur_is_active,
           cur.created_at AS cur_created_at,
           bc.id AS bc_id, bc.name AS bc_name, bc.type AS bc_type, bc.days AS bc_days,
           bc.is_active AS bc_is_active, bc.created_at AS bc_created_at
    FROM subscriptions s
    LEFT JOIN subscription_providers p ON p.id = s.provider_id
    LEFT JOIN categories c ON c.id = p.category_id
    JOIN currencies cur ON cur.id = s.currency_id
    JOIN billing_cycles bc ON bc.id = s.billing_cycle_id
"#;

impl Storage {
    /// Every subscription of `user_id`, soonest renewal first.
    pub async fn user_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<SubscriptionWithDetails>, SubtrackError> {
        let rows = sqlx::query(&format!(
            "{SUBSCRIPTION_WITH_DETAILS} WHERE s.user_id = ? ORDER BY s.next_billing_date ASC, s.created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(details_from_row).collect()
    }

    pub async fn subscriptions_by_status(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
    ) -> Result<Vec<SubscriptionWithDetails>, SubtrackError> {
        let rows = sqlx::query(&format!(
            "{SUBSCRIPTION_WITH_DETAILS} WHERE s.user_id = ? AND s.status = ? ORDER BY s.next_billing_date ASC, s.created_at ASC"
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(details_from_row).collect()
    }

    pub async fn active_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<SubscriptionWithDetails>, SubtrackError> {
        self.subscriptions_by_status(user_id, SubscriptionStatus::Active)
            .await
    }

    pub async fn subscription_by_id(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<SubscriptionWithDetails>, SubtrackError> {
        let row = sqlx::query(&format!(
            "{SUBSCRIPTION_WITH_DETAILS} WHERE s.id = ? AND s.user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(details_from_row).transpose()
    }

    /// Active subscriptions renewing on or before `until`.
    pub async fn upcoming_renewals(
        &self,
        user_id: &str,
        until: NaiveDate,
    ) -> Result<Vec<SubscriptionWithDetails>, SubtrackError> {
        let rows = sqlx::query(&format!(
            "{SUBSCRIPTION_WITH_DETAILS} WHERE s.user_id = ? AND s.status = 'active' AND s.next_billing_date <= ? ORDER BY s.next_billing_date ASC"
        ))
        .bind(user_id)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(details_from_row).collect()
    }

    pub async fn create_subscription(
        &self,
        user_id: &str,
        new: NewSubscription,
        today: NaiveDate,
    ) -> Result<Subscription, SubtrackError> {
        let mut conn = self.pool.acquire().await?;
        insert_subscription_on(&mut conn, user_id, new, today).await
    }

    /// Apply a partial update scoped to the owner. `None` when no such row.
    pub async fn update_subscription(
        &self,
        user_id: &str,
        id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Option<Subscription>, SubtrackError> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE subscriptions SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(v) = patch.provider_id {
            qb.push(", provider_id = ").push_bind(v);
        }
        if let Some(v) = patch.custom_provider_name {
            qb.push(", custom_provider_name = ").push_bind(v);
        }
        if let Some(v) = patch.name {
            qb.push(", name = ").push_bind(v);
        }
        if let Some(v) = patch.description {
            qb.push(", description = ").push_bind(v);
        }
        if let Some(v) = patch.amount {
            qb.push(", amount = ").push_bind(v);
        }
        if let Some(v) = patch.currency_id {
            qb.push(", currency_id = ").push_bind(v);
        }
        if let Some(v) = patch.billing_cycle_id {
            qb.push(", billing_cycle_id = ").push_bind(v);
        }
        if let Some(v) = patch.status {
            qb.push(", status = ").push_bind(v);
        }
        if let Some(v) = patch.start_date {
            qb.push(", start_date = ").push_bind(v);
        }
        if let Some(v) = patch.next_billing_date {
            qb.push(", next_billing_date = ").push_bind(v);
        }
        if let Some(v) = patch.end_date {
            qb.push(", end_date = ").push_bind(v);
        }
        if let Some(v) = patch.auto_renew {
            qb.push(", auto_renew = ").push_bind(v);
        }
        if let Some(v) = patch.notes {
            qb.push(", notes = ").push_bind(v);
        }
        qb.push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" AND user_id = ")
            .push_bind(user_id.to_string());

        let res = qb.build().execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, Subscription>(&format!(
            "{SUBSCRIPTION_COLUMNS} WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns whether a row was removed.
    pub async fn delete_subscription(&self, user_id: &str, id: &str) -> Result<bool, SubtrackError> {
        let res = sqlx::query("DELETE FROM subscriptions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

pub(crate) async fn insert_subscription_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    new: NewSubscription,
    today: NaiveDate,
) -> Result<Subscription, SubtrackError> {
    let now = Utc::now();
    let sub = Subscription {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        provider_id: new.provider_id,
        custom_provider_name: new.custom_provider_name,
        name: new.name,
        description: new.description,
        amount: new.amount,
        currency_id: new.currency_id,
        billing_cycle_id: new.billing_cycle_id,
        status: new.status.unwrap_or_default(),
        start_date: new.start_date.unwrap_or(today),
        next_billing_date: new.next_billing_date,
        end_date: new.end_date,
        auto_renew: new.auto_renew.unwrap_or(true),
        notes: new.notes,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, user_id, provider_id, custom_provider_name, name, description, amount,
            currency_id, billing_cycle_id, status, start_date, next_billing_date, end_date,
            auto_renew, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sub.id)
    .bind(&sub.user_id)
    .bind(&sub.provider_id)
    .bind(&sub.custom_provider_name)
    .bind(&sub.name)
    .bind(&sub.description)
    .bind(sub.amount)
    .bind(&sub.currency_id)
    .bind(&sub.billing_cycle_id)
    .bind(sub.status)
    .bind(sub.start_date)
    .bind(sub.next_billing_date)
    .bind(sub.end_date)
    .bind(sub.auto_renew)
    .bind(&sub.notes)
    .bind(sub.created_at)
    .bind(sub.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(sub)
}

fn details_from_row(row: &SqliteRow) -> Result<SubscriptionWithDetails, SubtrackError> {
    let subscription = Subscription::from_row(row)?;

    let provider = match row.try_get::<Option<String>, _>("p_id")? {
        Some(id) => Some(Provider {
            id,
            name: row.try_get("p_name")?,
            description: row.try_get("p_description")?,
            website_url: row.try_get("p_website_url")?,
            logo_url: row.try_get("p_logo_url")?,
            category_id: row.try_get("p_category_id")?,
            is_popular: row.try_get("p_is_popular")?,
            is_active: row.try_get("p_is_active")?,
            created_at: row.try_get::<DateTime<Utc>, _>("p_created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("p_updated_at")?,
        }),
        None => None,
    };
    let category = category_from_prefixed(row, "c_")?;

    let currency = Currency {
        id: row.try_get("cur_id")?,
        code: row.try_get("cur_code")?,
        name: row.try_get("cur_name")?,
        symbol: row.try_get("cur_symbol")?,
        is_active: row.try_get("cur_is_active")?,
        created_at: row.try_get("cur_created_at")?,
    };
    let billing_cycle = BillingCycle {
        id: row.try_get("bc_id")?,
        name: row.try_get("bc_name")?,
        cycle_type: row.try_get("bc_type")?,
        days: row.try_get("bc_days")?,
        is_active: row.try_get("bc_is_active")?,
        created_at: row.try_get("bc_created_at")?,
    };

    Ok(SubscriptionWithDetails {
        subscription,
        provider,
        category,
        currency,
        billing_cycle,
    })
}

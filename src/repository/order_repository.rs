use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        money::{from_minor_units, to_minor_units},
        NewOrder, Order, OrderStatus, PaymentDetails,
    },
    error::{AppError, Result},
    repository::OrderRepository,
};

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    campaign_id: String,
    user_id: String,
    amount_minor: i64,
    status: String,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    transaction_message: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: OrderRow) -> Result<Order> {
        Ok(Order {
            order_id: row.order_id,
            campaign_id: Uuid::parse_str(&row.campaign_id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| AppError::Database(e.to_string()))?,
            amount: from_minor_units(row.amount_minor),
            status: Self::parse_order_status(&row.status)?,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            transaction_message: row.transaction_message,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_order_status(s: &str) -> Result<OrderStatus> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(AppError::Database(format!("Invalid order status: {}", s))),
        }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let amount_minor = to_minor_units(order.amount)
            .filter(|minor| *minor > 0)
            .ok_or_else(|| AppError::Validation(format!("Invalid order amount: {}", order.amount)))?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO order_tracking (
                order_id, campaign_id, user_id, amount_minor, status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&order.order_id)
        .bind(order.campaign_id.to_string())
        .bind(order.user_id.to_string())
        .bind(amount_minor)
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_order_id(&order.order_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created order".to_string())
        })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, campaign_id, user_id, amount_minor, status,
                   payment_method, transaction_id, transaction_message,
                   created_at, updated_at
            FROM order_tracking
            WHERE order_id = ?
            "#
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn mark_completed(&self, order_id: &str, details: &PaymentDetails) -> Result<Option<Order>> {
        let now = Utc::now().naive_utc();

        // Completed is terminal; a repeat call leaves the first metadata in place.
        let result = sqlx::query(
            r#"
            UPDATE order_tracking
            SET status = ?,
                payment_method = ?,
                transaction_id = ?,
                transaction_message = ?,
                updated_at = ?
            WHERE order_id = ? AND status <> ?
            "#
        )
        .bind(OrderStatus::Completed.as_str())
        .bind(&details.payment_method)
        .bind(&details.transaction_id)
        .bind(&details.transaction_message)
        .bind(now)
        .bind(order_id)
        .bind(OrderStatus::Completed.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Order {} was already completed or does not exist", order_id);
        }

        self.find_by_order_id(order_id).await
    }
}

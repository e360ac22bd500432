use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        money::from_minor_units, CreditOutcome, Donation, DonationStatus, NewDonation,
    },
    error::{AppError, Result},
    repository::{
        campaign_repository::{credit_amount_minor, increment_collected_minor},
        DonationRepository,
    },
};

#[derive(FromRow)]
struct DonationRow {
    id: String,
    order_id: String,
    user_id: String,
    campaign_id: String,
    amount_minor: i64,
    status: String,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    transaction_message: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteDonationRepository {
    pool: SqlitePool,
}

impl SqliteDonationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_donation(row: DonationRow) -> Result<Donation> {
        Ok(Donation {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            order_id: row.order_id,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| AppError::Database(e.to_string()))?,
            campaign_id: Uuid::parse_str(&row.campaign_id).map_err(|e| AppError::Database(e.to_string()))?,
            amount: from_minor_units(row.amount_minor),
            status: Self::parse_donation_status(&row.status)?,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            transaction_message: row.transaction_message,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_donation_status(s: &str) -> Result<DonationStatus> {
        match s {
            "completed" => Ok(DonationStatus::Completed),
            _ => Err(AppError::Database(format!("Invalid donation status: {}", s))),
        }
    }
}

#[async_trait]
impl DonationRepository for SqliteDonationRepository {
    async fn credit(&self, donation: NewDonation) -> Result<CreditOutcome> {
        let amount_minor = credit_amount_minor(donation.amount)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // UNIQUE(order_id) decides which delivery wins; the loser inserts nothing.
        let inserted = sqlx::query(
            r#"
            INSERT INTO donations (
                id, order_id, user_id, campaign_id, amount_minor, status,
                payment_method, transaction_id, transaction_message, created_at
            ) VALUES (?, ?, ?, ?, ?, 'completed', ?, ?, ?, ?)
            ON CONFLICT(order_id) DO NOTHING
            "#
        )
        .bind(id.to_string())
        .bind(&donation.order_id)
        .bind(donation.user_id.to_string())
        .bind(donation.campaign_id.to_string())
        .bind(amount_minor)
        .bind(&donation.details.payment_method)
        .bind(&donation.details.transaction_id)
        .bind(&donation.details.transaction_message)
        .bind(now.naive_utc())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CreditOutcome::AlreadyCredited);
        }

        // Dropping `tx` on the error path rolls the donation insert back too.
        let collected_minor = increment_collected_minor(&mut tx, &donation.campaign_id.to_string(), amount_minor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", donation.campaign_id)))?;

        tx.commit().await?;

        Ok(CreditOutcome::Credited {
            donation: Donation {
                id,
                order_id: donation.order_id,
                user_id: donation.user_id,
                campaign_id: donation.campaign_id,
                amount: from_minor_units(amount_minor),
                status: DonationStatus::Completed,
                payment_method: donation.details.payment_method,
                transaction_id: donation.details.transaction_id,
                transaction_message: donation.details.transaction_message,
                created_at: now,
            },
            collected: from_minor_units(collected_minor),
        })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>> {
        let row = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT id, order_id, user_id, campaign_id, amount_minor, status,
                   payment_method, transaction_id, transaction_message, created_at
            FROM donations
            WHERE order_id = ?
            "#
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_donation).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Donation>> {
        let rows = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT id, order_id, user_id, campaign_id, amount_minor, status,
                   payment_method, transaction_id, transaction_message, created_at
            FROM donations
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_donation)
            .collect()
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<Donation>> {
        let rows = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT id, order_id, user_id, campaign_id, amount_minor, status,
                   payment_method, transaction_id, transaction_message, created_at
            FROM donations
            WHERE campaign_id = ?
            ORDER BY created_at DESC
            "#
        )
        .bind(campaign_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_donation)
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Donation>> {
        let rows = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT id, order_id, user_id, campaign_id, amount_minor, status,
                   payment_method, transaction_id, transaction_message, created_at
            FROM donations
            ORDER BY created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_donation)
            .collect()
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        money::{from_minor_units, to_minor_units},
        Campaign, CampaignLedger,
    },
    error::{AppError, Result},
    repository::CampaignRepository,
};

#[derive(FromRow)]
struct CampaignRow {
    id: String,
    title: String,
    description: String,
    goal_minor: i64,
    collected_minor: i64,
    category: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    image_url: Option<String>,
    created_by: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_campaign(row: CampaignRow) -> Result<Campaign> {
        Ok(Campaign {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            goal: from_minor_units(row.goal_minor),
            collected: from_minor_units(row.collected_minor),
            category: row.category,
            start_date: row.start_date,
            end_date: row.end_date,
            image_url: row.image_url,
            created_by: Uuid::parse_str(&row.created_by).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

/// Adds `amount_minor` to a campaign's collected total in a single UPDATE so
/// concurrent credits cannot overwrite each other. Returns the new total, or
/// `None` if the campaign does not exist.
pub(crate) async fn increment_collected_minor(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    amount_minor: i64,
) -> Result<Option<i64>> {
    let new_total = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE campaigns
        SET collected_minor = collected_minor + ?,
            updated_at = ?
        WHERE id = ?
        RETURNING collected_minor
        "#
    )
    .bind(amount_minor)
    .bind(Utc::now().naive_utc())
    .bind(campaign_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(new_total)
}

/// Validates a credit amount and converts it to minor units.
pub(crate) fn credit_amount_minor(amount: Decimal) -> Result<i64> {
    to_minor_units(amount)
        .filter(|minor| *minor > 0)
        .ok_or_else(|| AppError::Validation(format!("Invalid credit amount: {}", amount)))
}

#[async_trait]
impl CampaignRepository for SqliteCampaignRepository {
    async fn create(&self, campaign: Campaign) -> Result<Campaign> {
        let goal_minor = to_minor_units(campaign.goal)
            .filter(|minor| *minor > 0)
            .ok_or_else(|| AppError::Validation("goal must be a positive amount with at most two decimals".to_string()))?;
        let now = Utc::now().naive_utc();

        // New campaigns always start from zero; `collected` is owned by the ledger.
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, title, description, goal_minor, collected_minor, category,
                start_date, end_date, image_url, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(campaign.id.to_string())
        .bind(&campaign.title)
        .bind(&campaign.description)
        .bind(goal_minor)
        .bind(&campaign.category)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(&campaign.image_url)
        .bind(campaign.created_by.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(campaign.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created campaign".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, title, description, goal_minor, collected_minor, category,
                   start_date, end_date, image_url, created_by, created_at, updated_at
            FROM campaigns
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_campaign).transpose()
    }

    async fn list(&self) -> Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, title, description, goal_minor, collected_minor, category,
                   start_date, end_date, image_url, created_by, created_at, updated_at
            FROM campaigns
            ORDER BY created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_campaign)
            .collect()
    }

    async fn update(&self, campaign: &Campaign) -> Result<Campaign> {
        let goal_minor = to_minor_units(campaign.goal)
            .filter(|minor| *minor > 0)
            .ok_or_else(|| AppError::Validation("goal must be a positive amount with at most two decimals".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET title = ?, description = ?, goal_minor = ?, category = ?,
                end_date = ?, image_url = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&campaign.title)
        .bind(&campaign.description)
        .bind(goal_minor)
        .bind(&campaign.category)
        .bind(campaign.end_date)
        .bind(&campaign.image_url)
        .bind(Utc::now().naive_utc())
        .bind(campaign.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }

        self.find_by_id(campaign.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated campaign".to_string())
        })
    }

    async fn increment_collected(&self, id: Uuid, amount: Decimal) -> Result<Decimal> {
        let amount_minor = credit_amount_minor(amount)?;
        let mut conn = self.pool.acquire().await?;

        let total = increment_collected_minor(&mut conn, &id.to_string(), amount_minor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", id)))?;

        Ok(from_minor_units(total))
    }

    async fn ledger(&self, id: Uuid) -> Result<CampaignLedger> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT c.collected_minor,
                   COALESCE(SUM(d.amount_minor), 0),
                   COUNT(d.id)
            FROM campaigns c
            LEFT JOIN donations d ON d.campaign_id = c.id
            WHERE c.id = ?
            GROUP BY c.id
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let (collected, donation_total, donation_count) = row
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", id)))?;

        Ok(CampaignLedger {
            campaign_id: id,
            collected: from_minor_units(collected),
            donation_total: from_minor_units(donation_total),
            donation_count,
            balanced: collected == donation_total,
        })
    }
}

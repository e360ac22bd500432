use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Volunteer, VolunteerStatus},
    error::{AppError, Result},
    repository::VolunteerRepository,
};

#[derive(FromRow)]
struct VolunteerRow {
    id: String,
    user_id: String,
    campaign_id: String,
    message: Option<String>,
    status: String,
    applied_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteVolunteerRepository {
    pool: SqlitePool,
}

impl SqliteVolunteerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_volunteer(row: VolunteerRow) -> Result<Volunteer> {
        Ok(Volunteer {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| AppError::Database(e.to_string()))?,
            campaign_id: Uuid::parse_str(&row.campaign_id).map_err(|e| AppError::Database(e.to_string()))?,
            message: row.message,
            status: Self::parse_status(&row.status)?,
            applied_at: DateTime::from_naive_utc_and_offset(row.applied_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<VolunteerStatus> {
        match s {
            "pending" => Ok(VolunteerStatus::Pending),
            "approved" => Ok(VolunteerStatus::Approved),
            "rejected" => Ok(VolunteerStatus::Rejected),
            _ => Err(AppError::Database(format!("Invalid volunteer status: {}", s))),
        }
    }

    fn status_to_str(status: &VolunteerStatus) -> &'static str {
        match status {
            VolunteerStatus::Pending => "pending",
            VolunteerStatus::Approved => "approved",
            VolunteerStatus::Rejected => "rejected",
        }
    }
}

#[async_trait]
impl VolunteerRepository for SqliteVolunteerRepository {
    async fn create(&self, volunteer: Volunteer) -> Result<Volunteer> {
        sqlx::query(
            r#"
            INSERT INTO volunteers (id, user_id, campaign_id, message, status, applied_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(volunteer.id.to_string())
        .bind(volunteer.user_id.to_string())
        .bind(volunteer.campaign_id.to_string())
        .bind(&volunteer.message)
        .bind(Self::status_to_str(&volunteer.status))
        .bind(volunteer.applied_at.naive_utc())
        .bind(volunteer.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(volunteer.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created volunteer application".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Volunteer>> {
        let row = sqlx::query_as::<_, VolunteerRow>(
            r#"
            SELECT id, user_id, campaign_id, message, status, applied_at, updated_at
            FROM volunteers
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_volunteer).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Volunteer>> {
        let rows = sqlx::query_as::<_, VolunteerRow>(
            r#"
            SELECT id, user_id, campaign_id, message, status, applied_at, updated_at
            FROM volunteers
            WHERE user_id = ?
            ORDER BY applied_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_volunteer).collect()
    }

    async fn list_all(&self) -> Result<Vec<Volunteer>> {
        let rows = sqlx::query_as::<_, VolunteerRow>(
            r#"
            SELECT id, user_id, campaign_id, message, status, applied_at, updated_at
            FROM volunteers
            ORDER BY applied_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_volunteer).collect()
    }

    async fn update_status(&self, id: Uuid, status: VolunteerStatus) -> Result<Volunteer> {
        let result = sqlx::query(
            "UPDATE volunteers SET status = ?, updated_at = ? WHERE id = ?"
        )
        .bind(Self::status_to_str(&status))
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Volunteer application not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated volunteer application".to_string())
        })
    }
}

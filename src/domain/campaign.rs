use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::money::deserialize_optional_amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal: Decimal,
    /// Running total of completed donations. Written only by the ledger.
    pub collected: Decimal,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub goal: Option<Decimal>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Partial edit of a campaign. `collected` is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub goal: Option<Decimal>,
    pub category: Option<String>,
    pub end_date: Option<NaiveDate>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Collected total next to the sum of its donation rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignLedger {
    pub campaign_id: Uuid,
    pub collected: Decimal,
    pub donation_total: Decimal,
    pub donation_count: i64,
    pub balanced: bool,
}

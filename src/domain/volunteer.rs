use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub message: Option<String>,
    pub status: VolunteerStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerApplication {
    pub campaign_id: Uuid,
    pub message: Option<String>,
}

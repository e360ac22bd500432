use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{Volunteer, VolunteerApplication, VolunteerStatus},
    error::{AppError, Result},
    repository::{CampaignRepository, VolunteerRepository},
};

pub struct VolunteerService {
    repo: Arc<dyn VolunteerRepository>,
    campaign_repo: Arc<dyn CampaignRepository>,
}

impl VolunteerService {
    pub fn new(repo: Arc<dyn VolunteerRepository>, campaign_repo: Arc<dyn CampaignRepository>) -> Self {
        Self { repo, campaign_repo }
    }

    pub async fn apply(&self, user_id: Uuid, application: VolunteerApplication) -> Result<Volunteer> {
        if self.campaign_repo.find_by_id(application.campaign_id).await?.is_none() {
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }

        let now = Utc::now();
        let volunteer = self.repo
            .create(Volunteer {
                id: Uuid::new_v4(),
                user_id,
                campaign_id: application.campaign_id,
                message: application.message.filter(|m| !m.trim().is_empty()),
                status: VolunteerStatus::Pending,
                applied_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            volunteer_id = %volunteer.id,
            campaign_id = %volunteer.campaign_id,
            "Volunteer application received"
        );
        Ok(volunteer)
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<Volunteer>> {
        self.repo.list_by_user(user_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Volunteer>> {
        self.repo.list_all().await
    }

    pub async fn update_status(&self, id: Uuid, status: VolunteerStatus) -> Result<Volunteer> {
        self.repo.update_status(id, status).await
    }
}

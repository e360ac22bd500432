use std::sync::Arc;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{money::to_minor_units, Campaign, CampaignLedger, CreateCampaignRequest, UpdateCampaignRequest},
    error::{AppError, Result},
    repository::CampaignRepository,
};

const DEFAULT_CATEGORY: &str = "General";

pub struct CampaignService {
    repo: Arc<dyn CampaignRepository>,
}

impl CampaignService {
    pub fn new(repo: Arc<dyn CampaignRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Campaign>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Campaign> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
    }

    /// Creates a campaign with nothing collected yet. `collected` is only
    /// ever moved by the donation ledger afterwards.
    pub async fn create(&self, created_by: Uuid, request: CreateCampaignRequest) -> Result<Campaign> {
        request.validate()?;

        let goal = request
            .goal
            .ok_or_else(|| AppError::Validation("Title, description, and goal are required".to_string()))?;
        if goal <= Decimal::ZERO || to_minor_units(goal).is_none() {
            return Err(AppError::Validation(
                "Goal must be a positive amount with at most two decimal places".to_string(),
            ));
        }

        let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
        if let Some(end_date) = request.end_date {
            if end_date < start_date {
                return Err(AppError::Validation("end_date must not be before start_date".to_string()));
            }
        }

        let category = request
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let now = Utc::now();
        let campaign = self.repo
            .create(Campaign {
                id: Uuid::new_v4(),
                title: request.title.trim().to_string(),
                description: request.description,
                goal,
                collected: Decimal::ZERO,
                category,
                start_date,
                end_date: request.end_date,
                image_url: request.image_url,
                created_by,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(campaign_id = %campaign.id, created_by = %created_by, "Campaign created");
        Ok(campaign)
    }

    pub async fn update(&self, id: Uuid, request: UpdateCampaignRequest) -> Result<Campaign> {
        request.validate()?;

        let mut campaign = self.get(id).await?;
        if let Some(title) = request.title {
            campaign.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            campaign.description = description;
        }
        if let Some(goal) = request.goal {
            if goal <= Decimal::ZERO || to_minor_units(goal).is_none() {
                return Err(AppError::Validation(
                    "Goal must be a positive amount with at most two decimal places".to_string(),
                ));
            }
            campaign.goal = goal;
        }
        if let Some(category) = request.category.filter(|c| !c.trim().is_empty()) {
            campaign.category = category.trim().to_string();
        }
        if let Some(end_date) = request.end_date {
            if end_date < campaign.start_date {
                return Err(AppError::Validation("end_date must not be before start_date".to_string()));
            }
            campaign.end_date = Some(end_date);
        }
        if request.image_url.is_some() {
            campaign.image_url = request.image_url;
        }

        self.repo.update(&campaign).await
    }

    pub async fn ledger(&self, id: Uuid) -> Result<CampaignLedger> {
        let ledger = self.repo.ledger(id).await?;
        if !ledger.balanced {
            tracing::error!(
                campaign_id = %id,
                collected = %ledger.collected,
                donation_total = %ledger.donation_total,
                "Campaign total does not match its donations"
            );
        }
        Ok(ledger)
    }
}

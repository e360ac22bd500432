use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod campaign_repository;
pub mod donation_repository;
pub mod order_repository;
pub mod volunteer_repository;

pub use campaign_repository::SqliteCampaignRepository;
pub use donation_repository::SqliteDonationRepository;
pub use order_repository::SqliteOrderRepository;
pub use volunteer_repository::SqliteVolunteerRepository;

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: Campaign) -> Result<Campaign>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>>;
    async fn list(&self) -> Result<Vec<Campaign>>;
    /// Writes the descriptive fields and goal. Never touches `collected`.
    async fn update(&self, campaign: &Campaign) -> Result<Campaign>;
    /// Adds `amount` to `collected` in one statement and returns the new total.
    async fn increment_collected(&self, id: Uuid, amount: Decimal) -> Result<Decimal>;
    async fn ledger(&self, id: Uuid) -> Result<CampaignLedger>;
}

/// Order Store: one row per payment attempt.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<Order>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>>;
    /// Moves a non-completed order to `completed`. Returns `None` when the
    /// order does not exist.
    async fn mark_completed(&self, order_id: &str, details: &PaymentDetails) -> Result<Option<Order>>;
}

/// Donation Ledger: append-only, unique by order id.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Inserts the donation and increments the campaign total as one
    /// transaction. A second call for the same order id changes nothing and
    /// reports `AlreadyCredited`.
    async fn credit(&self, donation: NewDonation) -> Result<CreditOutcome>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Donation>>;
    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<Donation>>;
    async fn list_all(&self) -> Result<Vec<Donation>>;
}

#[async_trait]
pub trait VolunteerRepository: Send + Sync {
    async fn create(&self, volunteer: Volunteer) -> Result<Volunteer>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Volunteer>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Volunteer>>;
    async fn list_all(&self) -> Result<Vec<Volunteer>>;
    async fn update_status(&self, id: Uuid, status: VolunteerStatus) -> Result<Volunteer>;
}

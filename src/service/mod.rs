pub mod campaign_service;
pub mod order_service;
pub mod reconciler;
pub mod status_service;
pub mod volunteer_service;

use std::{sync::Arc, time::Duration};
use sqlx::SqlitePool;
use crate::config::Settings;
use crate::payments::PaymentGateway;
use crate::repository::*;
use campaign_service::CampaignService;
use order_service::{CheckoutSettings, OrderService};
use reconciler::Reconciler;
use status_service::StatusProber;
use volunteer_service::VolunteerService;

pub use order_service::{CreateOrderRequest, CreatedOrder};
pub use reconciler::{ReconcileOutcome, WebhookDelivery};
pub use status_service::{PaymentStatusView, StatusRequester};

pub struct ServiceContext {
    pub campaign_repo: Arc<dyn CampaignRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub donation_repo: Arc<dyn DonationRepository>,
    pub volunteer_repo: Arc<dyn VolunteerRepository>,
    pub campaign_service: Arc<CampaignService>,
    pub volunteer_service: Arc<VolunteerService>,
    pub order_service: Arc<OrderService>,
    pub reconciler: Arc<Reconciler>,
    pub status_prober: Arc<StatusProber>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        settings: &Settings,
    ) -> Self {
        let campaign_repo: Arc<dyn CampaignRepository> =
            Arc::new(SqliteCampaignRepository::new(db_pool.clone()));
        let order_repo: Arc<dyn OrderRepository> =
            Arc::new(SqliteOrderRepository::new(db_pool.clone()));
        let donation_repo: Arc<dyn DonationRepository> =
            Arc::new(SqliteDonationRepository::new(db_pool.clone()));
        let volunteer_repo: Arc<dyn VolunteerRepository> =
            Arc::new(SqliteVolunteerRepository::new(db_pool.clone()));

        let campaign_service = Arc::new(CampaignService::new(campaign_repo.clone()));
        let volunteer_service = Arc::new(VolunteerService::new(
            volunteer_repo.clone(),
            campaign_repo.clone(),
        ));

        let order_service = Arc::new(OrderService::new(
            order_repo.clone(),
            campaign_repo.clone(),
            gateway.clone(),
            CheckoutSettings::from(&settings.cashfree),
        ));

        let reconciler = Arc::new(Reconciler::new(
            order_repo.clone(),
            donation_repo.clone(),
            settings.cashfree.webhook_secret.clone(),
            Duration::from_secs(settings.payments.webhook_timeout_secs),
        ));

        let status_prober = Arc::new(StatusProber::new(
            order_repo.clone(),
            donation_repo.clone(),
            gateway,
            reconciler.clone(),
            settings.payments.reconcile_on_status,
        ));

        Self {
            campaign_repo,
            order_repo,
            donation_repo,
            volunteer_repo,
            campaign_service,
            volunteer_service,
            order_service,
            reconciler,
            status_prober,
            db_pool,
        }
    }
}

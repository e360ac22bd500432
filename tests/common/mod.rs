#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use hopeforall::{
    config::Settings,
    domain::{generate_order_id, Campaign, NewOrder, Order},
    error::{AppError, Result},
    payments::{GatewayOrder, GatewayOrderRequest, PaymentGateway},
    service::ServiceContext,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// One shared in-memory database per test. A single connection keeps every
/// query on the same database and serialises transactions.
pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Database file on disk, opened the way the server opens its database, so
/// several pooled connections contend for the same file. The file is removed
/// on drop.
pub struct FileDatabase {
    pub path: PathBuf,
}

impl FileDatabase {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("hopeforall-test-{}.db", Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }

    pub async fn pool(&self, max_connections: u32) -> anyhow::Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&self.url())
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// In-process gateway that records what it was asked to do.
#[derive(Default)]
pub struct FakeGateway {
    pub created: Mutex<Vec<GatewayOrderRequest>>,
    pub fail_create: AtomicBool,
    pub payments: Mutex<HashMap<String, Vec<Value>>>,
}

impl FakeGateway {
    pub fn fail_next_orders(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn created_requests(&self) -> Vec<GatewayOrderRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn set_payments(&self, order_id: &str, payments: Vec<Value>) {
        self.payments.lock().unwrap().insert(order_id.to_string(), payments);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("order_amount : invalid value".to_string()));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(GatewayOrder {
            order_id: request.order_id.clone(),
            payment_session_id: format!("session_{}", request.order_id),
            order_amount: request.order_amount.parse().ok(),
        })
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Value> {
        Ok(json!({ "order_id": order_id, "order_status": "ACTIVE" }))
    }

    async fn fetch_payments(&self, order_id: &str) -> Result<Vec<Value>> {
        Ok(self.payments.lock().unwrap().get(order_id).cloned().unwrap_or_default())
    }
}

pub struct TestContext {
    pub pool: SqlitePool,
    pub gateway: Arc<FakeGateway>,
    pub services: Arc<ServiceContext>,
    pub settings: Settings,
}

pub async fn test_context() -> anyhow::Result<TestContext> {
    test_context_with(Settings::default()).await
}

pub async fn test_context_with(settings: Settings) -> anyhow::Result<TestContext> {
    context_on_pool(setup_pool().await?, settings)
}

/// Context over a pool the caller opened, e.g. one from [`FileDatabase`].
pub fn context_on_pool(pool: SqlitePool, settings: Settings) -> anyhow::Result<TestContext> {
    let gateway = Arc::new(FakeGateway::default());
    let services = Arc::new(ServiceContext::new(pool.clone(), gateway.clone(), &settings));
    Ok(TestContext { pool, gateway, services, settings })
}

pub async fn create_campaign(services: &ServiceContext, goal: i64) -> anyhow::Result<Campaign> {
    let now = Utc::now();
    let campaign = services.campaign_repo.create(Campaign {
        id: Uuid::new_v4(),
        title: "Clean Water for Rampur".to_string(),
        description: "Wells and filters for the village school".to_string(),
        goal: Decimal::from(goal),
        collected: Decimal::ZERO,
        category: "Health".to_string(),
        start_date: now.date_naive(),
        end_date: None,
        image_url: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }).await?;
    Ok(campaign)
}

/// Records a pending order the way order creation would.
pub async fn track_order(
    services: &ServiceContext,
    campaign_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
) -> anyhow::Result<Order> {
    let order = services.order_repo.create(NewOrder {
        order_id: generate_order_id(),
        campaign_id,
        user_id,
        amount,
    }).await?;
    Ok(order)
}

pub fn payment_webhook(order_id: &str, amount: Value, status: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "type": "PAYMENT_SUCCESS_WEBHOOK",
        "event_time": "2024-01-02T10:00:05+05:30",
        "data": {
            "order": {
                "order_id": order_id,
                "order_amount": amount,
                "order_currency": "INR"
            },
            "payment": {
                "cf_payment_id": 5114910386u64,
                "payment_status": status,
                "payment_amount": amount,
                "payment_group": "upi",
                "payment_time": "2024-01-02T10:00:00+05:30",
                "payment_message": "Transaction successful"
            },
            "customer_details": { "customer_email": "donor@example.com" }
        }
    }))
    .unwrap()
}

pub fn success_webhook(order_id: &str, amount: Value) -> Vec<u8> {
    payment_webhook(order_id, amount, "SUCCESS")
}

pub fn test_webhook() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "type": "WEBHOOK",
        "data": { "test_object": { "test_key": "test_value" } }
    }))
    .unwrap()
}

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single donation-payment attempt, tracked from before the gateway call
/// until the payment is reconciled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub transaction_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
}

/// Provider-side details recorded once a payment completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentDetails {
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub transaction_message: Option<String>,
}

/// Builds an id of the form `order_<unix millis>_<9 random chars>`.
pub fn generate_order_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("order_{}_{}", Utc::now().timestamp_millis(), suffix)
}

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::money::deserialize_optional_amount,
    error::{AppError, Result},
};

/// Order-creation body sent to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    pub order_id: String,
    /// Always formatted with two decimals, e.g. `"500.00"`.
    pub order_amount: String,
    pub order_currency: String,
    pub order_note: String,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderMeta {
    pub return_url: String,
    pub notify_url: String,
}

/// The parts of the gateway's order response we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub payment_session_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub order_amount: Option<Decimal>,
}

/// Typed view over one entry of the gateway's payments list.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    #[serde(default)]
    pub cf_payment_id: Option<Value>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub payment_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_group: Option<String>,
    #[serde(default)]
    pub payment_time: Option<String>,
    #[serde(default)]
    pub payment_message: Option<String>,
}

impl GatewayPayment {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn reference_id(&self) -> Option<String> {
        self.cf_payment_id.as_ref().and_then(json_scalar_to_string)
    }
}

/// Renders a JSON string or number id as text.
pub fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The payment provider, as seen by the donation core.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder>;
    /// Raw order document, passed through to status callers.
    async fn fetch_order(&self, order_id: &str) -> Result<Value>;
    /// Payment attempts for an order, latest first.
    async fn fetch_payments(&self, order_id: &str) -> Result<Vec<Value>>;
}

/// Stand-in used when no gateway credentials are configured. Every call
/// reports the service as unavailable; webhooks still reconcile normally.
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_order(&self, _request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        Err(AppError::ServiceUnavailable("Payment processing is not configured".to_string()))
    }

    async fn fetch_order(&self, _order_id: &str) -> Result<Value> {
        Err(AppError::ServiceUnavailable("Payment processing is not configured".to_string()))
    }

    async fn fetch_payments(&self, _order_id: &str) -> Result<Vec<Value>> {
        Err(AppError::ServiceUnavailable("Payment processing is not configured".to_string()))
    }
}

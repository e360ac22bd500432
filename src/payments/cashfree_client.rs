use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::CashfreeConfig,
    error::{AppError, Result},
    payments::gateway::{GatewayOrder, GatewayOrderRequest, PaymentGateway},
};

/// Cashfree PG client. Credentials travel in headers on every request.
pub struct CashfreeClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    api_version: String,
}

impl CashfreeClient {
    pub fn new(config: &CashfreeConfig) -> Result<Self> {
        let (client_id, client_secret) = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => (id.clone(), secret.clone()),
            _ => {
                return Err(AppError::Internal(
                    "Cashfree client_id and client_secret must both be configured".to_string(),
                ))
            }
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            api_version: config.api_version.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .header("x-api-version", &self.api_version)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(AppError::Upstream(format!("Cashfree returned {}: {}", status, message)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Cashfree response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for CashfreeClient {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder> {
        tracing::debug!(order_id = %request.order_id, "Creating Cashfree order");
        self.send_json(self.request(Method::POST, "/orders").json(request)).await
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Value> {
        self.send_json(self.request(Method::GET, &format!("/orders/{}", order_id))).await
    }

    async fn fetch_payments(&self, order_id: &str) -> Result<Vec<Value>> {
        self.send_json(self.request(Method::GET, &format!("/orders/{}/payments", order_id))).await
    }
}

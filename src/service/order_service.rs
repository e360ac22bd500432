use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::CashfreeConfig,
    domain::{
        generate_order_id,
        money::{deserialize_optional_amount, format_gateway_amount, to_minor_units},
        NewOrder,
    },
    error::{AppError, Result},
    payments::{CustomerDetails, GatewayOrderRequest, OrderMeta, PaymentGateway},
    repository::{CampaignRepository, OrderRepository},
};

const DEFAULT_CUSTOMER_NAME: &str = "Donor";
const DEFAULT_CUSTOMER_PHONE: &str = "9999999999";
const MISSING_FIELDS: &str = "Amount, campaign ID, and customer email are required";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<Decimal>,
    pub campaign_id: Option<Uuid>,
    pub campaign_title: Option<String>,
    pub customer_name: Option<String>,
    #[validate(email(message = "customerEmail must be a valid email address"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: String,
    pub payment_session_id: String,
    pub order_amount: Decimal,
}

/// Where the gateway should send the donor and the webhook.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    pub return_url: String,
    pub notify_url: String,
}

impl From<&CashfreeConfig> for CheckoutSettings {
    fn from(config: &CashfreeConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            return_url: config.return_url.clone(),
            notify_url: config.notify_url.clone(),
        }
    }
}

/// Validates donation requests, tracks the order, then opens a gateway
/// payment session.
pub struct OrderService {
    order_repo: Arc<dyn OrderRepository>,
    campaign_repo: Arc<dyn CampaignRepository>,
    gateway: Arc<dyn PaymentGateway>,
    checkout: CheckoutSettings,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl OrderService {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        campaign_repo: Arc<dyn CampaignRepository>,
        gateway: Arc<dyn PaymentGateway>,
        checkout: CheckoutSettings,
    ) -> Self {
        Self {
            order_repo,
            campaign_repo,
            gateway,
            checkout,
        }
    }

    pub async fn create_order(&self, user_id: Uuid, request: CreateOrderRequest) -> Result<CreatedOrder> {
        request.validate()?;

        let amount = request.amount.ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;
        let campaign_id = request.campaign_id.ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;
        let customer_email = non_empty(request.customer_email)
            .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;

        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be greater than zero".to_string()));
        }
        if to_minor_units(amount).is_none() {
            return Err(AppError::Validation("Amount may have at most two decimal places".to_string()));
        }

        let campaign = self.campaign_repo
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        // The tracking row must exist before the gateway can send a webhook for it.
        let order = self.order_repo
            .create(NewOrder {
                order_id: generate_order_id(),
                campaign_id,
                user_id,
                amount,
            })
            .await?;

        tracing::info!(
            order_id = %order.order_id,
            campaign_id = %campaign_id,
            user_id = %user_id,
            amount = %amount,
            "Order tracking created"
        );

        let campaign_title = non_empty(request.campaign_title).unwrap_or(campaign.title);
        let gateway_request = GatewayOrderRequest {
            order_id: order.order_id.clone(),
            order_amount: format_gateway_amount(amount),
            order_currency: self.checkout.currency.clone(),
            order_note: format!("Donation for {}", campaign_title),
            customer_details: CustomerDetails {
                customer_id: format!("cust_{}", user_id.simple()),
                customer_name: non_empty(request.customer_name)
                    .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
                customer_email,
                customer_phone: non_empty(request.customer_phone)
                    .unwrap_or_else(|| DEFAULT_CUSTOMER_PHONE.to_string()),
            },
            order_meta: OrderMeta {
                return_url: self.checkout.return_url.clone(),
                notify_url: self.checkout.notify_url.clone(),
            },
        };

        // A rejected order stays pending; it is never resubmitted automatically.
        let created = self.gateway
            .create_order(&gateway_request)
            .await
            .map_err(|e| {
                tracing::error!(order_id = %order.order_id, error = %e, "Gateway rejected payment order");
                e
            })?;

        Ok(CreatedOrder {
            order_id: created.order_id,
            payment_session_id: created.payment_session_id,
            order_amount: created.order_amount.unwrap_or(amount),
        })
    }
}

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::{Donation, Order, OrderStatus},
    error::{AppError, Result},
    payments::{GatewayPayment, PaymentGateway, PaymentNotification},
    repository::{DonationRepository, OrderRepository},
    service::reconciler::{ReconcileOutcome, Reconciler},
};

/// Gateway view of an order next to our own records, so a donor polling for
/// the result sees the same state the ledger holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusView {
    pub order: Value,
    pub payments: Vec<Value>,
    pub latest_payment: Option<Value>,
    pub local_order: Option<Order>,
    pub donation: Option<Donation>,
}

/// Who is asking for a status.
#[derive(Debug, Clone, Copy)]
pub struct StatusRequester {
    pub user_id: Uuid,
    pub is_admin: bool,
}

pub struct StatusProber {
    order_repo: Arc<dyn OrderRepository>,
    donation_repo: Arc<dyn DonationRepository>,
    gateway: Arc<dyn PaymentGateway>,
    reconciler: Arc<Reconciler>,
    reconcile_on_status: bool,
}

fn is_valid_order_id(order_id: &str) -> bool {
    !order_id.is_empty()
        && order_id.len() <= 64
        && order_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl StatusProber {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        donation_repo: Arc<dyn DonationRepository>,
        gateway: Arc<dyn PaymentGateway>,
        reconciler: Arc<Reconciler>,
        reconcile_on_status: bool,
    ) -> Self {
        Self {
            order_repo,
            donation_repo,
            gateway,
            reconciler,
            reconcile_on_status,
        }
    }

    pub async fn get_status(&self, order_id: &str, requester: StatusRequester) -> Result<PaymentStatusView> {
        if !is_valid_order_id(order_id) {
            return Err(AppError::BadRequest("Invalid order id".to_string()));
        }

        let mut local_order = self.order_repo.find_by_order_id(order_id).await?;
        match &local_order {
            Some(order) if order.user_id != requester.user_id && !requester.is_admin => {
                return Err(AppError::Forbidden);
            }
            None if !requester.is_admin => {
                return Err(AppError::NotFound("Order not found".to_string()));
            }
            _ => {}
        }

        let order = self.gateway.fetch_order(order_id).await?;
        let payments = self.gateway.fetch_payments(order_id).await?;
        let latest_payment = payments.first().cloned();

        let mut changed = false;
        if self.reconcile_on_status {
            if let (Some(tracked), Some(latest)) = (&local_order, &latest_payment) {
                if tracked.status == OrderStatus::Pending {
                    changed = self.credit_from_gateway(tracked, latest).await;
                }
            }
        }
        if changed {
            local_order = self.order_repo.find_by_order_id(order_id).await?;
        }

        let donation = self.donation_repo.find_by_order_id(order_id).await?;

        Ok(PaymentStatusView {
            order,
            payments,
            latest_payment,
            local_order,
            donation,
        })
    }

    /// Routes a gateway-reported success through the reconciler's credit
    /// path. Returns true when local state may have changed.
    async fn credit_from_gateway(&self, tracked: &Order, latest: &Value) -> bool {
        let Some(payment) = GatewayPayment::from_value(latest) else {
            return false;
        };
        let Some(payment_status) = payment.payment_status.clone() else {
            return false;
        };

        let notification = PaymentNotification {
            order_id: tracked.order_id.clone(),
            order_amount: payment.payment_amount.unwrap_or(tracked.amount),
            payment_status,
            reference_id: payment.reference_id(),
            payment_mode: payment.payment_group.clone(),
            tx_time: payment.payment_time.clone(),
            tx_msg: payment.payment_message.clone(),
        };
        if !notification.is_success() {
            return false;
        }

        match self.reconciler.credit(&notification).await {
            Ok(ReconcileOutcome::Credited { .. }) => {
                tracing::info!(order_id = %tracked.order_id, "Credited payment from status probe");
                true
            }
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    order_id = %tracked.order_id,
                    reason = %e,
                    "Status probe could not credit payment; manual reconciliation required"
                );
                false
            }
        }
    }
}

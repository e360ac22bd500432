//! Turns provider payment notifications into ledger entries.
//!
//! Every delivery is acknowledged to the provider whatever happens here, so
//! the outcome of a delivery is reported as a [`ReconcileOutcome`] rather than
//! an error. Failures that need a human are logged with the order id, event
//! type and reason.
//!
//! Crediting runs the same steps for webhooks and for the status prober:
//!
//! 1. fast-path lookup of an existing donation for the order
//! 2. lookup of the tracked order to recover campaign and donor
//! 3. insert-or-detect-conflict on the donation ledger plus the atomic
//!    `collected` increment, in one transaction
//! 4. best-effort update of the order's status mirror

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{CreditOutcome, NewDonation},
    error::{AppError, Result},
    payments::{
        parse_webhook,
        webhook::verify_signature,
        PaymentNotification, WebhookEvent,
    },
    repository::{DonationRepository, OrderRepository},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Credited {
        order_id: String,
        campaign_id: Uuid,
        amount: Decimal,
        collected: Decimal,
    },
    AlreadyProcessed { order_id: String },
    NotSuccessful { order_id: String, payment_status: String },
    TestPing,
    Ignored { event_type: Option<String> },
    Incomplete { event_type: String, reason: String },
    Malformed,
    InvalidSignature,
    OrphanOrder { order_id: String },
    Failed { order_id: String, reason: String },
    TimedOut,
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Credited { .. } => "credited",
            ReconcileOutcome::AlreadyProcessed { .. } => "already_processed",
            ReconcileOutcome::NotSuccessful { .. } => "not_successful",
            ReconcileOutcome::TestPing => "test",
            ReconcileOutcome::Ignored { .. } => "ignored",
            ReconcileOutcome::Incomplete { .. } => "incomplete",
            ReconcileOutcome::Malformed => "malformed",
            ReconcileOutcome::InvalidSignature => "invalid_signature",
            ReconcileOutcome::OrphanOrder { .. } => "orphan_order",
            ReconcileOutcome::Failed { .. } => "failed",
            ReconcileOutcome::TimedOut => "timed_out",
        }
    }
}

/// A webhook request as it arrived: raw body plus signature headers.
#[derive(Debug, Clone, Copy)]
pub struct WebhookDelivery<'a> {
    pub body: &'a [u8],
    pub signature: Option<&'a str>,
    pub timestamp: Option<&'a str>,
}

pub struct Reconciler {
    order_repo: Arc<dyn OrderRepository>,
    donation_repo: Arc<dyn DonationRepository>,
    webhook_secret: Option<String>,
    timeout: Duration,
}

impl Reconciler {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        donation_repo: Arc<dyn DonationRepository>,
        webhook_secret: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            order_repo,
            donation_repo,
            webhook_secret,
            timeout,
        }
    }

    /// Entry point for the webhook endpoint. Checks the signature when a
    /// secret is configured, then processes the payload.
    pub async fn handle_webhook(&self, delivery: WebhookDelivery<'_>) -> ReconcileOutcome {
        if let Some(secret) = &self.webhook_secret {
            let valid = match (delivery.timestamp, delivery.signature) {
                (Some(timestamp), Some(signature)) => {
                    verify_signature(secret, timestamp, delivery.body, signature)
                }
                _ => false,
            };
            if !valid {
                tracing::warn!("Dropping webhook with missing or invalid signature");
                return ReconcileOutcome::InvalidSignature;
            }
        }

        self.handle_payload(delivery.body).await
    }

    /// Processes one raw payload within the configured time bound. If the
    /// bound is hit while the ledger transaction is open it rolls back; if
    /// it is hit after the commit the credit stands and only the outcome
    /// is lost, so a timeout says nothing certain about the order.
    pub async fn handle_payload(&self, raw: &[u8]) -> ReconcileOutcome {
        match tokio::time::timeout(self.timeout, self.process(raw)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout.as_secs(),
                    "Webhook processing timed out; the credit may already be committed, check the order status before crediting manually"
                );
                ReconcileOutcome::TimedOut
            }
        }
    }

    async fn process(&self, raw: &[u8]) -> ReconcileOutcome {
        let event = match parse_webhook(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, body_len = raw.len(), "Discarding malformed webhook body");
                return ReconcileOutcome::Malformed;
            }
        };

        match event {
            WebhookEvent::Test => {
                tracing::info!("Received provider test webhook");
                ReconcileOutcome::TestPing
            }
            WebhookEvent::Ignored { event_type } => {
                tracing::info!(event_type = %event_type, "Ignoring webhook event type");
                ReconcileOutcome::Ignored { event_type: Some(event_type) }
            }
            WebhookEvent::Legacy { order_id } => {
                tracing::warn!(
                    order_id = order_id.as_deref().unwrap_or("-"),
                    "Received flat legacy webhook payload; not supported"
                );
                ReconcileOutcome::Ignored { event_type: None }
            }
            WebhookEvent::Unrecognized => {
                tracing::warn!("Webhook payload has no event type");
                ReconcileOutcome::Ignored { event_type: None }
            }
            WebhookEvent::Incomplete { event_type, reason } => {
                tracing::error!(
                    event_type = %event_type,
                    reason = reason,
                    "Payment webhook is missing required fields"
                );
                ReconcileOutcome::Incomplete {
                    event_type,
                    reason: reason.to_string(),
                }
            }
            WebhookEvent::Payment { event_type, notification } => {
                self.process_payment(&event_type, &notification).await
            }
        }
    }

    async fn process_payment(&self, event_type: &str, notification: &PaymentNotification) -> ReconcileOutcome {
        if !notification.is_success() {
            tracing::info!(
                order_id = %notification.order_id,
                event_type = %event_type,
                payment_status = %notification.payment_status,
                "Payment not successful; ledger unchanged"
            );
            return ReconcileOutcome::NotSuccessful {
                order_id: notification.order_id.clone(),
                payment_status: notification.payment_status.clone(),
            };
        }

        match self.credit(notification).await {
            Ok(outcome) => outcome,
            Err(AppError::OrphanOrder(order_id)) => {
                tracing::error!(
                    order_id = %order_id,
                    event_type = %event_type,
                    reason = "no tracked order",
                    "Orphan payment: webhook references an order we never created"
                );
                ReconcileOutcome::OrphanOrder { order_id }
            }
            Err(e) => {
                tracing::error!(
                    order_id = %notification.order_id,
                    event_type = %event_type,
                    reason = %e,
                    "Failed to credit payment; manual reconciliation required"
                );
                ReconcileOutcome::Failed {
                    order_id: notification.order_id.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Credits a successful payment at most once per order id.
    pub async fn credit(&self, notification: &PaymentNotification) -> Result<ReconcileOutcome> {
        let order_id = notification.order_id.as_str();

        if self.donation_repo.find_by_order_id(order_id).await?.is_some() {
            tracing::info!(order_id = %order_id, "Payment already processed");
            return Ok(ReconcileOutcome::AlreadyProcessed { order_id: order_id.to_string() });
        }

        let order = self.order_repo
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::OrphanOrder(order_id.to_string()))?;

        if order.amount != notification.order_amount {
            tracing::warn!(
                order_id = %order_id,
                tracked = %order.amount,
                reported = %notification.order_amount,
                "Reported amount differs from tracked order; crediting reported amount"
            );
        }

        let details = notification.details();
        let outcome = self.donation_repo
            .credit(NewDonation {
                order_id: order_id.to_string(),
                user_id: order.user_id,
                campaign_id: order.campaign_id,
                amount: notification.order_amount,
                details: details.clone(),
            })
            .await?;

        let (donation, collected) = match outcome {
            CreditOutcome::Credited { donation, collected } => (donation, collected),
            CreditOutcome::AlreadyCredited => {
                tracing::info!(order_id = %order_id, "Concurrent delivery already credited this order");
                return Ok(ReconcileOutcome::AlreadyProcessed { order_id: order_id.to_string() });
            }
        };

        tracing::info!(
            order_id = %order_id,
            campaign_id = %donation.campaign_id,
            amount = %donation.amount,
            collected = %collected,
            "Donation credited"
        );

        // The ledger is already correct at this point; the order row only mirrors it.
        match self.order_repo.mark_completed(order_id, &details).await {
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!(order_id = %order_id, "Order vanished before status update"),
            Err(e) => tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Donation credited but order status update failed"
            ),
        }

        Ok(ReconcileOutcome::Credited {
            order_id: order_id.to_string(),
            campaign_id: donation.campaign_id,
            amount: donation.amount,
            collected,
        })
    }
}

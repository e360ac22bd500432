use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::PaymentDetails;

/// Immutable record of a reconciled payment. At most one exists per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub amount: Decimal,
    pub status: DonationStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub transaction_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Completed,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub order_id: String,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub amount: Decimal,
    pub details: PaymentDetails,
}

/// Result of the insert-and-credit step.
#[derive(Debug, Clone)]
pub enum CreditOutcome {
    /// The donation row was inserted and the campaign total incremented.
    Credited { donation: Donation, collected: Decimal },
    /// A donation for this order already exists; nothing changed.
    AlreadyCredited,
}

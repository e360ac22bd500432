//! Inbound payment-provider notifications.
//!
//! Provider payloads are loosely shaped: fields are optional, several event
//! type strings exist, and dashboard test pings share the endpoint. Parsing
//! turns a raw body into a [`WebhookEvent`] so the reconciler only ever sees
//! recognised shapes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::{
    domain::{
        money::{parse_amount, to_minor_units},
        PaymentDetails,
    },
    payments::gateway::json_scalar_to_string,
};

/// Event types that report a captured payment.
pub const SUCCESS_EVENT_TYPES: [&str; 2] = ["PAYMENT_SUCCESS_WEBHOOK", "PAYMENT_CHARGES_WEBHOOK"];

/// `payment_status` value of a successful payment.
pub const SUCCESS_STATUS: &str = "SUCCESS";

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

#[derive(Debug, Error)]
pub enum WebhookParseError {
    #[error("Malformed webhook body: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// Dashboard test ping.
    Test,
    /// A payment-success event with its extracted notification.
    Payment {
        event_type: String,
        notification: PaymentNotification,
    },
    /// A recognised envelope whose event type we do not act on.
    Ignored { event_type: String },
    /// A success event missing the fields needed to credit anything.
    Incomplete {
        event_type: String,
        reason: &'static str,
    },
    /// The older flat payload (`orderId`, `txStatus` at top level).
    Legacy { order_id: Option<String> },
    /// Valid JSON with no event type.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub order_id: String,
    pub order_amount: Decimal,
    pub payment_status: String,
    /// Provider payment id (`cf_payment_id`).
    pub reference_id: Option<String>,
    pub payment_mode: Option<String>,
    pub tx_time: Option<String>,
    pub tx_msg: Option<String>,
}

impl PaymentNotification {
    pub fn is_success(&self) -> bool {
        self.payment_status.eq_ignore_ascii_case(SUCCESS_STATUS)
    }

    pub fn details(&self) -> PaymentDetails {
        PaymentDetails {
            payment_method: self.payment_mode.clone(),
            transaction_id: self.reference_id.clone(),
            transaction_message: self.tx_msg.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: Option<String>,
    data: Option<EnvelopeData>,
    #[serde(rename = "orderId")]
    legacy_order_id: Option<Value>,
    #[serde(rename = "txStatus")]
    legacy_tx_status: Option<Value>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    order: Option<OrderSection>,
    payment: Option<PaymentSection>,
    test_object: Option<Value>,
}

#[derive(Deserialize)]
struct OrderSection {
    order_id: Option<Value>,
    order_amount: Option<Value>,
}

#[derive(Deserialize)]
struct PaymentSection {
    payment_status: Option<String>,
    cf_payment_id: Option<Value>,
    payment_group: Option<String>,
    payment_time: Option<String>,
    payment_message: Option<String>,
}

/// Classifies a raw webhook body.
pub fn parse_webhook(raw: &[u8]) -> Result<WebhookEvent, WebhookParseError> {
    let envelope: Envelope = serde_json::from_slice(raw)?;

    if envelope
        .data
        .as_ref()
        .is_some_and(|data| data.test_object.is_some())
    {
        return Ok(WebhookEvent::Test);
    }

    let Some(event_type) = envelope.event_type else {
        if envelope.legacy_order_id.is_some() || envelope.legacy_tx_status.is_some() {
            return Ok(WebhookEvent::Legacy {
                order_id: envelope.legacy_order_id.as_ref().and_then(json_scalar_to_string),
            });
        }
        return Ok(WebhookEvent::Unrecognized);
    };

    if !SUCCESS_EVENT_TYPES.contains(&event_type.as_str()) {
        return Ok(WebhookEvent::Ignored { event_type });
    }

    let Some(data) = envelope.data else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "missing data" });
    };
    let Some(order) = data.order else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "missing data.order" });
    };
    let Some(payment) = data.payment else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "missing data.payment" });
    };

    let order_id = order
        .order_id
        .as_ref()
        .and_then(json_scalar_to_string)
        .filter(|id| !id.trim().is_empty());
    let Some(order_id) = order_id else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "missing order_id" });
    };

    let order_amount = order
        .order_amount
        .as_ref()
        .and_then(parse_amount)
        .filter(|amount| to_minor_units(*amount).is_some_and(|minor| minor > 0));
    let Some(order_amount) = order_amount else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "invalid order_amount" });
    };

    let Some(payment_status) = payment.payment_status else {
        return Ok(WebhookEvent::Incomplete { event_type, reason: "missing payment_status" });
    };

    Ok(WebhookEvent::Payment {
        event_type,
        notification: PaymentNotification {
            order_id,
            order_amount,
            payment_status,
            reference_id: payment.cf_payment_id.as_ref().and_then(json_scalar_to_string),
            payment_mode: payment.payment_group,
            tx_time: payment.payment_time,
            tx_msg: payment.payment_message,
        },
    })
}

/// `base64(HMAC-SHA256(secret, timestamp || body))`.
pub fn compute_signature(secret: &str, timestamp: &str, raw_body: &[u8]) -> Option<String> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(raw_body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, timestamp: &str, raw_body: &[u8], signature: &str) -> bool {
    compute_signature(secret, timestamp, raw_body).is_some_and(|expected| {
        expected.as_bytes().ct_eq(signature.trim().as_bytes()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_payload(order_id: &str, amount: Value, status: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "type": "PAYMENT_SUCCESS_WEBHOOK",
            "data": {
                "order": { "order_id": order_id, "order_amount": amount },
                "payment": {
                    "payment_status": status,
                    "cf_payment_id": 885_123_456u64,
                    "payment_group": "upi",
                    "payment_time": "2024-01-02T10:00:00+05:30",
                    "payment_message": "Transaction successful"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_success_event_extracts_notification() {
        let event = parse_webhook(&success_payload("order_1", json!("500.00"), "SUCCESS")).unwrap();
        let WebhookEvent::Payment { event_type, notification } = event else {
            panic!("expected a payment event, got {:?}", event);
        };
        assert_eq!(event_type, "PAYMENT_SUCCESS_WEBHOOK");
        assert_eq!(notification.order_id, "order_1");
        assert_eq!(notification.order_amount, Decimal::from(500));
        assert!(notification.is_success());
        assert_eq!(notification.reference_id.as_deref(), Some("885123456"));
        assert_eq!(notification.payment_mode.as_deref(), Some("upi"));
    }

    #[test]
    fn test_charges_event_is_a_payment_event() {
        let body = json!({
            "type": "PAYMENT_CHARGES_WEBHOOK",
            "data": {
                "order": { "order_id": "order_2", "order_amount": 250 },
                "payment": { "payment_status": "SUCCESS" }
            }
        });
        let event = parse_webhook(body.to_string().as_bytes()).unwrap();
        assert!(matches!(event, WebhookEvent::Payment { .. }));
    }

    #[test]
    fn test_failed_status_is_parsed_but_not_success() {
        let event = parse_webhook(&success_payload("order_1", json!(500), "FAILED")).unwrap();
        match event {
            WebhookEvent::Payment { notification, .. } => assert!(!notification.is_success()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_test_object_wins_over_everything_else() {
        let body = json!({ "type": "PAYMENT_SUCCESS_WEBHOOK", "data": { "test_object": { "ping": true } } });
        assert_eq!(parse_webhook(body.to_string().as_bytes()).unwrap(), WebhookEvent::Test);
    }

    #[test]
    fn test_other_event_types_are_ignored() {
        let body = json!({ "type": "PAYMENT_FAILED_WEBHOOK", "data": {} });
        assert_eq!(
            parse_webhook(body.to_string().as_bytes()).unwrap(),
            WebhookEvent::Ignored { event_type: "PAYMENT_FAILED_WEBHOOK".to_string() }
        );
    }

    #[test]
    fn test_flat_payload_is_legacy() {
        let body = json!({ "orderId": "order_9", "txStatus": "SUCCESS", "orderAmount": "10.00" });
        assert_eq!(
            parse_webhook(body.to_string().as_bytes()).unwrap(),
            WebhookEvent::Legacy { order_id: Some("order_9".to_string()) }
        );
    }

    #[test]
    fn test_missing_or_bad_amount_is_incomplete() {
        let event = parse_webhook(&success_payload("order_1", json!("12.345"), "SUCCESS")).unwrap();
        assert!(matches!(event, WebhookEvent::Incomplete { reason: "invalid order_amount", .. }));

        let event = parse_webhook(&success_payload("order_1", json!(-5), "SUCCESS")).unwrap();
        assert!(matches!(event, WebhookEvent::Incomplete { .. }));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_webhook(b"{not json").is_err());
        assert!(parse_webhook(b"[1, 2, 3]").is_err());
    }

    #[test]
    fn test_signature_round_trip_and_tamper() {
        let body = br#"{"type":"PAYMENT_SUCCESS_WEBHOOK"}"#;
        let signature = compute_signature("secret", "1700000000", body).unwrap();
        assert!(verify_signature("secret", "1700000000", body, &signature));
        assert!(!verify_signature("secret", "1700000001", body, &signature));
        assert!(!verify_signature("other", "1700000000", body, &signature));
        assert!(!verify_signature("secret", "1700000000", b"{}", &signature));
    }
}

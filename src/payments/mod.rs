pub mod cashfree_client;
pub mod gateway;
pub mod webhook;

pub use cashfree_client::CashfreeClient;
pub use gateway::{
    CustomerDetails, GatewayOrder, GatewayOrderRequest, GatewayPayment, OrderMeta, PaymentGateway,
    UnconfiguredGateway,
};
pub use webhook::{parse_webhook, PaymentNotification, WebhookEvent};

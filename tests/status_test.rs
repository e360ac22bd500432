mod common;

use hopeforall::{
    config::Settings,
    domain::OrderStatus,
    error::AppError,
    repository::{CampaignRepository, DonationRepository},
    service::StatusRequester,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use common::*;

fn owner(user_id: Uuid) -> StatusRequester {
    StatusRequester { user_id, is_admin: false }
}

fn successful_payment(amount: i64) -> serde_json::Value {
    json!({
        "cf_payment_id": 5114910386u64,
        "payment_status": "SUCCESS",
        "payment_amount": amount,
        "payment_group": "upi",
        "payment_time": "2024-01-02T10:00:00+05:30",
        "payment_message": "Transaction successful"
    })
}

#[tokio::test]
async fn test_owner_sees_gateway_and_local_state() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let donor = Uuid::new_v4();
    let order = track_order(&ctx.services, campaign.id, donor, Decimal::from(50)).await?;
    ctx.gateway.set_payments(&order.order_id, vec![
        json!({ "cf_payment_id": 2, "payment_status": "FAILED" }),
        json!({ "cf_payment_id": 1, "payment_status": "USER_DROPPED" }),
    ]);

    let view = ctx.services.status_prober.get_status(&order.order_id, owner(donor)).await?;

    assert_eq!(view.order["order_id"], json!(order.order_id));
    assert_eq!(view.payments.len(), 2);
    assert_eq!(view.latest_payment.as_ref().unwrap()["payment_status"], json!("FAILED"));
    assert_eq!(view.local_order.as_ref().unwrap().status, OrderStatus::Pending);
    assert!(view.donation.is_none());

    let rendered = serde_json::to_value(&view)?;
    assert!(rendered.get("latestPayment").is_some());
    assert!(rendered.get("localOrder").is_some());

    Ok(())
}

#[tokio::test]
async fn test_status_access_rules() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let donor = Uuid::new_v4();
    let order = track_order(&ctx.services, campaign.id, donor, Decimal::from(50)).await?;
    let prober = &ctx.services.status_prober;

    let stranger = prober.get_status(&order.order_id, owner(Uuid::new_v4())).await;
    assert!(matches!(stranger, Err(AppError::Forbidden)));

    let admin = StatusRequester { user_id: Uuid::new_v4(), is_admin: true };
    assert!(prober.get_status(&order.order_id, admin).await.is_ok());

    let untracked = prober.get_status("order_1_unknown", owner(donor)).await;
    assert!(matches!(untracked, Err(AppError::NotFound(_))));

    let invalid = prober.get_status("order/../../x", owner(donor)).await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn test_probe_does_not_credit_by_default() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let donor = Uuid::new_v4();
    let order = track_order(&ctx.services, campaign.id, donor, Decimal::from(50)).await?;
    ctx.gateway.set_payments(&order.order_id, vec![successful_payment(50)]);

    let view = ctx.services.status_prober.get_status(&order.order_id, owner(donor)).await?;

    assert_eq!(view.local_order.unwrap().status, OrderStatus::Pending);
    assert!(view.donation.is_none());
    let campaign = ctx.services.campaign_repo.find_by_id(campaign.id).await?.unwrap();
    assert_eq!(campaign.collected, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn test_probe_credits_through_shared_path_when_enabled() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.payments.reconcile_on_status = true;
    let ctx = test_context_with(settings).await?;
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let donor = Uuid::new_v4();
    let order = track_order(&ctx.services, campaign.id, donor, Decimal::from(50)).await?;
    ctx.gateway.set_payments(&order.order_id, vec![successful_payment(50)]);

    let view = ctx.services.status_prober.get_status(&order.order_id, owner(donor)).await?;
    assert_eq!(view.local_order.unwrap().status, OrderStatus::Completed);
    assert_eq!(view.donation.unwrap().amount, Decimal::from(50));

    // A late webhook for the same payment must not add to the total again.
    let outcome = ctx.services.reconciler
        .handle_payload(&success_webhook(&order.order_id, json!(50)))
        .await;
    assert_eq!(outcome.label(), "already_processed");

    // Probing again is harmless too.
    ctx.services.status_prober.get_status(&order.order_id, owner(donor)).await?;

    let campaign = ctx.services.campaign_repo.find_by_id(campaign.id).await?.unwrap();
    assert_eq!(campaign.collected, Decimal::from(50));
    assert_eq!(ctx.services.donation_repo.list_by_campaign(campaign.id).await?.len(), 1);

    Ok(())
}

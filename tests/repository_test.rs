mod common;

use std::str::FromStr;

use chrono::Utc;
use hopeforall::{
    domain::{
        CreditOutcome, NewDonation, OrderStatus, PaymentDetails, UpdateCampaignRequest, Volunteer,
        VolunteerApplication, VolunteerStatus,
    },
    error::AppError,
    repository::{
        CampaignRepository, DonationRepository, OrderRepository, SqliteCampaignRepository,
        SqliteDonationRepository, SqliteOrderRepository, SqliteVolunteerRepository,
        VolunteerRepository,
    },
};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::*;

fn donation(order_id: &str, campaign_id: Uuid, amount: &str) -> NewDonation {
    NewDonation {
        order_id: order_id.to_string(),
        user_id: Uuid::new_v4(),
        campaign_id,
        amount: Decimal::from_str(amount).unwrap(),
        details: PaymentDetails {
            payment_method: Some("card".to_string()),
            transaction_id: Some("cf_1".to_string()),
            transaction_message: None,
        },
    }
}

#[tokio::test]
async fn test_campaign_crud() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteCampaignRepository::new(ctx.pool.clone());

    let first = create_campaign(&ctx.services, 5_000).await?;
    let second = create_campaign(&ctx.services, 7_500).await?;
    assert_eq!(first.collected, Decimal::ZERO);
    assert_eq!(first.goal, Decimal::from(5_000));

    let listed = repo.list().await?;
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|c| c.id == second.id));

    let total = repo.increment_collected(first.id, Decimal::from_str("12.34")?).await?;
    assert_eq!(total, Decimal::from_str("12.34")?);

    let mut edited = repo.find_by_id(first.id).await?.unwrap();
    edited.title = "Renamed".to_string();
    edited.goal = Decimal::from(6_000);
    edited.collected = Decimal::from(1_000_000);
    let updated = repo.update(&edited).await?;
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.goal, Decimal::from(6_000));
    // Editing never moves the collected total.
    assert_eq!(updated.collected, Decimal::from_str("12.34")?);

    assert!(repo.find_by_id(Uuid::new_v4()).await?.is_none());
    assert!(matches!(
        repo.increment_collected(Uuid::new_v4(), Decimal::ONE).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.increment_collected(first.id, Decimal::ZERO).await,
        Err(AppError::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_campaign_service_defaults_and_updates() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let service = &ctx.services.campaign_service;
    let admin = Uuid::new_v4();

    let request = serde_json::from_value(serde_json::json!({
        "title": "  Flood Relief ",
        "description": "Emergency kits",
        "goal": 100000
    }))?;
    let campaign = service.create(admin, request).await?;
    assert_eq!(campaign.title, "Flood Relief");
    assert_eq!(campaign.category, "General");
    assert_eq!(campaign.start_date, Utc::now().date_naive());
    assert_eq!(campaign.created_by, admin);

    let no_goal = serde_json::from_value(serde_json::json!({ "title": "x", "description": "y" }))?;
    assert!(matches!(service.create(admin, no_goal).await, Err(AppError::Validation(_))));

    let updated = service
        .update(campaign.id, UpdateCampaignRequest {
            category: Some("Disaster Relief".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(updated.category, "Disaster Relief");
    assert_eq!(updated.title, "Flood Relief");

    let ledger = service.ledger(campaign.id).await?;
    assert!(ledger.balanced);
    assert_eq!(ledger.donation_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_order_store_transitions() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteOrderRepository::new(ctx.pool.clone());
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let order = track_order(&ctx.services, campaign.id, Uuid::new_v4(), Decimal::from(10)).await?;
    assert_eq!(order.status, OrderStatus::Pending);

    let details = PaymentDetails {
        payment_method: Some("upi".to_string()),
        transaction_id: Some("42".to_string()),
        transaction_message: Some("ok".to_string()),
    };
    let completed = repo.mark_completed(&order.order_id, &details).await?.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(completed.transaction_id.as_deref(), Some("42"));

    // Completed orders keep their first set of details.
    let again = repo.mark_completed(&order.order_id, &PaymentDetails::default()).await?.unwrap();
    assert_eq!(again.transaction_id.as_deref(), Some("42"));

    assert!(repo.mark_completed("order_0_none", &details).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_credit_is_unique_per_order() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteDonationRepository::new(ctx.pool.clone());
    let campaign = create_campaign(&ctx.services, 1_000).await?;

    let first = repo.credit(donation("order_1_a", campaign.id, "30.00")).await?;
    match first {
        CreditOutcome::Credited { ref donation, collected } => {
            assert_eq!(donation.order_id, "order_1_a");
            assert_eq!(collected, Decimal::from(30));
        }
        CreditOutcome::AlreadyCredited => panic!("first credit must insert"),
    }

    let second = repo.credit(donation("order_1_a", campaign.id, "30.00")).await?;
    assert!(matches!(second, CreditOutcome::AlreadyCredited));

    let campaign = ctx.services.campaign_repo.find_by_id(campaign.id).await?.unwrap();
    assert_eq!(campaign.collected, Decimal::from(30));
    assert_eq!(repo.list_all().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_credit_rolls_back_ledger_row() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteDonationRepository::new(ctx.pool.clone());

    let result = repo.credit(donation("order_1_b", Uuid::new_v4(), "5.00")).await;
    assert!(result.is_err());
    assert!(repo.find_by_order_id("order_1_b").await?.is_none());

    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let invalid = repo.credit(donation("order_1_c", campaign.id, "0.001")).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    assert!(repo.find_by_order_id("order_1_c").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_donation_listings() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteDonationRepository::new(ctx.pool.clone());
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let other = create_campaign(&ctx.services, 1_000).await?;

    let mut mine = donation("order_2_a", campaign.id, "1.00");
    let me = mine.user_id;
    repo.credit(mine.clone()).await?;
    mine.order_id = "order_2_b".to_string();
    mine.campaign_id = other.id;
    repo.credit(mine).await?;
    repo.credit(donation("order_2_c", campaign.id, "2.00")).await?;

    assert_eq!(repo.list_by_user(me).await?.len(), 2);
    assert_eq!(repo.list_by_campaign(campaign.id).await?.len(), 2);
    assert_eq!(repo.list_all().await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_volunteer_applications() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let repo = SqliteVolunteerRepository::new(ctx.pool.clone());
    let campaign = create_campaign(&ctx.services, 1_000).await?;
    let user = Uuid::new_v4();

    let applied = ctx.services.volunteer_service
        .apply(user, VolunteerApplication {
            campaign_id: campaign.id,
            message: Some("Weekends free".to_string()),
        })
        .await?;
    assert_eq!(applied.status, VolunteerStatus::Pending);

    let unknown = ctx.services.volunteer_service
        .apply(user, VolunteerApplication { campaign_id: Uuid::new_v4(), message: None })
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let now = Utc::now();
    repo.create(Volunteer {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        campaign_id: campaign.id,
        message: None,
        status: VolunteerStatus::Pending,
        applied_at: now,
        updated_at: now,
    }).await?;

    assert_eq!(repo.list_by_user(user).await?.len(), 1);
    assert_eq!(repo.list_all().await?.len(), 2);

    let approved = repo.update_status(applied.id, VolunteerStatus::Approved).await?;
    assert_eq!(approved.status, VolunteerStatus::Approved);
    assert!(matches!(
        repo.update_status(Uuid::new_v4(), VolunteerStatus::Rejected).await,
        Err(AppError::NotFound(_))
    ));

    Ok(())
}

use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::lorem::en::{Paragraph, Words},
    Fake,
};
use hopeforall::{
    domain::Campaign,
    repository::{CampaignRepository, SqliteCampaignRepository},
};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

const CATEGORIES: [&str; 5] = ["General", "Education", "Health", "Disaster Relief", "Environment"];

/// Populate a HopeForAll database with demo campaigns.
#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Args {
    /// SQLite connection string; falls back to DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Number of campaigns to create.
    #[arg(long, default_value_t = 8)]
    campaigns: usize,

    /// Owner recorded as `created_by`; a random id when omitted.
    #[arg(long)]
    admin_id: Option<Uuid>,
}

fn title_case(words: Vec<String>) -> String {
    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://hopeforall.db?mode=rwc".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    // Run migrations first
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let campaign_repo = SqliteCampaignRepository::new(db_pool.clone());
    let created_by = args.admin_id.unwrap_or_else(Uuid::new_v4);
    let mut rng = rand::thread_rng();

    println!("🎯 Creating {} campaigns...", args.campaigns);
    for i in 0..args.campaigns {
        let now = Utc::now();
        let start_date = now.date_naive() - Duration::days(rng.gen_range(0..30));
        let goal_rupees: i64 = rng.gen_range(10..500) * 1_000;

        let campaign = campaign_repo.create(Campaign {
            id: Uuid::new_v4(),
            title: title_case(Words(2..5).fake()),
            description: Paragraph(2..4).fake(),
            goal: Decimal::from(goal_rupees),
            collected: Decimal::ZERO,
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
            start_date,
            end_date: Some(start_date + Duration::days(rng.gen_range(30..120))),
            image_url: None,
            created_by,
            created_at: now,
            updated_at: now,
        }).await?;

        println!("   • {} (goal {})", campaign.title, campaign.goal);
    }

    println!("✅ Seeding complete. Campaign owner: {}", created_by);

    Ok(())
}

use avanee_recurring::{
    config::{database, schedules},
    core::{processing, recurring, summary},
    errors::Result,
};
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since variables can be set externally
    dotenv().ok();

    // 3. Load engine settings and schedule seeds
    let config = schedules::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database ready at {}", database::get_database_url());

    // 5. Seed schedules declared in config.toml
    recurring::seed_schedules(&db, &config).await?;

    // 6. Process everything due today
    let today = Utc::now().date_naive();
    if processing::is_processing_needed(&db, today).await? {
        info!("Running recurring processing for {today}");
        let result =
            processing::process_due_schedules(&db, today, config.engine.max_catch_up_steps)
                .await
                .inspect_err(|e| error!("Recurring processing failed: {e}"))?;
        println!("{}", processing::format_processing_summary(&result));
    } else {
        info!("Recurring processing already ran for {today}, skipping");
    }

    // 7. Print the dashboard summary
    let overview =
        summary::generate_summary(&db, today, config.engine.due_soon_window_days).await?;
    println!("{}", summary::format_summary(&overview));

    Ok(())
}

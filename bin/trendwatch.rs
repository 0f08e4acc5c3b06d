use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use trendwatch::scoring::RandomScorer;
use trendwatch::scraper::HttpSnapshotSource;
use trendwatch::{CronScheduler, Database, Settings, VideoProcessor};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let db = Database::new(settings.clone())
        .await
        .context("Failed to initialize database connection")?;

    run_tracker(settings, db).await
}

async fn run_tracker(settings: Arc<Settings>, db: Database) -> anyhow::Result<()> {
    let search_limit = u32::try_from(settings.discovery.per_query_limit)
        .context("discovery.per_query_limit is too large")?;
    let source = HttpSnapshotSource::new(&settings.scraper, search_limit)
        .context("Failed to build HTTP client")?;

    let processor = Arc::new(VideoProcessor::new(
        source,
        db.postgres.as_ref().clone(),
        RandomScorer,
        settings.discovery.clone(),
    ));

    let cancellation_token = CancellationToken::new();

    let cron_scheduler = CronScheduler::new(processor, settings.schedule.clone());
    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!(
        "Scrape cycle scheduled every {}s",
        settings.schedule.scrape_interval_secs
    );

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Tracker running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    cancellation_token.cancel();

    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    info!("Tracker stopped");
    Ok(())
}

//! Cron scheduler for the periodic scrape cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::ScheduleSettings;
use crate::db::{PostgresClient, VideoStore};
use crate::scoring::{IntegrityScorer, RandomScorer};
use crate::scraper::{HttpSnapshotSource, SnapshotSource};
use crate::worker::VideoProcessor;

use super::jobs;

/// Cron scheduler that runs the scrape cycle on a fixed interval.
///
/// A tick that fires while the previous cycle is still running is skipped,
/// so at most one cycle writes at a time.
pub struct CronScheduler<Src = HttpSnapshotSource, St = PostgresClient, Sc = RandomScorer> {
    processor: Arc<VideoProcessor<Src, St, Sc>>,
    settings: ScheduleSettings,
    running: Arc<Mutex<()>>,
}

impl<Src, St, Sc> CronScheduler<Src, St, Sc>
where
    Src: SnapshotSource + 'static,
    St: VideoStore + 'static,
    Sc: IntegrityScorer + 'static,
{
    pub fn new(processor: Arc<VideoProcessor<Src, St, Sc>>, settings: ScheduleSettings) -> Self {
        Self {
            processor,
            settings,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    ///
    /// A startup cycle still in flight at cancellation is aborted; each
    /// video write is its own transaction, so no row is left half-written.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_scrape_cycle_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started");

        let startup = self.settings.run_on_startup.then(|| {
            let processor = self.processor.clone();
            let running = self.running.clone();
            tokio::spawn(async move { run_exclusive(&processor, &running).await })
        });

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;

        if let Some(handle) = startup {
            if !handle.is_finished() {
                info!("Stopping startup scrape cycle...");
                handle.abort();
            }
            let _ = handle.await;
        }
        Ok(())
    }

    async fn register_scrape_cycle_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let processor = self.processor.clone();
        let running = self.running.clone();
        let interval = self.settings.scrape_interval_secs;

        let job = Job::new_repeated_async(Duration::from_secs(interval), move |_uuid, _lock| {
            let processor = processor.clone();
            let running = running.clone();
            Box::pin(async move { run_exclusive(&processor, &running).await })
        })?;

        scheduler.add(job).await?;
        info!("Registered scrape_cycle job (every {}s)", interval);
        Ok(())
    }
}

async fn run_exclusive<Src, St, Sc>(
    processor: &VideoProcessor<Src, St, Sc>,
    running: &Mutex<()>,
) where
    Src: SnapshotSource,
    St: VideoStore,
    Sc: IntegrityScorer,
{
    let Ok(_guard) = running.try_lock() else {
        warn!("Previous scrape cycle still running, skipping this tick");
        return;
    };

    if let Err(e) = jobs::scrape_cycle::run(processor).await {
        error!("Scrape cycle failed: {:#}", e);
    }
}

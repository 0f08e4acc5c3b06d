use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::config::DiscoverySettings;
use crate::db::VideoStore;
use crate::scoring::IntegrityScorer;
use crate::scraper::SnapshotSource;
use crate::trend::{apply_snapshot, RecordWrite};

/// Outcome counts of one scrape pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub created: usize,
    pub updated: usize,
    /// Videos or searches that errored; retried next cycle.
    pub failed: usize,
    /// Search hits that were already tracked.
    pub skipped: usize,
}

impl CycleReport {
    fn record(&mut self, write: &RecordWrite) {
        if write.is_create() {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }

    pub fn merge(self, other: CycleReport) -> CycleReport {
        CycleReport {
            created: self.created + other.created,
            updated: self.updated + other.updated,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} failed, {} skipped",
            self.created, self.updated, self.failed, self.skipped
        )
    }
}

/// Drives scrape-and-record for tracked and newly discovered videos.
///
/// Each video goes READ-EXISTING -> CREATE | UPDATE inside one
/// [`VideoStore::record_snapshot`] call. A failure is logged and counted
/// and leaves the stored row as it was; the next cycle retries it.
pub struct VideoProcessor<Src, St, Sc> {
    source: Src,
    store: St,
    scorer: Sc,
    discovery: DiscoverySettings,
}

impl<Src, St, Sc> VideoProcessor<Src, St, Sc>
where
    Src: SnapshotSource,
    St: VideoStore,
    Sc: IntegrityScorer,
{
    pub fn new(source: Src, store: St, scorer: Sc, discovery: DiscoverySettings) -> Self {
        Self {
            source,
            store,
            scorer,
            discovery,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Scrapes `url` and records the snapshot under the current hour.
    pub async fn process_video(&self, url: &str) -> Result<RecordWrite> {
        self.process_video_at(url, Utc::now()).await
    }

    pub async fn process_video_at(&self, url: &str, now: DateTime<Utc>) -> Result<RecordWrite> {
        let snapshot = self
            .source
            .fetch_snapshot(url)
            .await
            .with_context(|| format!("Failed to fetch snapshot for {}", url))?;

        let scorer = &self.scorer;
        self.store
            .record_snapshot(url, move |existing| {
                apply_snapshot(existing, snapshot, now, scorer).map_err(anyhow::Error::from)
            })
            .await
            .with_context(|| format!("Failed to record snapshot for {}", url))
    }

    /// Re-scrapes every tracked video.
    pub async fn refresh_known(&self) -> Result<CycleReport> {
        let urls = self
            .store
            .list_video_urls()
            .await
            .context("Failed to list tracked videos")?;

        let mut report = CycleReport::default();
        for url in &urls {
            self.process_into(url, &mut report).await;
        }

        info!("Refreshed {} tracked videos: {}", urls.len(), report);
        Ok(report)
    }

    /// Searches for new videos while fewer than `max_videos` are tracked.
    ///
    /// The first `per_query_limit` hits of each query are considered; hits
    /// that are already stored are skipped rather than scraped again.
    pub async fn discover(&self) -> Result<CycleReport> {
        let tracked = self
            .store
            .list_video_urls()
            .await
            .context("Failed to count tracked videos")?
            .len();

        let mut report = CycleReport::default();
        if tracked >= self.discovery.max_videos {
            debug!(
                "Tracking {} videos (limit {}), skipping discovery",
                tracked, self.discovery.max_videos
            );
            return Ok(report);
        }

        for query in &self.discovery.queries {
            let hits = match self.source.search_videos(query).await {
                Ok(hits) => hits,
                Err(e) => {
                    error!("Search for {:?} failed: {:#}", query, e);
                    report.failed += 1;
                    continue;
                },
            };

            for url in hits.iter().take(self.discovery.per_query_limit) {
                match self.store.get_video(url).await {
                    Ok(Some(_)) => report.skipped += 1,
                    Ok(None) => self.process_into(url, &mut report).await,
                    Err(e) => {
                        error!("Failed to look up video {}: {:#}", url, e);
                        report.failed += 1;
                    },
                }
            }
        }

        info!("Discovery finished: {}", report);
        Ok(report)
    }

    /// One full pass: refresh everything tracked, then discover.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let refreshed = self.refresh_known().await?;
        let discovered = self.discover().await?;
        Ok(refreshed.merge(discovered))
    }

    async fn process_into(&self, url: &str, report: &mut CycleReport) {
        match self.process_video(url).await {
            Ok(write) => report.record(&write),
            Err(e) => {
                error!("Failed to process video {}: {:#}", url, e);
                report.failed += 1;
            },
        }
    }
}

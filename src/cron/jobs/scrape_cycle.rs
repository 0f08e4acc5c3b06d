//! Hourly scrape cycle: refresh tracked videos, then discover new ones.

use anyhow::Result;
use log::info;

use crate::db::VideoStore;
use crate::scoring::IntegrityScorer;
use crate::scraper::SnapshotSource;
use crate::worker::{CycleReport, VideoProcessor};

pub async fn run<Src, St, Sc>(processor: &VideoProcessor<Src, St, Sc>) -> Result<CycleReport>
where
    Src: SnapshotSource,
    St: VideoStore,
    Sc: IntegrityScorer,
{
    info!("Starting scrape_cycle job...");

    let start = std::time::Instant::now();
    let report = processor.run_cycle().await?;

    info!("Completed scrape_cycle job in {:?} ({})", start.elapsed(), report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::config::DiscoverySettings;
    use crate::db::memory::MemoryStore;
    use crate::scraper::VideoSnapshot;

    struct Offline;

    impl SnapshotSource for Offline {
        async fn fetch_snapshot(&self, video_url: &str) -> Result<VideoSnapshot> {
            Err(anyhow!("{} unreachable", video_url))
        }

        async fn search_videos(&self, query: &str) -> Result<Vec<String>> {
            Err(anyhow!("search {} unreachable", query))
        }
    }

    struct Half;

    impl IntegrityScorer for Half {
        fn score(&self) -> u8 {
            50
        }
    }

    #[tokio::test]
    async fn test_offline_source_fails_searches_without_aborting() {
        let discovery = DiscoverySettings {
            queries: vec!["a".to_string(), "b".to_string()],
            per_query_limit: 5,
            max_videos: 41,
        };
        let processor = VideoProcessor::new(Offline, MemoryStore::default(), Half, discovery);

        let report = run(&processor).await.unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(report.created, 0);
    }
}

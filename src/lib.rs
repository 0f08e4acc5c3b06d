pub mod config;
pub mod cron;
pub mod db;
pub mod report;
pub mod scoring;
pub mod scraper;
pub mod trend;
pub mod utils;
pub mod worker;

pub use config::Settings;
pub use cron::CronScheduler;
pub use db::Database;
pub use worker::{CycleReport, VideoProcessor};

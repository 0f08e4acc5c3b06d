//! Utility functions shared by the scraper, the store and the reports.
//!
//! - [`text`] - parsing of counters, dates and video URLs scraped from the platform
//! - [`conversion`] - checked integer conversions at the PostgreSQL boundary

mod conversion;
mod text;

pub use conversion::{to_count, to_db_int};
pub use text::{embed_url, parse_count, parse_upload_date, video_id_from_url};

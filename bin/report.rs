use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use simple_logger::SimpleLogger;

use trendwatch::db::PostgresClient;
use trendwatch::report::{self, DateRange};
use trendwatch::Settings;

/// Prints dashboard data from the tracker database as JSON.
#[derive(Parser)]
#[command(name = "report", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Latest counters per video
    Videos {
        /// Case-insensitive title filter; empty matches all
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Totals and average score per channel
    Channels {
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Integrity-band histogram
    Histogram {
        #[arg(value_enum)]
        kind: HistogramKind,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Deduped trend of one video
    VideoTrend {
        url: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Summed trend of every video of a channel
    ChannelTrend {
        channel_url: String,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HistogramKind {
    Videos,
    Channels,
    Engagement,
}

#[derive(clap::Args)]
struct RangeArgs {
    /// First day, YYYY-MM-DD (default: yesterday)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD (default: today)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self) -> DateRange {
        let default = DateRange::default();
        DateRange::new(self.start.unwrap_or(default.start), self.end.unwrap_or(default.end))
    }
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .init()
        .context("Failed to initialize logger")?;

    let cli = Cli::parse();
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;
    let postgres = PostgresClient::new(settings.postgres)
        .await
        .context("Failed to connect to PostgreSQL")?;

    match cli.command {
        Command::Videos { title } => print_json(&postgres.video_summaries(&title).await?),
        Command::Channels { title } => print_json(&postgres.channel_summaries(&title).await?),
        Command::Histogram { kind, title } => match kind {
            HistogramKind::Videos => {
                let videos = postgres.video_summaries(&title).await?;
                print_json(&report::video_band_histogram(&videos))
            },
            HistogramKind::Channels => {
                let channels = postgres.channel_summaries(&title).await?;
                print_json(&report::channel_band_histogram(&channels))
            },
            HistogramKind::Engagement => {
                let videos = postgres.video_summaries(&title).await?;
                print_json(&report::band_engagement(&videos))
            },
        },
        Command::VideoTrend { url, range } => {
            match report::video_trend(&postgres, &url, range.resolve()).await? {
                Some(trend) => print_json(&trend),
                None => anyhow::bail!("Video {} is not tracked", url),
            }
        },
        Command::ChannelTrend { channel_url, range } => {
            print_json(&report::channel_trend(&postgres, &channel_url, range.resolve()).await?)
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use chrono::{DateTime, NaiveDateTime};
use url::Url;

use crate::trend::series::TIMESTAMP_FORMAT;

/// Parses a scraped counter such as `"1234 views"`, `"1,234"` or `"1.2K"`.
///
/// Blank text counts as zero: the platform leaves like/dislike/comment
/// counters empty when nothing has been recorded yet.
pub fn parse_count(text: &str) -> Option<u64> {
    let Some(token) = text.split_whitespace().next() else {
        return Some(0);
    };
    let token = token.replace(',', "");

    let (number, multiplier) = match token.chars().last()?.to_ascii_uppercase() {
        'K' => (&token[..token.len() - 1], 1_000.0),
        'M' => (&token[..token.len() - 1], 1_000_000.0),
        'B' => (&token[..token.len() - 1], 1_000_000_000.0),
        _ => return token.parse().ok(),
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

/// Parses an upload date in any of the forms the platform has been seen to
/// produce:
///
/// - RFC 3339 (`2024-03-03T14:05:00.000Z`)
/// - the canonical stored form (`2024-03-03 14:05:00`)
/// - the page tooltip (`First published at 14:05 UTC on March 3rd, 2024.`)
pub fn parse_upload_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    parse_published_text(text)
}

fn parse_published_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim_end_matches('.');
    let (_, rest) = text.split_once(" at ")?;
    let (time, date) = rest.split_once(" UTC on ")?;

    let mut parts = date.split_whitespace();
    let month = parts.next()?;
    let day = parts
        .next()?
        .trim_end_matches(',')
        .trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let year = parts.next()?;

    let normalized = format!("{} {} {} {}", time.trim(), month, day, year);
    NaiveDateTime::parse_from_str(&normalized, "%H:%M %B %d %Y").ok()
}

/// Extracts the video id from `https://host/video/<id>/`.
pub fn video_id_from_url(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "video")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Embeddable player URL for a video page URL.
pub fn embed_url(video_url: &str) -> String {
    video_url.replacen("/video/", "/embed/", 1)
}

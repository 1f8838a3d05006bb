//! Projection of raw yt-dlp records onto the fixed `Playlist` / `Video` schema.
//!
//! Every function here is total: missing or oddly typed input degrades to an
//! empty value instead of an error.

use serde_json::Value;

use crate::model::{FetchMode, Playlist, RawRecord, Video};

const CHANNEL_BASE: &str = "https://www.youtube.com";

/// Returns the value under `key`, unchanged, if it is a non-empty string.
fn text(raw: &RawRecord, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn first_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(raw, key))
}

/// String array under `key`; absent when missing or empty.
fn string_list(raw: &RawRecord, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .get(key)
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.to_string())
        .collect();
    if items.is_empty() { None } else { Some(items) }
}

fn dimension(thumb: &Value, key: &str) -> u64 {
    thumb[key]
        .as_u64()
        .or_else(|| thumb[key].as_f64().map(|v| v.max(0.0) as u64))
        .unwrap_or(0)
}

/// URL of the candidate in `thumbnails` with the largest width×height.
/// Ties go to the earliest candidate. Empty string when there is none.
pub fn best_thumbnail(raw: &RawRecord) -> String {
    raw.get("thumbnails")
        .and_then(Value::as_array)
        .and_then(|thumbs| {
            thumbs
                .iter()
                .rev()
                .max_by_key(|t| dimension(t, "width").saturating_mul(dimension(t, "height")))
        })
        .and_then(|t| t["url"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Duration in whole seconds; yt-dlp reports floats for some extractors.
pub fn duration_seconds(raw: &RawRecord) -> Option<i64> {
    let value = raw.get("duration")?;
    value.as_i64().or_else(|| value.as_f64().map(|v| v as i64))
}

/// `H:MM:SS` from one hour up, `M:SS` below, `0:00` for zero, negative or unknown.
pub fn format_duration(seconds: Option<i64>) -> String {
    let seconds = match seconds {
        Some(s) if s > 0 => s,
        _ => return "0:00".to_string(),
    };
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Canonical channel page for an uploader or channel identifier.
/// Handles (`@name`) map to the handle URL, everything else to `/channel/<id>`.
pub fn channel_url_for(id: Option<&str>) -> String {
    match id {
        Some(id) if id.starts_with('@') => format!("{}/{}", CHANNEL_BASE, id),
        Some(id) if !id.is_empty() => format!("{}/channel/{}", CHANNEL_BASE, id),
        _ => String::new(),
    }
}

pub fn uploader_url(raw: &RawRecord) -> String {
    channel_url_for(text(raw, "uploader_id").as_deref())
}

pub fn channel_url(raw: &RawRecord) -> String {
    channel_url_for(text(raw, "channel_id").as_deref())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn thumbnail(raw: &RawRecord) -> Option<String> {
    non_empty(best_thumbnail(raw)).or_else(|| text(raw, "thumbnail"))
}

/// Projects a deep-fetched (or fallen-back flat) record onto the video schema.
pub fn minimize_video(raw: &RawRecord) -> Video {
    let seconds = duration_seconds(raw);
    let title = text(raw, "title");

    Video {
        id: text(raw, "id"),
        fulltitle: text(raw, "fulltitle").or_else(|| title.clone()),
        title,
        channel: text(raw, "channel"),
        uploader: text(raw, "uploader"),
        uploader_id: text(raw, "uploader_id"),
        channel_id: text(raw, "channel_id"),
        uploader_url: non_empty(uploader_url(raw)),
        channel_url: non_empty(channel_url(raw)),
        original_url: first_text(raw, &["original_url", "webpage_url", "url"]),
        webpage_url: first_text(raw, &["webpage_url", "url"]),
        thumbnail: thumbnail(raw),
        upload_date: text(raw, "upload_date"),
        duration: seconds.filter(|s| *s >= 0).map(|s| s as u64),
        duration_string: text(raw, "duration_string")
            .unwrap_or_else(|| format_duration(seconds)),
        description: text(raw, "description"),
        categories: string_list(raw, "categories"),
        tags: string_list(raw, "tags"),
    }
}

/// Projects a flat playlist entry. Deep-only fields are unavailable, so
/// `categories`/`tags` are forced empty and `fulltitle` mirrors `title`.
pub fn minimize_flat_entry(raw: &RawRecord) -> Video {
    let seconds = duration_seconds(raw);
    let title = text(raw, "title");
    let url = first_text(raw, &["url", "webpage_url"]);

    Video {
        id: text(raw, "id"),
        fulltitle: title.clone(),
        title,
        channel: text(raw, "channel"),
        uploader: text(raw, "uploader"),
        uploader_id: text(raw, "uploader_id"),
        channel_id: text(raw, "channel_id"),
        uploader_url: non_empty(uploader_url(raw)),
        channel_url: non_empty(channel_url(raw)),
        original_url: url.clone(),
        webpage_url: url,
        thumbnail: thumbnail(raw),
        upload_date: text(raw, "upload_date"),
        duration: seconds.filter(|s| *s >= 0).map(|s| s as u64),
        duration_string: format_duration(seconds),
        description: text(raw, "description"),
        categories: Some(Vec::new()),
        tags: Some(Vec::new()),
    }
}

/// Projects a playlist record, minimizing entries in source order and
/// dropping null (unavailable) ones.
pub fn minimize_playlist(raw: &RawRecord, mode: FetchMode) -> Playlist {
    let entries = raw
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|entry| match mode {
                    FetchMode::Fast => minimize_flat_entry(entry),
                    FetchMode::Full => minimize_video(entry),
                })
                .collect()
        })
        .unwrap_or_default();

    Playlist {
        id: text(raw, "id"),
        title: text(raw, "title"),
        channel: text(raw, "channel"),
        uploader: text(raw, "uploader"),
        uploader_id: text(raw, "uploader_id"),
        channel_id: text(raw, "channel_id"),
        uploader_url: non_empty(uploader_url(raw)),
        channel_url: non_empty(channel_url(raw)),
        thumbnail: thumbnail(raw),
        description: text(raw, "description"),
        categories: string_list(raw, "categories"),
        tags: string_list(raw, "tags"),
        entries,
    }
}

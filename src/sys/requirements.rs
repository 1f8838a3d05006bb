use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::model::task::Task;

const SECTION_HEADER: &str = "# playlists";

lazy_static! {
    static ref PLAYLIST_LINE: Regex =
        Regex::new(r"^\s*([^#=\n]+?)\s*=\s*([A-Za-z0-9_-]+)\s*$").unwrap();
}

/// Reads `name = id` pairs from the `# Playlists` section of a requirements document.
///
/// A missing file yields an empty list; whether that is fatal is up to the caller.
pub fn load_playlists(path: &Path) -> Result<Vec<Task>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_playlists(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("Requirements file {} not found", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub fn parse_playlists(content: &str) -> Vec<Task> {
    let mut playlists = Vec::new();
    let mut in_section = false;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if line.to_lowercase() == SECTION_HEADER {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }

        // Next top-level section ends ours
        if line.starts_with("# ") {
            break;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match PLAYLIST_LINE.captures(line) {
            Some(caps) => playlists.push(Task::new(caps[1].trim(), caps[2].trim())),
            None => log::debug!("Skipping unrecognised playlist line: {}", line),
        }
    }

    playlists
}

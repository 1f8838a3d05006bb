use crate::model::Playlist;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `<out_dir>/<playlist id>.json`, or `playlist.json` when the id is unknown.
pub fn output_path(playlist: &Playlist, out_dir: &Path) -> PathBuf {
    let stem = playlist
        .id
        .as_deref()
        .map(|id| id.replace(['/', '\\'], "_"))
        .filter(|id| !id.is_empty() && id != "." && id != "..")
        .unwrap_or_else(|| "playlist".to_string());
    out_dir.join(format!("{}.json", stem))
}

/// Writes the playlist as indented UTF-8 JSON, replacing any previous file.
pub fn save_playlist(playlist: &Playlist, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;

    let path = output_path(playlist, out_dir);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, playlist)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::info!("Saved {} entries to {}", playlist.entries.len(), path.display());
    Ok(path)
}

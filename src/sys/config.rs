use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::ClientProfile;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,
    #[serde(default)]
    pub client: ClientProfile,
    #[serde(default = "default_playlist_limit")]
    pub playlist_limit: u32,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_ytdlp() -> String { "yt-dlp".to_string() }
fn default_playlist_limit() -> u32 { 1000 }
fn default_progress_every() -> usize { 25 }
fn default_output_directory() -> String { "data".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            client: ClientProfile::default(),
            playlist_limit: default_playlist_limit(),
            progress_every: default_progress_every(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { directory: default_output_directory() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        ProjectDirs::from("com", "ytpl-export", "ytpl-export")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| home_dir().join(".ytpl-export").join("config.toml"))
    }

    pub fn default_log_path() -> PathBuf {
        ProjectDirs::from("com", "ytpl-export", "ytpl-export")
            .map(|proj_dirs| proj_dirs.data_local_dir().join("ytpl-export.log"))
            .unwrap_or_else(|| home_dir().join(".ytpl-export").join("ytpl-export.log"))
    }

    /// Loads the user config, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring invalid config {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Could not read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            return home_dir().join(rest);
        }
        if path == "~" {
            return home_dir();
        }
        PathBuf::from(path)
    }
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

use crate::cli::Cli;
use crate::model::{ClientProfile, FetchMode};
use crate::sys::config::Config;
use std::path::PathBuf;

/// Effective runtime options: config file values with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ytdlp_path: String,
    pub client: ClientProfile,
    pub playlist_limit: u32,
    pub progress_every: usize,
    pub mode: FetchMode,
    pub out_dir: PathBuf,

    pub enable_logging: bool,
    pub log_level: log::LevelFilter,
    pub log_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            client: ClientProfile::Web,
            playlist_limit: 1000,
            progress_every: 25,
            mode: FetchMode::Full,
            out_dir: PathBuf::from("data"),
            enable_logging: false,
            log_level: log::LevelFilter::Info,
            log_path: Config::default_log_path(),
        }
    }
}

impl Settings {
    pub fn from_config(config: Config) -> Self {
        let mut settings = Self::default();

        settings.ytdlp_path = Config::expand_tilde(&config.extractor.ytdlp)
            .to_string_lossy()
            .to_string();
        settings.client = config.extractor.client;
        settings.playlist_limit = config.extractor.playlist_limit.max(1);
        settings.progress_every = config.extractor.progress_every.max(1);
        settings.out_dir = Config::expand_tilde(&config.output.directory);

        settings.enable_logging = config.logging.enabled;
        settings.log_level = config
            .logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info);
        if let Some(path) = config.logging.path {
            settings.log_path = path;
        }

        settings
    }

    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(client) = cli.client {
            self.client = client;
        }
        if let Some(dir) = &cli.out_dir {
            self.out_dir = dir.clone();
        }
        if cli.fast {
            self.mode = FetchMode::Fast;
        }
        self
    }
}

use std::path::Path;
use anyhow::{Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Warnings and errors always reach stderr; with `file_level` set, the log file
/// at `path` receives everything down to that level. A log file that cannot be
/// opened is reported on stderr and skipped.
pub fn init_logger(path: &Path, file_level: Option<LevelFilter>) -> Result<()> {
    let (dispatch, file_error) = build_dispatch(path, file_level);
    dispatch.apply()?;

    if let Some(e) = file_error {
        log::warn!("Log file disabled: {:#}", e);
    }
    Ok(())
}

fn build_dispatch(
    path: &Path,
    file_level: Option<LevelFilter>,
) -> (fern::Dispatch, Option<anyhow::Error>) {
    let dispatch = fern::Dispatch::new().chain(stderr_dispatch());

    match file_level.map(|level| file_dispatch(path, level)) {
        Some(Ok(file)) => (dispatch.chain(file), None),
        Some(Err(e)) => (dispatch, Some(e)),
        None => (dispatch, None),
    }
}

fn stderr_dispatch() -> fern::Dispatch {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}]   {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .chain(std::io::stderr())
}

fn file_dispatch(path: &Path, level: LevelFilter) -> Result<fern::Dispatch> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = fern::log_file(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    Ok(fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}]   {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(file))
}

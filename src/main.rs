mod app;
mod cli;
mod model;
mod sys;

use anyhow::Result;
use app::cancel::Interrupt;
use clap::Parser;
use cli::Cli;
use model::settings::Settings;
use sys::config::Config;
use sys::yt::YtDlp;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_config(Config::load()).apply_cli(&cli);
    let file_level = settings.enable_logging.then_some(settings.log_level);
    if let Err(e) = sys::logging::init_logger(&settings.log_path, file_level) {
        eprintln!("Logging disabled: {:#}", e);
    }

    let tasks = app::resolve_tasks(&cli)?;

    let status = sys::deps::check_dependencies(&settings.ytdlp_path)?;
    log::info!(
        "yt-dlp {} | client={} | mode={} | out={}",
        status.yt_dlp_version,
        settings.client,
        settings.mode,
        settings.out_dir.display()
    );

    let interrupt = Interrupt::new();
    interrupt.listen_for_ctrl_c();

    let source = YtDlp::new(&settings, interrupt.clone());
    let report = app::run_batch(&tasks, &source, &settings, &interrupt).await;

    let lines: Vec<String> = report.outcomes.iter().map(|o| o.to_string()).collect();
    println!("{}", lines.join("\n"));
    println!("\n{}", report.summary());
    if report.interrupted() {
        println!("Interrupted: remaining playlists were not processed.");
    }

    Ok(())
}

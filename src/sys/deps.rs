use anyhow::{bail, Context, Result};
use std::process::Command;

pub struct DependencyStatus {
    pub yt_dlp_version: String,
}

pub fn check_dependencies(ytdlp_path: &str) -> Result<DependencyStatus> {
    let version = check_yt_dlp(ytdlp_path)?;

    Ok(DependencyStatus {
        yt_dlp_version: version,
    })
}

fn check_yt_dlp(ytdlp_path: &str) -> Result<String> {
    let output = Command::new(ytdlp_path)
        .arg("--version")
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {}. Is yt-dlp installed and in your PATH?",
                ytdlp_path
            )
        })?;

    if !output.status.success() {
        bail!("{} --version failed with status: {}", ytdlp_path, output.status);
    }

    let version_str = String::from_utf8(output.stdout)?.trim().to_string();
    Ok(version_str)
}

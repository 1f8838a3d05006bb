use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::model::ClientProfile;

#[derive(Parser, Debug)]
#[command(name = "ytpl-export")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["playlist", "all"])
))]
#[command(help_template = "NAME:
   {name} - YouTube playlist metadata to JSON

USAGE:
   ytpl-export <playlist | --all> [options]

VERSION:
   {version}

DESCRIPTION:
   Exports the metadata of a single playlist, or of every playlist listed under
   the '# Playlists' section of a requirements document, into one JSON file
   per playlist.

   Examples:
     • ytpl-export PLxxxxxxxxxxxxxxxx
     • ytpl-export \"https://www.youtube.com/playlist?list=PLxxxx\" --fast
     • ytpl-export --all --req notes/requirements.md --client android

GLOBAL OPTIONS:
{options}
")]
pub struct Cli {
    /// YouTube playlist URL or playlist ID (omit when using --all)
    pub playlist: Option<String>,

    /// Process all playlists listed in the requirements document
    #[arg(long)]
    pub all: bool,

    /// Path to the requirements document
    #[arg(long = "req", value_name = "PATH", default_value = "requirements.md")]
    pub requirements: PathBuf,

    /// Fast mode: keep flat entries (no per-video descriptions/dates)
    #[arg(long)]
    pub fast: bool,

    /// YouTube player client to use for extraction [default: web]
    #[arg(long, value_enum)]
    pub client: Option<ClientProfile>,

    /// Directory the JSON files are written to [default: data]
    #[arg(long = "out", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// print the version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub show_version: Option<bool>,
}

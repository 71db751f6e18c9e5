use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(bin_name = "roster")]
#[command(version)]
#[command(about = "A persons table behind a JSON API, with a polling terminal dashboard")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "DB_PATH",
        global = true,
        help = "Path to the SQLite database (default: db/roster.sqlite)."
    )]
    pub db: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        env = "ROSTER_CONFIG",
        global = true,
        help = "TOML config file (default: ./roster.toml when present)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v info, -vv debug). RUST_LOG overrides."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Serve the persons API over HTTP.")]
    Serve(ServeArgs),
    #[command(about = "Open the interactive dashboard against a running server.")]
    Dash(DashArgs),
    #[command(about = "Fetch and print every person from a running server.")]
    Ls(ListArgs),
    #[command(about = "Print shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(
        short = 'b',
        long,
        env = "ROSTER_BIND",
        help = "Address to listen on (default: 0.0.0.0:5000)."
    )]
    pub bind: Option<String>,
}

#[derive(Debug, Args)]
pub struct DashArgs {
    #[arg(
        short = 's',
        long,
        env = "ROSTER_SERVER_URL",
        help = "Base URL of the persons API (default: http://127.0.0.1:5000)."
    )]
    pub server_url: Option<String>,

    #[arg(
        short = 'p',
        long,
        env = "ROSTER_POLL_INTERVAL_MS",
        help = "Milliseconds between fetch attempts until data loads (default: 3000)."
    )]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        short = 's',
        long,
        env = "ROSTER_SERVER_URL",
        help = "Base URL of the persons API (default: http://127.0.0.1:5000)."
    )]
    pub server_url: Option<String>,

    #[arg(long, help = "Print JSON instead of a table.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for.")]
    pub shell: Shell,
}

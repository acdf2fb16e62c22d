//! Fanorona CLI - Command-line interface
//!
//! Commands:
//! - play: Play a game in the terminal (human or computer on either side)
//! - match: Play a batch of computer games and report statistics

mod match_cmd;
mod play_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use match_cmd::MatchArgs;
use play_cmd::PlayArgs;

#[derive(Parser)]
#[command(name = "fanorona")]
#[command(about = "Fanorona board game with computer opponents")]
struct Cli {
    /// Log every move and capture
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(PlayArgs),
    /// Play computer against computer
    Match(MatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep the board display clean during interactive play
    let default_level = match cli.command {
        Commands::Play(_) => "warn",
        Commands::Match(_) => "info",
    };
    init_logging(cli.verbose, default_level);

    match cli.command {
        Commands::Play(args) => play_cmd::run(args),
        Commands::Match(args) => match_cmd::run(args),
    }
}

fn init_logging(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

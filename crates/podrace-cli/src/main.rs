mod cmd;
mod output;
mod render;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "podrace",
    about = "Pick a track and a racer, then race them against the podrace service",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: .podrace/config.yaml above the working directory)
    #[arg(long, global = true, env = "PODRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Race service base URL, overrides server.base_url
    #[arg(long, global = true, env = "PODRACE_SERVER")]
    server: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tracks
    Tracks {
        /// Print the track cards as HTML
        #[arg(long)]
        html: bool,
    },

    /// List available racers
    Racers {
        /// Print the racer cards as HTML
        #[arg(long)]
        html: bool,
    },

    /// Run one race (Enter accelerates, Ctrl-C cancels)
    Race {
        /// Track id
        #[arg(long)]
        track: Option<u32>,

        /// Racer id to drive
        #[arg(long)]
        racer: Option<u32>,
    },

    /// Show, validate or initialise the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Race { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = root::config_path(cli.config.as_deref());
    let ctx = cmd::Context {
        config_path,
        server: cli.server,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Tracks { html } => cmd::reference::tracks(&ctx, html),
        Commands::Racers { html } => cmd::reference::racers(&ctx, html),
        Commands::Race { track, racer } => cmd::race::run(&ctx, track, racer),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

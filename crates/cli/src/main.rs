//! Matchday CLI
//!
//! Builds the training table from per-season result files and answers
//! team lookups against a previously exported table.
//!
//! Usage:
//!   matchday export --config matchday.json
//!   matchday lookup Arsenal --last-n 6
//!   matchday features Arsenal Chelsea

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use matchday_core::{Config, Season};
use matchday_features::{export_data, read_exports, write_exports};
use matchday_lookup::{LookupService, TeamKey};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "matchday")]
#[command(about = "Leakage-free match features for football result prediction")]
struct Cli {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Encoded feature table (overrides export.output_path)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Encoding table (overrides export.encoding_path)
    #[arg(long, global = true)]
    encoding: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load seasons, compute features and write the training table
    Export {
        /// Directory with one <season-code>.csv per season
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Last season to load, as a four-digit code
        #[arg(long)]
        last_season: Option<Season>,
        /// Also write the merged table with team names
        #[arg(long)]
        named_output: Option<PathBuf>,
        /// Fail on a season that cannot be loaded
        #[arg(long)]
        strict: bool,
    },
    /// Show a team's figures as of its latest match
    Lookup {
        /// Team name or encoded code
        team: String,
        /// Include averages over the last N matches
        #[arg(long)]
        last_n: Option<usize>,
    },
    /// Print the classifier feature vector for a fixture
    Features {
        /// Home team name or code
        home: String,
        /// Away team name or code
        away: String,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &cli.output {
        config.export.output_path = path.clone();
    }
    if let Some(path) = &cli.encoding {
        config.export.encoding_path = path.clone();
    }
    Ok(config)
}

fn run_export(
    mut config: Config,
    data_dir: Option<PathBuf>,
    last_season: Option<Season>,
    named_output: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.data.data_dir = dir;
    }
    if last_season.is_some() {
        config.data.last_season = last_season;
    }
    if named_output.is_some() {
        config.export.named_output_path = named_output;
    }
    config.data.strict |= strict;

    info!(
        data_dir = %config.data.data_dir.display(),
        history_start = %config.data.history_start,
        training_start = %config.data.training_start,
        "loading seasons"
    );
    let assembled = export_data(&config).with_context(|| {
        format!("building training table from {}", config.data.data_dir.display())
    })?;
    write_exports(&assembled, &config.export).context("writing exports")?;
    Ok(())
}

/// `RUST_LOG` when set, info otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Export {
            data_dir,
            last_season,
            named_output,
            strict,
        } => run_export(config, data_dir, last_season, named_output, strict),
        Commands::Lookup { team, last_n } => {
            let table = read_exports(&config.export).context("reading exported table")?;
            let lookup = LookupService::new(&table, &config.features);
            let stats = lookup.team_stats(TeamKey::parse(&team), last_n)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Features { home, away } => {
            let table = read_exports(&config.export).context("reading exported table")?;
            let lookup = LookupService::new(&table, &config.features);
            let features =
                lookup.prediction_features(TeamKey::parse(&home), TeamKey::parse(&away))?;
            println!("{}", serde_json::to_string_pretty(&features)?);
            Ok(())
        }
    }
}

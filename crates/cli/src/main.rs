//! commitwall command-line tool.
//!
//! Builds the commit wall journal from a directory of repositories and
//! replays it into a target repository, and helps manage the optional
//! configuration file.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commitwall_core::builder::{BuildOptions, BuildStats, WallBuilder};
use commitwall_core::config::{expand_tilde, WallConfig};
use commitwall_core::git::GitClient;
use commitwall_core::scanner::RepositoryScanner;

use crate::style::Mark;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Aggregate your commits from many repositories into one chronological wall.
#[derive(Parser, Debug)]
#[command(name = "commitwall", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "~/.config/commitwall/config.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the journal and replay it into the target repository.
    Build {
        /// Directory scanned for source repositories.
        collection: Option<PathBuf>,

        /// Repository receiving the journal and replay commits.
        target: Option<PathBuf>,

        /// Journal file name inside the target working tree.
        journal: Option<String>,

        /// Write the journal only; do not create replay commits.
        #[arg(long)]
        no_replay: bool,

        /// Print run statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the repositories a build would read.
    Scan {
        /// Directory scanned for source repositories.
        collection: Option<PathBuf>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./commitwall.toml")]
        output: PathBuf,
    },

    /// Validate the configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::marked(Mark::Failed, &format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = expand_tilde(Path::new(&cli.config));

    match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&config_path),
        Commands::Build {
            collection,
            target,
            journal,
            no_replay,
            json,
        } => {
            let mut config = load_config(&config_path)?;
            init_tracing(&config.wall.log_level);
            debug!(path = %config_path.display(), "configuration loaded");
            apply_overrides(&mut config, collection, target, journal);
            if no_replay {
                config.replay.enabled = false;
            }
            config.validate().context("invalid configuration")?;
            cmd_build(&config, json)
        }
        Commands::Scan { collection } => {
            let mut config = load_config(&config_path)?;
            init_tracing(&config.wall.log_level);
            apply_overrides(&mut config, collection, None, None);
            cmd_scan(&config)
        }
    }
}

/// Install the process-wide subscriber. `RUST_LOG` wins over the config.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<WallConfig> {
    let mut config = WallConfig::load_or_default(path).context("failed to load configuration")?;
    config.resolve_paths();
    Ok(config)
}

/// Positional arguments take precedence over the config file.
fn apply_overrides(
    config: &mut WallConfig,
    collection: Option<PathBuf>,
    target: Option<PathBuf>,
    journal: Option<String>,
) {
    if let Some(collection) = collection {
        config.wall.collection_path = Some(collection);
    }
    if let Some(target) = target {
        config.wall.target_path = Some(target);
    }
    if let Some(journal) = journal {
        config.wall.journal_file = journal;
    }
}

fn required<'a>(value: &'a Option<PathBuf>, what: &str) -> Result<&'a Path> {
    value.as_deref().with_context(|| {
        format!("no {what} given; pass it as an argument or set it in the config file")
    })
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_build(config: &WallConfig, json: bool) -> Result<()> {
    let collection = required(&config.wall.collection_path, "collection path")?;
    let target = required(&config.wall.target_path, "target repository")?;

    let builder = WallBuilder::new(BuildOptions::from(config));
    let outcome = builder
        .build(collection, target, &config.wall.journal_file)
        .context("commit wall build failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.stats).context("failed to encode stats")?
        );
    } else {
        print_summary(&outcome.stats, config.replay.enabled);
    }
    Ok(())
}

fn print_summary(stats: &BuildStats, replay: bool) {
    println!();
    println!("{}", style::title("Commit wall"));
    println!();
    println!("{}", style::row("Repositories", stats.repositories_found));
    if stats.repositories_skipped > 0 {
        println!("{}", style::row("Bare", stats.repositories_skipped));
    }
    println!("{}", style::row("Matched", stats.commits_matched));
    println!("{}", style::row("Duplicates", stats.duplicates_dropped));
    println!(
        "{}",
        style::row(
            "Journal",
            format!(
                "{} {}",
                stats.journal_entries,
                style::muted(&stats.journal_path.display().to_string())
            )
        )
    );
    if replay {
        println!("{}", style::row("Replayed", stats.replay_commits));
    } else {
        println!("{}", style::row("Replayed", style::muted("disabled")));
    }
    println!();
    println!("{}", style::marked(Mark::Ok, "done"));
}

fn cmd_scan(config: &WallConfig) -> Result<()> {
    let collection = required(&config.wall.collection_path, "collection path")?;
    let scanner = RepositoryScanner::new(collection).context("cannot scan collection")?;

    let mut count = 0;
    for path in scanner.scan() {
        count += 1;
        let line = match GitClient::open(&path) {
            Ok(client) if client.workdir().is_none() => {
                style::marked(Mark::Skipped, &format!("{} (bare)", path.display()))
            }
            Ok(_) => style::marked(Mark::Ok, &path.display().to_string()),
            Err(e) => style::marked(Mark::Failed, &format!("{} ({})", path.display(), e.message())),
        };
        println!("  {}", line);
    }

    println!();
    println!("{}", style::muted(&format!("{count} repositories found")));
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, WallConfig::default_template())
        .context("failed to write config file")?;

    println!(
        "{}",
        style::marked(Mark::Ok, &format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Set collection_path and target_path in the [wall] section");
    println!("  2. Validate with: commitwall validate --config {}", output.display());
    println!("  3. Build with: commitwall build --config {}", output.display());

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        WallConfig::load_from_file(config_path).context("failed to parse configuration")?;
    config.resolve_paths();
    println!("  {}", style::marked(Mark::Ok, "TOML structure is valid"));

    if let Err(e) = config.validate() {
        println!("  {}", style::marked(Mark::Failed, &format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::marked(Mark::Ok, "All fields are valid"));

    let show = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not set".to_string())
    };

    println!();
    println!("Configuration summary:");
    println!("  Collection    : {}", show(&config.wall.collection_path));
    println!("  Target        : {}", show(&config.wall.target_path));
    println!("  Journal file  : {}", config.wall.journal_file);
    println!("  Identity scope: {:?}", config.identity.scope);
    println!("  Replay        : {}", if config.replay.enabled { "enabled" } else { "disabled" });
    println!("  Log level     : {}", config.wall.log_level);

    Ok(())
}

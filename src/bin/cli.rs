//! CLI binary for the Selene lip-sync pipeline.
//!
//! Tracks and reports are written to stdout as JSON; all tracing output goes
//! to stderr so stdout can be piped straight into the animation front-end.

use anyhow::Context;
use clap::{Parser, Subcommand};
use selene::duration::estimate_total_ms;
use selene::startup::{DependencyStatus, initialize};
use selene::{LipSyncPipeline, SeleneConfig, SynthesisOutcome};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Selene: phoneme-to-viseme lip sync.
#[derive(Parser)]
#[command(name = "selene-lipsync", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Build a lip-sync track for a spoken reply.
    Sync {
        /// Text of the reply.
        text: String,

        /// Clip length in milliseconds.
        #[arg(long, conflicts_with = "wav", required_unless_present = "wav")]
        duration_ms: Option<i64>,

        /// Synthesized WAV clip; its length is read from the header.
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Use the timing-based fallback even if a phonemizer is loaded.
        #[arg(long)]
        fallback: bool,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Estimate clip length for text that has not been synthesized yet.
    Estimate {
        /// Text to estimate.
        text: String,
    },

    /// Print the phoneme to viseme table in effect.
    Visemes,

    /// Report phonemizer availability and the lip-sync mode.
    Status,

    /// Write the default configuration to a file.
    InitConfig {
        /// Destination (defaults to the standard config path).
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("selene=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => SeleneConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let path = SeleneConfig::default_config_path();
            if path.exists() {
                SeleneConfig::from_file(&path)?
            } else {
                SeleneConfig::default()
            }
        }
    };

    match cli.command {
        Command::Sync {
            text,
            duration_ms,
            wav,
            fallback,
            pretty,
        } => run_sync(&config, &text, duration_ms, wav, fallback, pretty),
        Command::Estimate { text } => {
            let ms = estimate_total_ms(&text, config.timing.words_per_minute);
            println!("{}", serde_json::json!({ "estimated_duration_ms": ms }));
            Ok(())
        }
        Command::Visemes => {
            let tables = selene::LipSyncTables::from_config(&config);
            for (symbol, category) in tables.visemes.entries() {
                println!(
                    "{symbol:<4} {:<13} weight={}",
                    category.as_str(),
                    tables.weights.weight(symbol)
                );
            }
            Ok(())
        }
        Command::Status => {
            let models = initialize(&config)?;
            let status = DependencyStatus::check(&models);
            println!("{}", serde_json::to_string_pretty(&status)?);
            eprintln!("Lip Sync: {}", status.mode.label());
            Ok(())
        }
        Command::InitConfig { path } => {
            let path = path.unwrap_or_else(SeleneConfig::default_config_path);
            SeleneConfig::default().save_to_file(&path)?;
            info!("wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn run_sync(
    config: &SeleneConfig,
    text: &str,
    duration_ms: Option<i64>,
    wav: Option<PathBuf>,
    force_fallback: bool,
    pretty: bool,
) -> anyhow::Result<()> {
    let models = initialize(config)?;
    let pipeline = LipSyncPipeline::with_models(config, models);

    let request = if force_fallback {
        pipeline.begin_fallback()
    } else {
        pipeline.begin()
    };

    let json = match (wav, duration_ms) {
        (Some(path), _) => {
            let outcome = SynthesisOutcome::from_wav_file(path)?;
            to_json(&request.respond(text, outcome), pretty)?
        }
        (None, Some(duration_ms)) => {
            let track = request.run(text, duration_ms)?;
            to_json(&track, pretty)?
        }
        (None, None) => anyhow::bail!("either --duration-ms or --wav is required"),
    };
    println!("{json}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

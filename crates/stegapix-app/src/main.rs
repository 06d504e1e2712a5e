// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stegapix — hide one found image inside another and publish the result.
//
// Entry point. Initialises logging, parses the command line, and dispatches
// to the service layer.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use stegapix_core::AppConfig;
use stegapix_core::config::{DEFAULT_LSB_BITS, validate_lsb_bits};
use stegapix_core::error::{Result, StegapixError};
use stegapix_core::human_errors::humanize_error;

use services::app_services::AppServices;
use services::{files, settings};

/// Stegapix - image steganography fed by image search
///
/// Finds an unused "message" image and an unused "veil" image, hides the
/// message in the veil's low bits, and publishes the composed PNG.
#[derive(Debug, Parser)]
#[command(name = "stegapix", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to stegapix.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the database, config, and published images
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one publishing cycle
    Run {
        /// Search term for the hidden image
        #[arg(long)]
        message_term: Option<String>,

        /// Search term for the carrier image
        #[arg(long)]
        veil_term: Option<String>,

        /// Continue each term from its last recorded page
        #[arg(long)]
        resume: bool,

        /// Low bits per channel used for the message (1-7)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=7))]
        lsb_bits: Option<u8>,
    },

    /// Hide a local image inside another local image
    ///
    /// The veil is resized to the message's dimensions. Output is PNG.
    Embed {
        #[arg(long)]
        veil: PathBuf,

        #[arg(long)]
        message: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = DEFAULT_LSB_BITS)]
        lsb_bits: u8,
    },

    /// Recover the hidden image from a composed PNG
    Extract {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = DEFAULT_LSB_BITS)]
        lsb_bits: u8,
    },

    /// Show what has been used and published so far
    Status {
        /// Number of recent artifacts to list
        #[arg(long, default_value_t = 10)]
        limit: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("error: {}", human.message);
            eprintln!("  hint: {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.as_deref();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Run {
            message_term,
            veil_term,
            resume,
            lsb_bits,
        } => {
            let mut services = AppServices::init(data_dir, config_path)?;
            apply_run_overrides(services.config_mut(), message_term, veil_term, resume, lsb_bits);
            let artifact = services.run_cycle()?;
            println!("published {}", artifact.artifact_id);
            println!("  message  {}", artifact.message_url);
            println!("  veil     {}", artifact.veil_url);
            println!("  size     {}x{}", artifact.width, artifact.height);
            println!("  sha256   {}", artifact.sha256);
        }
        Command::Embed {
            veil,
            message,
            output,
            lsb_bits,
        } => {
            validate_lsb_bits(lsb_bits)?;
            let (width, height) = files::embed_files(&veil, &message, &output, lsb_bits)?;
            println!("wrote {} ({width}x{height})", output.display());
        }
        Command::Extract {
            input,
            output,
            lsb_bits,
        } => {
            validate_lsb_bits(lsb_bits)?;
            let (width, height) = files::extract_file(&input, &output, lsb_bits)?;
            println!("wrote {} ({width}x{height})", output.display());
        }
        Command::Status { limit, json } => {
            let services = AppServices::init(data_dir, config_path)?;
            let report = services.status(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!("data dir     {}", report.data_dir.display());
            println!("config       {}", report.config_path.display());
            println!("seen urls    {}", report.seen_urls);
            for cursor in &report.cursors {
                println!("cursor       {:?} -> page {}", cursor.term, cursor.page_index);
            }
            for artifact in &report.recent_artifacts {
                println!(
                    "published    {} {} ({}x{})",
                    artifact.published_at.format("%Y-%m-%d %H:%M:%S"),
                    artifact.artifact_id,
                    artifact.width,
                    artifact.height
                );
            }
        }
        Command::InitConfig { force } => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => {
                    let dir = services::data_dir::data_dir(data_dir)?;
                    settings::default_config_path(&dir)
                }
            };
            init_config(&path, force)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

/// Command-line flags win over file settings.
fn apply_run_overrides(
    config: &mut AppConfig,
    message_term: Option<String>,
    veil_term: Option<String>,
    resume: bool,
    lsb_bits: Option<u8>,
) {
    if let Some(term) = message_term {
        config.message_search_term = term;
    }
    if let Some(term) = veil_term {
        config.veil_search_term = term;
    }
    if resume {
        config.resume_from_last_index = true;
    }
    if let Some(bits) = lsb_bits {
        config.lsb_bits = bits;
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(StegapixError::InvalidConfiguration(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    settings::persist_config(path, &AppConfig::default())
}

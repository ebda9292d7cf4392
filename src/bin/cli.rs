// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! bsdfview CLI

use anyhow::{Context, Result};
use bsdfview::cli::{init_logging, Reporter};
use bsdfview::{server, AppConfig, Dashboard, Rmtxop};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Instant, SystemTime};

#[derive(Parser)]
#[command(name = "bsdfview")]
#[command(about = "Annual daylight dashboard for Klems BSDF window systems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root holding the matrices, template results and model
    #[arg(short, long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Prefix log lines with the elapsed time
    #[arg(long, global = true)]
    log_timestamp: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and process BSDF XML files
    Upload {
        /// BSDF XML file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Select the active BSDF
    Select {
        /// Name of a loaded BSDF
        name: String,
    },

    /// Print the metrics table
    Table {
        /// Print as markdown
        #[arg(long)]
        markdown: bool,
    },

    /// Show the simulation parameters
    Info,

    /// Rebuild the 3D scene of a loaded BSDF
    Visualize {
        /// Name of a loaded BSDF, defaults to the active one
        name: Option<String>,
    },

    /// Start the web dashboard
    Serve {
        /// Listen address, defaults to the configured one
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose.saturating_add(1), cli.log_timestamp, SystemTime::now());

    if let Err(e) = run(cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        println!("bsdfview v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AppConfig::load(cli.root.as_deref())?;

    match cli.command {
        Commands::Upload { files } => upload_command(config, &files),
        Commands::Select { name } => {
            let mut dashboard = Dashboard::open(config)?;
            dashboard.select(&name)?;
            Reporter::success(&format!("{} is now active", name));
            Ok(())
        }
        Commands::Table { markdown } => {
            let dashboard = Dashboard::open(config)?;
            let state = dashboard.state();
            if markdown {
                print!("{}", state.metrics.to_markdown(&state.active_bsdf));
            } else {
                Reporter::report_table(&state.metrics, &state.active_bsdf);
            }
            Ok(())
        }
        Commands::Info => {
            Reporter::report_simulation_info(&config);
            Ok(())
        }
        Commands::Visualize { name } => {
            let mut dashboard = Dashboard::open(config)?;
            let name = name.unwrap_or_else(|| dashboard.state().active_bsdf.clone());
            Reporter::progress(&format!("Building scene for {}", name));
            let path = dashboard.rebuild_visualization(&name)?;
            Reporter::success(&format!("Scene written to {}", path.display()));
            Ok(())
        }
        Commands::Serve { addr } => serve_command(config, addr),
        Commands::Version => Ok(()),
    }
}

fn upload_command(config: AppConfig, files: &[PathBuf]) -> Result<()> {
    let rmtxop = Rmtxop::from_config(&config);
    if !rmtxop.is_available() {
        Reporter::report_warning("rmtxop was not found; valid BSDFs will fail to process");
    }
    let mut dashboard = Dashboard::open(config)?;

    let progress = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut rejected = 0;
    for file in files {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Invalid file path: {}", file.display()))?;
        if let Some(ref pb) = progress {
            pb.set_message(format!("Processing {}", file_name));
        }

        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let start = Instant::now();
        let outcome = dashboard.process_upload(&file_name, &bytes)?;
        let elapsed = start.elapsed();

        if outcome.is_rejected() {
            rejected += 1;
        }
        match progress {
            Some(ref pb) => pb.suspend(|| Reporter::report_upload(&outcome, elapsed)),
            None => Reporter::report_upload(&outcome, elapsed),
        }
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    let state = dashboard.state();
    Reporter::report_table(&state.metrics, &state.active_bsdf);

    if rejected > 0 {
        anyhow::bail!("{} of {} files were rejected", rejected, files.len());
    }
    Ok(())
}

fn serve_command(config: AppConfig, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.server_addr.clone());
    let dashboard = Dashboard::open(config)?;
    println!("{} http://{}", "Serving on".bold(), addr.cyan());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    runtime.block_on(server::serve(dashboard, &addr))
}

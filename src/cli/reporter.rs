// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::config::AppConfig;
use crate::metrics::{MetricsRow, MetricsTable};
use crate::pipeline::UploadOutcome;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the outcome of one uploaded file
    pub fn report_upload(outcome: &UploadOutcome, duration: Duration) {
        match outcome {
            UploadOutcome::Processed { name, row, scene } => {
                println!("\n{}", "━".repeat(80).bright_black());
                println!("{} {}", "Processed:".bold(), name.cyan());
                println!("{}", "━".repeat(80).bright_black());
                for (column, value) in MetricsRow::COLUMNS.iter().zip(row.values()) {
                    Self::print_metric(column, value);
                }
                println!(
                    "  {} {}",
                    "Scene:".bright_black(),
                    scene.display().to_string().cyan()
                );
                println!(
                    "  {} {}",
                    "Time:".bright_black(),
                    Self::format_duration(duration).yellow()
                );
                println!("{}", "━".repeat(80).bright_black());
            }
            UploadOutcome::AlreadyLoaded { name } => {
                Self::report_info(&format!("{} is already loaded", name));
            }
            UploadOutcome::Rejected { message, .. } => {
                Self::report_error(message);
            }
        }
    }

    /// Print the metrics table with the active BSDF marked
    pub fn report_table(table: &MetricsTable, active: &str) {
        if table.is_empty() {
            Self::report_warning("The metrics table is empty");
            return;
        }

        print!("\n{:<24}", "BSDF".bold());
        for column in MetricsRow::COLUMNS {
            print!(" {:>20}", column.bold());
        }
        println!();
        println!("{}", "─".repeat(24 + 21 * MetricsRow::COLUMNS.len()).bright_black());

        for row in table.rows() {
            let marker = if row.name == active { "▶ " } else { "  " };
            let label = format!("{}{}", marker, row.name);
            if row.name == active {
                print!("{:<24}", label.green().bold());
            } else {
                print!("{:<24}", label);
            }
            for value in row.values() {
                print!(" {:>20}", format!("{:.2}", value).cyan());
            }
            println!();
        }
    }

    /// Print the simulation parameters behind the results
    pub fn report_simulation_info(config: &AppConfig) {
        println!("\n{}", "Simulation parameters:".bold());
        println!(
            "  {} {}",
            "Daylight matrix:".bright_black(),
            config.simulation.daylight_matrix
        );
        println!(
            "  {} {}",
            "View matrix:".bright_black(),
            config.simulation.view_matrix
        );
        println!(
            "  {} {} lux",
            "DA threshold:".bright_black(),
            config.post_process.threshold
        );
        println!(
            "  {} {} - {} lux",
            "UDI range:".bright_black(),
            config.post_process.min_t,
            config.post_process.max_t
        );
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_metric(name: &str, value: f32) {
        let formatted = format!("{:.2}", value);
        let formatted = if value >= 50.0 {
            formatted.green()
        } else if value >= 25.0 {
            formatted.yellow()
        } else {
            formatted.red()
        };
        println!("  {} {}", format!("{}:", name).bright_black(), formatted);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    pub fn progress(message: &str) {
        println!("{} {}...", "⏳".bright_blue(), message.bright_black());
    }

    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

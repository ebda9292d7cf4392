// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Results folder seeding

use super::annual::read_sun_up_hours;
use super::npy::write_npy;
use super::schedule::HOURS_PER_YEAR;
use crate::config::AppConfig;
use crate::error::MatrixError;
use crate::radiance::Matrix;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively copy a folder
pub fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry.path().strip_prefix(source)?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)
                .with_context(|| format!("Failed to create {}", destination.display()))?;
        } else {
            fs::copy(entry.path(), &destination).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    destination.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Align matrix columns with the sun-up hours of a results folder
pub fn align_to_sun_up_hours(matrix: &Matrix, sun_up_hours: &[f32]) -> Result<Matrix, MatrixError> {
    if matrix.cols == sun_up_hours.len() {
        Ok(matrix.clone())
    } else if matrix.cols == HOURS_PER_YEAR {
        let columns: Vec<usize> = sun_up_hours
            .iter()
            .map(|h| (h.floor().max(0.0) as usize).min(HOURS_PER_YEAR - 1))
            .collect();
        Ok(matrix.select_columns(&columns))
    } else {
        Err(MatrixError::ColumnMismatch {
            cols: matrix.cols,
            sun_up: sun_up_hours.len(),
        })
    }
}

/// Copy the template results folder for a BSDF and save its illuminance array
pub fn copy_results_folder(config: &AppConfig, bsdf: &str, matrix: &Matrix) -> Result<PathBuf> {
    let target_folder = config.data_dir().join(bsdf);
    if !target_folder.exists() {
        let template = config.default_results_dir();
        if !template.is_dir() {
            anyhow::bail!("Template results folder not found: {}", template.display());
        }
        log::debug!("Seeding {} from {}", target_folder.display(), template.display());
        copy_tree(&template, &target_folder)?;
    }

    let sun_up_hours = read_sun_up_hours(&target_folder)?;
    let illuminance = matrix.to_illuminance();
    let aligned = align_to_sun_up_hours(&illuminance, &sun_up_hours)
        .with_context(|| format!("Illuminance matrix for {} does not fit the results folder", bsdf))?;

    let output = target_folder.join(&config.post_process.light_path_file);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    write_npy(&output, &aligned)?;
    log::info!(
        "Saved {}x{} illuminance array to {}",
        aligned.rows,
        aligned.cols,
        output.display()
    );

    Ok(target_folder)
}

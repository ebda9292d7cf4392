// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3D scenes of models coloured by annual metrics

mod legend;
mod scene;

pub use legend::{Legend, ORIGINAL_COLORS};
pub use scene::{export_glb, write_glb, GridData, SceneBuilder};

use crate::config::AppConfig;
use crate::model::Model;
use crate::results::{read_metric_values, Metric};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Build the scene for a metrics folder and return the `.glb` path
pub fn visualization_set(config: &AppConfig, model: &Model, metrics_folder: &Path) -> Result<PathBuf> {
    let metric: Metric = config.post_process.active_grid_data.parse()?;
    let name = metrics_folder
        .file_name()
        .context("Metrics folder has no name")?
        .to_string_lossy()
        .into_owned();

    let mut builder = SceneBuilder::new();
    builder.add_wireframe(model);
    builder.add_apertures(model);

    let legend = Legend::percent();
    for grid in model.sensor_grids() {
        let Some(mesh) = grid.mesh.as_ref() else {
            log::warn!("Sensor grid {} has no mesh and is not displayed", grid.identifier);
            continue;
        };
        let values_file = metric.grid_file(metrics_folder, &grid.identifier);
        if !values_file.is_file() {
            log::warn!("No {} values for grid {}", metric.folder(), grid.identifier);
            continue;
        }
        let values = read_metric_values(&values_file)?;
        builder.add_grid(
            &GridData {
                identifier: &grid.identifier,
                mesh,
                values: &values,
            },
            &legend,
            metric.folder(),
        )?;
    }

    let output_dir = config.visualization_dir();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let output = config.visualization_file(&name);
    export_glb(builder, &name, &output)
        .with_context(|| format!("Failed to write scene {}", output.display()))?;

    log::info!("Scene written to {}", output.display());
    Ok(output)
}

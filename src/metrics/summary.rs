// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scalar summary of a metrics folder

use crate::results::{read_metric_values, Metric};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sensors at or above this daylight autonomy count toward sDA
pub const SDA_DA_LIMIT: f32 = 50.0;

/// One row of the metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub name: String,
    #[serde(rename = "sDA")]
    pub sda: f32,
    #[serde(rename = "Average DA")]
    pub average_da: f32,
    #[serde(rename = "Average cDA")]
    pub average_cda: f32,
    #[serde(rename = "Average UDI")]
    pub average_udi: f32,
    #[serde(rename = "Average UDI (lower)")]
    pub average_udi_lower: f32,
    #[serde(rename = "Average UDI (upper)")]
    pub average_udi_upper: f32,
}

impl MetricsRow {
    pub const COLUMNS: [&'static str; 6] = [
        "sDA",
        "Average DA",
        "Average cDA",
        "Average UDI",
        "Average UDI (lower)",
        "Average UDI (upper)",
    ];

    /// Summarise the values of one grid in a metrics folder
    pub fn from_metrics_folder(name: &str, folder: &Path, grid: &str) -> Result<Self> {
        let load = |metric: Metric| read_metric_values(&metric.grid_file(folder, grid));

        let da = load(Metric::Da)?;
        if da.is_empty() {
            bail!("No daylight autonomy values for grid {} in {}", grid, folder.display());
        }

        Ok(Self {
            name: name.to_string(),
            sda: spatial_daylight_autonomy(&da),
            average_da: mean(&da),
            average_cda: mean(&load(Metric::Cda)?),
            average_udi: mean(&load(Metric::Udi)?),
            average_udi_lower: mean(&load(Metric::UdiLower)?),
            average_udi_upper: mean(&load(Metric::UdiUpper)?),
        })
    }

    /// Values in column order
    pub fn values(&self) -> [f32; 6] {
        [
            self.sda,
            self.average_da,
            self.average_cda,
            self.average_udi,
            self.average_udi_lower,
            self.average_udi_upper,
        ]
    }
}

/// Percentage of sensors with DA >= 50
pub fn spatial_daylight_autonomy(da: &[f32]) -> f32 {
    if da.is_empty() {
        return 0.0;
    }
    let passing = da.iter().filter(|v| **v >= SDA_DA_LIMIT).count();
    passing as f32 / da.len() as f32 * 100.0
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    (sum / values.len() as f64) as f32
}

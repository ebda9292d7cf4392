// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Annual daylight metrics from a results folder

use super::npy::read_npy;
use super::schedule::{default_schedule, occupancy_at};
use crate::config::AppConfig;
use crate::radiance::Matrix;
use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const GRIDS_INFO: &str = "grids_info.json";
pub const SUN_UP_HOURS: &str = "sun-up-hours.txt";

/// Entry of `grids_info.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridInfo {
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
    pub count: usize,
    #[serde(default)]
    pub full_id: Option<String>,
}

impl GridInfo {
    /// Stem of the grid's data files
    pub fn file_id(&self) -> &str {
        self.full_id
            .as_deref()
            .or(self.identifier.as_deref())
            .unwrap_or(&self.name)
    }
}

/// Annual daylight metric written to a metrics folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Da,
    Cda,
    Udi,
    UdiLower,
    UdiUpper,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Da,
        Metric::Cda,
        Metric::Udi,
        Metric::UdiLower,
        Metric::UdiUpper,
    ];

    /// Sub-folder name
    pub fn folder(&self) -> &'static str {
        match self {
            Metric::Da => "da",
            Metric::Cda => "cda",
            Metric::Udi => "udi",
            Metric::UdiLower => "udi_lower",
            Metric::UdiUpper => "udi_upper",
        }
    }

    /// File extension of the per-grid values
    pub fn extension(&self) -> &'static str {
        match self {
            Metric::Da => "da",
            Metric::Cda => "cda",
            Metric::Udi | Metric::UdiLower | Metric::UdiUpper => "udi",
        }
    }

    /// Path of a grid's values inside a metrics folder
    pub fn grid_file(&self, metrics_folder: &Path, grid: &str) -> PathBuf {
        metrics_folder
            .join(self.folder())
            .join(format!("{}.{}", grid, self.extension()))
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    /// Case-insensitive folder name, e.g. `da` or `UDI_lower`
    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.folder() == name)
            .ok_or_else(|| anyhow!("Unknown grid data '{}'", s))
    }
}

/// Illuminance thresholds in lux
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub threshold: f32,
    pub min_t: f32,
    pub max_t: f32,
}

impl Thresholds {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            threshold: config.post_process.threshold,
            min_t: config.post_process.min_t,
            max_t: config.post_process.max_t,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            threshold: 300.0,
            min_t: 100.0,
            max_t: 3000.0,
        }
    }
}

/// Per-sensor metric values of one grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridMetrics {
    pub da: Vec<f32>,
    pub cda: Vec<f32>,
    pub udi: Vec<f32>,
    pub udi_lower: Vec<f32>,
    pub udi_upper: Vec<f32>,
}

impl GridMetrics {
    pub fn values(&self, metric: Metric) -> &[f32] {
        match metric {
            Metric::Da => &self.da,
            Metric::Cda => &self.cda,
            Metric::Udi => &self.udi,
            Metric::UdiLower => &self.udi_lower,
            Metric::UdiUpper => &self.udi_upper,
        }
    }
}

/// Compute metrics for a sensors x sun-up-hours illuminance matrix
pub fn compute_metrics(
    illuminance: &Matrix,
    occupancy: &[bool],
    total_occupied: usize,
    thresholds: Thresholds,
) -> GridMetrics {
    let occupied_sun_up = occupancy.iter().filter(|o| **o).count();
    let sun_down_occupied = total_occupied.saturating_sub(occupied_sun_up) as f32;
    let scale = if total_occupied > 0 {
        100.0 / total_occupied as f32
    } else {
        0.0
    };

    let per_sensor: Vec<[f32; 5]> = (0..illuminance.rows)
        .into_par_iter()
        .map(|r| {
            let mut da = 0.0f32;
            let mut cda = 0.0f32;
            let mut udi = 0.0f32;
            let mut lower = 0.0f32;
            let mut upper = 0.0f32;

            for (value, occupied) in illuminance.row(r).iter().zip(occupancy) {
                if !occupied {
                    continue;
                }
                if *value >= thresholds.threshold {
                    da += 1.0;
                    cda += 1.0;
                } else if thresholds.threshold > 0.0 {
                    cda += value / thresholds.threshold;
                }
                if *value < thresholds.min_t {
                    lower += 1.0;
                } else if *value > thresholds.max_t {
                    upper += 1.0;
                } else {
                    udi += 1.0;
                }
            }

            [
                da * scale,
                cda * scale,
                udi * scale,
                (lower + sun_down_occupied) * scale,
                upper * scale,
            ]
        })
        .collect();

    let mut metrics = GridMetrics::default();
    for [da, cda, udi, lower, upper] in per_sensor {
        metrics.da.push(da);
        metrics.cda.push(cda);
        metrics.udi.push(udi);
        metrics.udi_lower.push(lower);
        metrics.udi_upper.push(upper);
    }
    metrics
}

/// Read `sun-up-hours.txt` from a results folder
pub fn read_sun_up_hours(results_folder: &Path) -> Result<Vec<f32>> {
    let path = results_folder.join(SUN_UP_HOURS);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .with_context(|| format!("Invalid sun-up hour '{}' in {}", token, path.display()))
        })
        .collect()
}

/// Read `grids_info.json` from a results folder
pub fn read_grids_info(folder: &Path) -> Result<Vec<GridInfo>> {
    let path = folder.join(GRIDS_INFO);
    let file = fs::File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Light path and the state folder used for it
#[derive(Debug, Clone)]
pub struct LightPath {
    pub name: String,
    pub default_state: PathBuf,
}

/// Results of an annual daylight simulation
#[derive(Debug, Clone)]
pub struct AnnualDaylight {
    pub folder: PathBuf,
    pub grids: Vec<GridInfo>,
    pub sun_up_hours: Vec<f32>,
    pub light_paths: Vec<LightPath>,
    schedule: Vec<bool>,
}

impl AnnualDaylight {
    /// Load a results folder with the default occupancy schedule
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        let grids = read_grids_info(&folder)?;
        let sun_up_hours = read_sun_up_hours(&folder)?;
        let light_paths = discover_light_paths(&folder)?;

        if light_paths.is_empty() {
            bail!("No light paths found in {}", folder.display());
        }

        Ok(Self {
            folder,
            grids,
            sun_up_hours,
            light_paths,
            schedule: default_schedule(),
        })
    }

    /// Replace the occupancy schedule (8760 hourly flags)
    pub fn with_schedule(mut self, schedule: Vec<bool>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn total_occupied(&self) -> usize {
        self.schedule.iter().filter(|o| **o).count()
    }

    /// Sum of the default-state illuminance across light paths
    pub fn grid_illuminance(&self, grid: &GridInfo) -> Result<Matrix> {
        let mut total: Option<Matrix> = None;

        for light_path in &self.light_paths {
            let file = light_path
                .default_state
                .join("total")
                .join(format!("{}.npy", grid.file_id()));
            if !file.is_file() {
                continue;
            }

            let array = read_npy(&file)?;
            if array.rows != grid.count || array.cols != self.sun_up_hours.len() {
                bail!(
                    "{} has shape {}x{}, expected {}x{}",
                    file.display(),
                    array.rows,
                    array.cols,
                    grid.count,
                    self.sun_up_hours.len()
                );
            }

            total = Some(match total {
                None => array,
                Some(mut sum) => {
                    sum.data
                        .iter_mut()
                        .zip(&array.data)
                        .for_each(|(a, b)| *a += b);
                    sum
                }
            });
        }

        total.with_context(|| format!("No illuminance found for grid {}", grid.name))
    }

    /// Metrics for one grid
    pub fn grid_metrics(&self, grid: &GridInfo, thresholds: Thresholds) -> Result<GridMetrics> {
        let illuminance = self.grid_illuminance(grid)?;
        let occupancy = occupancy_at(&self.schedule, &self.sun_up_hours);
        Ok(compute_metrics(
            &illuminance,
            &occupancy,
            self.total_occupied(),
            thresholds,
        ))
    }

    /// Write every metric of every grid to `target`
    pub fn annual_metrics_to_folder(&self, target: &Path, thresholds: Thresholds) -> Result<()> {
        for metric in Metric::ALL {
            fs::create_dir_all(target.join(metric.folder()))?;
            fs::copy(
                self.folder.join(GRIDS_INFO),
                target.join(metric.folder()).join(GRIDS_INFO),
            )?;
        }

        for grid in &self.grids {
            let metrics = self.grid_metrics(grid, thresholds)?;
            for metric in Metric::ALL {
                let path = metric.grid_file(target, grid.file_id());
                fs::write(&path, format_values(metrics.values(metric)))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            log::debug!("Wrote metrics for grid {} ({} sensors)", grid.name, grid.count);
        }

        let info = serde_json::json!({
            "threshold": thresholds.threshold,
            "min_t": thresholds.min_t,
            "max_t": thresholds.max_t,
            "occupied_hours": self.total_occupied(),
            "sun_up_hours": self.sun_up_hours.len(),
        });
        fs::write(
            target.join("metrics_info.json"),
            serde_json::to_string_pretty(&info)?,
        )?;

        Ok(())
    }
}

fn discover_light_paths(folder: &Path) -> Result<Vec<LightPath>> {
    let mut light_paths = Vec::new();

    for entry in sorted_dirs(folder)? {
        let mut states: Vec<PathBuf> = sorted_dirs(&entry)?
            .into_iter()
            .filter(|state| state.join("total").is_dir())
            .collect();
        if states.is_empty() {
            continue;
        }
        let default_state = states.remove(0);
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        light_paths.push(LightPath {
            name,
            default_state,
        });
    }

    Ok(light_paths)
}

fn sorted_dirs(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(folder)
        .with_context(|| format!("Failed to read {}", folder.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn format_values(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 7);
    for value in values {
        let _ = writeln!(out, "{:.2}", value);
    }
    out
}

/// Load metric values written by [`AnnualDaylight::annual_metrics_to_folder`]
pub fn read_metric_values(path: &Path) -> Result<Vec<f32>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .with_context(|| format!("Invalid value '{}' in {}", token, path.display()))
        })
        .collect()
}

/// Calculate annual metrics for a results folder and return the metrics folder
pub fn annual_metrics(config: &AppConfig, results_folder: &Path) -> Result<PathBuf> {
    let results = AnnualDaylight::new(results_folder)?;
    let name = results_folder
        .file_name()
        .context("Results folder has no name")?;
    let target_folder = config.metrics_dir().join(name);

    results.annual_metrics_to_folder(&target_folder, Thresholds::from_config(config))?;
    log::info!("Annual metrics written to {}", target_folder.display());

    Ok(target_folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::npy::write_npy;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn thresholds() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_metrics_single_sensor() {
        // four occupied sun-up hours, six occupied hours in the year
        let matrix = Matrix::new(1, 5, vec![50.0, 150.0, 300.0, 3500.0, 9999.0]);
        let occupancy = [true, true, true, true, false];

        let metrics = compute_metrics(&matrix, &occupancy, 6, thresholds());

        assert_relative_eq!(metrics.da[0], 2.0 / 6.0 * 100.0, epsilon = 1e-4);
        let cda = (50.0 / 300.0 + 150.0 / 300.0 + 1.0 + 1.0) / 6.0 * 100.0;
        assert_relative_eq!(metrics.cda[0], cda, epsilon = 1e-4);
        assert_relative_eq!(metrics.udi[0], 2.0 / 6.0 * 100.0, epsilon = 1e-4);
        // one dim hour plus two sun-down occupied hours
        assert_relative_eq!(metrics.udi_lower[0], 3.0 / 6.0 * 100.0, epsilon = 1e-4);
        assert_relative_eq!(metrics.udi_upper[0], 1.0 / 6.0 * 100.0, epsilon = 1e-4);
    }

    #[test]
    fn test_udi_bins_sum_to_hundred() {
        let matrix = Matrix::new(2, 3, vec![10.0, 500.0, 5000.0, 100.0, 3000.0, 3000.1]);
        let metrics = compute_metrics(&matrix, &[true, true, true], 4, thresholds());
        for i in 0..2 {
            let total = metrics.udi[i] + metrics.udi_lower[i] + metrics.udi_upper[i];
            assert_relative_eq!(total, 100.0, epsilon = 1e-4);
        }
        // bounds are inclusive for useful daylight
        assert_relative_eq!(metrics.udi[1], 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_no_occupied_hours() {
        let matrix = Matrix::new(1, 2, vec![1000.0, 1000.0]);
        let metrics = compute_metrics(&matrix, &[false, false], 0, thresholds());
        assert_eq!(metrics.da, vec![0.0]);
    }

    #[test]
    fn test_metric_names() {
        assert_eq!("UDI_lower".parse::<Metric>().unwrap(), Metric::UdiLower);
        assert_eq!("da".parse::<Metric>().unwrap(), Metric::Da);
        assert_eq!(Metric::UdiUpper.extension(), "udi");
        assert_eq!(
            Metric::Cda.grid_file(Path::new("m"), "Room"),
            PathBuf::from("m/cda/Room.cda")
        );
        let err = "lux".parse::<Metric>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown grid data 'lux'");
    }

    #[test]
    fn test_light_paths_are_summed() -> Result<()> {
        let dir = TempDir::new()?;
        let folder = dir.path();
        fs::write(
            folder.join(GRIDS_INFO),
            r#"[{"name": "Room", "identifier": "Room", "count": 1, "full_id": "Room"}]"#,
        )?;
        fs::write(folder.join(SUN_UP_HOURS), "8.5\n9.5\n")?;

        for (path, values) in [
            ("__static_apertures__/default/total", vec![100.0, 200.0]),
            ("ApertureGroup_1/0_ApertureGroup_1/total", vec![50.0, 25.0]),
            ("ApertureGroup_1/1_ApertureGroup_1/total", vec![9e6, 9e6]),
        ] {
            fs::create_dir_all(folder.join(path))?;
            write_npy(&folder.join(path).join("Room.npy"), &Matrix::new(1, 2, values))?;
        }

        let results = AnnualDaylight::new(folder)?;
        assert_eq!(results.light_paths.len(), 2);

        let total = results.grid_illuminance(&results.grids[0])?;
        assert_eq!(total.data, vec![150.0, 225.0]);
        Ok(())
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_values(&[1.0, 33.333]), "1.00\n33.33\n");
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Project configuration system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = "bsdfview.toml";

/// Folder layout of a project, relative to its root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderLayout {
    /// Uploaded BSDF XML files
    pub bsdf: PathBuf,
    /// Template results folder copied for every BSDF
    pub default_results: PathBuf,
    /// Per-BSDF results folders and raw illuminance matrices
    pub data: PathBuf,
    /// Per-BSDF annual metrics
    pub metrics: PathBuf,
    /// Honeybee model
    pub model: PathBuf,
    /// Exported scenes
    pub visualization: PathBuf,
    /// Precomputed Radiance matrices
    pub matrix: PathBuf,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            bsdf: PathBuf::from("bsdf"),
            default_results: PathBuf::from("results"),
            data: PathBuf::from("data"),
            metrics: PathBuf::from("metrics"),
            model: PathBuf::from("model"),
            visualization: PathBuf::from("visualization"),
            matrix: PathBuf::from("matrix"),
        }
    }
}

/// Radiance matrix file names inside the matrix folder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixFiles {
    pub view_matrix: String,
    pub daylight_matrix: String,
    pub sky_matrix: String,
}

impl Default for MatrixFiles {
    fn default() -> Self {
        Self {
            view_matrix: "view_matrix.vmx".to_string(),
            daylight_matrix: "daylight_matrix.dmx".to_string(),
            sky_matrix: "sky.mtx".to_string(),
        }
    }
}

/// Annual daylight post-processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcess {
    /// Illuminance threshold for daylight autonomy (lux)
    pub threshold: f32,
    /// Lower bound of useful daylight illuminance (lux)
    pub min_t: f32,
    /// Upper bound of useful daylight illuminance (lux)
    pub max_t: f32,
    /// Metric used to colour sensor grids
    pub active_grid_data: String,
    /// Grid whose values feed the summary table
    pub grid: String,
    /// Location of the BSDF illuminance inside a results folder
    pub light_path_file: PathBuf,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            threshold: 300.0,
            min_t: 100.0,
            max_t: 3000.0,
            active_grid_data: "da".to_string(),
            grid: "Room".to_string(),
            light_path_file: PathBuf::from(
                "ApertureGroup_38fc081f/0_ApertureGroup_38fc081f/total/Room.npy",
            ),
        }
    }
}

/// Simulation parameters shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationInfo {
    pub daylight_matrix: String,
    pub view_matrix: String,
}

impl Default for SimulationInfo {
    fn default() -> Self {
        Self {
            daylight_matrix: "-ab 3 -ad 2048 -lw 4.88e-06 -c 1000".to_string(),
            view_matrix: "-ab 6 -ad 16384 -lw 6.10e-07".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Project root; every folder in the layout is resolved against it
    #[serde(skip)]
    pub root: PathBuf,
    pub folders: FolderLayout,
    pub matrices: MatrixFiles,
    pub post_process: PostProcess,
    pub simulation: SimulationInfo,
    /// rmtxop executable, resolved on PATH when unset
    pub rmtxop_path: Option<String>,
    /// HBJSON file inside the model folder
    pub model_file: String,
    /// BSDF that every new session starts with
    pub seed_bsdf: String,
    /// Address of the web dashboard
    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            folders: FolderLayout::default(),
            matrices: MatrixFiles::default(),
            post_process: PostProcess::default(),
            simulation: SimulationInfo::default(),
            rmtxop_path: None,
            model_file: "sample_bsdf.hbjson".to_string(),
            seed_bsdf: "clear".to_string(),
            server_addr: "127.0.0.1:8501".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load the configuration of a project root with environment variable overrides
    pub fn load(root: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => std::env::var("BSDFVIEW_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        };

        let config_path = root.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            log::debug!("Loading configuration from {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            Self::default()
        };
        config.root = root;

        if let Ok(rmtxop) = std::env::var("BSDFVIEW_RMTXOP") {
            config.rmtxop_path = Some(rmtxop);
        }

        if let Ok(threshold) = std::env::var("BSDFVIEW_THRESHOLD") {
            match threshold.parse() {
                Ok(value) => config.post_process.threshold = value,
                Err(_) => log::warn!("Ignoring invalid BSDFVIEW_THRESHOLD '{}'", threshold),
            }
        }

        Ok(config)
    }

    /// Default configuration rooted at the given folder
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn bsdf_dir(&self) -> PathBuf {
        self.root.join(&self.folders.bsdf)
    }

    pub fn default_results_dir(&self) -> PathBuf {
        self.root.join(&self.folders.default_results)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.folders.data)
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.root.join(&self.folders.metrics)
    }

    pub fn visualization_dir(&self) -> PathBuf {
        self.root.join(&self.folders.visualization)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(&self.folders.model).join(&self.model_file)
    }

    pub fn view_matrix(&self) -> PathBuf {
        self.root.join(&self.folders.matrix).join(&self.matrices.view_matrix)
    }

    pub fn daylight_matrix(&self) -> PathBuf {
        self.root
            .join(&self.folders.matrix)
            .join(&self.matrices.daylight_matrix)
    }

    pub fn sky_matrix(&self) -> PathBuf {
        self.root.join(&self.folders.matrix).join(&self.matrices.sky_matrix)
    }

    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Scene file written for a BSDF
    pub fn visualization_file(&self, bsdf: &str) -> PathBuf {
        self.visualization_dir().join(format!("{}.glb", bsdf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.post_process.threshold, 300.0);
        assert_eq!(config.post_process.min_t, 100.0);
        assert_eq!(config.post_process.max_t, 3000.0);
        assert_eq!(config.seed_bsdf, "clear");
        assert_eq!(config.post_process.active_grid_data, "da");
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let config = AppConfig::with_root("/tmp/project");
        assert_eq!(
            config.view_matrix(),
            PathBuf::from("/tmp/project/matrix/view_matrix.vmx")
        );
        assert_eq!(
            config.visualization_file("clear"),
            PathBuf::from("/tmp/project/visualization/clear.glb")
        );
    }

    #[test]
    fn test_partial_config_file() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "seed_bsdf = \"baseline\"\n\n[post_process]\nthreshold = 250.0\n",
        )?;

        let config = AppConfig::load(Some(dir.path()))?;
        assert_eq!(config.seed_bsdf, "baseline");
        assert_eq!(config.post_process.threshold, 250.0);
        assert_eq!(config.post_process.max_t, 3000.0);
        assert_eq!(config.root, dir.path());

        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.rmtxop_path = Some("/opt/radiance/bin/rmtxop".to_string());
        config.save(&path)?;

        let loaded = AppConfig::from_file(&path)?;
        assert_eq!(loaded.rmtxop_path.as_deref(), Some("/opt/radiance/bin/rmtxop"));

        Ok(())
    }
}

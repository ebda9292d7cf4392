// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Upload processing: validation, three-phase run, metrics and scene

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::metrics::MetricsRow;
use crate::model::Model;
use crate::radiance::{check_angle_basis, read_matrix, three_phase_illuminance, MatrixEngine, Rmtxop};
use crate::results::{annual_metrics, copy_results_folder};
use crate::session::SessionState;
use crate::visualization::visualization_set;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of handling one uploaded file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Ran through the whole pipeline and was added to the session
    Processed {
        name: String,
        row: MetricsRow,
        scene: PathBuf,
    },
    /// A BSDF with this name is already loaded; nothing was done
    AlreadyLoaded { name: String },
    /// Failed validation; shown to the user and not added
    Rejected { name: String, message: String },
}

impl UploadOutcome {
    pub fn name(&self) -> &str {
        match self {
            UploadOutcome::Processed { name, .. }
            | UploadOutcome::AlreadyLoaded { name }
            | UploadOutcome::Rejected { name, .. } => name,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, UploadOutcome::Rejected { .. })
    }
}

/// Project-bound dashboard: configuration, session and simulation engine
pub struct Dashboard {
    config: AppConfig,
    engine: Box<dyn MatrixEngine>,
    model: Option<Model>,
    state: SessionState,
}

impl Dashboard {
    /// Open a project using the rmtxop executable from the configuration
    pub fn open(config: AppConfig) -> Result<Self> {
        let engine = Box::new(Rmtxop::from_config(&config));
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: AppConfig, engine: Box<dyn MatrixEngine>) -> Result<Self> {
        let state = SessionState::initialize(&config)?;
        Ok(Self {
            config,
            engine,
            model: None,
            state,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn model(&mut self) -> Result<&Model> {
        if self.model.is_none() {
            self.model = Some(Model::from_hbjson(&self.config.model_path())?);
        }
        self.model.as_ref().context("model not loaded")
    }

    /// Handle one uploaded BSDF file
    pub fn process_upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<UploadOutcome> {
        let file_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Upload has no file name")?;
        let bsdf_file = self.config.bsdf_dir().join(&file_name);
        let stem = bsdf_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("Upload has no file name")?;

        if !is_valid_name(&stem) {
            log::warn!("Rejected {}: invalid name", file_name);
            return Ok(UploadOutcome::Rejected {
                message: format!(
                    "{} is not a valid BSDF name. Use letters, digits, '.', '_' or '-'.",
                    file_name
                ),
                name: stem,
            });
        }

        if self.state.contains(&stem) {
            log::info!("{} is already loaded", stem);
            return Ok(UploadOutcome::AlreadyLoaded { name: stem });
        }

        let is_xml = bsdf_file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if !is_xml {
            return Ok(UploadOutcome::Rejected {
                name: stem,
                message: format!("{} is not an XML file", file_name),
            });
        }

        std::fs::create_dir_all(self.config.bsdf_dir())?;
        std::fs::write(&bsdf_file, bytes)
            .with_context(|| format!("Failed to write {}", bsdf_file.display()))?;

        let start = Instant::now();
        if let Err(e) = check_angle_basis(&bsdf_file) {
            log::warn!("Rejected {}: {}", file_name, e);
            return Ok(UploadOutcome::Rejected {
                name: stem,
                message: e.to_string(),
            });
        }

        let illuminance_file = three_phase_illuminance(self.engine.as_ref(), &self.config, &bsdf_file)?;
        let matrix = read_matrix(&illuminance_file)
            .with_context(|| format!("Failed to read {}", illuminance_file.display()))?;
        let results_folder = copy_results_folder(&self.config, &stem, &matrix)?;
        let metrics_folder = annual_metrics(&self.config, &results_folder)?;

        let row = MetricsRow::from_metrics_folder(&stem, &metrics_folder, &self.config.post_process.grid)?;
        let config = self.config.clone();
        let scene = visualization_set(&config, self.model()?, &metrics_folder)?;

        self.state.metrics.upsert(row.clone());
        self.state.add_bsdf(&stem);
        self.state.save(&self.config)?;

        log::info!("Processed {} in {:.2?}", stem, start.elapsed());
        Ok(UploadOutcome::Processed {
            name: stem,
            row,
            scene,
        })
    }

    /// Handle several files from one submission, in order
    pub fn process_uploads<I>(&mut self, files: I) -> Result<Vec<UploadOutcome>>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        files
            .into_iter()
            .map(|(name, bytes)| self.process_upload(&name, &bytes))
            .collect()
    }

    /// Select the BSDF shown in the viewer
    pub fn select(&mut self, name: &str) -> Result<()> {
        self.state.select(name)?;
        self.state.save(&self.config)?;
        Ok(())
    }

    /// Scene of a loaded BSDF, if one has been written
    pub fn scene_path(&self, name: &str) -> Option<PathBuf> {
        if !self.state.contains(name) {
            return None;
        }
        let path = self.config.visualization_file(name);
        path.is_file().then_some(path)
    }

    /// Rebuild the scene of a loaded BSDF from its metrics folder
    pub fn rebuild_visualization(&mut self, name: &str) -> Result<PathBuf> {
        if !self.state.contains(name) {
            return Err(SessionError::UnknownBsdf(name.to_string()).into());
        }
        let metrics_folder = self.config.metrics_dir().join(name);
        let config = self.config.clone();
        visualization_set(&config, self.model()?, &metrics_folder)
    }
}

/// BSDF names end up in file paths and in the rmtxop command line
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Session state shared by the CLI and the web dashboard

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::metrics::{MetricsRow, MetricsTable};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tempfile::NamedTempFile;

/// Loaded BSDFs, the active selection and their metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub bsdfs: Vec<String>,
    pub active_bsdf: String,
    pub metrics: MetricsTable,
    pub updated: DateTime<Utc>,
}

impl SessionState {
    /// Fresh session with the seed BSDF loaded and active
    pub fn fresh(config: &AppConfig) -> Self {
        let seed = config.seed_bsdf.clone();
        let mut metrics = MetricsTable::new();

        let seed_metrics = config.metrics_dir().join(&seed);
        if seed_metrics.is_dir() {
            match MetricsRow::from_metrics_folder(&seed, &seed_metrics, &config.post_process.grid) {
                Ok(row) => metrics.upsert(row),
                Err(e) => log::warn!("Could not summarise {}: {:#}", seed, e),
            }
        } else {
            log::warn!("No metrics for seed BSDF at {}", seed_metrics.display());
        }

        Self {
            bsdfs: vec![seed.clone()],
            active_bsdf: seed,
            metrics,
            updated: Utc::now(),
        }
    }

    /// Load the persisted session of a project, or start a fresh one
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let path = config.session_file();
        if path.exists() {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("Failed to open session {}", path.display()))?;
            let state: SessionState = serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse session {}", path.display()))?;
            log::debug!("Resumed session with {} BSDFs", state.bsdfs.len());
            Ok(state)
        } else {
            log::info!("Starting a new session in {}", config.root.display());
            Ok(Self::fresh(config))
        }
    }

    /// Persist atomically next to the project files
    pub fn save(&mut self, config: &AppConfig) -> Result<()> {
        self.updated = Utc::now();
        let path = config.session_file();
        let dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| config.root.clone());
        std::fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary session in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.flush()?;
        file.persist(&path)
            .with_context(|| format!("Failed to write session {}", path.display()))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bsdfs.iter().any(|b| b == name)
    }

    /// Append a BSDF name; returns false if it was already loaded
    pub fn add_bsdf(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.bsdfs.push(name.to_string());
        true
    }

    /// Make a loaded BSDF the active one
    pub fn select(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.contains(name) {
            return Err(SessionError::UnknownBsdf(name.to_string()));
        }
        self.active_bsdf = name.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_session() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::with_root(dir.path());
        let state = SessionState::fresh(&config);

        assert_eq!(state.bsdfs, vec!["clear".to_string()]);
        assert_eq!(state.active_bsdf, "clear");
        assert!(state.metrics.is_empty());
    }

    #[test]
    fn test_add_and_select() {
        let dir = TempDir::new().unwrap();
        let mut state = SessionState::fresh(&AppConfig::with_root(dir.path()));

        assert!(state.add_bsdf("venetian"));
        assert!(!state.add_bsdf("venetian"));
        assert_eq!(state.bsdfs.len(), 2);

        state.select("venetian").unwrap();
        assert_eq!(state.active_bsdf, "venetian");
        assert!(matches!(
            state.select("missing"),
            Err(SessionError::UnknownBsdf(name)) if name == "missing"
        ));
        assert_eq!(state.active_bsdf, "venetian");
    }

    #[test]
    fn test_save_and_resume() -> Result<()> {
        let dir = TempDir::new()?;
        let config = AppConfig::with_root(dir.path());

        let mut state = SessionState::initialize(&config)?;
        state.add_bsdf("fritted");
        state.select("fritted")?;
        state.save(&config)?;

        let resumed = SessionState::initialize(&config)?;
        assert_eq!(resumed.bsdfs, vec!["clear".to_string(), "fritted".to_string()]);
        assert_eq!(resumed.active_bsdf, "fritted");
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Three-phase matrix multiplication through Radiance rmtxop

use super::matrix::ILLUMINANCE_TRANSFORM;
use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Operands of a three-phase calculation, in multiplication order
#[derive(Debug, Clone)]
pub struct ThreePhaseInputs {
    pub view_matrix: PathBuf,
    pub bsdf: PathBuf,
    pub daylight_matrix: PathBuf,
    pub sky_matrix: PathBuf,
}

impl ThreePhaseInputs {
    pub fn from_config(config: &AppConfig, bsdf: &Path) -> Self {
        Self {
            view_matrix: config.view_matrix(),
            bsdf: bsdf.to_path_buf(),
            daylight_matrix: config.daylight_matrix(),
            sky_matrix: config.sky_matrix(),
        }
    }

    fn operands(&self) -> [&Path; 4] {
        [
            self.view_matrix.as_path(),
            self.bsdf.as_path(),
            self.daylight_matrix.as_path(),
            self.sky_matrix.as_path(),
        ]
    }
}

/// Computes `V x T x D x S` and writes a binary illuminance matrix
pub trait MatrixEngine: Send + Sync {
    fn three_phase(&self, inputs: &ThreePhaseInputs, output: &Path) -> Result<Duration>;
}

/// Runner for the Radiance `rmtxop` executable
pub struct Rmtxop {
    program: String,
}

impl Rmtxop {
    pub fn new() -> Self {
        Self {
            program: "rmtxop".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match &config.rmtxop_path {
            Some(path) => Self::with_program(path.clone()),
            None => Self::new(),
        }
    }

    /// Arguments of the outer command; the inner product is passed as a `!command` operand
    pub fn arguments(&self, inputs: &ThreePhaseInputs) -> Vec<String> {
        let mut inner = vec![quote(&self.program)];
        inner.extend(
            inputs
                .operands()
                .iter()
                .map(|p| quote(&p.to_string_lossy())),
        );

        let mut args = vec!["-ff".to_string(), "-c".to_string()];
        args.extend(ILLUMINANCE_TRANSFORM.iter().map(|w| w.to_string()));
        args.push(format!("!{}", inner.join(" ")));
        args
    }

    /// Check if rmtxop is available
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl Default for Rmtxop {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixEngine for Rmtxop {
    fn three_phase(&self, inputs: &ThreePhaseInputs, output: &Path) -> Result<Duration> {
        for operand in inputs.operands() {
            if !operand.exists() {
                bail!("Matrix operand not found: {}", operand.display());
            }
        }

        let start = Instant::now();
        let stdout = File::create(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;

        let args = self.arguments(inputs);
        log::debug!("{} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !result.status.success() {
            bail!(
                "{} exited with status {}: {}",
                self.program,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        Ok(start.elapsed())
    }
}

/// Single-quote a word for the shell that runs the inner `!command`
fn quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Run the three-phase calculation for a BSDF and return the illuminance file
pub fn three_phase_illuminance(
    engine: &dyn MatrixEngine,
    config: &AppConfig,
    bsdf_file: &Path,
) -> Result<PathBuf> {
    let stem = bsdf_file
        .file_stem()
        .context("BSDF file has no name")?
        .to_string_lossy();

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let output = data_dir.join(format!("{}.ill", stem));

    let inputs = ThreePhaseInputs::from_config(config, bsdf_file);
    let elapsed = engine
        .three_phase(&inputs, &output)
        .with_context(|| format!("Three-phase calculation failed for {}", stem))?;

    log::info!("Three-phase illuminance for {} in {:.2?}", stem, elapsed);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ThreePhaseInputs {
        ThreePhaseInputs {
            view_matrix: PathBuf::from("matrix/view_matrix.vmx"),
            bsdf: PathBuf::from("bsdf/venetian.xml"),
            daylight_matrix: PathBuf::from("matrix/daylight_matrix.dmx"),
            sky_matrix: PathBuf::from("matrix/sky.mtx"),
        }
    }

    #[test]
    fn test_arguments() {
        let args = Rmtxop::new().arguments(&inputs());
        assert_eq!(
            args,
            vec![
                "-ff",
                "-c",
                "47.4",
                "119.9",
                "11.6",
                "!'rmtxop' 'matrix/view_matrix.vmx' 'bsdf/venetian.xml' 'matrix/daylight_matrix.dmx' 'matrix/sky.mtx'",
            ]
        );
    }

    #[test]
    fn test_quotes_every_word() {
        assert_eq!(quote("my bsdf.xml"), "'my bsdf.xml'");
        assert_eq!(quote("it's.xml"), r"'it'\''s.xml'");
        assert_eq!(quote("a$(touch x).xml"), "'a$(touch x).xml'");
    }

    #[cfg(unix)]
    #[test]
    fn test_inner_command_does_not_expand_file_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let bsdf = format!("bsdf/a$(touch${{IFS}}{}).xml", marker.display());

        let mut inputs = inputs();
        inputs.bsdf = PathBuf::from(&bsdf);
        let args = Rmtxop::with_program("echo").arguments(&inputs);
        let inner = args.last().unwrap().strip_prefix('!').unwrap().to_string();

        // rmtxop hands `!command` operands to popen, i.e. `sh -c`
        let output = Command::new("sh").arg("-c").arg(&inner).output().unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains(&bsdf));
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_operand() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Rmtxop::new()
            .three_phase(&inputs(), &dir.path().join("out.ill"))
            .unwrap_err();
        assert!(err.to_string().contains("Matrix operand not found"));
    }
}

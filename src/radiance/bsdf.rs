// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! BSDF XML metadata reader

use crate::error::BsdfError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Angle basis of a BSDF data definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleBasis {
    KlemsFull,
    KlemsHalf,
    KlemsQuarter,
    TensorTree,
    Other(String),
}

impl AngleBasis {
    /// Parse an `AngleBasisName` value such as `LBNL/Klems Full`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        let short = name.strip_prefix("LBNL/").unwrap_or(name);
        match short {
            "Klems Full" => AngleBasis::KlemsFull,
            "Klems Half" => AngleBasis::KlemsHalf,
            "Klems Quarter" => AngleBasis::KlemsQuarter,
            s if s.starts_with("TensorTree") => AngleBasis::TensorTree,
            _ => AngleBasis::Other(short.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AngleBasis::KlemsFull => "Klems Full",
            AngleBasis::KlemsHalf => "Klems Half",
            AngleBasis::KlemsQuarter => "Klems Quarter",
            AngleBasis::TensorTree => "TensorTree",
            AngleBasis::Other(name) => name,
        }
    }
}

impl fmt::Display for AngleBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata read from a BSDF XML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BsdfInfo {
    /// `Material/Name`
    pub name: Option<String>,
    /// `DataDefinition/IncidentDataStructure`
    pub incident_data_structure: Option<String>,
    /// Raw `AngleBasisName`
    pub angle_basis_name: Option<String>,
}

impl BsdfInfo {
    /// Read metadata from a BSDF file
    pub fn from_file(path: &Path) -> Result<Self, BsdfError> {
        let xml = std::fs::read_to_string(path).map_err(|source| BsdfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml(&xml, &file_label(path))
    }

    /// Read metadata from XML source; `file` labels errors
    pub fn from_xml(xml: &str, file: &str) -> Result<Self, BsdfError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut info = BsdfInfo::default();
        let mut path: Vec<String> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|source| BsdfError::Xml {
                file: file.to_string(),
                source,
            })?;

            match event {
                Event::Start(e) => {
                    path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|source| BsdfError::Xml {
                            file: file.to_string(),
                            source,
                        })?
                        .trim()
                        .to_string();
                    if text.is_empty() {
                        continue;
                    }
                    info.record(&path, text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(info)
    }

    // First occurrence wins: WINDOW files repeat the basis for every data block.
    fn record(&mut self, path: &[String], text: String) {
        let Some(element) = path.last() else {
            return;
        };
        let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

        match (element.as_str(), parent) {
            ("Name", Some("Material")) if self.name.is_none() => self.name = Some(text),
            ("IncidentDataStructure", _) if self.incident_data_structure.is_none() => {
                self.incident_data_structure = Some(text)
            }
            ("AngleBasisName", _) if self.angle_basis_name.is_none() => {
                self.angle_basis_name = Some(text)
            }
            _ => {}
        }
    }

    /// Angle basis, if the file declares one
    pub fn angle_basis(&self) -> Option<AngleBasis> {
        if let Some(structure) = &self.incident_data_structure {
            if structure.starts_with("TensorTree") {
                return Some(AngleBasis::TensorTree);
            }
        }
        self.angle_basis_name.as_deref().map(AngleBasis::from_name)
    }
}

/// Ensure a BSDF file uses the Klems Full angle basis
pub fn check_angle_basis(path: &Path) -> Result<BsdfInfo, BsdfError> {
    let info = BsdfInfo::from_file(path)?;
    validate_angle_basis(&info, &file_label(path))?;
    Ok(info)
}

/// Validate already-parsed metadata
pub fn validate_angle_basis(info: &BsdfInfo, file: &str) -> Result<(), BsdfError> {
    match info.angle_basis() {
        Some(AngleBasis::KlemsFull) => Ok(()),
        Some(other) => Err(BsdfError::InvalidAngleBasis {
            file: file.to_string(),
            found: other.to_string(),
        }),
        None => Err(BsdfError::MissingAngleBasis {
            file: file.to_string(),
        }),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

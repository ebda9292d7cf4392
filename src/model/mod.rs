// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Honeybee model (HBJSON) subset used for display

use anyhow::{Context, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Planar polygon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face3D {
    pub boundary: Vec<[f64; 3]>,
}

impl Face3D {
    pub fn points(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.boundary.iter().map(|p| Point3::new(p[0], p[1], p[2]))
    }

    /// Fan triangulation, valid for convex boundaries
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        (1..self.boundary.len().saturating_sub(1))
            .map(|i| [0, i, i + 1])
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aperture {
    pub identifier: String,
    pub geometry: Face3D,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub identifier: String,
    #[serde(default)]
    pub face_type: Option<String>,
    pub geometry: Face3D,
    #[serde(default)]
    pub apertures: Vec<Aperture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub identifier: String,
    #[serde(default)]
    pub faces: Vec<Face>,
}

/// Mesh with triangle or quad faces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh3D {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
}

impl Mesh3D {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, index: usize) -> Option<Point3<f64>> {
        self.vertices.get(index).map(|p| Point3::new(p[0], p[1], p[2]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorGrid {
    pub identifier: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mesh: Option<Mesh3D>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadianceProperties {
    #[serde(default)]
    pub sensor_grids: Vec<SensorGrid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelProperties {
    #[serde(default)]
    pub radiance: RadianceProperties,
}

/// Model geometry and sensor grids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub identifier: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub orphaned_apertures: Vec<Aperture>,
    #[serde(default)]
    pub properties: ModelProperties,
}

impl Model {
    /// Load the display subset of an HBJSON file
    pub fn from_hbjson(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open model {}", path.display()))?;
        let model: Model = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse model {}", path.display()))?;
        log::debug!(
            "Loaded model {} with {} rooms and {} sensor grids",
            model.identifier,
            model.rooms.len(),
            model.sensor_grids().len()
        );
        Ok(model)
    }

    pub fn sensor_grids(&self) -> &[SensorGrid] {
        &self.properties.radiance.sensor_grids
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.rooms.iter().flat_map(|room| room.faces.iter())
    }

    pub fn apertures(&self) -> impl Iterator<Item = &Aperture> {
        self.faces()
            .flat_map(|face| face.apertures.iter())
            .chain(self.orphaned_apertures.iter())
    }
}

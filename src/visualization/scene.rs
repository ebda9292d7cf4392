// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GLB scene exporter for models and coloured sensor grids

use super::legend::Legend;
use crate::model::{Mesh3D, Model};
use anyhow::{bail, Result};
use nalgebra::Point3;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_LINES: u32 = 1;
const MODE_TRIANGLES: u32 = 4;

/// Z-up to Y-up rotation applied to the root node
const Z_UP_TO_Y_UP: [f32; 4] = [-std::f32::consts::FRAC_1_SQRT_2, 0.0, 0.0, std::f32::consts::FRAC_1_SQRT_2];

/// Sensor grid values to colour
#[derive(Debug, Clone)]
pub struct GridData<'a> {
    pub identifier: &'a str,
    pub mesh: &'a Mesh3D,
    pub values: &'a [f32],
}

/// Scene description accumulated into a single binary buffer
pub struct SceneBuilder {
    buffer: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    nodes: Vec<Value>,
    materials: Vec<Value>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            meshes: Vec::new(),
            nodes: Vec::new(),
            materials: vec![
                // 0: wireframe
                json!({"name": "wireframe", "pbrMetallicRoughness": {"baseColorFactor": [0.1, 0.1, 0.1, 1.0], "metallicFactor": 0.0}}),
                // 1: glazing
                json!({"name": "aperture", "alphaMode": "BLEND", "doubleSided": true,
                       "pbrMetallicRoughness": {"baseColorFactor": [0.35, 0.65, 0.9, 0.35], "metallicFactor": 0.0, "roughnessFactor": 0.2}}),
                // 2: grid, tinted by COLOR_0
                json!({"name": "grid", "doubleSided": true,
                       "pbrMetallicRoughness": {"baseColorFactor": [1.0, 1.0, 1.0, 1.0], "metallicFactor": 0.0, "roughnessFactor": 1.0},
                       "extensions": {"KHR_materials_unlit": {}}}),
            ],
        }
    }

    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target
        }));
        self.buffer_views.len() - 1
    }

    fn push_vec3(&mut self, values: &[[f32; 3]], bounds: Option<(Point3<f32>, Point3<f32>)>) -> usize {
        let bytes: Vec<u8> = values
            .iter()
            .flat_map(|v| v.iter().flat_map(|c| c.to_le_bytes()))
            .collect();
        let view = self.push_view(&bytes, ARRAY_BUFFER);

        let mut accessor = json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": values.len(),
            "type": "VEC3"
        });
        if let Some((min, max)) = bounds {
            accessor["min"] = json!([min.x, min.y, min.z]);
            accessor["max"] = json!([max.x, max.y, max.z]);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// POSITION accessors carry their bounding box
    fn push_positions(&mut self, points: &[Point3<f32>]) -> usize {
        let values: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        self.push_vec3(&values, calculate_bounds(points))
    }

    fn push_indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes, ELEMENT_ARRAY_BUFFER);
        self.accessors.push(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": UNSIGNED_INT,
            "count": indices.len(),
            "type": "SCALAR"
        }));
        self.accessors.len() - 1
    }

    fn push_mesh(&mut self, name: &str, primitive: Value, extras: Option<Value>) {
        self.meshes.push(json!({"name": name, "primitives": [primitive]}));
        let mut node = json!({"name": name, "mesh": self.meshes.len() - 1});
        if let Some(extras) = extras {
            node["extras"] = extras;
        }
        self.nodes.push(node);
    }

    /// Outline of every room face
    pub fn add_wireframe(&mut self, model: &Model) {
        let mut positions = Vec::new();
        for face in model.faces() {
            let points: Vec<Point3<f32>> = face.geometry.points().map(|p| p.cast::<f32>()).collect();
            for i in 0..points.len() {
                positions.push(points[i]);
                positions.push(points[(i + 1) % points.len()]);
            }
        }
        if positions.is_empty() {
            return;
        }

        let position = self.push_positions(&positions);
        self.push_mesh(
            "wireframe",
            json!({"attributes": {"POSITION": position}, "material": 0, "mode": MODE_LINES}),
            None,
        );
    }

    /// Translucent aperture surfaces
    pub fn add_apertures(&mut self, model: &Model) {
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for aperture in model.apertures() {
            let base = positions.len() as u32;
            positions.extend(aperture.geometry.points().map(|p| p.cast::<f32>()));
            for [a, b, c] in aperture.geometry.triangles() {
                indices.extend([base + a as u32, base + b as u32, base + c as u32]);
            }
        }
        if indices.is_empty() {
            return;
        }

        let position = self.push_positions(&positions);
        let index = self.push_indices(&indices);
        self.push_mesh(
            "apertures",
            json!({"attributes": {"POSITION": position}, "indices": index, "material": 1, "mode": MODE_TRIANGLES}),
            None,
        );
    }

    /// Sensor grid with one flat colour per face
    pub fn add_grid(&mut self, grid: &GridData<'_>, legend: &Legend, metric: &str) -> Result<()> {
        if grid.values.len() != grid.mesh.face_count() {
            bail!(
                "Grid {} has {} faces but {} values",
                grid.identifier,
                grid.mesh.face_count(),
                grid.values.len()
            );
        }

        let mut positions = Vec::new();
        let mut colors = Vec::new();
        let mut indices = Vec::new();

        for (face, value) in grid.mesh.faces.iter().zip(grid.values) {
            if face.len() < 3 {
                continue;
            }
            let color = legend.linear_color(*value);
            let base = positions.len() as u32;
            for &vertex in face {
                let point = grid.mesh.vertex(vertex).ok_or_else(|| {
                    anyhow::anyhow!("Grid {} references missing vertex {}", grid.identifier, vertex)
                })?;
                positions.push(point.cast::<f32>());
                colors.push(color);
            }
            for i in 1..face.len() as u32 - 1 {
                indices.extend([base, base + i, base + i + 1]);
            }
        }

        if indices.is_empty() {
            return Ok(());
        }

        let position = self.push_positions(&positions);
        let color = self.push_vec3(&colors, None);
        let index = self.push_indices(&indices);
        self.push_mesh(
            grid.identifier,
            json!({"attributes": {"POSITION": position, "COLOR_0": color}, "indices": index, "material": 2, "mode": MODE_TRIANGLES}),
            Some(json!({"metric": metric, "legend": {"min": legend.min, "max": legend.max}})),
        );
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Assemble the glTF document and its binary buffer
    pub fn build(self, name: &str) -> (Value, Vec<u8>) {
        let children: Vec<usize> = (1..=self.nodes.len()).collect();
        let mut nodes = vec![json!({"name": name, "rotation": Z_UP_TO_Y_UP, "children": children})];
        nodes.extend(self.nodes);

        let gltf = json!({
            "asset": {"generator": "bsdfview", "version": "2.0"},
            "extensionsUsed": ["KHR_materials_unlit"],
            "scene": 0,
            "scenes": [{"name": name, "nodes": [0]}],
            "nodes": nodes,
            "meshes": self.meshes,
            "materials": self.materials,
            "accessors": self.accessors,
            "bufferViews": self.buffer_views,
            "buffers": [{"byteLength": self.buffer.len()}]
        });

        (gltf, self.buffer)
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a GLB container
pub fn write_glb<W: Write>(writer: &mut W, gltf: &Value, buffer_data: &[u8]) -> Result<()> {
    let json_string = serde_json::to_string(gltf)?;
    let mut json_offset = json_string.len();
    align_to_multiple_of_four(&mut json_offset);
    let json_padding = json_offset - json_string.len();

    let mut buffer_offset = buffer_data.len();
    align_to_multiple_of_four(&mut buffer_offset);
    let buffer_padding = buffer_offset - buffer_data.len();

    let total_length = 12 + 8 + json_offset + 8 + buffer_offset;

    // GLB header
    writer.write_all(&0x46546C67u32.to_le_bytes())?; // magic: "glTF"
    writer.write_all(&2u32.to_le_bytes())?;
    writer.write_all(&(total_length as u32).to_le_bytes())?;

    // JSON chunk
    writer.write_all(&(json_offset as u32).to_le_bytes())?;
    writer.write_all(&0x4E4F534Au32.to_le_bytes())?; // type: "JSON"
    writer.write_all(json_string.as_bytes())?;
    writer.write_all(&vec![b' '; json_padding])?;

    // BIN chunk
    writer.write_all(&(buffer_offset as u32).to_le_bytes())?;
    writer.write_all(&0x004E4942u32.to_le_bytes())?; // type: "BIN\0"
    writer.write_all(buffer_data)?;
    writer.write_all(&vec![0u8; buffer_padding])?;

    Ok(())
}

/// Export a scene to a `.glb` file
pub fn export_glb(builder: SceneBuilder, name: &str, path: &Path) -> Result<()> {
    let (gltf, buffer) = builder.build(name);
    let mut file = BufWriter::new(File::create(path)?);
    write_glb(&mut file, &gltf, &buffer)?;
    file.flush()?;
    Ok(())
}

fn calculate_bounds(points: &[Point3<f32>]) -> Option<(Point3<f32>, Point3<f32>)> {
    let first = points.first()?;
    Some(points.iter().fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p))))
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::SAMPLE_HBJSON;

    fn sample_model() -> Model {
        serde_json::from_str(SAMPLE_HBJSON).unwrap()
    }

    #[test]
    fn test_scene_layout() -> Result<()> {
        let model = sample_model();
        let grid = &model.sensor_grids()[0];
        let values = [80.0, 20.0];

        let mut builder = SceneBuilder::new();
        builder.add_wireframe(&model);
        builder.add_apertures(&model);
        builder.add_grid(
            &GridData {
                identifier: &grid.identifier,
                mesh: grid.mesh.as_ref().unwrap(),
                values: &values,
            },
            &Legend::percent(),
            "da",
        )?;

        let (gltf, buffer) = builder.build("clear");
        assert_eq!(gltf["meshes"].as_array().unwrap().len(), 3);
        assert_eq!(gltf["nodes"][0]["children"], json!([1, 2, 3]));
        assert_eq!(gltf["meshes"][0]["primitives"][0]["mode"], MODE_LINES);
        // quad + triangle become three triangles
        let grid_indices = gltf["meshes"][2]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        assert_eq!(gltf["accessors"][grid_indices]["count"], 9);
        assert_eq!(gltf["nodes"][3]["extras"]["metric"], "da");
        assert_eq!(buffer.len() % 4, 0);
        assert_eq!(gltf["buffers"][0]["byteLength"], buffer.len());
        Ok(())
    }

    #[test]
    fn test_value_count_mismatch() {
        let model = sample_model();
        let grid = &model.sensor_grids()[0];
        let mut builder = SceneBuilder::new();
        let err = builder
            .add_grid(
                &GridData {
                    identifier: "Room",
                    mesh: grid.mesh.as_ref().unwrap(),
                    values: &[1.0],
                },
                &Legend::percent(),
                "da",
            )
            .unwrap_err();
        assert!(err.to_string().contains("2 faces but 1 values"));
    }

    #[test]
    fn test_position_bounds() {
        let mut builder = SceneBuilder::new();
        builder.add_wireframe(&sample_model());
        let (gltf, _) = builder.build("scene");
        let position = gltf["meshes"][0]["primitives"][0]["attributes"]["POSITION"]
            .as_u64()
            .unwrap() as usize;
        assert_eq!(gltf["accessors"][position]["min"], json!([0.0, 0.0, 0.0]));
        assert!(gltf["accessors"][position]["max"][2].as_f64().unwrap() > 0.0);
        assert!(calculate_bounds(&[]).is_none());
    }

    #[test]
    fn test_glb_container() -> Result<()> {
        let mut builder = SceneBuilder::new();
        builder.add_wireframe(&sample_model());
        let (gltf, buffer) = builder.build("scene");

        let mut bytes = Vec::new();
        write_glb(&mut bytes, &gltf, &buffer)?;

        assert_eq!(&bytes[0..4], b"glTF");
        let total = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(total, bytes.len());
        assert_eq!(bytes.len() % 4, 0);
        Ok(())
    }
}

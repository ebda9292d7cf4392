// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! NPY array files used inside results folders

use crate::radiance::Matrix;
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a single-component matrix as a 2D float32 array
pub fn write_npy(path: &Path, matrix: &Matrix) -> Result<()> {
    if matrix.ncomp != 1 {
        bail!("Only single-component matrices can be saved, got {} components", matrix.ncomp);
    }

    let array = Array2::from_shape_vec((matrix.rows, matrix.cols), matrix.data.clone())?;
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    array
        .write_npy(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a 2D float32 or float64 array
pub fn read_npy(path: &Path) -> Result<Matrix> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let array = match Array2::<f32>::read_npy(bytes.as_slice()) {
        Ok(array) => array,
        Err(ReadNpyError::WrongDescriptor(_)) => Array2::<f64>::read_npy(bytes.as_slice())
            .with_context(|| format!("Invalid NPY file {}", path.display()))?
            .mapv(|v| v as f32),
        Err(e) => return Err(e).with_context(|| format!("Invalid NPY file {}", path.display())),
    };

    let (rows, cols) = array.dim();
    Ok(Matrix::new(rows, cols, array.iter().copied().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ShapeBuilder};
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Room.npy");
        write_npy(&path, &Matrix::new(3, 2, vec![0.0, 1.5, 300.0, 12.0, 7.25, 4000.0]))?;

        let loaded = read_npy(&path)?;
        assert_eq!((loaded.rows, loaded.cols), (3, 2));
        assert_eq!(loaded.row(1), &[300.0, 12.0]);
        Ok(())
    }

    #[test]
    fn test_reads_float64_from_numpy() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Room.npy");
        array![[150.0f64, 2500.5]].write_npy(File::create(&path)?)?;

        let matrix = read_npy(&path)?;
        assert_eq!((matrix.rows, matrix.cols), (1, 2));
        assert_eq!(matrix.data, vec![150.0, 2500.5]);
        Ok(())
    }

    #[test]
    fn test_fortran_order_keeps_logical_layout() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("Room.npy");
        let fortran = Array2::from_shape_vec((2, 2).f(), vec![1.0f32, 3.0, 2.0, 4.0])?;
        fortran.write_npy(File::create(&path)?)?;

        let matrix = read_npy(&path)?;
        assert_eq!(matrix.data, vec![1.0, 2.0, 3.0, 4.0]);
        Ok(())
    }

    #[test]
    fn test_rejects_multi_component() {
        let matrix = Matrix {
            rows: 1,
            cols: 1,
            ncomp: 3,
            data: vec![1.0, 1.0, 1.0],
        };
        assert!(write_npy(Path::new("unused.npy"), &matrix).is_err());
    }

    #[test]
    fn test_rejects_integer_arrays() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("grid.npy");
        array![[1i32, 2]].write_npy(File::create(&path)?)?;
        assert!(read_npy(&path).is_err());
        Ok(())
    }
}

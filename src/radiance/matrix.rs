// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Radiance matrix reader and writer

use crate::error::MatrixError;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Photopic weights turning RGB irradiance into illuminance
pub const ILLUMINANCE_TRANSFORM: [f32; 3] = [47.4, 119.9, 11.6];

/// Data encoding after the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Ascii,
    Float,
    Double,
}

impl DataFormat {
    fn parse(value: &str) -> Result<Self, MatrixError> {
        match value.trim() {
            "ascii" => Ok(DataFormat::Ascii),
            "float" => Ok(DataFormat::Float),
            "double" => Ok(DataFormat::Double),
            other => Err(MatrixError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parsed header fields
#[derive(Debug, Clone)]
pub struct Header {
    pub rows: usize,
    pub cols: usize,
    pub ncomp: usize,
    pub format: DataFormat,
    pub big_endian: bool,
    /// Command lines and other free-form header text
    pub notes: Vec<String>,
}

/// Dense row-major matrix with `ncomp` values per entry
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub ncomp: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        Self {
            rows,
            cols,
            ncomp: 1,
            data,
        }
    }

    /// Single-component values of one row
    pub fn row(&self, index: usize) -> &[f32] {
        let stride = self.cols * self.ncomp;
        &self.data[index * stride..(index + 1) * stride]
    }

    /// Collapse RGB components to illuminance; single-component data is returned as-is
    pub fn to_illuminance(&self) -> Matrix {
        if self.ncomp == 1 {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(self.ncomp)
            .map(|rgb| {
                rgb.iter()
                    .zip(ILLUMINANCE_TRANSFORM.iter())
                    .map(|(v, w)| v * w)
                    .sum()
            })
            .collect();
        Matrix::new(self.rows, self.cols, data)
    }

    /// Keep only the given columns, in order
    pub fn select_columns(&self, columns: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(self.rows * columns.len() * self.ncomp);
        for r in 0..self.rows {
            let row = self.row(r);
            for &c in columns {
                data.extend_from_slice(&row[c * self.ncomp..(c + 1) * self.ncomp]);
            }
        }
        Matrix {
            rows: self.rows,
            cols: columns.len(),
            ncomp: self.ncomp,
            data,
        }
    }
}

/// Read a Radiance matrix file
pub fn read_matrix(path: &Path) -> Result<Matrix, MatrixError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader)?;
    log::debug!(
        "Reading {}x{}x{} {:?} matrix from {}",
        header.rows,
        header.cols,
        header.ncomp,
        header.format,
        path.display()
    );
    read_data(&mut reader, &header)
}

/// Parse the header up to and including the blank separator line
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<Header, MatrixError> {
    let mut rows = None;
    let mut cols = None;
    let mut ncomp = 1;
    let mut format = DataFormat::Ascii;
    let mut big_endian = false;
    let mut notes = Vec::new();

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            break;
        }
        if trimmed.starts_with("#?") {
            continue;
        }

        match trimmed.split_once('=') {
            Some(("NROWS", value)) => rows = Some(parse_count("NROWS", value)?),
            Some(("NCOLS", value)) => cols = Some(parse_count("NCOLS", value)?),
            Some(("NCOMP", value)) => ncomp = parse_count("NCOMP", value)?,
            Some(("FORMAT", value)) => format = DataFormat::parse(value)?,
            Some(("BIGENDIAN", value)) => big_endian = value.trim() == "1",
            _ => notes.push(trimmed.to_string()),
        }
    }

    Ok(Header {
        rows: rows.ok_or(MatrixError::MissingField("NROWS"))?,
        cols: cols.ok_or(MatrixError::MissingField("NCOLS"))?,
        ncomp,
        format,
        big_endian,
        notes,
    })
}

fn parse_count(field: &'static str, value: &str) -> Result<usize, MatrixError> {
    value.trim().parse().map_err(|_| MatrixError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn read_data<R: Read>(reader: &mut R, header: &Header) -> Result<Matrix, MatrixError> {
    let expected = header.rows * header.cols * header.ncomp;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let data: Vec<f32> = match header.format {
        DataFormat::Ascii => {
            let text = String::from_utf8_lossy(&bytes);
            text.split_whitespace()
                .map(|token| {
                    token.parse::<f32>().map_err(|_| MatrixError::InvalidField {
                        field: "data",
                        value: token.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?
        }
        DataFormat::Float => bytes
            .chunks_exact(4)
            .map(|chunk| {
                let raw = [chunk[0], chunk[1], chunk[2], chunk[3]];
                if header.big_endian {
                    f32::from_be_bytes(raw)
                } else {
                    f32::from_le_bytes(raw)
                }
            })
            .collect(),
        DataFormat::Double => bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                let value = if header.big_endian {
                    f64::from_be_bytes(raw)
                } else {
                    f64::from_le_bytes(raw)
                };
                value as f32
            })
            .collect(),
    };

    if data.len() < expected {
        return Err(MatrixError::Truncated {
            expected,
            found: data.len(),
        });
    }

    let mut data = data;
    data.truncate(expected);

    Ok(Matrix {
        rows: header.rows,
        cols: header.cols,
        ncomp: header.ncomp,
        data,
    })
}

/// Write a little-endian float matrix with a Radiance header
pub fn write_float_matrix<W: Write>(writer: &mut W, matrix: &Matrix) -> std::io::Result<()> {
    writeln!(writer, "#?RADIANCE")?;
    writeln!(writer, "NROWS={}", matrix.rows)?;
    writeln!(writer, "NCOLS={}", matrix.cols)?;
    writeln!(writer, "NCOMP={}", matrix.ncomp)?;
    writeln!(writer, "BIGENDIAN=0")?;
    writeln!(writer, "FORMAT=float")?;
    writeln!(writer)?;
    for value in &matrix.data {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

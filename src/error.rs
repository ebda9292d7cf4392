// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed errors for the BSDF, matrix and session layers

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading BSDF XML metadata
#[derive(Debug, Error)]
pub enum BsdfError {
    #[error("XML file {file} has an invalid angle basis '{found}'. Angle basis must be 'Klems Full'.")]
    InvalidAngleBasis { file: String, found: String },

    #[error("XML file {file} does not declare an angle basis")]
    MissingAngleBasis { file: String },

    #[error("failed to parse BSDF XML {file}: {source}")]
    Xml {
        file: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("failed to read BSDF file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while decoding Radiance matrices
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("missing Radiance header field {0}")]
    MissingField(&'static str),

    #[error("invalid value for header field {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("unsupported matrix format '{0}'")]
    UnsupportedFormat(String),

    #[error("matrix data truncated: expected {expected} values, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("matrix has {cols} columns, expected 8760 or {sun_up} sun-up hours")]
    ColumnMismatch { cols: usize, sun_up: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by session state operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("BSDF '{0}' has not been loaded")]
    UnknownBsdf(String),
}

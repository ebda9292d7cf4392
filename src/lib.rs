// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! bsdfview
//!
//! Annual daylight dashboard for Klems BSDF window systems. Uploaded BSDFs are
//! validated, run through a three-phase Radiance simulation, summarised as
//! daylight metrics and rendered as a coloured 3D scene.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod radiance;
pub mod results;
pub mod server;
pub mod session;
pub mod visualization;

pub use config::AppConfig;
pub use error::{BsdfError, MatrixError, SessionError};
pub use metrics::{MetricsRow, MetricsTable};
pub use model::Model;
pub use pipeline::{Dashboard, UploadOutcome};
pub use radiance::{check_angle_basis, AngleBasis, BsdfInfo, Matrix, MatrixEngine, Rmtxop};
pub use session::SessionState;

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Radiance inputs and the external three-phase calculation

pub mod bsdf;
pub mod matrix;
pub mod rmtxop;

pub use bsdf::{check_angle_basis, AngleBasis, BsdfInfo};
pub use matrix::{read_matrix, write_float_matrix, Matrix, ILLUMINANCE_TRANSFORM};
pub use rmtxop::{three_phase_illuminance, MatrixEngine, Rmtxop, ThreePhaseInputs};

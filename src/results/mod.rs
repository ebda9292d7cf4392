// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Results folders, arrays and annual daylight metrics

pub mod annual;
pub mod folder;
pub mod npy;
pub mod schedule;

pub use annual::{
    annual_metrics, compute_metrics, read_metric_values, AnnualDaylight, GridInfo, GridMetrics,
    Metric, Thresholds,
};
pub use folder::{copy_results_folder, copy_tree};
pub use npy::{read_npy, write_npy};
pub use schedule::default_schedule;

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Summary metrics per BSDF

pub mod summary;
pub mod table;

pub use summary::{spatial_daylight_autonomy, MetricsRow};
pub use table::{escape_html, MetricsTable, ACTIVE_ROW_STYLE};

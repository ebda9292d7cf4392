// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Terminal output for the bsdfview CLI

pub mod reporter;

pub use reporter::Reporter;

use chrono::{DateTime, Utc};
use std::io::Write;
use std::time::SystemTime;

/// Map a verbosity count to a log filter
pub fn log_filter_from_level(level: u8) -> log::LevelFilter {
    match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Initialise the logger; `RUST_LOG` overrides the verbosity
pub fn init_logging(verbosity: u8, timestamp: bool, launch_time: SystemTime) {
    env_logger::builder()
        .format(move |buf, record| {
            let module = record
                .module_path()
                .and_then(|path| path.split("::").next())
                .unwrap_or("bsdfview");
            if timestamp {
                let elapsed = launch_time.elapsed().unwrap_or_default();
                writeln!(
                    buf,
                    "{}:{:02}:{:02}.{:03} {:5} [{}]: {}",
                    elapsed.as_secs() / 3600,
                    (elapsed.as_secs() / 60) % 60,
                    elapsed.as_secs() % 60,
                    elapsed.as_millis() % 1000,
                    record.level(),
                    module,
                    record.args()
                )
            } else {
                writeln!(buf, "{:5} [{}]: {}", record.level(), module, record.args())
            }
        })
        .filter_level(log_filter_from_level(verbosity))
        .filter(Some("hyper"), log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    log::debug!(
        "bsdfview launched at {} on {}",
        DateTime::<Utc>::from(launch_time),
        std::env::consts::OS
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_from_level() {
        assert_eq!(log_filter_from_level(0), log::LevelFilter::Warn);
        assert_eq!(log_filter_from_level(1), log::LevelFilter::Info);
        assert_eq!(log_filter_from_level(7), log::LevelFilter::Trace);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Occupancy schedules

/// Hours in a non-leap year
pub const HOURS_PER_YEAR: usize = 8760;

/// Default occupancy: weekdays from 08:00 to 18:00, the year starts on a Sunday
pub fn default_schedule() -> Vec<bool> {
    let weekday: Vec<bool> = (0..24).map(|h| (8..18).contains(&h)).collect();
    let weekend = vec![false; 24];

    let mut week = weekend.clone();
    for _ in 0..5 {
        week.extend_from_slice(&weekday);
    }
    week.extend_from_slice(&weekend);

    let mut year = Vec::with_capacity(HOURS_PER_YEAR);
    for _ in 0..52 {
        year.extend_from_slice(&week);
    }
    year.extend_from_slice(&weekend);
    year
}

/// Occupancy flag for each sun-up hour
pub fn occupancy_at(schedule: &[bool], sun_up_hours: &[f32]) -> Vec<bool> {
    sun_up_hours
        .iter()
        .map(|hour| {
            let index = hour.floor().max(0.0) as usize % schedule.len().max(1);
            schedule.get(index).copied().unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_shape() {
        let schedule = default_schedule();
        assert_eq!(schedule.len(), HOURS_PER_YEAR);
        assert_eq!(schedule.iter().filter(|o| **o).count(), 52 * 5 * 10);
    }

    #[test]
    fn test_first_day_is_weekend() {
        let schedule = default_schedule();
        assert!(schedule[..24].iter().all(|o| !o));
        // Monday 08:00 and 17:00 occupied, 18:00 free
        assert!(schedule[24 + 8]);
        assert!(schedule[24 + 17]);
        assert!(!schedule[24 + 18]);
    }

    #[test]
    fn test_occupancy_at_half_hours() {
        let schedule = default_schedule();
        let occ = occupancy_at(&schedule, &[6.5, 32.5, 40.5]);
        assert_eq!(occ, vec![false, true, true]);
    }
}

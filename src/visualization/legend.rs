// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Legend colour ramp for grid data

/// Ladybug "original" colour set, low to high
pub const ORIGINAL_COLORS: [[u8; 3]; 10] = [
    [75, 107, 169],
    [115, 147, 202],
    [170, 200, 247],
    [193, 213, 208],
    [245, 239, 103],
    [252, 230, 74],
    [239, 156, 21],
    [234, 123, 0],
    [234, 74, 0],
    [234, 38, 0],
];

/// Maps values in `[min, max]` onto a colour ramp
#[derive(Debug, Clone)]
pub struct Legend {
    pub min: f32,
    pub max: f32,
    colors: Vec<[u8; 3]>,
}

impl Legend {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            colors: ORIGINAL_COLORS.to_vec(),
        }
    }

    /// Legend for percentage metrics
    pub fn percent() -> Self {
        Self::new(0.0, 100.0)
    }

    /// sRGB colour of a value; values outside the range are clamped
    pub fn color(&self, value: f32) -> [u8; 3] {
        let span = self.max - self.min;
        let t = if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let position = t * (self.colors.len() - 1) as f32;
        let lower = position.floor() as usize;
        let upper = (lower + 1).min(self.colors.len() - 1);
        let fraction = position - lower as f32;

        let a = self.colors[lower];
        let b = self.colors[upper];
        [0, 1, 2].map(|i| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * fraction).round() as u8)
    }

    /// Linear RGB colour for glTF vertex colours
    pub fn linear_color(&self, value: f32) -> [f32; 3] {
        self.color(value).map(srgb_to_linear)
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let legend = Legend::percent();
        assert_eq!(legend.color(0.0), [75, 107, 169]);
        assert_eq!(legend.color(100.0), [234, 38, 0]);
        assert_eq!(legend.color(-5.0), [75, 107, 169]);
        assert_eq!(legend.color(250.0), [234, 38, 0]);
    }

    #[test]
    fn test_interpolates_between_colors() {
        let legend = Legend::new(0.0, 9.0);
        assert_eq!(legend.color(4.0), [245, 239, 103]);
        assert_eq!(legend.color(4.5), [249, 235, 89]);
    }

    #[test]
    fn test_degenerate_range() {
        let legend = Legend::new(5.0, 5.0);
        assert_eq!(legend.color(5.0), ORIGINAL_COLORS[0]);
    }

    #[test]
    fn test_linear_color_range() {
        let color = Legend::percent().linear_color(50.0);
        assert!(color.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}

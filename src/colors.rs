//! Color helpers shared by the brand-card pipeline and the scorer.
//!
//! Colors travel through the crate as `#rrggbb` strings because that is what
//! the templates and the palette report print. Callers guarantee the
//! 7-character form; parsing a malformed string yields channel value 0.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Sum of absolute per-channel differences, 0..=765.
    pub fn channel_distance(self, other: Rgb) -> u32 {
        (self.r as i32 - other.r as i32).unsigned_abs()
            + (self.g as i32 - other.g as i32).unsigned_abs()
            + (self.b as i32 - other.b as i32).unsigned_abs()
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

/// Precondition: `hex` is a well-formed `#rrggbb` string.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    Rgb::new(channel(1..3), channel(3..5), channel(5..7))
}

/// Perceptual brightness in 0..=1 (0.299/0.587/0.114 weighting, no gamma).
pub fn relative_luminance(hex: &str) -> f64 {
    let Rgb { r, g, b } = hex_to_rgb(hex);
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

/// WCAG 2.0 relative luminance with sRGB linearization.
pub fn wcag_luminance(rgb: Rgb) -> f64 {
    fn linear(channel: u8) -> f64 {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * linear(rgb.r) + 0.7152 * linear(rgb.g) + 0.0722 * linear(rgb.b)
}

pub fn contrast_ratio(a: &str, b: &str) -> f64 {
    let lum_a = relative_luminance(a);
    let lum_b = relative_luminance(b);
    (lum_a.max(lum_b) + 0.05) / (lum_a.min(lum_b) + 0.05)
}

//! Depth color gradient
//!
//! Maps a depth in meters to a marker color. The gradient is built once in
//! HSV space with constant saturation and value: the first band runs from
//! red to green over the shallow depths, the second from green towards
//! blue up to the maximum depth.

pub mod hsv;
pub mod legend;

pub use hsv::hsv_to_rgb;
pub use legend::{DepthLegend, LegendCell};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hue at the shallow end of the first band (red)
const START_HUE: f64 = 0.0;
/// Hue where the first band ends and the second one starts (green)
const SPLIT_HUE: f64 = 120.0;
/// Hue at the deep end of the second band (blue)
const END_HUE: f64 = 240.0;
const SATURATION: f64 = 100.0;
const VALUE: f64 = 100.0;

/// An RGBA color as used by markers, the legend and the histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Color {
    /// Fully transparent; marks "no data" in slot 0 of the gradient
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, alpha: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 255 }
    }

    /// Build an opaque color from channels in the range 0.0 - 1.0
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let channel = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha == 0
    }

    /// CSS representation: `#rrggbb` when opaque, `rgba(...)` otherwise
    pub fn css(&self) -> String {
        if self.alpha == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                self.alpha as f64 / 255.0
            )
        }
    }
}

/// Gradient construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    /// Depths greater than this are shown with the deepest color (meters)
    pub max_depth: u32,
    /// Depth at which the red-green band turns into the green-blue band
    pub split: u32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            max_depth: 40,
            split: 10,
        }
    }
}

/// Depth to color mapping indexed by whole meters
#[derive(Debug, Clone)]
pub struct DepthGradient {
    colors: Vec<Color>,
}

impl DepthGradient {
    pub fn new(config: &GradientConfig) -> Self {
        let max_depth = config.max_depth.max(1);
        let split = config.split.clamp(1, max_depth);
        if max_depth != config.max_depth || split != config.split {
            debug!(
                max_depth,
                split, "gradient parameters out of range, using clamped values"
            );
        }

        let mut colors = Vec::with_capacity(max_depth as usize + 1);
        colors.push(Color::TRANSPARENT);

        for step in 0..split {
            let hue = interpolate(step, split, START_HUE, SPLIT_HUE);
            colors.push(hsv_to_rgb(hue, SATURATION, VALUE));
        }
        // The second band is interpolated against the full depth range,
        // continuing from the step index the first band stopped at.
        for step in split..max_depth {
            let hue = interpolate(step, max_depth, SPLIT_HUE, END_HUE);
            colors.push(hsv_to_rgb(hue, SATURATION, VALUE));
        }

        Self { colors }
    }

    /// Color for a depth in meters. The depth is rounded up; anything
    /// shallower than one meter gets the first real color and anything
    /// past the end of the gradient gets the last one.
    pub fn color(&self, depth: f64) -> Color {
        let rounded = depth.ceil();
        if !(rounded >= 1.0) {
            // Also catches NaN.
            return self.colors[1];
        }
        if rounded >= self.colors.len() as f64 {
            return self.colors[self.colors.len() - 1];
        }
        self.colors[rounded as usize]
    }

    /// Raw gradient slot, including the transparent slot 0
    pub fn slot(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn legend(&self) -> DepthLegend {
        DepthLegend::from_gradient(self)
    }
}

impl Default for DepthGradient {
    fn default() -> Self {
        Self::new(&GradientConfig::default())
    }
}

fn interpolate(step: u32, chunks: u32, start: f64, end: f64) -> f64 {
    step as f64 * ((end - start) / chunks as f64) + start
}

/// Label for a legend cell: the depth itself on every fifth meter,
/// empty elsewhere.
pub fn depth_figure(depth: f64) -> String {
    if (depth % 5.0).floor() != 0.0 {
        return String::new();
    }
    format!("{}", depth)
}

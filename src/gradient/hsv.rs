//! HSV to RGB conversion
//!
//! Hue runs from 0 to 360 degrees, saturation and value from 0 to 100,
//! the same ranges image editors use.

use super::Color;

/// Convert a hue/saturation/value triple into an opaque RGB color.
/// Out-of-range arguments are clamped.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Color {
    let h = hue.clamp(0.0, 360.0);
    let s = saturation.clamp(0.0, 100.0) / 100.0;
    let v = value.clamp(0.0, 100.0) / 100.0;

    if s == 0.0 {
        // Achromatic
        return Color::from_unit(v, v, v);
    }

    let h = h / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        // sector 5, and 6 for hue == 360
        _ => (v, p, q),
    };

    Color::from_unit(r, g, b)
}

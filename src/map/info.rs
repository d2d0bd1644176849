//! Content of the marker info popup

use crate::core::Measurement;
use chrono::NaiveDateTime;
use maud::{html, Markup};

/// Name and class of the validity checkbox inside the popup
pub const VALID_DEPTH_CHECKBOX: &str = "validDepthCheckBox";

/// Length of a `YYYYMMDDHHMMSS` timestamp
const COMPACT_TIMESTAMP_LEN: usize = 14;

/// Turn `YYYYMMDDHHMMSS` into `YYYY-MM-DD HH:MM:SS UTC`; anything else
/// yields an empty string.
pub fn format_timestamp(raw: &str) -> String {
    if raw.len() != COMPACT_TIMESTAMP_LEN {
        return String::new();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S") {
        Ok(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Err(_) => String::new(),
    }
}

/// Checkbox form that is checked while the measurement is considered valid
pub fn validity_checkbox(point: &Measurement) -> Markup {
    html! {
        form {
            "Depth measurement valid: "
            input type="checkbox" name=(VALID_DEPTH_CHECKBOX) class=(VALID_DEPTH_CHECKBOX) value="1"
                checked=[(!point.depth_erroneous).then_some("1")];
        }
    }
}

/// HTML shown when a marker is clicked
pub fn info_window_html(point: &Measurement, with_validity_checkbox: bool) -> String {
    let mut lines = vec![
        format_timestamp(&point.timestamp_utc),
        format!("{} / {}", point.latitude, point.longitude),
    ];
    if let Some(depth) = point.depth {
        lines.push(format!("Depth: {}m", depth));
    }
    if let Some(speed) = point.water_speed {
        lines.push(format!("Water speed: {} kn", speed));
    }
    if let Some(speed) = point.ground_speed {
        lines.push(format!("Ground speed: {} kn", speed));
    }
    if let Some(course) = point.course {
        lines.push(format!("Course: {}°", course));
    }
    lines.push(format!("position_id: {}", point.position_id));

    html! {
        p {
            @for (i, line) in lines.iter().enumerate() {
                @if i > 0 { br; }
                (line)
            }
            @if with_validity_checkbox {
                br;
                (validity_checkbox(point))
            }
        }
    }
    .into_string()
}

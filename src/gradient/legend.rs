//! Depth legend table
//!
//! One cell per gradient slot, colored like the markers of the same depth.
//! Every fifth cell carries the depth figure.

use super::{depth_figure, Color, DepthGradient};
use maud::html;

/// A single legend cell
#[derive(Debug, Clone, PartialEq)]
pub struct LegendCell {
    pub id: String,
    pub label: String,
    pub color: Color,
}

/// Legend derived from a gradient
#[derive(Debug, Clone, PartialEq)]
pub struct DepthLegend {
    cells: Vec<LegendCell>,
}

impl DepthLegend {
    pub fn from_gradient(gradient: &DepthGradient) -> Self {
        let colors = gradient.colors();
        let cells = colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                // Slot 0 is transparent; show the shallowest color there.
                let color = if i == 0 {
                    colors.get(1).copied().unwrap_or(*color)
                } else {
                    *color
                };
                LegendCell {
                    id: cell_id(i),
                    label: depth_figure(i as f64),
                    color,
                }
            })
            .collect();

        Self { cells }
    }

    pub fn cells(&self) -> &[LegendCell] {
        &self.cells
    }

    /// Render the legend as an HTML table with inline cell styles
    pub fn to_html(&self) -> String {
        html! {
            table id="legend_table" {
                tbody {
                    tr {
                        td { "Depth legend (m):" }
                        @for cell in &self.cells {
                            td id=(cell.id)
                                style=(format!("background-color: {}; width: 1em; text-align: right", cell.color.css())) {
                                (cell.label)
                            }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

pub fn cell_id(cell: usize) -> String {
    format!("depthLegendCell_{}", cell)
}

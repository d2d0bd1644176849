//! Histogram of measured depths
//!
//! Depths are rounded up to whole meters and counted in uniform bins over
//! `[0, domain_max]`. The result can be rendered as an SVG bar chart whose
//! bars use the depth gradient colors.

use crate::gradient::DepthGradient;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 440;
const MARGIN_TOP: i32 = 10;
const MARGIN_RIGHT: i32 = 40;
const MARGIN_BOTTOM: i32 = 25;
const MARGIN_LEFT: i32 = 10;
const TICK_STEP_M: f64 = 5.0;

pub const HISTOGRAM_CAPTION: &str = "Distribution of depths";

#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("failed to render histogram: {0}")]
    Render(String),
}

/// Histogram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Whether the depth feed maintains a histogram at all
    pub enabled: bool,
    /// Upper end of the depth axis (meters)
    pub domain_max: f64,
    pub bin_count: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            domain_max: 40.0,
            bin_count: 20,
        }
    }
}

/// One histogram bar
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct DepthHistogram {
    domain_max: f64,
    bin_count: usize,
}

impl DepthHistogram {
    pub fn new(config: &HistogramConfig) -> Self {
        Self {
            domain_max: if config.domain_max > 0.0 { config.domain_max } else { 40.0 },
            bin_count: config.bin_count.max(1),
        }
    }

    fn bin_width(&self) -> f64 {
        self.domain_max / self.bin_count as f64
    }

    /// Count depths into bins. Bins are half-open except the last one,
    /// which also holds `domain_max`. Depths outside the domain are ignored.
    pub fn bins<I>(&self, depths: I) -> Vec<HistogramBin>
    where
        I: IntoIterator<Item = f64>,
    {
        let width = self.bin_width();
        let mut bins: Vec<HistogramBin> = (0..self.bin_count)
            .map(|i| HistogramBin {
                start: i as f64 * width,
                end: (i + 1) as f64 * width,
                count: 0,
            })
            .collect();

        for depth in depths {
            let depth = depth.ceil();
            if !(0.0..=self.domain_max).contains(&depth) {
                continue;
            }
            let index = ((depth / width).floor() as usize).min(self.bin_count - 1);
            bins[index].count += 1;
        }

        bins
    }

    /// Render bins as a standalone SVG document
    pub fn render_svg(
        &self,
        bins: &[HistogramBin],
        gradient: &DepthGradient,
    ) -> Result<String, HistogramError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let plot = root.margin(MARGIN_TOP, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT);
            let (plot_width, plot_height) = plot.dim_in_pixel();
            let (plot_width, plot_height) = (plot_width as i32, plot_height as i32);
            let x = |depth: f64| (depth / self.domain_max * plot_width as f64).round() as i32;

            let max_count = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1);
            let label_style = ("sans-serif", 10)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top));

            for bin in bins {
                let bar_height =
                    (bin.count as f64 / max_count as f64 * plot_height as f64).round() as i32;
                let top = plot_height - bar_height;
                let color = gradient.color(bin.end);
                let (left, right) = (x(bin.start) + 1, x(bin.end));

                plot.draw(&Rectangle::new(
                    [(left, top), (right, plot_height)],
                    RGBColor(color.r, color.g, color.b).filled(),
                ))
                .map_err(render_error)?;

                if bin.count > 0 {
                    plot.draw(&Text::new(
                        bin.count.to_string(),
                        ((left + right) / 2, top + 6),
                        label_style.clone(),
                    ))
                    .map_err(render_error)?;
                }
            }

            plot.draw(&PathElement::new(
                vec![(0, plot_height), (plot_width, plot_height)],
                BLACK.stroke_width(1),
            ))
            .map_err(render_error)?;

            let mut tick = 0.0;
            while tick <= self.domain_max {
                root.draw(&Text::new(
                    format!("{:.0}", tick),
                    (MARGIN_LEFT + x(tick), MARGIN_TOP + plot_height + 4),
                    label_style.clone(),
                ))
                .map_err(render_error)?;
                tick += TICK_STEP_M;
            }

            plot.draw(&Text::new(
                "Depth (m)",
                (plot_width, plot_height - 6),
                ("sans-serif", 12)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Right, VPos::Bottom)),
            ))
            .map_err(render_error)?;

            root.present().map_err(render_error)?;
        }
        Ok(svg)
    }

    /// SVG chart followed by its caption, ready to be placed in the page
    pub fn render_html(
        &self,
        bins: &[HistogramBin],
        gradient: &DepthGradient,
    ) -> Result<String, HistogramError> {
        let svg = self.render_svg(bins, gradient)?;
        Ok(format!(
            "<div id=\"graph\" style=\"width: {}px\">{}<p class=\"img_text\">{}</p></div>",
            WIDTH, svg, HISTOGRAM_CAPTION
        ))
    }
}

impl Default for DepthHistogram {
    fn default() -> Self {
        Self::new(&HistogramConfig::default())
    }
}

fn render_error<E: std::fmt::Display>(error: E) -> HistogramError {
    HistogramError::Render(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_layout() {
        let histogram = DepthHistogram::default();
        let bins = histogram.bins(std::iter::empty());
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[0].end, 2.0);
        assert_eq!(bins[19].end, 40.0);
        assert!(bins.iter().all(|bin| bin.count == 0));
    }

    #[test]
    fn test_depths_are_rounded_up_before_binning() {
        let histogram = DepthHistogram::default();
        // 1.2 -> 2 lands in [2, 4); 0.0 stays in [0, 2); 3.9 -> 4 in [4, 6)
        let bins = histogram.bins(vec![1.2, 0.0, 3.9, 2.0]);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins[2].count, 1);
    }

    #[test]
    fn test_upper_edge_and_out_of_range() {
        let histogram = DepthHistogram::default();
        let bins = histogram.bins(vec![40.0, 39.5, 40.2, -1.5, f64::NAN]);
        // 40 and 39.5 (-> 40) go to the last bin, 40.2 (-> 41) is dropped,
        // -1.5 rounds up to -1 which is outside the domain
        assert_eq!(bins[19].count, 2);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_render_svg() {
        let histogram = DepthHistogram::default();
        let gradient = DepthGradient::default();
        let bins = histogram.bins(vec![1.0, 2.0, 2.5, 12.0, 30.0]);
        let svg = histogram.render_svg(&bins, &gradient).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<rect"));
        assert!(svg.contains("Depth (m)"));

        let html = histogram.render_html(&bins, &gradient).unwrap();
        assert!(html.contains(HISTOGRAM_CAPTION));
    }
}

//! Chart variants.
//!
//! Every chart is a [`Chart`](climviz_core::chart::Chart) trait object: the
//! serialisable fields are its configuration and everything picked up at mount
//! time is `#[serde(skip)]`. Marks are drawn in absolute coordinates of the
//! chart's render root, margins included.
//!
//! This module also holds the drawing helpers shared by the variants: margins,
//! number formatting, axes and legends.

mod alluvial;
mod choropleth;
mod dumbbell;
mod heatmap;
mod line;
mod lollipop;
mod radar;
mod stacked_bar;
mod top_n_bar;

pub use alluvial::AlluvialChart;
pub use choropleth::ChoroplethChart;
pub use dumbbell::DumbbellChart;
pub use heatmap::HeatmapChart;
pub use line::LineChart;
pub use lollipop::LollipopChart;
pub use radar::RadarChart;
pub use stacked_bar::StackedBarChart;
pub use top_n_bar::{Orientation, TopNBarChart};

use climviz_core::color::{Rgb, AXIS, GRID, TEXT};
use climviz_core::dataset::FloatValue;
use climviz_core::document::{Mark, RenderSurface, Size, TextAnchor};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::{BandScale, LinearScale, PointScale};
use serde::{Deserialize, Serialize};

/// Space between the edge of the render root and the plot area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: FloatValue,
    pub right: FloatValue,
    pub bottom: FloatValue,
    pub left: FloatValue,
}

impl Margin {
    pub const fn new(
        top: FloatValue,
        right: FloatValue,
        bottom: FloatValue,
        left: FloatValue,
    ) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn inner_width(&self, size: Size) -> FloatValue {
        size.width - self.left - self.right
    }

    pub fn inner_height(&self, size: Size) -> FloatValue {
        size.height - self.top - self.bottom
    }

    /// Horizontal pixel range of the plot area
    pub fn x_range(&self, size: Size) -> (FloatValue, FloatValue) {
        (self.left, size.width - self.right)
    }

    /// Vertical pixel range of the plot area, bottom first
    pub fn y_range(&self, size: Size) -> (FloatValue, FloatValue) {
        (size.height - self.bottom, self.top)
    }
}

/// Group the integer digits in threes, e.g. `1234567.5` → `"1,234,567.5"`
pub fn format_grouped(value: FloatValue) -> String {
    let text = format!("{}", value.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    if value < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Rounded to a whole number and grouped, e.g. `1234.6` → `"1,235"`
pub fn format_thousands(value: FloatValue) -> String {
    format_grouped(value.round())
}

/// Grouped with at most three decimals, e.g. `531867.153` → `"531,867.153"`
pub fn format_locale(value: FloatValue) -> String {
    format_grouped((value * 1000.0).round() / 1000.0)
}

/// Unit of `dataset` as registered, empty if unknown
pub(crate) fn registered_unit(registry: &DatasetRegistry, dataset: &str) -> String {
    registry
        .get(dataset)
        .map(|definition| definition.unit)
        .unwrap_or_default()
}

/// `preferred` if it is one of `options`, otherwise the last option
pub(crate) fn initial_option(options: &[String], preferred: &str) -> String {
    if options.iter().any(|o| o == preferred) {
        preferred.to_string()
    } else {
        options.last().cloned().unwrap_or_else(|| preferred.to_string())
    }
}

pub(crate) fn draw_title(surface: &mut dyn RenderSurface, y: FloatValue, text: impl Into<String>) {
    let x = surface.size().width / 2.0;
    surface.draw(
        Mark::text(x, y, text)
            .anchor(TextAnchor::Middle)
            .font_size(18.0)
            .fill(TEXT)
            .class("title"),
    );
}

/// Axis title rotated to run along a vertical axis
pub(crate) fn draw_vertical_label(
    surface: &mut dyn RenderSurface,
    x: FloatValue,
    y: FloatValue,
    text: &str,
) {
    surface.draw(
        Mark::text(x, y, text)
            .anchor(TextAnchor::Middle)
            .rotate(-90.0)
            .fill(TEXT)
            .class("axis-label"),
    );
}

/// Tick positions and labels of a linear scale
pub(crate) fn linear_ticks(
    scale: &LinearScale,
    count: usize,
    format: impl Fn(FloatValue) -> String,
) -> Vec<(FloatValue, String)> {
    scale
        .ticks(count)
        .into_iter()
        .map(|tick| (scale.apply(tick), format(tick)))
        .collect()
}

/// Band centres and their keys
pub(crate) fn band_ticks(scale: &BandScale) -> Vec<(FloatValue, String)> {
    scale
        .domain()
        .iter()
        .filter_map(|key| Some((scale.center(key)?, key.clone())))
        .collect()
}

pub(crate) fn point_ticks(scale: &PointScale) -> Vec<(FloatValue, String)> {
    scale
        .domain()
        .iter()
        .filter_map(|key| Some((scale.apply(key)?, key.clone())))
        .collect()
}

/// Horizontal axis line at `y` with a label under every tick.
///
/// A non-zero `rotate` turns the labels and anchors them at their end.
pub(crate) fn draw_bottom_axis(
    surface: &mut dyn RenderSurface,
    y: FloatValue,
    x_range: (FloatValue, FloatValue),
    ticks: &[(FloatValue, String)],
    rotate: FloatValue,
) {
    surface.draw(Mark::line(x_range.0, y, x_range.1, y).stroke(AXIS, 1.0).class("axis"));
    let anchor = if rotate == 0.0 {
        TextAnchor::Middle
    } else {
        TextAnchor::End
    };
    for (x, label) in ticks {
        surface.draw(Mark::line(*x, y, *x, y + 6.0).stroke(AXIS, 1.0).class("axis"));
        surface.draw(
            Mark::text(*x, y + 18.0, label.clone())
                .anchor(anchor)
                .rotate(rotate)
                .font_size(12.0)
                .fill(TEXT)
                .class("tick"),
        );
    }
}

/// Vertical axis line at `x` with right-aligned labels
pub(crate) fn draw_left_axis(
    surface: &mut dyn RenderSurface,
    x: FloatValue,
    y_range: (FloatValue, FloatValue),
    ticks: &[(FloatValue, String)],
) {
    surface.draw(Mark::line(x, y_range.0, x, y_range.1).stroke(AXIS, 1.0).class("axis"));
    for (y, label) in ticks {
        surface.draw(Mark::line(x - 6.0, *y, x, *y).stroke(AXIS, 1.0).class("axis"));
        surface.draw(
            Mark::text(x - 9.0, *y, label.clone())
                .anchor(TextAnchor::End)
                .font_size(12.0)
                .fill(TEXT)
                .class("tick"),
        );
    }
}

/// Faint lines across the plot area at each tick
pub(crate) fn draw_grid_rows(
    surface: &mut dyn RenderSurface,
    x_range: (FloatValue, FloatValue),
    ticks: &[(FloatValue, String)],
) {
    for (y, _) in ticks {
        surface.draw(Mark::line(x_range.0, *y, x_range.1, *y).stroke(GRID, 1.0).class("grid"));
    }
}

/// Coloured squares with a label each, stacked downwards from `(x, y)`
pub(crate) fn draw_swatch_legend(
    surface: &mut dyn RenderSurface,
    x: FloatValue,
    y: FloatValue,
    items: &[(String, Rgb)],
) {
    for (i, (label, color)) in items.iter().enumerate() {
        let top = y + i as FloatValue * 20.0;
        surface.draw(Mark::rect(x, top, 19.0, 19.0).fill(*color).class("legend"));
        surface.draw(
            Mark::text(x + 24.0, top + 9.5, label.clone())
                .font_size(10.0)
                .fill(TEXT)
                .class("legend"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1234.0), "1,234");
        assert_eq!(format_grouped(-1234567.5), "-1,234,567.5");
        assert_eq!(format_thousands(261326674.4), "261,326,674");
        assert_eq!(format_thousands(1234.6), "1,235");
        assert_eq!(format_locale(531867.15349), "531,867.153");
    }

    #[test]
    fn initial_option_falls_back_to_latest() {
        let options = vec!["2018".to_string(), "2022".to_string()];
        assert_eq!(initial_option(&options, "2018"), "2018");
        assert_eq!(initial_option(&options, "2020"), "2022");
        assert_eq!(initial_option(&[], "2020"), "2020");
    }

    #[test]
    fn margins() {
        let margin = Margin::new(60.0, 30.0, 30.0, 200.0);
        let size = Size::default();
        assert_eq!(margin.inner_width(size), 670.0);
        assert_eq!(margin.inner_height(size), 410.0);
        assert_eq!(margin.x_range(size), (200.0, 870.0));
        assert_eq!(margin.y_range(size), (470.0, 60.0));
    }
}

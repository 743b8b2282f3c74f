//! Stacked bar chart
//!
//! One column per selected entity, with a segment per key stacked bottom up in
//! the configured key order. A key an entity has no value for adds a
//! zero-height segment.

use super::{
    band_ticks, draw_bottom_axis, draw_left_axis, draw_swatch_legend, format_grouped, linear_ticks,
    Margin,
};
use climviz_core::chart::{
    check_options, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{ordinal, Rgb, TABLEAU_10};
use climviz_core::dataset::Dataset;
use climviz_core::document::{Mark, RenderSurface};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::{BandScale, LinearScale};
use climviz_core::selection::{MultiSelection, COMPARISON_MINIMUM};
use climviz_core::view::{stack_layers, stack_max, top_by_total, StackLayer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MARGIN: Margin = Margin::new(60.0, 30.0, 30.0, 200.0);

#[derive(Debug, Clone)]
struct StackedState {
    dataset: Arc<Dataset>,
    entities: Vec<String>,
    selection: MultiSelection,
}

fn default_keys() -> Vec<String> {
    [
        "Actual evapotranspiration",
        "Internal flow",
        "Total actual outflow",
        "Actual external inflow from neighbouring territories",
        "Precipitation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_minimum() -> usize {
    COMPARISON_MINIMUM
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StackedBarChart {
    title: String,
    dataset: String,
    /// Stacked keys, bottom first
    #[serde(default = "default_keys")]
    keys: Vec<String>,
    #[serde(default = "default_minimum")]
    minimum: usize,
    #[serde(skip)]
    state: Option<StackedState>,
}

impl StackedBarChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            keys: default_keys(),
            minimum: default_minimum(),
            state: None,
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn layers(&self) -> ClimvizResult<Vec<StackLayer>> {
        let state = mounted(&self.state, &self.title)?;
        Ok(stack_layers(&state.dataset, state.selection.values(), &self.keys))
    }

    fn key_color(&self, index: usize) -> Rgb {
        ordinal(&TABLEAU_10, index)
    }
}

#[typetag::serde]
impl Chart for StackedBarChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        self.state = Some(StackedState {
            entities: dataset.entities().map(str::to_string).collect(),
            selection: MultiSelection::new(
                top_by_total(&dataset, COMPARISON_MINIMUM),
                self.minimum,
            ),
            dataset,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    fn controls(&self) -> Vec<Control> {
        match &self.state {
            Some(state) => vec![Control::multiple(
                format!("Select Countries (minimum {})", self.minimum),
                state.entities.clone(),
                state.selection.values(),
                self.minimum,
            )
            .with_help(format!(
                "Select countries to compare their water resources (minimum {} countries required)",
                self.minimum
            ))],
            None => Vec::new(),
        }
    }

    fn apply(&mut self, input: SelectionInput) -> ClimvizResult<bool> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ClimvizError::NotMounted(self.title.clone()))?;
        match input {
            SelectionInput::Entities(values) => {
                check_options(InputKind::Entities, &state.entities, &values)?;
                state.selection.set(values)
            }
            other => Err(invalid_input(&self.title, &other)),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()> {
        let state = mounted(&self.state, &self.title)?;
        let layers = self.layers()?;
        let size = surface.size();

        let x = BandScale::new(
            state.selection.values().iter().map(String::as_str),
            MARGIN.x_range(size),
        )
        .with_padding(0.1);
        let y = LinearScale::new((0.0, stack_max(&layers).unwrap_or(0.0)), MARGIN.y_range(size));

        for (index, layer) in layers.iter().enumerate() {
            let color = self.key_color(index);
            for (entity, segment) in &layer.segments {
                let Some(left) = x.apply(entity) else {
                    continue;
                };
                let top = y.apply(segment.y1);
                surface.draw(
                    Mark::rect(left, top, x.bandwidth(), y.apply(segment.y0) - top)
                        .fill(color)
                        .tooltip(format!("{}\nValue: {:.2}", layer.key, segment.height()))
                        .transition(0, 1000)
                        .class("segment"),
                );
            }
        }

        let baseline = size.height - MARGIN.bottom;
        draw_bottom_axis(surface, baseline, MARGIN.x_range(size), &band_ticks(&x), -30.0);
        let y_ticks = linear_ticks(&y, 10, format_grouped);
        draw_left_axis(surface, MARGIN.left, MARGIN.y_range(size), &y_ticks);

        let legend: Vec<(String, Rgb)> = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), self.key_color(i)))
            .collect();
        draw_swatch_legend(surface, size.width - MARGIN.right - 200.0, MARGIN.top, &legend);
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

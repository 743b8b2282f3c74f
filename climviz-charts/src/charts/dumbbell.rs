//! Dumbbell chart comparing two years per entity

use super::{
    band_ticks, draw_bottom_axis, draw_grid_rows, draw_left_axis, format_grouped, linear_ticks,
    registered_unit, Margin,
};
use climviz_core::chart::{
    check_options, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{Rgb, AXIS};
use climviz_core::dataset::Dataset;
use climviz_core::document::{Mark, RenderSurface};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::{BandScale, LinearScale};
use climviz_core::selection::{MultiSelection, COMPARISON_MINIMUM};
use climviz_core::view::{dumbbell_max, dumbbell_rows, top_by_total, DumbbellRow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MARGIN: Margin = Margin::new(60.0, 30.0, 100.0, 80.0);
const START_COLOR: Rgb = Rgb::hex(0x0000ff);
const END_COLOR: Rgb = Rgb::hex(0xff0000);

#[derive(Debug, Clone)]
struct DumbbellState {
    dataset: Arc<Dataset>,
    unit: String,
    entities: Vec<String>,
    selection: MultiSelection,
}

fn default_start() -> String {
    "2020".to_string()
}

fn default_end() -> String {
    "2023".to_string()
}

fn default_minimum() -> usize {
    COMPARISON_MINIMUM
}

/// Value at `start` and at `end` for each selected entity, joined by a line
#[derive(Debug, Serialize, Deserialize)]
pub struct DumbbellChart {
    title: String,
    dataset: String,
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_end")]
    end: String,
    #[serde(default = "default_minimum")]
    minimum: usize,
    #[serde(skip)]
    state: Option<DumbbellState>,
}

impl DumbbellChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            start: default_start(),
            end: default_end(),
            minimum: default_minimum(),
            state: None,
        }
    }

    pub fn with_periods(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    pub fn rows(&self) -> ClimvizResult<Vec<DumbbellRow>> {
        let state = mounted(&self.state, &self.title)?;
        Ok(dumbbell_rows(&state.dataset, state.selection.values(), &self.start, &self.end))
    }

    pub fn selected(&self) -> ClimvizResult<&[String]> {
        Ok(mounted(&self.state, &self.title)?.selection.values())
    }
}

#[typetag::serde]
impl Chart for DumbbellChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        self.state = Some(DumbbellState {
            unit: registered_unit(registry, &self.dataset),
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
                "Select countries to compare {} and {} (minimum {} countries required)",
                self.start, self.end, self.minimum
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
        let rows = self.rows()?;
        let size = surface.size();

        let x = BandScale::new(rows.iter().map(|r| r.entity.as_str()), MARGIN.x_range(size))
            .with_padding(0.5);
        let y = LinearScale::new((0.0, dumbbell_max(&rows)), MARGIN.y_range(size));
        let ticks = linear_ticks(&y, 10, format_grouped);

        draw_grid_rows(surface, MARGIN.x_range(size), &ticks);
        draw_bottom_axis(
            surface,
            size.height - MARGIN.bottom,
            MARGIN.x_range(size),
            &band_ticks(&x),
            -45.0,
        );
        draw_left_axis(surface, MARGIN.left, MARGIN.y_range(size), &ticks);

        for row in &rows {
            let Some(cx) = x.center(&row.entity) else {
                continue;
            };
            surface.draw(
                Mark::line(cx, y.apply(row.start), cx, y.apply(row.end))
                    .stroke(AXIS, 3.0)
                    .class("connector"),
            );
            for (period, value, color) in [
                (&self.start, row.start, START_COLOR),
                (&self.end, row.end, END_COLOR),
            ] {
                surface.draw(
                    Mark::circle(cx, y.apply(value), 5.0)
                        .fill(color)
                        .tooltip(format!("{} ({period}): {value:.2} {}", row.entity, state.unit))
                        .class("dot"),
                );
            }
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

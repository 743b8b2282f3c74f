//! Entity × year heatmap
//!
//! One row per selected entity and one column per year of the dataset. Cells are
//! coloured on the yellow-orange-red ramp over the range of the whole dataset,
//! so the colours stay comparable while the selection changes. Cells without data
//! keep the reserved [`NO_DATA`] fill.

use super::{draw_title, format_locale, Margin};
use climviz_core::chart::{
    check_options, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{SequentialScale, BLACK, NO_DATA, TEXT, YL_OR_RD_9};
use climviz_core::dataset::{Dataset, FloatValue};
use climviz_core::document::{Mark, RenderSurface, TextAnchor};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::LinearScale;
use climviz_core::selection::{MultiSelection, COMPARISON_MINIMUM};
use climviz_core::view::{comparison_matrix, first_entities, Cell, ComparisonMatrix, MissingValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MARGIN: Margin = Margin::new(60.0, 130.0, 30.0, 200.0);
const MAX_CELL_HEIGHT: FloatValue = 40.0;
const LEGEND_WIDTH: FloatValue = 20.0;

#[derive(Debug, Clone)]
struct HeatmapState {
    dataset: Arc<Dataset>,
    /// Range of every value in the dataset
    range: (FloatValue, FloatValue),
    entities: Vec<String>,
    selection: MultiSelection,
}

fn default_minimum() -> usize {
    COMPARISON_MINIMUM
}

fn default_unit() -> String {
    "tones".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapChart {
    title: String,
    dataset: String,
    #[serde(default = "default_minimum")]
    minimum: usize,
    /// Unit shown in tooltips
    #[serde(default = "default_unit")]
    unit: String,
    /// Whether to draw the title above the grid
    #[serde(default)]
    show_title: bool,
    #[serde(skip)]
    state: Option<HeatmapState>,
}

impl HeatmapChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            minimum: default_minimum(),
            unit: default_unit(),
            show_title: false,
            state: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn selected(&self) -> ClimvizResult<&[String]> {
        Ok(mounted(&self.state, &self.title)?.selection.values())
    }

    /// Matrix for the current selection
    pub fn matrix(&self) -> ClimvizResult<ComparisonMatrix> {
        let state = mounted(&self.state, &self.title)?;
        Ok(comparison_matrix(
            &state.dataset,
            state.selection.values(),
            MissingValue::Skip,
        ))
    }

    fn tooltip(&self, entity: &str, period: &str, cell: Cell) -> String {
        let value = match cell {
            Cell::Value(value) => format!("{} {}", format_locale(value), self.unit),
            Cell::NoData => "No data".to_string(),
        };
        format!("{entity}\nYear: {period}\nValue: {value}")
    }
}

#[typetag::serde]
impl Chart for HeatmapChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        self.state = Some(HeatmapState {
            range: dataset.value_range().unwrap_or((0.0, 0.0)),
            entities: dataset.entities().map(str::to_string).collect(),
            selection: MultiSelection::new(
                first_entities(&dataset, COMPARISON_MINIMUM),
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
                "Select Country",
                state.entities.clone(),
                state.selection.values(),
                self.minimum,
            )
            .with_help(format!("Please select at least {} countries to compare", self.minimum))],
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
        let matrix = self.matrix()?;
        let size = surface.size();
        if self.show_title {
            draw_title(surface, 30.0, self.title.clone());
        }

        let columns = matrix.periods.len().max(1) as FloatValue;
        let rows = matrix.entities.len().max(1) as FloatValue;
        let cell_width = MARGIN.inner_width(size) / columns;
        let cell_height = MAX_CELL_HEIGHT.min(MARGIN.inner_height(size) / rows);
        let color = SequentialScale::new(state.range, &YL_OR_RD_9);

        for (col, period) in matrix.periods.iter().enumerate() {
            surface.draw(
                Mark::text(
                    MARGIN.left + col as FloatValue * cell_width + cell_width / 2.0,
                    MARGIN.top - 10.0,
                    period.clone(),
                )
                .anchor(TextAnchor::Middle)
                .font_size(12.0)
                .fill(TEXT)
                .transition(col as u32 * 50, 500)
                .class("tick"),
            );
        }

        for (row, entity) in matrix.entities.iter().enumerate() {
            let top = MARGIN.top + row as FloatValue * cell_height;
            surface.draw(
                Mark::text(MARGIN.left - 10.0, top + cell_height / 2.0, entity.clone())
                    .anchor(TextAnchor::End)
                    .font_size(12.0)
                    .fill(TEXT)
                    .transition(row as u32 * 100, 500)
                    .class("tick"),
            );
            for (col, period) in matrix.periods.iter().enumerate() {
                let cell = matrix.cell(row, col);
                let fill = cell.value().map_or(NO_DATA, |v| color.apply(v));
                surface.draw(
                    Mark::rect(
                        MARGIN.left + col as FloatValue * cell_width,
                        top,
                        cell_width - 1.0,
                        cell_height - 1.0,
                    )
                    .fill(fill)
                    .tooltip(self.tooltip(entity, period, cell))
                    .transition(col as u32 * 50, 1000)
                    .class(match cell {
                        Cell::Value(_) => "cell",
                        Cell::NoData => "no-data",
                    }),
                );
            }
        }

        draw_legend(
            surface,
            &color,
            size.width - MARGIN.right + 10.0,
            MARGIN.top,
            MARGIN.inner_height(size),
        );
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

/// Vertical colour ramp with value ticks on its right
fn draw_legend(
    surface: &mut dyn RenderSurface,
    color: &SequentialScale,
    x: FloatValue,
    top: FloatValue,
    height: FloatValue,
) {
    const STEPS: usize = 20;
    let (d0, d1) = color.domain();
    let step_height = height / STEPS as FloatValue;
    for i in 0..STEPS {
        let t = (i as FloatValue + 0.5) / STEPS as FloatValue;
        let y = top + height - (i + 1) as FloatValue * step_height;
        surface.draw(
            Mark::rect(x, y, LEGEND_WIDTH, step_height)
                .fill(color.apply(d0 + (d1 - d0) * t))
                .class("legend"),
        );
    }
    let scale = LinearScale::new((d0, d1), (top + height, top));
    for tick in scale.ticks(5) {
        let y = scale.apply(tick);
        surface.draw(
            Mark::line(x + LEGEND_WIDTH, y, x + LEGEND_WIDTH + 6.0, y)
                .stroke(BLACK, 1.0)
                .class("legend"),
        );
        surface.draw(
            Mark::text(x + LEGEND_WIDTH + 9.0, y, format!("{tick:.2}"))
                .font_size(10.0)
                .fill(TEXT)
                .class("legend"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climviz_core::document::{Scene, Shape, Size};
    use climviz_core::registry::{DatasetDefinition, DatasetKind};

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        registry
            .register(DatasetDefinition::new(
                "heatmap-test",
                DatasetKind::Tabular,
                "tonnes",
                "test",
                r#"{
                    "Belgium": {"2020": 531867.15, "2021": 548238.38},
                    "Bulgaria": {"2020": 300000, "2021": 310000},
                    "Cyprus": {"2020": 0, "2021": 25000},
                    "Malta": {"2021": 12000},
                    "Denmark": {"2020": 200000, "2021": 210000},
                    "Estonia": {"2020": 90000, "2021": 95000},
                    "Finland": {"2020": 150000}
                }"#,
            ))
            .unwrap();
        registry
    }

    fn mounted_chart() -> HeatmapChart {
        let mut chart = HeatmapChart::new("Fuel", "heatmap-test");
        chart.mount(&registry()).unwrap();
        chart
    }

    fn render(chart: &HeatmapChart) -> Scene {
        let mut scene = Scene::new(Size::default());
        chart.render(&mut scene).unwrap();
        scene
    }

    #[test]
    fn defaults_to_first_five_entities() {
        let chart = mounted_chart();
        assert_eq!(
            chart.selected().unwrap(),
            ["Belgium", "Bulgaria", "Cyprus", "Malta", "Denmark"]
        );
        assert_eq!(chart.controls()[0].minimum, Some(5));
    }

    #[test]
    fn no_data_is_distinct_from_zero() {
        let scene = render(&mounted_chart());
        assert_eq!(scene.with_class("cell").count() + scene.with_class("no-data").count(), 10);

        let missing: Vec<&Mark> = scene.with_class("no-data").collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].style.fill, Some(NO_DATA));
        assert_eq!(missing[0].tooltip.as_deref(), Some("Malta\nYear: 2020\nValue: No data"));

        let zero = scene
            .with_class("cell")
            .find(|m| m.tooltip.as_deref() == Some("Cyprus\nYear: 2020\nValue: 0 tones"))
            .unwrap();
        assert_ne!(zero.style.fill, Some(NO_DATA));
    }

    #[test]
    fn cell_geometry() {
        let scene = render(&mounted_chart());
        let first = scene.with_class("cell").next().unwrap();
        match first.shape {
            Shape::Rect { x, y, width, height } => {
                assert_eq!((x, y), (200.0, 60.0));
                // (900 - 200 - 130) / 2 years
                assert_eq!(width, 284.0);
                assert_eq!(height, 39.0);
            }
            _ => panic!("expected a rect"),
        }
        assert_eq!(
            first.tooltip.as_deref(),
            Some("Belgium\nYear: 2020\nValue: 531,867.15 tones")
        );
    }

    #[test]
    fn colour_scale_ignores_the_selection() {
        let mut chart = mounted_chart();
        let before = render(&chart);
        let belgium = |scene: &Scene| scene.with_class("cell").next().and_then(|m| m.style.fill);
        let expected = belgium(&before);

        chart
            .apply(SelectionInput::Entities(
                ["Belgium", "Estonia", "Finland", "Denmark", "Cyprus"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ))
            .unwrap();
        assert_eq!(belgium(&render(&chart)), expected);
    }

    #[test]
    fn small_selection_is_rejected() {
        let mut chart = mounted_chart();
        let err = chart
            .apply(SelectionInput::Entities(vec!["Belgium".to_string()]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select at least 5 items (got 1)");
        assert_eq!(chart.selected().unwrap().len(), 5);
    }

    #[test]
    fn unknown_entities_are_rejected() {
        let mut chart = mounted_chart();
        let before = chart.selected().unwrap().to_vec();
        let err = chart
            .apply(SelectionInput::Entities(
                ["Belgium", "Bulgaria", "Cyprus", "Denmark", "Atlantis"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            ClimvizError::UnknownOption { ref value, .. } if value == "Atlantis"
        ));
        assert_eq!(chart.selected().unwrap(), before.as_slice());
    }
}

//! Line chart of one entity's per-year total across every category

use super::{
    draw_bottom_axis, draw_left_axis, draw_vertical_label, format_grouped, initial_option,
    linear_ticks, point_ticks, Margin,
};
use climviz_core::chart::{
    check_option, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::Rgb;
use climviz_core::dataset::{max_of, CategorizedDataset, FloatValue};
use climviz_core::document::{Mark, PathCommand, Point, RenderSurface};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::{LinearScale, PointScale};
use climviz_core::selection::SingleSelection;
use climviz_core::view::period_totals;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MARGIN: Margin = Margin::new(60.0, 30.0, 120.0, 60.0);
const LINE_COLOR: Rgb = Rgb::hex(0x2196f3);

#[derive(Debug, Clone)]
struct LineState {
    dataset: Arc<CategorizedDataset>,
    entities: Vec<String>,
    entity: SingleSelection,
}

fn default_entity() -> String {
    "Lithuania".to_string()
}

fn default_unit() -> String {
    "Million Euro".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineChart {
    title: String,
    dataset: String,
    /// Entity shown after mounting
    #[serde(default = "default_entity")]
    entity: String,
    /// Unit of the totals, also used as the y axis title
    #[serde(default = "default_unit")]
    unit: String,
    #[serde(skip)]
    state: Option<LineState>,
}

impl LineChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            entity: default_entity(),
            unit: default_unit(),
            state: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// `(year, total)` for the selected entity, years without data count as zero
    pub fn totals(&self) -> ClimvizResult<Vec<(String, FloatValue)>> {
        let state = mounted(&self.state, &self.title)?;
        Ok(period_totals(&state.dataset, state.entity.value()))
    }
}

#[typetag::serde]
impl Chart for LineChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_categorized(&self.dataset)?;
        let entities = dataset.entities();
        self.state = Some(LineState {
            entity: SingleSelection::new(initial_option(&entities, &self.entity)),
            entities,
            dataset,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    fn controls(&self) -> Vec<Control> {
        match &self.state {
            Some(state) => vec![Control::single(
                "Select Country",
                InputKind::Entity,
                state.entities.clone(),
                state.entity.value(),
            )
            .with_help(format!(
                "Showing total energy production over years for {} in {}",
                state.entity.value(),
                self.unit
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
            SelectionInput::Entity(entity) => {
                check_option(InputKind::Entity, &state.entities, &entity)?;
                Ok(state.entity.set(entity))
            }
            other => Err(invalid_input(&self.title, &other)),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()> {
        let totals = self.totals()?;
        let size = surface.size();

        let x = PointScale::new(totals.iter().map(|(year, _)| year.as_str()), MARGIN.x_range(size));
        let max = max_of(totals.iter().map(|(_, v)| *v)).unwrap_or(0.0);
        let y = LinearScale::new((0.0, max), MARGIN.y_range(size));

        let baseline = size.height - MARGIN.bottom;
        draw_bottom_axis(surface, baseline, MARGIN.x_range(size), &point_ticks(&x), -65.0);
        let y_ticks = linear_ticks(&y, 10, format_grouped);
        draw_left_axis(surface, MARGIN.left, MARGIN.y_range(size), &y_ticks);
        draw_vertical_label(surface, MARGIN.left - 40.0, size.height / 2.0, &self.unit);

        let points: Vec<(Point, &str, FloatValue)> = totals
            .iter()
            .filter_map(|(year, value)| {
                let point = Point::new(x.apply(year)?, y.apply(*value));
                Some((point, year.as_str(), *value))
            })
            .collect();

        let commands = points
            .iter()
            .enumerate()
            .map(|(i, (p, _, _))| {
                if i == 0 {
                    PathCommand::MoveTo(*p)
                } else {
                    PathCommand::LineTo(*p)
                }
            })
            .collect();
        surface.draw(
            Mark::path(commands)
                .stroke(LINE_COLOR, 2.0)
                .transition(0, 1000)
                .class("line"),
        );

        for (point, year, value) in points {
            surface.draw(
                Mark::circle(point.x, point.y, 5.0)
                    .fill(LINE_COLOR)
                    .tooltip(format!("Year: {year}\nValue: {value:.2} {}", self.unit))
                    .transition(0, 1000)
                    .class("dot"),
            );
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use climviz_core::document::{Scene, Shape, Size};
    use climviz_core::registry::{DatasetDefinition, DatasetKind};

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        registry
            .register(DatasetDefinition::new(
                "line-test",
                DatasetKind::Categorized,
                "MW",
                "test",
                r#"{
                    "Hydro": {
                        "Lithuania": {"2020": 117, "2021": 117, "2022": 116.5},
                        "Latvia": {"2020": 1576, "2021": 1576}
                    },
                    "Solar": {
                        "Lithuania": {"2021": 255, "2022": 430},
                        "Estonia": {"2022": 465}
                    }
                }"#,
            ))
            .unwrap();
        registry
    }

    fn mounted_chart() -> LineChart {
        let mut chart = LineChart::new("Capacity", "line-test").with_unit("MW");
        chart.mount(&registry()).unwrap();
        chart
    }

    #[test]
    fn totals_span_every_category() {
        let chart = mounted_chart();
        assert_eq!(
            chart.totals().unwrap(),
            vec![
                ("2020".to_string(), 117.0),
                ("2021".to_string(), 372.0),
                ("2022".to_string(), 546.5),
            ]
        );
        assert_eq!(chart.controls()[0].options, ["Estonia", "Latvia", "Lithuania"]);
    }

    #[test]
    fn years_without_data_are_zero() {
        let mut chart = mounted_chart();
        assert!(chart.apply(SelectionInput::Entity("Estonia".to_string())).unwrap());
        let totals = chart.totals().unwrap();
        assert_eq!(totals[0].1, 0.0);
        assert_eq!(totals[2].1, 465.0);
        assert!(chart.apply(SelectionInput::Entity("Poland".to_string())).is_err());
        assert!(chart.apply(SelectionInput::Period("2021".to_string())).is_err());
    }

    #[test]
    fn dots_and_tooltips() {
        let chart = mounted_chart();
        let mut scene = Scene::new(Size::default());
        chart.render(&mut scene).unwrap();

        let dots: Vec<&Mark> = scene.with_class("dot").collect();
        assert_eq!(dots.len(), 3);
        assert_eq!(dots[2].tooltip.as_deref(), Some("Year: 2022\nValue: 546.50 MW"));
        match dots[2].shape {
            Shape::Circle { cx, cy, .. } => {
                assert_relative_eq!(cx, 870.0);
                assert_relative_eq!(cy, 60.0);
            }
            _ => panic!("expected a circle"),
        }
        assert_eq!(scene.with_class("line").count(), 1);
    }
}

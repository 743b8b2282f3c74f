//! Radar chart with one spoke per year
//!
//! Starts with nothing selected and any number of entities can be compared.
//! The radial axis spans the whole dataset while the selection is empty and
//! only the selected entities otherwise.

use climviz_core::chart::{
    check_options, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{ordinal, Rgb, CATEGORY_10, TEXT, UNMATCHED};
use climviz_core::dataset::{Dataset, FloatValue};
use climviz_core::document::{Mark, Point, RenderSurface, Size, TextAnchor};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::selection::MultiSelection;
use climviz_core::view::{radial_view, RadialView};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

const RING_FRACTIONS: [FloatValue; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];
const LABEL_OFFSET: FloatValue = 20.0;

#[derive(Debug, Clone)]
struct RadarState {
    dataset: Arc<Dataset>,
    entities: Vec<String>,
    selection: MultiSelection,
}

fn default_size() -> Size {
    Size::new(600.0, 600.0)
}

fn default_margin() -> FloatValue {
    60.0
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RadarChart {
    title: String,
    dataset: String,
    #[serde(default = "default_size")]
    size: Size,
    /// Gap between the outer ring and the edge of the root
    #[serde(default = "default_margin")]
    margin: FloatValue,
    #[serde(default)]
    minimum: usize,
    #[serde(skip)]
    state: Option<RadarState>,
}

impl RadarChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            size: default_size(),
            margin: default_margin(),
            minimum: 0,
            state: None,
        }
    }

    pub fn view(&self) -> ClimvizResult<RadialView> {
        let state = mounted(&self.state, &self.title)?;
        Ok(radial_view(&state.dataset, state.selection.values()))
    }

    fn radius(&self, size: Size) -> FloatValue {
        (size.width.min(size.height) / 2.0 - self.margin).max(0.0)
    }
}

/// Point at `distance` from `center` along `angle`, measured clockwise from the top
fn polar(center: Point, distance: FloatValue, angle: FloatValue) -> Point {
    Point::new(
        center.x + distance * (angle - FRAC_PI_2).cos(),
        center.y + distance * (angle - FRAC_PI_2).sin(),
    )
}

#[typetag::serde]
impl Chart for RadarChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn size(&self) -> Size {
        self.size
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        self.state = Some(RadarState {
            entities: dataset.entities().map(str::to_string).collect(),
            selection: MultiSelection::empty(self.minimum),
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
            .with_help("You can add more countries by selecting them from the dropdown")],
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
        let view = self.view()?;
        let size = surface.size();
        let center = Point::new(size.width / 2.0, size.height / 2.0);
        let radius = self.radius(size);
        let scale = |value: FloatValue| {
            if view.value_max > 0.0 {
                value / view.value_max * radius
            } else {
                0.0
            }
        };

        for fraction in RING_FRACTIONS {
            surface.draw(
                Mark::circle(center.x, center.y, radius * fraction)
                    .stroke(UNMATCHED, 1.0)
                    .transition(0, 1000)
                    .class("grid"),
            );
        }

        for (i, year) in view.axes.iter().enumerate() {
            let angle = view.angle(i);
            let end = polar(center, radius, angle);
            surface.draw(
                Mark::line(center.x, center.y, end.x, end.y)
                    .stroke(UNMATCHED, 1.0)
                    .transition(0, 1000)
                    .class("spoke"),
            );
            let label = polar(center, radius + LABEL_OFFSET, angle);
            surface.draw(
                Mark::text(label.x, label.y, year.clone())
                    .anchor(TextAnchor::Middle)
                    .fill(TEXT)
                    .transition(0, 1000)
                    .class("axis-label"),
            );
        }

        for (index, series) in view.series.iter().enumerate() {
            let color = ordinal(&CATEGORY_10, index);
            let points: Vec<Point> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, value)| polar(center, scale(*value), view.angle(i)))
                .collect();
            surface.draw(
                Mark::polygon(&points)
                    .stroke(color, 2.0)
                    .transition(0, 1500)
                    .class("series"),
            );

            for (i, (point, value)) in points.iter().zip(&series.values).enumerate() {
                surface.draw(
                    Mark::circle(point.x, point.y, 5.0)
                        .fill(color)
                        .tooltip(format!("{}\n{}: {value}", series.entity, view.axes[i]))
                        .transition(i as u32 * 100, 500)
                        .class("dot"),
                );
            }

            draw_legend_entry(surface, index, &series.entity, color);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

/// Legend entries stack down from the top-left corner
fn draw_legend_entry(surface: &mut dyn RenderSurface, index: usize, entity: &str, color: Rgb) {
    let y = 20.0 + index as FloatValue * 20.0;
    surface.draw(Mark::circle(20.0, y, 6.0).fill(color).class("legend"));
    surface.draw(Mark::text(35.0, y, entity).fill(TEXT).class("legend"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use climviz_core::document::{Scene, Shape};
    use climviz_core::registry::{DatasetDefinition, DatasetKind};

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        registry
            .register(DatasetDefinition::new(
                "radar-test",
                DatasetKind::Tabular,
                "tonnes per capita",
                "test",
                r#"{
                    "Luxembourg": {"2019": 20, "2020": 18, "2021": 16, "2022": 15},
                    "Austria": {"2019": 8, "2020": 7.5, "2021": 7.8, "2022": 7},
                    "Sweden": {"2019": 4, "2020": 3.6, "2022": 3.5}
                }"#,
            ))
            .unwrap();
        registry
    }

    fn mounted_chart() -> RadarChart {
        let mut chart = RadarChart::new("CO₂", "radar-test");
        chart.mount(&registry()).unwrap();
        chart
    }

    fn render(chart: &RadarChart) -> Scene {
        let mut scene = Scene::new(chart.size());
        chart.render(&mut scene).unwrap();
        scene
    }

    fn select(chart: &mut RadarChart, entities: &[&str]) -> bool {
        chart
            .apply(SelectionInput::Entities(entities.iter().map(|s| s.to_string()).collect()))
            .unwrap()
    }

    #[test]
    fn empty_selection_draws_the_frame_only() {
        let chart = mounted_chart();
        let scene = render(&chart);
        assert_eq!(scene.with_class("grid").count(), 5);
        assert_eq!(scene.with_class("spoke").count(), 4);
        assert_eq!(scene.with_class("series").count(), 0);
        assert_eq!(chart.view().unwrap().value_max, 20.0);
        assert_eq!(chart.controls()[0].minimum, Some(0));
    }

    #[test]
    fn first_spoke_points_up() {
        let scene = render(&mounted_chart());
        let spoke = scene.with_class("spoke").next().unwrap();
        match spoke.shape {
            Shape::Line { x1, y1, x2, y2 } => {
                assert_relative_eq!(x1, 300.0);
                assert_relative_eq!(y1, 300.0);
                assert_relative_eq!(x2, 300.0, epsilon = 1e-9);
                assert_relative_eq!(y2, 60.0);
            }
            _ => panic!("expected a line"),
        }
    }

    #[test]
    fn selection_rescales_the_radius() {
        let mut chart = mounted_chart();
        assert!(select(&mut chart, &["Austria", "Sweden"]));
        assert_eq!(chart.view().unwrap().value_max, 8.0);

        let scene = render(&chart);
        assert_eq!(scene.with_class("series").count(), 2);
        let dots: Vec<&Mark> = scene.with_class("dot").collect();
        assert_eq!(dots.len(), 8);
        assert_eq!(dots[0].tooltip.as_deref(), Some("Austria\n2019: 8"));
        assert_eq!(dots[6].tooltip.as_deref(), Some("Sweden\n2021: 0"));
        match dots[0].shape {
            Shape::Circle { cy, .. } => assert_relative_eq!(cy, 60.0),
            _ => panic!("expected a circle"),
        }
        assert_eq!(scene.with_class("legend").count(), 4);
    }

    #[test]
    fn selection_can_be_cleared() {
        let mut chart = mounted_chart();
        select(&mut chart, &["Austria"]);
        assert!(select(&mut chart, &[]));
        assert_eq!(chart.view().unwrap().value_max, 20.0);
    }
}

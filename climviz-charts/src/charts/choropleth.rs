//! Choropleth map of one year of a regional dataset
//!
//! Regions come from a boundary collection and join the dataset by name (see
//! [`region_name`](climviz_core::geo::region_name)). Joined regions are filled
//! from a nine-class quantile scale over the year's values; regions that did
//! not join, or have no value, keep the neutral fill.

use super::{initial_option, registered_unit};
use climviz_core::chart::{
    check_option, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{AXIS, GREENS_9, TEXT, WHITE};
use climviz_core::dataset::{max_of, min_of, Dataset, FloatValue};
use climviz_core::document::{Mark, PathCommand, Point, RenderSurface, Size, TextAnchor};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::geo::{choropleth_fills, BoundaryCollection, FitTransform, RegionFill};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::LinearScale;
use climviz_core::selection::SingleSelection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const FIT_MARGIN: FloatValue = 20.0;
const LEGEND_WIDTH: FloatValue = 300.0;
const LEGEND_HEIGHT: FloatValue = 10.0;

#[derive(Debug, Clone)]
struct MapState {
    dataset: Arc<Dataset>,
    boundaries: Arc<BoundaryCollection>,
    unit: String,
    year: SingleSelection,
}

fn default_years() -> Vec<String> {
    ["2009", "2012", "2015", "2018"].iter().map(|s| s.to_string()).collect()
}

fn default_year() -> String {
    "2018".to_string()
}

fn default_size() -> Size {
    Size::new(650.0, 650.0)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChoroplethChart {
    title: String,
    dataset: String,
    /// Identifier of the boundary collection
    boundaries: String,
    /// Years offered in the selector
    #[serde(default = "default_years")]
    years: Vec<String>,
    #[serde(default = "default_year")]
    year: String,
    #[serde(default = "default_size")]
    size: Size,
    #[serde(skip)]
    state: Option<MapState>,
}

impl ChoroplethChart {
    pub fn new(
        title: impl Into<String>,
        dataset: impl Into<String>,
        boundaries: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            boundaries: boundaries.into(),
            years: default_years(),
            year: default_year(),
            size: default_size(),
            state: None,
        }
    }

    /// Fill of every region for the selected year
    pub fn fills(&self) -> ClimvizResult<Vec<RegionFill>> {
        let state = mounted(&self.state, &self.title)?;
        Ok(choropleth_fills(&state.boundaries, &state.dataset, state.year.value()))
    }

    fn draw_legend(&self, surface: &mut dyn RenderSurface, values: &[FloatValue], unit: &str) {
        let (x, y) = (50.0, self.size.height - 50.0);
        let swatch = LEGEND_WIDTH / GREENS_9.len() as FloatValue;
        let top = y - LEGEND_HEIGHT - 10.0;
        for (i, color) in GREENS_9.iter().enumerate() {
            surface.draw(
                Mark::rect(x + i as FloatValue * swatch, top, swatch, LEGEND_HEIGHT)
                    .fill(*color)
                    .class("legend"),
            );
        }

        let min = min_of(values.iter().copied());
        let max = max_of(values.iter().copied());
        let (Some(min), Some(max)) = (min, max) else {
            return;
        };
        let scale = LinearScale::new((min, max), (x, x + LEGEND_WIDTH));
        surface.draw(Mark::line(x, y, x + LEGEND_WIDTH, y).stroke(AXIS, 1.0).class("legend"));
        for tick in scale.ticks(5) {
            let tick_x = scale.apply(tick);
            surface.draw(Mark::line(tick_x, y, tick_x, y + 6.0).stroke(AXIS, 1.0).class("legend"));
            surface.draw(
                Mark::text(tick_x, y + 18.0, format!("{tick:.0} {unit}"))
                    .anchor(TextAnchor::Middle)
                    .font_size(10.0)
                    .fill(TEXT)
                    .class("legend"),
            );
        }
    }
}

#[typetag::serde]
impl Chart for ChoroplethChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn size(&self) -> Size {
        self.size
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        let boundaries = registry.load_boundaries(&self.boundaries)?;
        self.state = Some(MapState {
            unit: registered_unit(registry, &self.dataset),
            year: SingleSelection::new(initial_option(&self.years, &self.year)),
            dataset,
            boundaries,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    fn controls(&self) -> Vec<Control> {
        match &self.state {
            Some(state) => vec![Control::single(
                "Select Year",
                InputKind::Period,
                self.years.clone(),
                state.year.value(),
            )
            .with_help("Select a year to view protected areas across European regions")],
            None => Vec::new(),
        }
    }

    fn apply(&mut self, input: SelectionInput) -> ClimvizResult<bool> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ClimvizError::NotMounted(self.title.clone()))?;
        match input {
            SelectionInput::Period(year) => {
                check_option(InputKind::Period, &self.years, &year)?;
                Ok(state.year.set(year))
            }
            other => Err(invalid_input(&self.title, &other)),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()> {
        let state = mounted(&self.state, &self.title)?;
        let fills = self.fills()?;
        let size = surface.size();

        if let Some(bounds) = state.boundaries.bounds() {
            let transform = FitTransform::fit(bounds, (size.width, size.height), FIT_MARGIN);
            for fill in &fills {
                let feature = &state.boundaries.features[fill.feature];
                let Some(geometry) = feature.geometry.as_ref() else {
                    continue;
                };
                let mut commands = Vec::new();
                for ring in geometry.rings() {
                    for (i, position) in ring.iter().enumerate() {
                        let (x, y) = transform.apply(*position);
                        commands.push(match i {
                            0 => PathCommand::MoveTo(Point::new(x, y)),
                            _ => PathCommand::LineTo(Point::new(x, y)),
                        });
                    }
                    commands.push(PathCommand::Close);
                }
                surface.draw(
                    Mark::path(commands)
                        .fill(fill.fill)
                        .stroke(WHITE, 0.5)
                        .tooltip(fill.tooltip(&state.unit))
                        .class(if fill.matched { "region" } else { "unmatched" }),
                );
            }
        }

        let values: Vec<FloatValue> = state
            .dataset
            .values_for(state.year.value())
            .map(|(_, v)| v)
            .collect();
        self.draw_legend(surface, &values, &state.unit);
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climviz_core::color::UNMATCHED;
    use climviz_core::document::{Scene, Shape};
    use climviz_core::registry::{DatasetDefinition, DatasetKind};

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        registry
            .register(DatasetDefinition::new(
                "map-areas",
                DatasetKind::Tabular,
                "km²",
                "test",
                r#"{
                    "Austria": {"2015": 27.5, "2018": 28.5},
                    "Greece": {"2015": 35.0, "2018": 36.0},
                    "Malta": {"2015": 1.0, "2018": 0}
                }"#,
            ))
            .unwrap();
        registry
            .register(DatasetDefinition::new(
                "map-shapes",
                DatasetKind::Boundaries,
                "",
                "test",
                r#"{"type": "FeatureCollection", "features": [
                    {"type": "Feature", "properties": {"NAME": "Austria"},
                     "geometry": {"type": "Polygon", "coordinates": [[
                        [9.5, 46.4], [17.1, 46.4], [17.1, 49.0], [9.5, 49.0], [9.5, 46.4]
                     ]]}},
                    {"type": "Feature", "properties": {"name": "Ελλάδα", "ADMIN": "Greece"},
                     "geometry": {"type": "MultiPolygon", "coordinates": [
                        [[[20.0, 38.0], [26.0, 38.0], [26.0, 41.7], [20.0, 38.0]]],
                        [[[24.0, 35.0], [26.3, 35.0], [26.3, 35.6], [24.0, 35.0]]]
                     ]}},
                    {"type": "Feature", "properties": {"name": "Malta"},
                     "geometry": {"type": "Polygon", "coordinates": [[
                        [14.2, 35.8], [14.6, 35.8], [14.6, 36.1], [14.2, 35.8]
                     ]]}},
                    {"type": "Feature", "properties": {"name": "Norway"},
                     "geometry": {"type": "Polygon", "coordinates": [[
                        [5.0, 58.0], [31.0, 58.0], [31.0, 71.0], [5.0, 58.0]
                     ]]}}
                ]}"#,
            ))
            .unwrap();
        registry
    }

    fn mounted_chart() -> ChoroplethChart {
        let mut chart = ChoroplethChart::new("Protected areas", "map-areas", "map-shapes");
        chart.mount(&registry()).unwrap();
        chart
    }

    fn render(chart: &ChoroplethChart) -> Scene {
        let mut scene = Scene::new(chart.size());
        chart.render(&mut scene).unwrap();
        scene
    }

    #[test]
    fn regions_join_and_fill() {
        let scene = render(&mounted_chart());
        let tooltips: Vec<&str> = scene
            .marks()
            .iter()
            .filter_map(|m| m.tooltip.as_deref())
            .collect();
        assert_eq!(
            tooltips,
            vec!["Austria: 28.5 km²", "Greece: 36 km²", "Malta: No data", "Norway: No data"]
        );
        assert_eq!(scene.with_class("unmatched").count(), 1);

        let regions: Vec<&Mark> = scene.with_class("region").collect();
        assert_ne!(regions[0].style.fill, Some(UNMATCHED));
        assert_eq!(regions[2].style.fill, Some(UNMATCHED));
    }

    #[test]
    fn multipolygons_draw_every_ring() {
        let scene = render(&mounted_chart());
        let greece = scene.with_class("region").nth(1).unwrap();
        match &greece.shape {
            Shape::Path { commands } => {
                let closes = commands.iter().filter(|c| matches!(c, PathCommand::Close)).count();
                assert_eq!(closes, 2);
            }
            _ => panic!("expected a path"),
        }
    }

    #[test]
    fn year_options_are_fixed() {
        let mut chart = mounted_chart();
        assert_eq!(chart.controls()[0].options, default_years());
        assert_eq!(chart.controls()[0].selected, vec!["2018".to_string()]);
        assert!(chart.apply(SelectionInput::Period("2015".to_string())).unwrap());
        assert!(chart.apply(SelectionInput::Period("2016".to_string())).is_err());

        let scene = render(&chart);
        let malta = scene.with_class("region").nth(2).unwrap();
        assert_eq!(malta.tooltip.as_deref(), Some("Malta: 1 km²"));
    }

    #[test]
    fn map_is_square() {
        assert_eq!(mounted_chart().size(), Size::new(650.0, 650.0));
    }
}

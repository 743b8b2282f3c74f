//! Top-N bar chart
//!
//! Ranks the entities of one period and draws the largest `top` as bars coloured
//! along the viridis ramp. Works on a tabular dataset, or on a categorized one
//! with an extra category control.

use super::{
    band_ticks, draw_bottom_axis, draw_grid_rows, draw_left_axis, draw_title, draw_vertical_label,
    format_grouped, format_thousands, initial_option, linear_ticks, registered_unit, Margin,
};
use climviz_core::chart::{
    check_option, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{SequentialScale, GRID, TEXT, VIRIDIS};
use climviz_core::dataset::{max_of, min_of, CategorizedDataset, Dataset, FloatValue};
use climviz_core::document::{Mark, RenderSurface, TextAnchor};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::{DatasetData, DatasetKind, DatasetRegistry};
use climviz_core::scale::{BandScale, LinearScale};
use climviz_core::selection::SingleSelection;
use climviz_core::view::{top_n, TopNOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Bars grow rightwards, entity names on the left
    #[default]
    Horizontal,
    /// Bars grow upwards, entity names under the axis
    Vertical,
}

#[derive(Debug, Clone)]
enum BarSource {
    Tabular(Arc<Dataset>),
    Categorized(Arc<CategorizedDataset>),
}

#[derive(Debug, Clone)]
struct BarState {
    source: BarSource,
    unit: String,
    years: Vec<String>,
    categories: Vec<String>,
    year: SingleSelection,
    category: Option<SingleSelection>,
}

impl BarState {
    fn dataset(&self) -> Option<&Dataset> {
        match (&self.source, &self.category) {
            (BarSource::Tabular(dataset), _) => Some(dataset),
            (BarSource::Categorized(dataset), Some(category)) => dataset.category(category.value()),
            (BarSource::Categorized(_), None) => None,
        }
    }
}

fn default_year() -> String {
    "2020".to_string()
}

fn default_top() -> usize {
    10
}

/// Bars for the `top` largest values of the selected year
#[derive(Debug, Serialize, Deserialize)]
pub struct TopNBarChart {
    title: String,
    dataset: String,
    #[serde(default = "default_year")]
    year: String,
    /// Initial category, for categorized datasets
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    orientation: Orientation,
    /// Aggregates never ranked
    #[serde(default)]
    exclude: Vec<String>,
    /// Label of the value axis, vertical bars only
    #[serde(default)]
    axis_label: Option<String>,
    #[serde(skip)]
    state: Option<BarState>,
}

impl TopNBarChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            year: default_year(),
            category: None,
            top: default_top(),
            orientation: Orientation::default(),
            exclude: Vec::new(),
            axis_label: None,
            state: None,
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Leave `entities` out of the ranking, e.g. EU-wide aggregates
    pub fn with_exclude<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_axis_label(mut self, label: impl Into<String>) -> Self {
        self.axis_label = Some(label.into());
        self
    }

    /// Ranked `(entity, value)` pairs for the current selection
    pub fn ranking(&self) -> ClimvizResult<Vec<(String, FloatValue)>> {
        let state = mounted(&self.state, &self.title)?;
        let options = TopNOptions::new(self.top).excluding(self.exclude.iter().cloned());
        Ok(state
            .dataset()
            .map(|dataset| top_n(dataset, state.year.value(), &options))
            .unwrap_or_default())
    }

    /// Heading for the current selection, e.g. `"Top 10 Countries in 2020 - Hydro"`
    pub fn heading(&self) -> ClimvizResult<String> {
        let state = mounted(&self.state, &self.title)?;
        let mut heading = format!("Top {} Countries in {}", self.top, state.year.value());
        if let Some(category) = &state.category {
            heading.push_str(" - ");
            heading.push_str(category.value());
        }
        Ok(heading)
    }

    fn render_horizontal(
        &self,
        surface: &mut dyn RenderSurface,
        state: &BarState,
        ranking: &[(String, FloatValue)],
    ) {
        let size = surface.size();
        let margin = Margin::new(60.0, 30.0, 30.0, 200.0);
        let max = max_of(ranking.iter().map(|(_, v)| *v)).unwrap_or(0.0);
        let x = LinearScale::new((0.0, max), margin.x_range(size));
        let y = BandScale::new(
            ranking.iter().map(|(e, _)| e.as_str()),
            (margin.top, size.height - margin.bottom),
        )
        .with_padding(0.2);
        let color = color_scale(ranking);

        let ticks = linear_ticks(&x, 5, |v| format!("{} {}", format_grouped(v), state.unit));
        for (tick_x, _) in &ticks {
            surface.draw(
                Mark::line(*tick_x, margin.top, *tick_x, size.height - margin.bottom)
                    .stroke(GRID, 1.0)
                    .class("grid"),
            );
        }
        draw_bottom_axis(surface, size.height - margin.bottom, margin.x_range(size), &ticks, 0.0);

        for (i, (entity, value)) in ranking.iter().enumerate() {
            let top = y.position(i);
            surface.draw(
                Mark::rect(margin.left, top, x.apply(*value) - margin.left, y.bandwidth())
                    .fill(color.apply(*value))
                    .opacity(0.8)
                    .tooltip(tooltip(entity, *value, &state.unit))
                    .transition(i as u32 * 100, 1000)
                    .class("bar"),
            );
            surface.draw(
                Mark::text(margin.left - 10.0, top + y.bandwidth() / 2.0, entity.clone())
                    .anchor(TextAnchor::End)
                    .font_size(12.0)
                    .fill(TEXT)
                    .class("tick"),
            );
        }
    }

    fn render_vertical(
        &self,
        surface: &mut dyn RenderSurface,
        state: &BarState,
        ranking: &[(String, FloatValue)],
    ) {
        let size = surface.size();
        let margin = Margin::new(60.0, 30.0, 120.0, 60.0);
        let max = max_of(ranking.iter().map(|(_, v)| *v)).unwrap_or(0.0);
        let x = BandScale::new(ranking.iter().map(|(e, _)| e.as_str()), margin.x_range(size))
            .with_padding(0.2);
        let y = LinearScale::new((0.0, max), margin.y_range(size));
        let color = color_scale(ranking);

        let ticks = linear_ticks(&y, 5, |v| format!("{} {}", format_grouped(v), state.unit));
        draw_grid_rows(surface, margin.x_range(size), &ticks);

        let baseline = y.apply(0.0);
        for (i, (entity, value)) in ranking.iter().enumerate() {
            let top = y.apply(*value);
            surface.draw(
                Mark::rect(x.position(i), top, x.bandwidth(), baseline - top)
                    .fill(color.apply(*value))
                    .opacity(0.8)
                    .tooltip(tooltip(entity, *value, &state.unit))
                    .transition(i as u32 * 100, 1000)
                    .class("bar"),
            );
        }

        draw_bottom_axis(surface, baseline, margin.x_range(size), &band_ticks(&x), -45.0);
        draw_left_axis(surface, margin.left, margin.y_range(size), &ticks);
        if let Some(label) = &self.axis_label {
            draw_vertical_label(
                surface,
                margin.left - 50.0,
                margin.top + margin.inner_height(size) / 2.0,
                label,
            );
        }
    }
}

fn color_scale(ranking: &[(String, FloatValue)]) -> SequentialScale {
    let values = || ranking.iter().map(|(_, v)| *v);
    let domain = (min_of(values()).unwrap_or(0.0), max_of(values()).unwrap_or(0.0));
    SequentialScale::new(domain, &VIRIDIS)
}

fn tooltip(entity: &str, value: FloatValue, unit: &str) -> String {
    format!("{entity}\nValue: {} {unit}", format_thousands(value))
}

#[typetag::serde]
impl Chart for TopNBarChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let unit = registered_unit(registry, &self.dataset);
        let state = match registry.load(&self.dataset)? {
            DatasetData::Tabular(dataset) => {
                let years = dataset.periods();
                BarState {
                    year: SingleSelection::new(initial_option(&years, &self.year)),
                    source: BarSource::Tabular(dataset),
                    unit,
                    years,
                    categories: Vec::new(),
                    category: None,
                }
            }
            DatasetData::Categorized(dataset) => {
                let years = dataset.periods();
                let categories: Vec<String> = dataset.categories().map(str::to_string).collect();
                let preferred = self.category.as_deref().unwrap_or_default();
                let category = if categories.iter().any(|c| c == preferred) {
                    preferred.to_string()
                } else {
                    categories.first().cloned().unwrap_or_default()
                };
                BarState {
                    year: SingleSelection::new(initial_option(&years, &self.year)),
                    category: Some(SingleSelection::new(category)),
                    source: BarSource::Categorized(dataset),
                    unit,
                    years,
                    categories,
                }
            }
            other => {
                return Err(ClimvizError::DatasetKind {
                    id: self.dataset.clone(),
                    expected: DatasetKind::Tabular,
                    actual: other.kind(),
                })
            }
        };
        self.state = Some(state);
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    fn controls(&self) -> Vec<Control> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        let mut controls = vec![Control::single(
            "Select Year",
            InputKind::Period,
            state.years.clone(),
            state.year.value(),
        )];
        match &state.category {
            Some(category) => {
                controls.push(Control::single(
                    "Select Category",
                    InputKind::Category,
                    state.categories.clone(),
                    category.value(),
                ));
                controls[0].help = format!(
                    "Showing top {} countries for the selected year and category",
                    self.top
                );
            }
            None => {
                controls[0].help =
                    format!("Showing top {} countries for the selected year", self.top);
            }
        }
        controls
    }

    fn apply(&mut self, input: SelectionInput) -> ClimvizResult<bool> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ClimvizError::NotMounted(self.title.clone()))?;
        match input {
            SelectionInput::Period(year) => {
                check_option(InputKind::Period, &state.years, &year)?;
                Ok(state.year.set(year))
            }
            SelectionInput::Category(category) if state.category.is_some() => {
                check_option(InputKind::Category, &state.categories, &category)?;
                Ok(state.category.as_mut().is_some_and(|c| c.set(category)))
            }
            other => Err(invalid_input(&self.title, &other)),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()> {
        let state = mounted(&self.state, &self.title)?;
        let ranking = self.ranking()?;
        draw_title(surface, 30.0, self.heading()?);
        match self.orientation {
            Orientation::Horizontal => self.render_horizontal(surface, state, &ranking),
            Orientation::Vertical => self.render_vertical(surface, state, &ranking),
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
    use crate::datasets::EU_27;
    use climviz_core::document::{Scene, Shape, Size};
    use climviz_core::registry::DatasetDefinition;

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        registry
            .register(DatasetDefinition::new(
                "bar-waste",
                DatasetKind::Tabular,
                "tons",
                "test",
                r#"{
                    "European Union - 27 countries (from 2020)": {"2020": 5000},
                    "France": {"2018": 80, "2020": 90},
                    "Germany": {"2018": 110, "2020": 1234.4},
                    "Malta": {"2018": 2}
                }"#,
            ))
            .unwrap();
        registry
            .register(DatasetDefinition::new(
                "bar-capacity",
                DatasetKind::Categorized,
                "MW",
                "test",
                r#"{
                    "Hydro": {"Austria": {"2020": 14000}, "Latvia": {"2020": 1500}},
                    "Wind": {
                        "Austria": {"2020": 3100},
                        "Latvia": {"2020": 80},
                        "Estonia": {"2021": 320}
                    }
                }"#,
            ))
            .unwrap();
        registry
    }

    fn render(chart: &TopNBarChart) -> Scene {
        let mut scene = Scene::new(Size::default());
        chart.render(&mut scene).unwrap();
        scene
    }

    #[test]
    fn aggregates_are_ranked_by_default() {
        let mut chart = TopNBarChart::new("Waste", "bar-waste");
        chart.mount(&registry()).unwrap();
        let ranking = chart.ranking().unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0], (EU_27.to_string(), 5000.0));
    }

    #[test]
    fn horizontal_bars_rank_and_skip_excluded() {
        let mut chart = TopNBarChart::new("Waste", "bar-waste").with_exclude([EU_27]);
        chart.mount(&registry()).unwrap();

        assert_eq!(
            chart.ranking().unwrap(),
            vec![("Germany".to_string(), 1234.4), ("France".to_string(), 90.0)]
        );

        let scene = render(&chart);
        let bars: Vec<&Mark> = scene.with_class("bar").collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].tooltip.as_deref(), Some("Germany\nValue: 1,234 tons"));
        assert_eq!(bars[1].transition.map(|t| t.delay_ms), Some(100));
        assert_eq!(
            scene.with_class("title").next().and_then(Mark::text_content),
            Some("Top 10 Countries in 2020")
        );

        // The largest bar spans the whole plot width
        match bars[0].shape {
            Shape::Rect { x, width, .. } => {
                assert_eq!(x, 200.0);
                assert_eq!(width, 670.0);
            }
            _ => panic!("expected a rect"),
        }
    }

    #[test]
    fn year_selection() {
        let mut chart = TopNBarChart::new("Waste", "bar-waste").with_exclude([EU_27]);
        chart.mount(&registry()).unwrap();

        assert!(chart.apply(SelectionInput::Period("2018".to_string())).unwrap());
        assert_eq!(chart.ranking().unwrap().len(), 3);
        assert!(!chart.apply(SelectionInput::Period("2018".to_string())).unwrap());

        let err = chart.apply(SelectionInput::Period("1990".to_string())).unwrap_err();
        assert!(matches!(err, ClimvizError::UnknownOption { .. }));
        assert_eq!(chart.controls()[0].selected, vec!["2018".to_string()]);

        let err = chart.apply(SelectionInput::Category("Hydro".to_string())).unwrap_err();
        assert!(matches!(err, ClimvizError::InvalidInput { .. }));
    }

    #[test]
    fn categorized_vertical_bars() {
        let mut chart = TopNBarChart::new("Capacity", "bar-capacity")
            .with_category("Wind")
            .with_orientation(Orientation::Vertical)
            .with_axis_label("Megawatts (MW)");
        chart.mount(&registry()).unwrap();

        assert_eq!(chart.heading().unwrap(), "Top 10 Countries in 2020 - Wind");
        assert_eq!(chart.controls().len(), 2);
        assert_eq!(chart.controls()[1].options, vec!["Hydro".to_string(), "Wind".to_string()]);

        let scene = render(&chart);
        let tooltips: Vec<&str> = scene
            .with_class("bar")
            .filter_map(|m| m.tooltip.as_deref())
            .collect();
        assert_eq!(tooltips, vec!["Austria\nValue: 3,100 MW", "Latvia\nValue: 80 MW"]);
        assert!(scene.with_class("axis-label").any(|m| m.text_content() == Some("Megawatts (MW)")));

        assert!(chart.apply(SelectionInput::Category("Hydro".to_string())).unwrap());
        assert_eq!(chart.ranking().unwrap()[0], ("Austria".to_string(), 14000.0));
    }

    #[test]
    fn empty_year_draws_no_bars() {
        let mut chart = TopNBarChart::new("Capacity", "bar-capacity").with_category("Wind");
        chart.mount(&registry()).unwrap();
        chart.apply(SelectionInput::Period("2021".to_string())).unwrap();
        chart.apply(SelectionInput::Category("Hydro".to_string())).unwrap();
        assert!(render(&chart).with_class("bar").next().is_none());
    }

    #[test]
    fn render_before_mount_fails() {
        let chart = TopNBarChart::new("Waste", "bar-waste");
        let mut scene = Scene::new(Size::default());
        assert!(matches!(chart.render(&mut scene), Err(ClimvizError::NotMounted(_))));
    }
}

//! Lollipop chart
//!
//! The same top-N ranking as [`TopNBarChart`](super::TopNBarChart), drawn as a
//! stem and a dot per entity. Entities without a value for the selected year
//! count as zero.

use super::{
    draw_bottom_axis, draw_left_axis, draw_vertical_label, format_grouped, initial_option,
    linear_ticks, point_ticks, registered_unit, Margin,
};
use climviz_core::chart::{
    check_option, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{Rgb, WHITE};
use climviz_core::dataset::{max_of, Dataset, FloatValue};
use climviz_core::document::{Mark, RenderSurface};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::registry::DatasetRegistry;
use climviz_core::scale::{LinearScale, PointScale};
use climviz_core::selection::SingleSelection;
use climviz_core::view::{top_n, MissingValue, TopNOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const STEM: Rgb = Rgb::hex(0x69b3a2);
const MARGIN: Margin = Margin::new(60.0, 30.0, 30.0, 200.0);

#[derive(Debug, Clone)]
struct LollipopState {
    dataset: Arc<Dataset>,
    unit: String,
    years: Vec<String>,
    year: SingleSelection,
}

fn default_year() -> String {
    "2020".to_string()
}

fn default_top() -> usize {
    10
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LollipopChart {
    title: String,
    dataset: String,
    #[serde(default = "default_year")]
    year: String,
    #[serde(default = "default_top")]
    top: usize,
    #[serde(default)]
    exclude: Vec<String>,
    /// Unit shown in tooltips, defaults to the dataset's unit
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    axis_label: Option<String>,
    #[serde(skip)]
    state: Option<LollipopState>,
}

impl LollipopChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            year: default_year(),
            top: default_top(),
            exclude: Vec::new(),
            unit: None,
            axis_label: None,
            state: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
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

    pub fn ranking(&self) -> ClimvizResult<Vec<(String, FloatValue)>> {
        let state = mounted(&self.state, &self.title)?;
        let options = TopNOptions::new(self.top)
            .with_missing(MissingValue::Zero)
            .excluding(self.exclude.iter().cloned());
        Ok(top_n(&state.dataset, state.year.value(), &options))
    }
}

#[typetag::serde]
impl Chart for LollipopChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_tabular(&self.dataset)?;
        let years = dataset.periods();
        self.state = Some(LollipopState {
            unit: self
                .unit
                .clone()
                .unwrap_or_else(|| registered_unit(registry, &self.dataset)),
            year: SingleSelection::new(initial_option(&years, &self.year)),
            years,
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
                "Select Year",
                InputKind::Period,
                state.years.clone(),
                state.year.value(),
            )
            .with_help(format!("Showing top {} countries for the selected year", self.top))],
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
                check_option(InputKind::Period, &state.years, &year)?;
                Ok(state.year.set(year))
            }
            other => Err(invalid_input(&self.title, &other)),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()> {
        let state = mounted(&self.state, &self.title)?;
        let ranking = self.ranking()?;
        let size = surface.size();

        let max = max_of(ranking.iter().map(|(_, v)| *v)).unwrap_or(0.0);
        let y = LinearScale::new((0.0, max), MARGIN.y_range(size));
        let x = PointScale::new(ranking.iter().map(|(e, _)| e.as_str()), MARGIN.x_range(size))
            .with_padding(1.0);

        let baseline = size.height - MARGIN.bottom;
        draw_bottom_axis(surface, baseline, MARGIN.x_range(size), &point_ticks(&x), -45.0);
        draw_left_axis(
            surface,
            MARGIN.left,
            MARGIN.y_range(size),
            &linear_ticks(&y, 10, format_grouped),
        );
        if let Some(label) = &self.axis_label {
            draw_vertical_label(surface, MARGIN.left - 100.0, size.height / 2.0, label);
        }

        for (i, (_, value)) in ranking.iter().enumerate() {
            let cx = x.position(i);
            surface.draw(
                Mark::line(cx, y.apply(0.0), cx, y.apply(*value))
                    .stroke(STEM, 2.0)
                    .class("stem"),
            );
        }
        for (i, (entity, value)) in ranking.iter().enumerate() {
            surface.draw(
                Mark::circle(x.position(i), y.apply(*value), 6.0)
                    .fill(STEM)
                    .stroke(WHITE, 2.0)
                    .tooltip(format!("{entity}: {value} {}", state.unit))
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
    use climviz_core::document::{Scene, Shape, Size};
    use climviz_core::registry::{DatasetDefinition, DatasetKind};

    fn registry() -> DatasetRegistry {
        let registry = DatasetRegistry::new();
        let mut entries: Vec<String> = (0..12)
            .map(|i| format!(r#""Country {i}": {{"2018": {}, "2020": {}}}"#, i * 10, i * 3))
            .collect();
        entries.push(r#""Latecomer": {"2020": 1000}"#.to_string());
        registry
            .register(DatasetDefinition::new(
                "lollipop-test",
                DatasetKind::Tabular,
                "tons",
                "test",
                format!("{{{}}}", entries.join(",")),
            ))
            .unwrap();
        registry
    }

    fn mounted_chart() -> LollipopChart {
        let mut chart = LollipopChart::new("Waste", "lollipop-test");
        chart.mount(&registry()).unwrap();
        chart
    }

    #[test]
    fn missing_values_count_as_zero() {
        let mut chart = mounted_chart();
        chart.apply(SelectionInput::Period("2018".to_string())).unwrap();
        let ranking = chart.ranking().unwrap();
        assert_eq!(ranking.len(), 10);
        assert_eq!(ranking[0], ("Country 11".to_string(), 110.0));
        assert!(ranking.iter().all(|(e, _)| e != "Latecomer"));

        chart.apply(SelectionInput::Period("2020".to_string())).unwrap();
        assert_eq!(chart.ranking().unwrap()[0], ("Latecomer".to_string(), 1000.0));
    }

    #[test]
    fn dots_carry_tooltips() {
        let mut chart = LollipopChart::new("Waste", "lollipop-test").with_unit("g/km");
        chart.mount(&registry()).unwrap();
        let mut scene = Scene::new(Size::default());
        chart.render(&mut scene).unwrap();

        let dots: Vec<&Mark> = scene.with_class("dot").collect();
        assert_eq!(dots.len(), 10);
        assert_eq!(scene.with_class("stem").count(), 10);
        assert_eq!(dots[0].tooltip.as_deref(), Some("Latecomer: 1000 g/km"));
        assert_eq!(dots[1].tooltip.as_deref(), Some("Country 11: 33 g/km"));
        match dots[0].shape {
            Shape::Circle { cy, r, .. } => {
                assert_eq!(cy, MARGIN.top);
                assert_eq!(r, 6.0);
            }
            _ => panic!("expected a circle"),
        }
    }

    #[test]
    fn excluded_entities_are_not_ranked() {
        let mut chart = LollipopChart::new("Waste", "lollipop-test").with_exclude(["Latecomer"]);
        chart.mount(&registry()).unwrap();
        let ranking = chart.ranking().unwrap();
        assert_eq!(ranking.len(), 10);
        assert_eq!(ranking[0], ("Country 11".to_string(), 33.0));
    }

    #[test]
    fn rejects_category_input() {
        let mut chart = mounted_chart();
        assert!(chart.apply(SelectionInput::Category("Hydro".to_string())).is_err());
        assert_eq!(chart.controls()[0].selected, vec!["2020".to_string()]);
    }
}

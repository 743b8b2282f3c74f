//! Derived views: pure projections from a dataset and a selection to the data a
//! chart draws.
//!
//! Every function here is recomputed from scratch on each selection change and
//! never mutates its inputs.
//!
//! ```rust
//! use climviz_core::dataset::Dataset;
//! use climviz_core::view::{top_n, TopNOptions};
//!
//! let json = r#"{"France": {"2020": 90}, "Germany": {"2020": 120}}"#;
//! let dataset = Dataset::from_json_str(json).unwrap();
//! let top = top_n(&dataset, "2020", &TopNOptions::default());
//! assert_eq!(top, vec![("Germany".to_string(), 120.0), ("France".to_string(), 90.0)]);
//! ```

use crate::dataset::{max_of, min_of, CategorizedDataset, Dataset, FloatValue};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// What a view does with an entity that has no value for the requested period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingValue {
    /// Leave the entity out
    #[default]
    Skip,
    /// Treat the absent value as `0`
    Zero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNOptions {
    pub n: usize,
    #[serde(default)]
    pub missing: MissingValue,
    /// Aggregate entities that are never ranked
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for TopNOptions {
    fn default() -> Self {
        Self {
            n: 10,
            missing: MissingValue::Skip,
            exclude: Vec::new(),
        }
    }
}

impl TopNOptions {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            ..Default::default()
        }
    }

    pub fn with_missing(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    pub fn excluding<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(entities.into_iter().map(Into::into));
        self
    }
}

fn sort_descending<T>(items: &mut [(T, FloatValue)]) {
    // `sort_by` is stable, ties keep source order
    items.sort_by(|a, b| b.1.total_cmp(&a.1));
}

/// The `n` largest values for `period`, largest first.
///
/// Entities without a value are skipped or zero-filled according to
/// `options.missing`. The result never holds more than `n` entries and never
/// holds an undefined value.
pub fn top_n(dataset: &Dataset, period: &str, options: &TopNOptions) -> Vec<(String, FloatValue)> {
    let mut ranked: Vec<(String, FloatValue)> = dataset
        .iter()
        .filter(|(entity, _)| !options.exclude.iter().any(|e| e == entity))
        .filter_map(|(entity, series)| {
            let value = match (series.get(period), options.missing) {
                (Some(value), _) => value,
                (None, MissingValue::Zero) => 0.0,
                (None, MissingValue::Skip) => return None,
            };
            Some((entity.to_string(), value))
        })
        .collect();
    sort_descending(&mut ranked);
    ranked.truncate(options.n);
    ranked
}

/// The `n` entities with the largest sum over all their values
pub fn top_by_total(dataset: &Dataset, n: usize) -> Vec<String> {
    let mut totals: Vec<(&str, FloatValue)> = dataset
        .iter()
        .map(|(entity, series)| (entity, series.total()))
        .collect();
    sort_descending(&mut totals);
    totals
        .into_iter()
        .take(n)
        .map(|(entity, _)| entity.to_string())
        .collect()
}

/// The first `n` entities in source order
pub fn first_entities(dataset: &Dataset, n: usize) -> Vec<String> {
    dataset.entities().take(n).map(str::to_string).collect()
}

/// A heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    NoData,
    Value(FloatValue),
}

impl Cell {
    pub fn value(&self) -> Option<FloatValue> {
        match self {
            Cell::NoData => None,
            Cell::Value(v) => Some(*v),
        }
    }
}

/// Selected entities × every period of the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatrix {
    pub entities: Vec<String>,
    pub periods: Vec<String>,
    /// Shape `(entities.len(), periods.len())`
    pub cells: Array2<Cell>,
}

impl ComparisonMatrix {
    pub fn cell(&self, entity: usize, period: usize) -> Cell {
        self.cells[[entity, period]]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Cell)> {
        self.cells.indexed_iter().map(|((row, col), cell)| {
            (
                self.entities[row].as_str(),
                self.periods[col].as_str(),
                *cell,
            )
        })
    }
}

/// Build the heatmap matrix for `entities` over the dataset's sorted period axis.
///
/// Entities unknown to the dataset still get a row, filled according to `missing`.
pub fn comparison_matrix(
    dataset: &Dataset,
    entities: &[String],
    missing: MissingValue,
) -> ComparisonMatrix {
    let periods = dataset.periods();
    let cells = Array2::from_shape_fn((entities.len(), periods.len()), |(row, col)| {
        match (dataset.value(&entities[row], &periods[col]), missing) {
            (Some(value), _) => Cell::Value(value),
            (None, MissingValue::Zero) => Cell::Value(0.0),
            (None, MissingValue::Skip) => Cell::NoData,
        }
    });
    ComparisonMatrix {
        entities: entities.to_vec(),
        periods,
        cells,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumbbellRow {
    pub entity: String,
    pub start: FloatValue,
    pub end: FloatValue,
}

/// Start and end values per entity, missing values as `0`
pub fn dumbbell_rows(
    dataset: &Dataset,
    entities: &[String],
    start: &str,
    end: &str,
) -> Vec<DumbbellRow> {
    entities
        .iter()
        .map(|entity| DumbbellRow {
            entity: entity.clone(),
            start: dataset.value(entity, start).unwrap_or(0.0),
            end: dataset.value(entity, end).unwrap_or(0.0),
        })
        .collect()
}

/// Largest value at either end of any row, `0` for no rows
pub fn dumbbell_max(rows: &[DumbbellRow]) -> FloatValue {
    max_of(rows.iter().map(|r| r.start.max(r.end))).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackSegment {
    pub y0: FloatValue,
    pub y1: FloatValue,
}

impl StackSegment {
    pub fn height(&self) -> FloatValue {
        self.y1 - self.y0
    }
}

/// One key of a stack, with a segment per entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackLayer {
    pub key: String,
    /// `(entity, segment)` in the order the entities were requested
    pub segments: Vec<(String, StackSegment)>,
}

/// Stack `keys` on top of each other for each entity.
///
/// Layers follow `keys` order, bottom first. A key missing for an entity
/// contributes a zero-height segment.
pub fn stack_layers(dataset: &Dataset, entities: &[String], keys: &[String]) -> Vec<StackLayer> {
    let mut baselines = vec![0.0; entities.len()];
    keys.iter()
        .map(|key| {
            let segments = entities
                .iter()
                .zip(baselines.iter_mut())
                .map(|(entity, baseline)| {
                    let value = dataset.value(entity, key).unwrap_or(0.0);
                    let segment = StackSegment {
                        y0: *baseline,
                        y1: *baseline + value,
                    };
                    *baseline = segment.y1;
                    (entity.clone(), segment)
                })
                .collect();
            StackLayer {
                key: key.clone(),
                segments,
            }
        })
        .collect()
}

/// Top of the stack: the largest `y1` of the last layer
pub fn stack_max(layers: &[StackLayer]) -> Option<FloatValue> {
    layers
        .last()
        .and_then(|layer| max_of(layer.segments.iter().map(|(_, s)| s.y1)))
}

/// Per-period sum over every category for one entity, over every period of the
/// dataset in sorted order.
///
/// A category without a value for a period contributes nothing, so a period
/// where the entity has no data at all sums to `0`.
pub fn period_totals(dataset: &CategorizedDataset, entity: &str) -> Vec<(String, FloatValue)> {
    dataset
        .periods()
        .into_iter()
        .map(|period| {
            let total: FloatValue = dataset
                .iter()
                .filter_map(|(_, category)| category.value(entity, &period))
                .sum();
            (period, total)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialSeries {
    pub entity: String,
    /// One value per axis, missing as `0`
    pub values: Vec<FloatValue>,
}

/// Closed series over a radial period axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialView {
    pub axes: Vec<String>,
    pub series: Vec<RadialSeries>,
    /// Maximum of the value axis
    pub value_max: FloatValue,
}

impl RadialView {
    /// Angle of axis `index` in radians, clockwise from the top
    pub fn angle(&self, index: usize) -> FloatValue {
        axis_angle(index, self.axes.len())
    }
}

pub fn axis_angle(index: usize, count: usize) -> FloatValue {
    if count == 0 {
        return 0.0;
    }
    2.0 * PI * index as FloatValue / count as FloatValue
}

/// Radar projection for the selected entities.
///
/// The value axis covers the whole dataset while nothing is selected, and only
/// the selected entities once something is.
pub fn radial_view(dataset: &Dataset, selected: &[String]) -> RadialView {
    let axes = dataset.periods();
    let series: Vec<RadialSeries> = selected
        .iter()
        .map(|entity| RadialSeries {
            entity: entity.clone(),
            values: axes
                .iter()
                .map(|period| dataset.value(entity, period).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    let value_max = if selected.is_empty() {
        dataset.max_value()
    } else {
        max_of(series.iter().flat_map(|s| s.values.iter().copied()))
    }
    .unwrap_or(0.0);

    RadialView {
        axes,
        series,
        value_max,
    }
}

/// `(min, max)` of every defined value across a set of entities
pub fn selection_range(dataset: &Dataset, entities: &[String]) -> Option<(FloatValue, FloatValue)> {
    let values = || {
        entities
            .iter()
            .filter_map(|e| dataset.get(e))
            .flat_map(|s| s.iter().map(|(_, v)| v))
    };
    Some((min_of(values())?, max_of(values())?))
}

//! Static datasets rendered by the charts.
//!
//! Every chart reads one of a handful of shapes of bundled JSON:
//!
//! - [`Dataset`]: entity → period → value (`{"France": {"2020": 90}}`)
//! - [`CategorizedDataset`]: category → [`Dataset`]
//! - [`FlowDataset`]: period → list of [`LinkPair`]s
//!
//! Source order of JSON object keys is preserved. Several views rely on it:
//! default selections take the first entities in file order and sorts are stable,
//! so ties keep the order in which the entities were written.
//!
//! An absent period means "no data", which is not the same as a zero measurement.
//! `null` values are treated as absent and numeric strings are coerced with
//! [`parse_number_or_zero`].
//!
//! ```rust
//! use climviz_core::dataset::Dataset;
//!
//! let dataset = Dataset::from_json_str(r#"{"France": {"2020": 90, "2021": null}}"#).unwrap();
//! assert_eq!(dataset.value("France", "2020"), Some(90.0));
//! assert_eq!(dataset.value("France", "2021"), None);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type FloatValue = f64;

/// Parse the leading number of `text`, falling back to zero.
///
/// Trailing garbage is ignored (`"12.5%"` parses as `12.5`) and anything that does
/// not start with a finite number yields `0.0`.
///
/// ```rust
/// use climviz_core::dataset::parse_number_or_zero;
///
/// assert_eq!(parse_number_or_zero("1520.33"), 1520.33);
/// assert_eq!(parse_number_or_zero(" 12.5%"), 12.5);
/// assert_eq!(parse_number_or_zero(":"), 0.0);
/// ```
pub fn parse_number_or_zero(text: &str) -> FloatValue {
    let trimmed = text.trim();
    let mut end = trimmed.len();
    while end > 0 {
        if trimmed.is_char_boundary(end) {
            if let Ok(value) = trimmed[..end].parse::<FloatValue>() {
                return if value.is_finite() { value } else { 0.0 };
            }
        }
        end -= 1;
    }
    0.0
}

/// A numeric field that may have been written either as a number or as a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(FloatValue),
    Text(String),
}

impl RawNumber {
    pub fn to_number_or_zero(&self) -> FloatValue {
        match self {
            RawNumber::Number(v) if v.is_finite() => *v,
            RawNumber::Number(_) => 0.0,
            RawNumber::Text(text) => parse_number_or_zero(text),
        }
    }
}

impl From<FloatValue> for RawNumber {
    fn from(value: FloatValue) -> Self {
        RawNumber::Number(value)
    }
}

/// Measurements of a single entity, keyed by period
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Option<RawNumber>>")]
pub struct Series {
    points: IndexMap<String, FloatValue>,
}

impl Series {
    pub fn from_points<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = (P, FloatValue)>,
        P: Into<String>,
    {
        Self {
            points: points.into_iter().map(|(p, v)| (p.into(), v)).collect(),
        }
    }

    /// Value for `period`, or `None` when the period has no data
    pub fn get(&self, period: &str) -> Option<FloatValue> {
        self.points.get(period).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FloatValue)> {
        self.points.iter().map(|(p, v)| (p.as_str(), *v))
    }

    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of all defined values
    pub fn total(&self) -> FloatValue {
        self.points.values().sum()
    }

    pub fn max(&self) -> Option<FloatValue> {
        max_of(self.points.values().copied())
    }
}

/// `null` entries are dropped, everything else is coerced to a number
impl From<IndexMap<String, Option<RawNumber>>> for Series {
    fn from(raw: IndexMap<String, Option<RawNumber>>) -> Self {
        Self {
            points: raw
                .into_iter()
                .filter_map(|(period, raw)| raw.map(|raw| (period, raw.to_number_or_zero())))
                .collect(),
        }
    }
}

/// Largest of `values`, `None` when empty
pub fn max_of(values: impl Iterator<Item = FloatValue>) -> Option<FloatValue> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: FloatValue| a.max(v))))
}

pub fn min_of(values: impl Iterator<Item = FloatValue>) -> Option<FloatValue> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: FloatValue| a.min(v))))
}

/// Mapping from entity name to its [`Series`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    entries: IndexMap<String, Series>,
}

impl Dataset {
    /// Build a dataset in memory
    ///
    /// ```rust
    /// use climviz_core::dataset::Dataset;
    ///
    /// let dataset = Dataset::from_entries([
    ///     ("France", vec![("2020", 90.0)]),
    ///     ("Germany", vec![("2019", 110.0), ("2020", 120.0)]),
    /// ]);
    /// assert_eq!(dataset.len(), 2);
    /// assert_eq!(dataset.periods(), vec!["2019", "2020"]);
    /// ```
    pub fn from_entries<I, K, P, Q>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: IntoIterator<Item = (Q, FloatValue)>,
        Q: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(entity, points)| (entity.into(), Series::from_points(points)))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entity names in source order
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.entries.iter().map(|(e, s)| (e.as_str(), s))
    }

    pub fn get(&self, entity: &str) -> Option<&Series> {
        self.entries.get(entity)
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.entries.contains_key(entity)
    }

    pub fn value(&self, entity: &str, period: &str) -> Option<FloatValue> {
        self.get(entity).and_then(|s| s.get(period))
    }

    /// All periods that appear for any entity, sorted as strings
    pub fn periods(&self) -> Vec<String> {
        self.entries
            .values()
            .flat_map(Series::periods)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every defined value in the dataset
    pub fn values(&self) -> impl Iterator<Item = FloatValue> + '_ {
        self.entries.values().flat_map(|s| s.points.values().copied())
    }

    /// Defined values for a single period, in entity order
    pub fn values_for<'a>(
        &'a self,
        period: &'a str,
    ) -> impl Iterator<Item = (&'a str, FloatValue)> {
        self.entries
            .iter()
            .filter_map(move |(e, s)| s.get(period).map(|v| (e.as_str(), v)))
    }

    pub fn max_value(&self) -> Option<FloatValue> {
        max_of(self.values())
    }

    /// `(min, max)` over every defined value
    pub fn value_range(&self) -> Option<(FloatValue, FloatValue)> {
        Some((min_of(self.values())?, self.max_value()?))
    }
}

/// Datasets grouped by a category, e.g. capacity per energy source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CategorizedDataset {
    categories: IndexMap<String, Dataset>,
}

impl CategorizedDataset {
    pub fn from_categories<I, K>(categories: I) -> Self
    where
        I: IntoIterator<Item = (K, Dataset)>,
        K: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(|(k, d)| (k.into(), d)).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Category names in source order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn category(&self, name: &str) -> Option<&Dataset> {
        self.categories.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.categories.iter().map(|(c, d)| (c.as_str(), d))
    }

    /// Entities present in any category, sorted
    pub fn entities(&self) -> Vec<String> {
        self.categories
            .values()
            .flat_map(Dataset::entities)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Periods present in any category, sorted
    pub fn periods(&self) -> Vec<String> {
        self.categories
            .values()
            .flat_map(Dataset::periods)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// A single weighted edge of a flow diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "value")]
    pub raw_value: RawNumber,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: FloatValue) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            raw_value: RawNumber::Number(value),
        }
    }

    /// Numeric value of the link, zero when the raw field does not parse
    pub fn value(&self) -> FloatValue {
        self.raw_value.to_number_or_zero()
    }
}

/// A first-layer link (origin → intermediate) paired with the second-layer link
/// (intermediate → destination) it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPair(pub Link, pub Link);

impl LinkPair {
    pub fn first(&self) -> &Link {
        &self.0
    }

    pub fn second(&self) -> &Link {
        &self.1
    }
}

/// Flow links grouped by period
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FlowDataset {
    periods: IndexMap<String, Vec<LinkPair>>,
}

impl FlowDataset {
    pub fn from_periods<I, K>(periods: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<LinkPair>)>,
        K: Into<String>,
    {
        Self {
            periods: periods.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Periods in source order
    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.periods.keys().map(String::as_str)
    }

    pub fn links(&self, period: &str) -> Option<&[LinkPair]> {
        self.periods.get(period).map(Vec::as_slice)
    }

    /// The last period in source order
    pub fn latest_period(&self) -> Option<&str> {
        self.periods.last().map(|(p, _)| p.as_str())
    }
}

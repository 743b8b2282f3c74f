//! Region boundaries and the choropleth join.
//!
//! Boundary features carry a loose bag of properties and region names can sit
//! under several keys depending on where the file came from. The join tries
//! [`REGION_NAME_KEYS`] in order and takes the first non-empty value the dataset
//! knows about. The key order is a heuristic that fits the bundled boundaries,
//! not something callers should rely on.

use crate::color::{Rgb, GREENS_9, UNMATCHED};
use crate::dataset::{Dataset, FloatValue};
use crate::scale::QuantileScale;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Property keys that may hold a region name, tried in order
pub const REGION_NAME_KEYS: [&str; 8] = [
    "name",
    "NAME",
    "Name",
    "ADMIN",
    "admin",
    "region",
    "NUTS_NAME",
    "CNTR_NAME",
];

/// Keys used for the label of a region that did not join
const LABEL_KEYS: [&str; 3] = ["name", "NAME", "NUTS_NAME"];

pub type Position = [FloatValue; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// Every linear ring of the geometry, outer rings and holes alike
    pub fn rings(&self) -> Vec<&[Position]> {
        match self {
            Geometry::Polygon(rings) => rings.iter().map(Vec::as_slice).collect(),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::as_slice))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Non-empty string value of a property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Candidate region names in lookup order
    pub fn candidate_names(&self) -> impl Iterator<Item = &str> {
        REGION_NAME_KEYS.iter().filter_map(|key| self.property(key))
    }

    /// Name used in labels when the region has no dataset entry
    pub fn label(&self) -> Option<&str> {
        LABEL_KEYS.iter().find_map(|key| self.property(key))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl BoundaryCollection {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `(min, max)` corners over every position, `None` without geometry
    pub fn bounds(&self) -> Option<(Position, Position)> {
        let mut positions = self
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.rings().into_iter().flatten().copied().collect::<Vec<_>>());
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            ([min[0].min(p[0]), min[1].min(p[1])], [max[0].max(p[0]), max[1].max(p[1])])
        }))
    }
}

/// The dataset entity a feature joins to
pub fn region_name<'a>(feature: &'a Feature, dataset: &Dataset) -> Option<&'a str> {
    feature.candidate_names().find(|name| dataset.contains(name))
}

/// Fill and label of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFill {
    pub feature: usize,
    /// Joined dataset entity, or the feature's own label if it did not join
    pub name: Option<String>,
    pub matched: bool,
    pub value: Option<FloatValue>,
    pub fill: Rgb,
}

impl RegionFill {
    /// Hover text, e.g. `"Austria: 28.5 km²"` or `"Malta: No data"`
    pub fn tooltip(&self, unit: &str) -> String {
        let name = self.name.as_deref().unwrap_or("Unknown region");
        match self.value {
            Some(value) if value != 0.0 => format!("{name}: {value} {unit}"),
            _ => format!("{name}: No data"),
        }
    }
}

/// Join every feature to `period` of `dataset` and pick its fill.
///
/// Joined regions with a non-zero value are coloured from a 9-class quantile
/// scale over all values defined for `period`. Unmatched regions and regions
/// whose value is absent or zero are filled with [`UNMATCHED`]. A miss is
/// logged and never stops the other regions from being filled.
pub fn choropleth_fills(
    boundaries: &BoundaryCollection,
    dataset: &Dataset,
    period: &str,
) -> Vec<RegionFill> {
    let scale = QuantileScale::new(dataset.values_for(period).map(|(_, v)| v), &GREENS_9);

    boundaries
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| match region_name(feature, dataset) {
            Some(name) => {
                let value = dataset.value(name, period);
                debug!(region = name, ?value, "Matched region");
                let fill = value
                    .filter(|v| *v != 0.0)
                    .and_then(|v| scale.apply(v).copied())
                    .unwrap_or(UNMATCHED);
                RegionFill {
                    feature: index,
                    name: Some(name.to_string()),
                    matched: true,
                    value,
                    fill,
                }
            }
            None => {
                let label = feature.label().or_else(|| feature.candidate_names().next());
                warn!(region = label.unwrap_or("<unnamed>"), "No dataset entry for region");
                RegionFill {
                    feature: index,
                    name: label.map(str::to_string),
                    matched: false,
                    value: None,
                    fill: UNMATCHED,
                }
            }
        })
        .collect()
}

/// Linear fit of longitude/latitude into a pixel box, north up.
///
/// Keeps the aspect ratio of the bounds and centres the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    scale: FloatValue,
    origin: Position,
    offset: (FloatValue, FloatValue),
}

impl FitTransform {
    pub fn fit(
        bounds: (Position, Position),
        size: (FloatValue, FloatValue),
        margin: FloatValue,
    ) -> Self {
        let ([x0, y0], [x1, y1]) = bounds;
        let (width, height) = (size.0 - 2.0 * margin, size.1 - 2.0 * margin);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            (false, true) => height / dy,
            (false, false) => 1.0,
        };
        let offset = (
            margin + (width - dx * scale) / 2.0,
            margin + (height - dy * scale) / 2.0,
        );
        Self {
            scale,
            origin: [x0, y1],
            offset,
        }
    }

    pub fn apply(&self, position: Position) -> (FloatValue, FloatValue) {
        (
            self.offset.0 + (position[0] - self.origin[0]) * self.scale,
            self.offset.1 + (self.origin[1] - position[1]) * self.scale,
        )
    }
}

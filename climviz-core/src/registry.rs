//! Dataset registration and loading.
//!
//! Charts never read files. Each dataset is bundled into the binary as JSON text and
//! registered under an identifier, either at compile time with
//! [`define_static_dataset!`] or at runtime with [`DatasetRegistry::register`].
//! The first [`DatasetRegistry::load`] of an identifier parses the JSON; later loads
//! share the parsed value for the rest of the process.
//!
//! ```rust
//! use climviz_core::registry::{DatasetDefinition, DatasetKind, DatasetRegistry};
//!
//! let registry = DatasetRegistry::new();
//! registry
//!     .register(DatasetDefinition::new(
//!         "emissions",
//!         DatasetKind::Tabular,
//!         "tons",
//!         "Annual emissions",
//!         r#"{"France": {"2020": 90}, "Germany": {"2020": 120}}"#,
//!     ))
//!     .unwrap();
//!
//! let dataset = registry.load_tabular("emissions").unwrap();
//! assert_eq!(dataset.value("Germany", "2020"), Some(120.0));
//! ```

use crate::dataset::{CategorizedDataset, Dataset, FlowDataset};
use crate::errors::{ClimvizError, ClimvizResult};
use crate::geo::BoundaryCollection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};
use tracing::debug;

/// Shape of the JSON held by a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// entity → period → value
    Tabular,
    /// category → entity → period → value
    Categorized,
    /// period → `[[link, link], ...]`
    Flow,
    /// GeoJSON-like feature collection
    Boundaries,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Tabular => write!(f, "tabular"),
            DatasetKind::Categorized => write!(f, "categorized"),
            DatasetKind::Flow => write!(f, "flow"),
            DatasetKind::Boundaries => write!(f, "boundaries"),
        }
    }
}

/// A parsed dataset
#[derive(Debug, Clone)]
pub enum DatasetData {
    Tabular(Arc<Dataset>),
    Categorized(Arc<CategorizedDataset>),
    Flow(Arc<FlowDataset>),
    Boundaries(Arc<BoundaryCollection>),
}

impl DatasetData {
    pub fn kind(&self) -> DatasetKind {
        match self {
            DatasetData::Tabular(_) => DatasetKind::Tabular,
            DatasetData::Categorized(_) => DatasetKind::Categorized,
            DatasetData::Flow(_) => DatasetKind::Flow,
            DatasetData::Boundaries(_) => DatasetKind::Boundaries,
        }
    }
}

/// Definition of a dataset registered at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier used by chart configurations
    pub id: String,
    pub kind: DatasetKind,
    /// Unit of the measurements (e.g. "tons", "MW")
    pub unit: String,
    pub description: String,
    /// The JSON text
    pub source: String,
}

impl DatasetDefinition {
    pub fn new(
        id: impl Into<String>,
        kind: DatasetKind,
        unit: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            unit: unit.into(),
            description: description.into(),
            source: source.into(),
        }
    }

    fn parse(&self) -> ClimvizResult<DatasetData> {
        parse_source(&self.id, self.kind, &self.source)
    }
}

/// Dataset definition holder for compile-time registration.
///
/// Holds `&'static str` references so it can be built in const contexts; the
/// JSON is usually pulled in with `include_str!`.
#[derive(Debug, Clone, Copy)]
pub struct StaticDatasetDefinition {
    pub id: &'static str,
    pub kind: DatasetKind,
    pub unit: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

impl StaticDatasetDefinition {
    pub const fn new(
        id: &'static str,
        kind: DatasetKind,
        unit: &'static str,
        description: &'static str,
        source: &'static str,
    ) -> Self {
        Self {
            id,
            kind,
            unit,
            description,
            source,
        }
    }

    /// Convert to a [`DatasetDefinition`].
    pub fn to_definition(&self) -> DatasetDefinition {
        DatasetDefinition::new(self.id, self.kind, self.unit, self.description, self.source)
    }
}

inventory::collect!(StaticDatasetDefinition);

/// Macro for bundling a dataset at compile time.
///
/// Datasets defined with this macro are visible to every [`DatasetRegistry`],
/// including the global [`DATASET_REGISTRY`].
///
/// ```rust
/// use climviz_core::define_static_dataset;
/// use climviz_core::registry::DatasetKind;
///
/// define_static_dataset!(
///     DATASET_DOC_EXAMPLE,
///     id = "doc-example",
///     kind = DatasetKind::Tabular,
///     unit = "tons",
///     description = "A tiny dataset",
///     source = r#"{"France": {"2020": 90}}"#,
/// );
/// ```
#[macro_export]
macro_rules! define_static_dataset {
    (
        $var_name:ident,
        id = $id:expr,
        kind = $kind:expr,
        unit = $unit:expr,
        description = $desc:expr,
        source = $source:expr $(,)?
    ) => {
        #[doc = concat!("Bundled dataset ", $id)]
        pub static $var_name: $crate::registry::StaticDatasetDefinition =
            $crate::registry::StaticDatasetDefinition::new($id, $kind, $unit, $desc, $source);

        ::inventory::submit! { $var_name }
    };
}

pub use crate::define_static_dataset;

fn parse_source(id: &str, kind: DatasetKind, source: &str) -> ClimvizResult<DatasetData> {
    let to_error = |source| ClimvizError::Json {
        id: id.to_string(),
        source,
    };
    let data = match kind {
        DatasetKind::Tabular => {
            DatasetData::Tabular(Arc::new(serde_json::from_str(source).map_err(to_error)?))
        }
        DatasetKind::Categorized => {
            DatasetData::Categorized(Arc::new(serde_json::from_str(source).map_err(to_error)?))
        }
        DatasetKind::Flow => {
            DatasetData::Flow(Arc::new(serde_json::from_str(source).map_err(to_error)?))
        }
        DatasetKind::Boundaries => {
            DatasetData::Boundaries(Arc::new(serde_json::from_str(source).map_err(to_error)?))
        }
    };
    debug!(dataset = %id, kind = %kind, "Parsed dataset");
    Ok(data)
}

/// Registry of bundled and runtime datasets.
///
/// Static datasets come from [`define_static_dataset!`] and are immutable; runtime
/// datasets and the parse cache sit behind `RwLock`s so a registry can be shared.
#[derive(Debug)]
pub struct DatasetRegistry {
    runtime: RwLock<HashMap<String, DatasetDefinition>>,
    cache: RwLock<HashMap<String, DatasetData>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self {
            runtime: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get a dataset definition by identifier.
    ///
    /// Static datasets take precedence over runtime ones.
    pub fn get(&self, id: &str) -> Option<DatasetDefinition> {
        for dataset in inventory::iter::<StaticDatasetDefinition> {
            if dataset.id == id {
                return Some(dataset.to_definition());
            }
        }

        let runtime = self.runtime.read().expect("Registry lock poisoned");
        runtime.get(id).cloned()
    }

    /// Register a dataset at runtime.
    ///
    /// Returns [`ClimvizError::DuplicateDataset`] if the identifier is taken.
    pub fn register(&self, definition: DatasetDefinition) -> ClimvizResult<()> {
        if inventory::iter::<StaticDatasetDefinition>
            .into_iter()
            .any(|d| d.id == definition.id)
        {
            return Err(ClimvizError::DuplicateDataset(definition.id));
        }

        let mut runtime = self.runtime.write().expect("Registry lock poisoned");
        if runtime.contains_key(&definition.id) {
            return Err(ClimvizError::DuplicateDataset(definition.id));
        }
        runtime.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All definitions, sorted by identifier
    pub fn list(&self) -> Vec<DatasetDefinition> {
        let mut result: Vec<DatasetDefinition> = inventory::iter::<StaticDatasetDefinition>
            .into_iter()
            .map(StaticDatasetDefinition::to_definition)
            .collect();

        let runtime = self.runtime.read().expect("Registry lock poisoned");
        result.extend(runtime.values().cloned());

        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    /// Load a dataset, parsing it on first use.
    ///
    /// An unknown identifier is a programming error in a chart configuration and
    /// is reported as [`ClimvizError::UnknownDataset`]; nothing retries it.
    pub fn load(&self, id: &str) -> ClimvizResult<DatasetData> {
        if let Some(data) = self.cache.read().expect("Registry lock poisoned").get(id) {
            return Ok(data.clone());
        }

        let definition = self
            .get(id)
            .ok_or_else(|| ClimvizError::UnknownDataset(id.to_string()))?;
        let data = definition.parse()?;

        let mut cache = self.cache.write().expect("Registry lock poisoned");
        Ok(cache.entry(id.to_string()).or_insert(data).clone())
    }

    pub fn load_tabular(&self, id: &str) -> ClimvizResult<Arc<Dataset>> {
        match self.load(id)? {
            DatasetData::Tabular(data) => Ok(data),
            other => Err(kind_mismatch(id, DatasetKind::Tabular, other.kind())),
        }
    }

    pub fn load_categorized(&self, id: &str) -> ClimvizResult<Arc<CategorizedDataset>> {
        match self.load(id)? {
            DatasetData::Categorized(data) => Ok(data),
            other => Err(kind_mismatch(id, DatasetKind::Categorized, other.kind())),
        }
    }

    pub fn load_flow(&self, id: &str) -> ClimvizResult<Arc<FlowDataset>> {
        match self.load(id)? {
            DatasetData::Flow(data) => Ok(data),
            other => Err(kind_mismatch(id, DatasetKind::Flow, other.kind())),
        }
    }

    pub fn load_boundaries(&self, id: &str) -> ClimvizResult<Arc<BoundaryCollection>> {
        match self.load(id)? {
            DatasetData::Boundaries(data) => Ok(data),
            other => Err(kind_mismatch(id, DatasetKind::Boundaries, other.kind())),
        }
    }

    /// Drop runtime registrations and every cached parse.
    ///
    /// Static datasets cannot be removed. Mostly useful for testing.
    pub fn clear_runtime(&self) {
        self.runtime.write().expect("Registry lock poisoned").clear();
        self.cache.write().expect("Registry lock poisoned").clear();
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_mismatch(id: &str, expected: DatasetKind, actual: DatasetKind) -> ClimvizError {
    ClimvizError::DatasetKind {
        id: id.to_string(),
        expected,
        actual,
    }
}

/// Global dataset registry instance.
pub static DATASET_REGISTRY: LazyLock<DatasetRegistry> = LazyLock::new(DatasetRegistry::new);

#[cfg(test)]
mod tests {
    use super::*;

    define_static_dataset!(
        DATASET_STATIC_TEST,
        id = "registry-static-test",
        kind = DatasetKind::Tabular,
        unit = "tons",
        description = "Registered through the macro",
        source = r#"{"France": {"2020": 90}}"#,
    );

    fn tabular(id: &str, json: &str) -> DatasetDefinition {
        DatasetDefinition::new(id, DatasetKind::Tabular, "tons", "test", json)
    }

    #[test]
    fn static_datasets_are_visible() {
        let registry = DatasetRegistry::new();
        assert!(registry.is_registered("registry-static-test"));
        let dataset = registry.load_tabular("registry-static-test").unwrap();
        assert_eq!(dataset.value("France", "2020"), Some(90.0));
        assert_eq!(DATASET_STATIC_TEST.unit, "tons");
    }

    #[test]
    fn unknown_dataset() {
        let registry = DatasetRegistry::new();
        let result = registry.load("does-not-exist");
        assert!(matches!(result, Err(ClimvizError::UnknownDataset(id)) if id == "does-not-exist"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = DatasetRegistry::new();
        registry.register(tabular("dup", "{}")).unwrap();
        assert!(matches!(
            registry.register(tabular("dup", "{}")),
            Err(ClimvizError::DuplicateDataset(_))
        ));
        assert!(matches!(
            registry.register(tabular("registry-static-test", "{}")),
            Err(ClimvizError::DuplicateDataset(_))
        ));
    }

    #[test]
    fn loads_are_shared() {
        let registry = DatasetRegistry::new();
        registry
            .register(tabular("shared", r#"{"A": {"2020": 1}}"#))
            .unwrap();
        let first = registry.load_tabular("shared").unwrap();
        let second = registry.load_tabular("shared").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn wrong_kind() {
        let registry = DatasetRegistry::new();
        registry.register(tabular("tab", "{}")).unwrap();
        let result = registry.load_flow("tab");
        assert!(matches!(
            result,
            Err(ClimvizError::DatasetKind {
                expected: DatasetKind::Flow,
                actual: DatasetKind::Tabular,
                ..
            })
        ));
    }

    #[test]
    fn malformed_json() {
        let registry = DatasetRegistry::new();
        registry.register(tabular("broken", "{not json")).unwrap();
        assert!(matches!(
            registry.load("broken"),
            Err(ClimvizError::Json { .. })
        ));
    }

    #[test]
    fn list_is_sorted() {
        let registry = DatasetRegistry::new();
        registry.register(tabular("zzz-last", "{}")).unwrap();
        registry.register(tabular("aaa-first", "{}")).unwrap();
        let ids: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ids.contains(&"registry-static-test".to_string()));
    }
}

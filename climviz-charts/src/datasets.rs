//! Bundled datasets for the climate site.
//!
//! The JSON files under `data/` are embedded at compile time and registered with
//! [`define_static_dataset!`], so they are available in every
//! [`DatasetRegistry`](climviz_core::registry::DatasetRegistry), including the global
//! [`DATASET_REGISTRY`](climviz_core::registry::DATASET_REGISTRY).
//!
//! # Usage
//!
//! ```rust
//! use climviz_charts::datasets::{DATASET_WASTE_MANAGEMENT, WASTE_MANAGEMENT};
//! use climviz_core::registry::DATASET_REGISTRY;
//!
//! assert_eq!(DATASET_WASTE_MANAGEMENT.unit, "tons");
//!
//! let waste = DATASET_REGISTRY.load_tabular(WASTE_MANAGEMENT).unwrap();
//! assert!(waste.contains("Germany"));
//! ```
//!
//! # Available datasets
//!
//! ## Causes
//! - `waste-management` - Waste generated per country and year, in tons
//! - `transport-fuel` - Fuel used by road transport per country and year, in tonnes
//! - `co2-per-capita` - CO₂ emissions per inhabitant, in tonnes
//!
//! ## Effects
//! - `livestock` - Livestock population, in thousand heads
//! - `water-resources` - Long-term annual water flows per country, in million m³
//! - `protected-areas` - Terrestrial protected area, in km²
//! - `europe-boundaries` - Coarse country outlines for the protected-area map
//!
//! ## Initiatives
//! - `renewable-capacity` - Installed electricity capacity by energy source, in MW
//! - `environmental-taxes` - Environmental tax revenue by country, tax type and paying sector,
//!   in million euro

use climviz_core::define_static_dataset;
use climviz_core::registry::DatasetKind;

pub const WASTE_MANAGEMENT: &str = "waste-management";
pub const TRANSPORT_FUEL: &str = "transport-fuel";
pub const CO2_PER_CAPITA: &str = "co2-per-capita";
pub const LIVESTOCK: &str = "livestock";
pub const WATER_RESOURCES: &str = "water-resources";
pub const PROTECTED_AREAS: &str = "protected-areas";
pub const EUROPE_BOUNDARIES: &str = "europe-boundaries";
pub const RENEWABLE_CAPACITY: &str = "renewable-capacity";
pub const ENVIRONMENTAL_TAXES: &str = "environmental-taxes";

/// Aggregate rows that are not countries
pub const EU_27: &str = "European Union - 27 countries (from 2020)";
pub const EURO_AREA_20: &str = "Euro area – 20 countries (from 2023)";

// ============================================================================
// Causes
// ============================================================================

define_static_dataset!(
    DATASET_WASTE_MANAGEMENT,
    id = "waste-management",
    kind = DatasetKind::Tabular,
    unit = "tons",
    description = "Waste generated by all economic activities and households",
    source = include_str!("../data/waste_management.json"),
);

define_static_dataset!(
    DATASET_TRANSPORT_FUEL,
    id = "transport-fuel",
    kind = DatasetKind::Tabular,
    unit = "tonnes",
    description = "Final energy consumption of road transport fuels",
    source = include_str!("../data/transport_fuel.json"),
);

define_static_dataset!(
    DATASET_CO2_PER_CAPITA,
    id = "co2-per-capita",
    kind = DatasetKind::Tabular,
    unit = "tonnes per capita",
    description = "Greenhouse gas emissions (CO2) per inhabitant",
    source = include_str!("../data/co2_per_capita.json"),
);

// ============================================================================
// Effects
// ============================================================================

define_static_dataset!(
    DATASET_LIVESTOCK,
    id = "livestock",
    kind = DatasetKind::Tabular,
    unit = "Thousand heads (animals)",
    description = "Livestock population at the December survey",
    source = include_str!("../data/livestock.json"),
);

define_static_dataset!(
    DATASET_WATER_RESOURCES,
    id = "water-resources",
    kind = DatasetKind::Tabular,
    unit = "million m³",
    description = "Renewable freshwater resources by flow component (long-term annual average)",
    source = include_str!("../data/water_resources.json"),
);

define_static_dataset!(
    DATASET_PROTECTED_AREAS,
    id = "protected-areas",
    kind = DatasetKind::Tabular,
    unit = "km²",
    description = "Terrestrial protected areas (Natura 2000)",
    source = include_str!("../data/protected_areas.json"),
);

define_static_dataset!(
    DATASET_EUROPE_BOUNDARIES,
    id = "europe-boundaries",
    kind = DatasetKind::Boundaries,
    unit = "",
    description = "Coarse outlines of European countries",
    source = include_str!("../data/europe.geojson"),
);

// ============================================================================
// Initiatives
// ============================================================================

define_static_dataset!(
    DATASET_RENEWABLE_CAPACITY,
    id = "renewable-capacity",
    kind = DatasetKind::Categorized,
    unit = "MW",
    description = "Electrical capacity installed, by renewable energy source",
    source = include_str!("../data/renewable_capacity.json"),
);

define_static_dataset!(
    DATASET_ENVIRONMENTAL_TAXES,
    id = "environmental-taxes",
    kind = DatasetKind::Flow,
    unit = "million euro",
    description = "Environmental tax revenue by tax type and paying sector",
    source = include_str!("../data/environmental_taxes.json"),
);

/// Identifiers of every bundled dataset
pub fn bundled() -> [&'static str; 9] {
    [
        WASTE_MANAGEMENT,
        TRANSPORT_FUEL,
        CO2_PER_CAPITA,
        LIVESTOCK,
        WATER_RESOURCES,
        PROTECTED_AREAS,
        EUROPE_BOUNDARIES,
        RENEWABLE_CAPACITY,
        ENVIRONMENTAL_TAXES,
    ]
}

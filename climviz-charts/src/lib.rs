//! Chart variants for the climate site and the datasets they are drawn from.
//!
//! Every chart here is registered with `typetag`, so a `Box<dyn Chart>` can be
//! read straight from a site configuration by its `type` name.

pub mod charts;
pub mod datasets;

pub use charts::{
    AlluvialChart, ChoroplethChart, DumbbellChart, HeatmapChart, LineChart, LollipopChart,
    Orientation, RadarChart, StackedBarChart, TopNBarChart,
};

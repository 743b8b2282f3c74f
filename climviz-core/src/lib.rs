pub mod chart;
pub mod color;
pub mod dataset;
pub mod document;
pub mod flow;
pub mod geo;
pub mod overlay;
pub mod registry;
pub mod scale;
pub mod selection;
pub mod view;

pub mod errors;

//! Alluvial (sankey) diagram of one year of a three-tier flow dataset
//!
//! Only the largest origins are kept, see [`FlowDiagram::build`]. Nodes are laid
//! out in one column per tier and links are drawn as horizontal cubic bands.

use super::{initial_option, registered_unit, Margin};
use climviz_core::chart::{
    check_option, invalid_input, mounted, Chart, Control, InputKind, SelectionInput,
};
use climviz_core::color::{Rgb, TEXT};
use climviz_core::dataset::{FlowDataset, FloatValue};
use climviz_core::document::{Mark, PathCommand, Point, RenderSurface, TextAnchor};
use climviz_core::errors::{ClimvizError, ClimvizResult};
use climviz_core::flow::{FlowDiagram, FlowLayout, FlowOptions, LinkBand};
use climviz_core::registry::DatasetRegistry;
use climviz_core::selection::SingleSelection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MARGIN: Margin = Margin::new(60.0, 30.0, 30.0, 200.0);
const NODE_WIDTH: FloatValue = 15.0;
const NODE_PADDING: FloatValue = 10.0;
const FLOW_COLOR: Rgb = Rgb::hex(0x4287f5);

#[derive(Debug, Clone)]
struct AlluvialState {
    dataset: Arc<FlowDataset>,
    unit: String,
    years: Vec<String>,
    year: SingleSelection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlluvialChart {
    title: String,
    dataset: String,
    #[serde(default)]
    options: FlowOptions,
    #[serde(skip)]
    state: Option<AlluvialState>,
}

impl AlluvialChart {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            options: FlowOptions::default(),
            state: None,
        }
    }

    pub fn with_options(mut self, options: FlowOptions) -> Self {
        self.options = options;
        self
    }

    /// Diagram for the selected year, empty if the year has no links
    pub fn diagram(&self) -> ClimvizResult<FlowDiagram> {
        let state = mounted(&self.state, &self.title)?;
        Ok(state
            .dataset
            .links(state.year.value())
            .map(|pairs| FlowDiagram::build(pairs, &self.options))
            .unwrap_or_default())
    }

    pub fn layout(
        &self,
        surface_width: FloatValue,
        surface_height: FloatValue,
    ) -> ClimvizResult<FlowLayout> {
        let extent = (
            (MARGIN.left, MARGIN.top),
            (surface_width - MARGIN.right, surface_height - MARGIN.bottom),
        );
        Ok(self.diagram()?.layout(extent, NODE_WIDTH, NODE_PADDING))
    }
}

/// Horizontal cubic through the middle of a link band
fn band_path(link: &LinkBand) -> Vec<PathCommand> {
    let middle = (link.x_source + link.x_target) / 2.0;
    vec![
        PathCommand::MoveTo(Point::new(link.x_source, link.y_source)),
        PathCommand::CubicTo(
            Point::new(middle, link.y_source),
            Point::new(middle, link.y_target),
            Point::new(link.x_target, link.y_target),
        ),
    ]
}

#[typetag::serde]
impl Chart for AlluvialChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()> {
        let dataset = registry.load_flow(&self.dataset)?;
        let years: Vec<String> = dataset.periods().map(str::to_string).collect();
        let latest = dataset.latest_period().unwrap_or_default().to_string();
        self.state = Some(AlluvialState {
            unit: registered_unit(registry, &self.dataset),
            year: SingleSelection::new(initial_option(&years, &latest)),
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
            .with_help("View environmental taxes flow between different sectors")],
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
        let size = surface.size();
        let layout = self.layout(size.width, size.height)?;
        let unit = &state.unit;

        for link in &layout.links {
            surface.draw(
                Mark::path(band_path(link))
                    .stroke(FLOW_COLOR, link.width.max(1.0))
                    .opacity(0.5)
                    .tooltip(format!(
                        "From: {}\nTo: {}\nValue: {:.2} {unit}",
                        link.source, link.target, link.value
                    ))
                    .class("link"),
            );
        }

        for node in &layout.nodes {
            surface.draw(
                Mark::rect(node.x0, node.y0, node.x1 - node.x0, node.y1 - node.y0)
                    .fill(FLOW_COLOR)
                    .opacity(0.8)
                    .tooltip(format!(
                        "{}\nIncoming: {:.2} {unit}\nOutgoing: {:.2} {unit}",
                        node.name, node.incoming, node.outgoing
                    ))
                    .class("node"),
            );
        }

        for node in &layout.nodes {
            let (x, anchor) = if node.x0 < size.width / 2.0 {
                (node.x1 + 6.0, TextAnchor::Start)
            } else {
                (node.x0 - 6.0, TextAnchor::End)
            };
            surface.draw(
                Mark::text(x, (node.y0 + node.y1) / 2.0, node.name.clone())
                    .anchor(anchor)
                    .font_size(10.0)
                    .fill(TEXT)
                    .class("label"),
            );
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.state = None;
    }
}

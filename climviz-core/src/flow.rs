//! Three-tier flow diagrams (origin → intermediate → destination).
//!
//! A [`FlowDiagram`] is built for one period of a [`FlowDataset`](crate::dataset::FlowDataset):
//! origins are ranked by the sum of their first-layer links, only the top few are
//! kept, and the second-layer links they feed are merged by `(source, target)`.
//! Nodes and links live in a `petgraph` graph so incoming and outgoing totals come
//! straight from the edges.

use crate::dataset::{FloatValue, LinkPair};
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::{Direction, Graph};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlowLayer {
    /// A kept source, e.g. a country
    Origin,
    /// One of the fixed intermediate names, e.g. a tax type
    Intermediate,
    /// Everything else, e.g. the paying sector
    Destination,
}

impl FlowLayer {
    pub fn index(&self) -> usize {
        match self {
            FlowLayer::Origin => 0,
            FlowLayer::Intermediate => 1,
            FlowLayer::Destination => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
    pub layer: FlowLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOptions {
    /// Number of origins kept after ranking
    pub top_sources: usize,
    /// Aggregate origins left out of the ranking
    pub exclude: Vec<String>,
    /// Node names assigned to [`FlowLayer::Intermediate`]
    pub intermediates: Vec<String>,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            top_sources: 3,
            exclude: vec!["European Union - 27 countries (from 2020)".to_string()],
            intermediates: vec![
                "Total environmental taxes".to_string(),
                "Energy taxes".to_string(),
                "Transport taxes".to_string(),
            ],
        }
    }
}

/// A link as drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLink<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub value: FloatValue,
}

#[derive(Debug, Clone, Default)]
pub struct FlowDiagram {
    node_indexes: IndexMap<String, NodeIndex>,
    graph: Graph<FlowNode, FloatValue>,
    sources: Vec<String>,
}

/// Origins ranked by the sum of their first-layer values, largest first
fn rank_sources(pairs: &[LinkPair], exclude: &[String]) -> Vec<(String, FloatValue)> {
    let mut totals: IndexMap<&str, FloatValue> = IndexMap::new();
    for pair in pairs {
        let source = &pair.first().source;
        if exclude.contains(source) {
            continue;
        }
        *totals.entry(source.as_str()).or_insert(0.0) += pair.first().value();
    }
    let mut ranked: Vec<(String, FloatValue)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

impl FlowDiagram {
    /// Build the diagram for one period's link pairs
    pub fn build(pairs: &[LinkPair], options: &FlowOptions) -> Self {
        let sources: Vec<String> = rank_sources(pairs, &options.exclude)
            .into_iter()
            .take(options.top_sources)
            .map(|(name, _)| name)
            .collect();
        let kept: Vec<&LinkPair> = pairs
            .iter()
            .filter(|pair| sources.contains(&pair.first().source))
            .collect();

        let mut second_layer: IndexMap<(&str, &str), FloatValue> = IndexMap::new();
        for pair in &kept {
            let key = (pair.first().target.as_str(), pair.second().target.as_str());
            *second_layer.entry(key).or_insert(0.0) += pair.second().value();
        }

        let mut diagram = FlowDiagram {
            sources,
            ..Default::default()
        };
        for pair in &kept {
            let link = pair.first();
            diagram.add_link(&link.source, &link.target, link.value(), options);
        }
        for ((source, target), value) in second_layer {
            diagram.add_link(source, target, value, options);
        }

        debug!(
            sources = diagram.sources.len(),
            nodes = diagram.graph.node_count(),
            links = diagram.graph.edge_count(),
            "Built flow diagram"
        );
        diagram
    }

    fn layer_for(&self, name: &str, options: &FlowOptions) -> FlowLayer {
        if options.intermediates.iter().any(|n| n == name) {
            FlowLayer::Intermediate
        } else if self.sources.iter().any(|n| n == name) {
            FlowLayer::Origin
        } else {
            FlowLayer::Destination
        }
    }

    fn ensure_node(&mut self, name: &str, options: &FlowOptions) -> NodeIndex {
        if let Some(index) = self.get_index(name) {
            return index;
        }
        let layer = self.layer_for(name, options);
        let index = self.graph.add_node(FlowNode {
            name: name.to_string(),
            layer,
        });
        self.node_indexes.insert(name.to_string(), index);
        index
    }

    fn add_link(&mut self, source: &str, target: &str, value: FloatValue, options: &FlowOptions) {
        let source = self.ensure_node(source, options);
        let target = self.ensure_node(target, options);
        self.graph.add_edge(source, target, value);
    }

    fn get_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_indexes.get(name).copied()
    }

    /// Kept origins, largest first
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Nodes in order of first appearance in the link list
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.node_indexes.values().map(|x| &self.graph[*x])
    }

    pub fn node(&self, name: &str) -> Option<&FlowNode> {
        self.get_index(name).map(|x| &self.graph[x])
    }

    pub fn layer_of(&self, name: &str) -> Option<FlowLayer> {
        self.node(name).map(|n| n.layer)
    }

    /// First-layer links followed by the merged second-layer links
    pub fn links(&self) -> Vec<FlowLink<'_>> {
        self.graph
            .edge_references()
            .map(|edge| FlowLink {
                source: &self.graph[edge.source()].name,
                target: &self.graph[edge.target()].name,
                value: *edge.weight(),
            })
            .collect()
    }

    fn total(&self, name: &str, direction: Direction) -> FloatValue {
        self.get_index(name)
            .map(|x| {
                self.graph
                    .edges_directed(x, direction)
                    .map(|e| *e.weight())
                    .sum::<FloatValue>()
            })
            .unwrap_or(0.0)
    }

    /// Sum of the values flowing into `name`
    pub fn incoming(&self, name: &str) -> FloatValue {
        self.total(name, Direction::Incoming)
    }

    /// Sum of the values flowing out of `name`
    pub fn outgoing(&self, name: &str) -> FloatValue {
        self.total(name, Direction::Outgoing)
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Position nodes in one column per layer inside `extent`.
    ///
    /// Node heights are proportional to the larger of their incoming and outgoing
    /// totals, using the tightest vertical scale that fits every column.
    pub fn layout(
        &self,
        extent: (Extent, Extent),
        node_width: FloatValue,
        node_padding: FloatValue,
    ) -> FlowLayout {
        let ((x0, y0), (x1, y1)) = extent;
        let mut columns: Vec<FlowLayer> = self.nodes().map(|n| n.layer).collect();
        columns.sort();
        columns.dedup();
        let column_of = |layer: FlowLayer| columns.iter().position(|l| *l == layer).unwrap_or(0);
        let column_step = if columns.len() > 1 {
            (x1 - x0 - node_width) / (columns.len() - 1) as FloatValue
        } else {
            0.0
        };

        let node_value = |name: &str| self.incoming(name).max(self.outgoing(name));
        let ky = columns
            .iter()
            .filter_map(|layer| {
                let members: Vec<&FlowNode> = self.nodes().filter(|n| n.layer == *layer).collect();
                let total: FloatValue = members.iter().map(|n| node_value(&n.name)).sum();
                if total <= 0.0 {
                    return None;
                }
                let free = (y1 - y0) - (members.len() as FloatValue - 1.0) * node_padding;
                Some(free.max(0.0) / total)
            })
            .fold(FloatValue::INFINITY, FloatValue::min);
        let ky = if ky.is_finite() { ky } else { 0.0 };

        let mut cursor = vec![y0; columns.len()];
        let nodes: Vec<NodeBox> = self
            .nodes()
            .map(|node| {
                let column = column_of(node.layer);
                let top = cursor[column];
                let height = node_value(&node.name) * ky;
                cursor[column] = top + height + node_padding;
                let left = x0 + column_step * column as FloatValue;
                NodeBox {
                    name: node.name.clone(),
                    layer: node.layer,
                    x0: left,
                    x1: left + node_width,
                    y0: top,
                    y1: top + height,
                    incoming: self.incoming(&node.name),
                    outgoing: self.outgoing(&node.name),
                }
            })
            .collect();

        let mut out_offset = vec![0.0; nodes.len()];
        let mut in_offset = vec![0.0; nodes.len()];
        let position = |name: &str| nodes.iter().position(|n| n.name == name);
        let links = self
            .links()
            .into_iter()
            .filter_map(|link| {
                let (s, t) = (position(link.source)?, position(link.target)?);
                let width = link.value * ky;
                let y_source = nodes[s].y0 + out_offset[s] + width / 2.0;
                let y_target = nodes[t].y0 + in_offset[t] + width / 2.0;
                out_offset[s] += width;
                in_offset[t] += width;
                Some(LinkBand {
                    source: link.source.to_string(),
                    target: link.target.to_string(),
                    value: link.value,
                    width,
                    x_source: nodes[s].x1,
                    y_source,
                    x_target: nodes[t].x0,
                    y_target,
                })
            })
            .collect();

        FlowLayout { nodes, links }
    }
}

/// A point of the layout extent
pub type Extent = (FloatValue, FloatValue);

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub name: String,
    pub layer: FlowLayer,
    pub x0: FloatValue,
    pub x1: FloatValue,
    pub y0: FloatValue,
    pub y1: FloatValue,
    pub incoming: FloatValue,
    pub outgoing: FloatValue,
}

/// A link drawn as a band between two node edges
#[derive(Debug, Clone, PartialEq)]
pub struct LinkBand {
    pub source: String,
    pub target: String,
    pub value: FloatValue,
    pub width: FloatValue,
    pub x_source: FloatValue,
    pub y_source: FloatValue,
    pub x_target: FloatValue,
    pub y_target: FloatValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowLayout {
    pub nodes: Vec<NodeBox>,
    pub links: Vec<LinkBand>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Link;
    use approx::assert_relative_eq;

    fn pair(
        source: &str,
        tax: &str,
        first: FloatValue,
        sector: &str,
        second: FloatValue,
    ) -> LinkPair {
        LinkPair(Link::new(source, tax, first), Link::new(tax, sector, second))
    }

    fn options(top_sources: usize) -> FlowOptions {
        FlowOptions {
            top_sources,
            ..Default::default()
        }
    }

    #[test]
    fn keeps_only_top_sources() {
        let pairs = vec![
            pair("X", "Energy taxes", 10.0, "Households", 6.0),
            pair("Y", "Energy taxes", 5.0, "Households", 3.0),
        ];
        let diagram = FlowDiagram::build(&pairs, &options(1));
        assert_eq!(diagram.sources(), &["X".to_string()]);
        assert!(diagram.node("Y").is_none());

        let first: Vec<_> = diagram
            .links()
            .into_iter()
            .filter(|l| l.target == "Energy taxes")
            .collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].source, "X");
        assert_eq!(first[0].value, 10.0);
    }

    #[test]
    fn merges_second_layer_links() {
        let pairs = vec![
            pair("A", "Energy taxes", 10.0, "Households", 4.0),
            pair("B", "Energy taxes", 8.0, "Households", 2.5),
            pair("B", "Transport taxes", 3.0, "Industry", 1.0),
            pair(
                "European Union - 27 countries (from 2020)",
                "Energy taxes",
                999.0,
                "Households",
                999.0,
            ),
        ];
        let diagram = FlowDiagram::build(&pairs, &FlowOptions::default());
        // B's two links outweigh A's single one
        assert_eq!(diagram.sources(), &["B".to_string(), "A".to_string()]);

        let links = diagram.links();
        assert_eq!(links.len(), 5);
        let merged = links
            .iter()
            .find(|l| l.source == "Energy taxes" && l.target == "Households")
            .unwrap();
        assert_relative_eq!(merged.value, 6.5);
        assert_relative_eq!(diagram.incoming("Energy taxes"), 18.0);
        assert_relative_eq!(diagram.outgoing("Energy taxes"), 6.5);
    }

    #[test]
    fn assigns_layers() {
        let pairs = vec![pair("A", "Energy taxes", 10.0, "Households", 4.0)];
        let diagram = FlowDiagram::build(&pairs, &FlowOptions::default());
        assert_eq!(diagram.layer_of("A"), Some(FlowLayer::Origin));
        assert_eq!(diagram.layer_of("Energy taxes"), Some(FlowLayer::Intermediate));
        assert_eq!(diagram.layer_of("Households"), Some(FlowLayer::Destination));
        assert_eq!(diagram.layer_of("Nowhere"), None);
    }

    #[test]
    fn empty_period_gives_empty_diagram() {
        let diagram = FlowDiagram::build(&[], &FlowOptions::default());
        assert!(diagram.is_empty());
        assert!(diagram.layout(((0.0, 0.0), (100.0, 100.0)), 15.0, 10.0).nodes.is_empty());
    }

    #[test]
    fn layout_places_layers_in_columns() {
        let pairs = vec![
            pair("A", "Energy taxes", 10.0, "Households", 10.0),
            pair("B", "Energy taxes", 10.0, "Industry", 10.0),
        ];
        let diagram = FlowDiagram::build(&pairs, &FlowOptions::default());
        let layout = diagram.layout(((200.0, 60.0), (870.0, 470.0)), 15.0, 10.0);

        let node = |name: &str| layout.nodes.iter().find(|n| n.name == name).unwrap();
        assert_eq!(node("A").x0, 200.0);
        assert_relative_eq!(node("Energy taxes").x0, 200.0 + (670.0 - 15.0) / 2.0);
        assert_relative_eq!(node("Households").x1, 870.0);

        // Two-node columns leave 400px for 20 units
        assert_relative_eq!(node("Energy taxes").y1 - node("Energy taxes").y0, 400.0);
        assert_relative_eq!(node("B").y0, 60.0 + 200.0 + 10.0);
        assert!(layout.links.iter().all(|l| l.width > 0.0));
    }
}

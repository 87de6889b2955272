//! Pure mapping from an epoch plus interaction state to draw records.

use super::epoch::Epoch;
use super::state::{EdgeEmphasis, InteractionState};
use super::types::{EdgeId, EdgeKind, Graph, GraphEdge, NodeKey, Point};
use crate::config::{NodeConfig, ViewConfig};

/// Categorical palette for relation types.
const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];
const OWNERSHIP_STROKE: &str = "#3f3f55";
const OWNERSHIP_STROKE_ACTIVE: &str = "#60a5fa";

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDraw {
	pub key: NodeKey,
	pub position: Point,
	pub radius: f64,
	pub fill: String,
	pub opacity: f64,
	pub label: String,
	pub label_visible: bool,
	/// Drawn with a ring when selected.
	pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDraw {
	pub id: EdgeId,
	pub from: Point,
	pub to: Point,
	/// Endpoint radii, so strokes stop at the node rims.
	pub from_radius: f64,
	pub to_radius: f64,
	pub stroke: String,
	pub width: f64,
	pub opacity: f64,
	/// Arrow head at `to`; relation edges only.
	pub marker: bool,
	pub label: Option<String>,
	pub emphasis: EdgeEmphasis,
}

/// Draw records in paint order: edges first, then dimmed nodes, then
/// emphasized nodes on top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<NodeDraw>,
	pub edges: Vec<EdgeDraw>,
}

impl Scene {
	/// Topmost node under `point` (graph coordinates).
	pub fn node_at(&self, point: Point, slop: f64) -> Option<NodeKey> {
		self.nodes
			.iter()
			.rev()
			.find(|n| n.position.distance(point) <= n.radius + slop)
			.map(|n| n.key)
	}
}

pub fn present(
	epoch: &Epoch,
	state: &InteractionState,
	style: &NodeConfig,
	view: &ViewConfig,
) -> Scene {
	let graph = epoch.graph();
	let highlight = state.highlight();
	let focused = [state.selected(), state.hovered()];

	let mut nodes: Vec<NodeDraw> = graph
		.nodes
		.iter()
		.map(|node| {
			let emphasized = highlight.is_emphasized(node.key);
			NodeDraw {
				key: node.key,
				position: node.position,
				radius: node.radius,
				fill: if node.key.is_thought() {
					style.thought_color.clone()
				} else {
					style.detail_color.clone()
				},
				opacity: if emphasized { 1.0 } else { view.dim_opacity },
				label: node.label.clone(),
				label_visible: focused.contains(&Some(node.key)),
				selected: state.selected() == Some(node.key),
			}
		})
		.collect();
	// Stable: graph order is kept within each band.
	nodes.sort_by_key(|n| highlight.is_emphasized(n.key));

	let edges = graph
		.edges
		.iter()
		.filter_map(|edge| {
			let (from, to) = (epoch.node(edge.source)?, epoch.node(edge.target)?);
			let emphasis = highlight.edge_emphasis(edge);
			let (opacity, width) = match emphasis {
				EdgeEmphasis::Normal => (view.edge_idle_opacity, 1.0),
				EdgeEmphasis::Emphasized => (1.0, 2.0),
				EdgeEmphasis::Connector => (view.edge_connector_opacity, 1.0),
				EdgeEmphasis::Dimmed => (view.edge_dim_opacity, 1.0),
			};
			Some(EdgeDraw {
				id: edge.id,
				from: from.position,
				to: to.position,
				from_radius: from.radius,
				to_radius: to.radius,
				stroke: edge_stroke(graph, edge, emphasis),
				width,
				opacity,
				marker: edge.is_relation(),
				label: (emphasis == EdgeEmphasis::Emphasized)
					.then(|| edge_label(&edge.kind))
					.flatten(),
				emphasis,
			})
		})
		.collect();

	Scene { nodes, edges }
}

fn edge_stroke(graph: &Graph, edge: &GraphEdge, emphasis: EdgeEmphasis) -> String {
	match &edge.kind {
		EdgeKind::Ownership if emphasis == EdgeEmphasis::Emphasized => {
			OWNERSHIP_STROKE_ACTIVE.into()
		}
		EdgeKind::Ownership => OWNERSHIP_STROKE.into(),
		EdgeKind::Relation { type_name, .. } => relation_color(graph, type_name).into(),
	}
}

/// Palette colour by position in the sorted type catalog.
pub fn relation_color(graph: &Graph, type_name: &str) -> &'static str {
	let slot = graph
		.relation_types
		.iter()
		.position(|name| name == type_name)
		.unwrap_or(0);
	COLORS[slot % COLORS.len()]
}

fn edge_label(kind: &EdgeKind) -> Option<String> {
	let EdgeKind::Relation {
		type_name,
		confidence,
		..
	} = kind
	else {
		return None;
	};
	Some(match confidence {
		Some(c) => format!("{type_name} ({:.0}%)", c * 100.0),
		None => type_name.clone(),
	})
}

/// One relation incident to a selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationLine {
	pub outgoing: bool,
	pub other: NodeKey,
	pub other_label: String,
	pub type_name: String,
	pub note: Option<String>,
	pub confidence: Option<f64>,
}

/// What the selection panel shows.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSummary {
	pub key: NodeKey,
	pub label: String,
	pub kind: &'static str,
	pub info: Option<String>,
	pub relations: Vec<RelationLine>,
}

impl SelectionSummary {
	pub fn describe(graph: &Graph, key: NodeKey) -> Option<Self> {
		let node = graph.node(key)?;
		let relations = graph
			.edges
			.iter()
			.filter(|e| e.touches(key))
			.filter_map(|e| {
				let EdgeKind::Relation {
					type_name,
					note,
					confidence,
				} = &e.kind
				else {
					return None;
				};
				let other = e.other(key)?;
				Some(RelationLine {
					outgoing: e.source == key,
					other,
					other_label: graph.node(other).map(|n| n.label.clone()).unwrap_or_default(),
					type_name: type_name.clone(),
					note: note.clone(),
					confidence: *confidence,
				})
			})
			.collect();
		Some(Self {
			key,
			label: node.label.clone(),
			kind: if key.is_thought() { "Thought" } else { "Detail" },
			info: node.info.clone(),
			relations,
		})
	}
}

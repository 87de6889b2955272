//! Projection of collaborator records into a typed node/edge graph.
//!
//! Building never fails. Records that cannot be placed are dropped and
//! reported as [`DataShapeError`] diagnostics next to the graph.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use super::types::{
	EdgeId, EdgeKind, Graph, GraphEdge, GraphNode, GraphRecords, NodeKey, Point, RecordId,
};
use crate::config::NodeConfig;
use crate::error::DataShapeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
	/// Omit thought nodes and their ownership edges.
	pub hide_thoughts: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildOutput {
	pub graph: Graph,
	pub dropped: Vec<DataShapeError>,
}

/// Build the graph for the whole record set.
pub fn build_graph(records: &GraphRecords, options: BuildOptions, style: &NodeConfig) -> BuildOutput {
	let mut dropped = Vec::new();
	let mut graph = Graph::default();

	let mut thought_ids = HashSet::new();
	for thought in &records.thoughts {
		let Some(id) = thought.id else {
			dropped.push(missing("thought", "id"));
			continue;
		};
		let Some(title) = non_empty(&thought.title) else {
			dropped.push(missing("thought", "title"));
			continue;
		};
		if !thought_ids.insert(id) {
			dropped.push(DataShapeError::DuplicateId { entity: "thought", id });
			continue;
		}
		if !options.hide_thoughts {
			graph.nodes.push(GraphNode {
				key: NodeKey::Thought(id),
				label: title.to_owned(),
				info: non_empty(&thought.description).map(str::to_owned),
				radius: style.thought_radius,
				position: Point::ORIGIN,
			});
		}
	}

	let mut detail_ids = HashSet::new();
	for detail in &records.details {
		let Some(id) = detail.id else {
			dropped.push(missing("detail", "id"));
			continue;
		};
		let Some(text) = non_empty(&detail.text) else {
			dropped.push(missing("detail", "text"));
			continue;
		};
		let Some(thought_id) = detail.thought_id else {
			dropped.push(missing("detail", "thought_id"));
			continue;
		};
		if !thought_ids.contains(&thought_id) {
			dropped.push(DataShapeError::UnknownThought {
				detail_id: id,
				thought_id,
			});
			continue;
		}
		if !detail_ids.insert(id) {
			dropped.push(DataShapeError::DuplicateId { entity: "detail", id });
			continue;
		}
		graph.nodes.push(GraphNode {
			key: NodeKey::Detail(id),
			label: text.to_owned(),
			info: non_empty(&detail.note).map(str::to_owned),
			radius: style.detail_radius,
			position: Point::ORIGIN,
		});
		if !options.hide_thoughts {
			graph.edges.push(GraphEdge {
				id: EdgeId::Ownership(id),
				source: NodeKey::Thought(thought_id),
				target: NodeKey::Detail(id),
				kind: EdgeKind::Ownership,
			});
		}
	}

	let mut relation_ids = HashSet::new();
	for relation in &records.relations {
		let Some(id) = relation.id else {
			dropped.push(missing("relation", "id"));
			continue;
		};
		let (Some(from), Some(to)) = (relation.from_detail_id, relation.to_detail_id) else {
			dropped.push(missing("relation", "from_detail_id/to_detail_id"));
			continue;
		};
		if from == to {
			dropped.push(DataShapeError::SelfRelation {
				relation_id: id,
				detail_id: from,
			});
			continue;
		}
		if let Some(&unknown) = [from, to].iter().find(|d| !detail_ids.contains(*d)) {
			dropped.push(DataShapeError::UnknownDetail {
				relation_id: id,
				detail_id: unknown,
			});
			continue;
		}
		if !relation_ids.insert(id) {
			dropped.push(DataShapeError::DuplicateId { entity: "relation", id });
			continue;
		}
		let confidence = match relation.confidence {
			Some(value) if !(value.is_finite() && (0.0..=1.0).contains(&value)) => {
				dropped.push(DataShapeError::ConfidenceOutOfRange {
					relation_id: id,
					value,
				});
				None
			}
			other => other,
		};
		graph.edges.push(GraphEdge {
			id: EdgeId::Relation(id),
			source: NodeKey::Detail(from),
			target: NodeKey::Detail(to),
			kind: EdgeKind::Relation {
				type_name: relation.type_name.clone().unwrap_or_default(),
				note: non_empty(&relation.note).map(str::to_owned),
				confidence,
			},
		});
	}

	let mut type_names = BTreeSet::new();
	for relation_type in &records.relation_types {
		match non_empty(&relation_type.name) {
			Some(name) => {
				type_names.insert(name.to_owned());
			}
			None => dropped.push(missing("relation type", "name")),
		}
	}
	graph.relation_types = type_names.into_iter().collect();

	for err in &dropped {
		warn!("dropped record: {err}");
	}
	debug!(
		"built graph: {} nodes, {} edges ({} records dropped)",
		graph.nodes.len(),
		graph.edges.len(),
		dropped.len()
	);
	BuildOutput { graph, dropped }
}

/// The neighbourhood of one thought: the thought, its details, every relation
/// touching them and the foreign details at the far end of those relations.
pub fn thought_subgraph(records: &GraphRecords, thought_id: RecordId, style: &NodeConfig) -> BuildOutput {
	let mut output = build_graph(records, BuildOptions::default(), style);
	// Ownership as built, so duplicate records resolve the same way.
	let owners: HashMap<RecordId, RecordId> = output
		.graph
		.edges
		.iter()
		.filter(|e| !e.is_relation())
		.filter_map(|e| match (e.source, e.target) {
			(NodeKey::Thought(t), NodeKey::Detail(d)) => Some((d, t)),
			_ => None,
		})
		.collect();
	let owned = |key: NodeKey| match key {
		NodeKey::Thought(id) => id == thought_id,
		NodeKey::Detail(id) => owners.get(&id) == Some(&thought_id),
	};

	let mut keep: HashSet<NodeKey> = HashSet::new();
	for edge in output.graph.edges.iter().filter(|e| e.is_relation()) {
		if owned(edge.source) || owned(edge.target) {
			keep.insert(edge.source);
			keep.insert(edge.target);
		}
	}
	output
		.graph
		.retain_nodes(|n| owned(n.key) || keep.contains(&n.key));
	output
}

fn missing(entity: &'static str, field: &'static str) -> DataShapeError {
	DataShapeError::MissingField { entity, field }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

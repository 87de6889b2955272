use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Primary key of a persisted record.
pub type RecordId = i64;

// ---- Collaborator records ----
//
// Every field is optional on the wire; the builder decides what is required.

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThoughtRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub id: Option<RecordId>,
	pub title: Option<String>,
	pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetailRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub id: Option<RecordId>,
	pub text: Option<String>,
	pub note: Option<String>,
	#[serde(deserialize_with = "lenient_id")]
	pub thought_id: Option<RecordId>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelationRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub id: Option<RecordId>,
	#[serde(deserialize_with = "lenient_id")]
	pub from_detail_id: Option<RecordId>,
	#[serde(deserialize_with = "lenient_id")]
	pub to_detail_id: Option<RecordId>,
	pub type_name: Option<String>,
	pub note: Option<String>,
	#[serde(deserialize_with = "lenient_number")]
	pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelationTypeRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub id: Option<RecordId>,
	pub name: Option<String>,
}

/// The four record sets returned by the graph data endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphRecords {
	#[serde(deserialize_with = "lenient_list")]
	pub thoughts: Vec<ThoughtRecord>,
	#[serde(deserialize_with = "lenient_list")]
	pub details: Vec<DetailRecord>,
	#[serde(deserialize_with = "lenient_list")]
	pub relations: Vec<RelationRecord>,
	#[serde(rename = "relationTypes", deserialize_with = "lenient_list")]
	pub relation_types: Vec<RelationTypeRecord>,
}

impl GraphRecords {
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	pub fn is_empty(&self) -> bool {
		self.thoughts.is_empty() && self.details.is_empty()
	}
}

/// Numeric ids may arrive as JSON numbers or as strings (bigint columns).
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<RecordId>, D::Error> {
	Ok(match Option::<Value>::deserialize(de)? {
		Some(Value::Number(n)) => n.as_i64(),
		Some(Value::String(s)) => s.trim().parse().ok(),
		_ => None,
	})
}

/// Postgres numerics are serialized as strings.
fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
	Ok(match Option::<Value>::deserialize(de)? {
		Some(Value::Number(n)) => n.as_f64(),
		Some(Value::String(s)) => s.trim().parse().ok(),
		_ => None,
	})
}

/// Decode list items one by one, dropping the ones that do not fit.
fn lenient_list<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let items = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
	Ok(items
		.into_iter()
		.filter_map(|item| match serde_json::from_value(item) {
			Ok(record) => Some(record),
			Err(err) => {
				log::warn!("dropping undecodable record: {err}");
				None
			}
		})
		.collect())
}

// ---- Graph projection ----

/// Identity of a graph node, tagged by the record it projects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
	Thought(RecordId),
	Detail(RecordId),
}

impl NodeKey {
	pub fn is_thought(self) -> bool {
		matches!(self, NodeKey::Thought(_))
	}
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKey::Thought(id) => write!(f, "t-{id}"),
			NodeKey::Detail(id) => write!(f, "d-{id}"),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub key: NodeKey,
	pub label: String,
	/// Thought description or detail note.
	pub info: Option<String>,
	pub radius: f64,
	/// Assigned by the layout engine; the origin until then.
	pub position: Point,
}

/// Identity of a graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeId {
	/// Synthesized thought -> detail edge, keyed by the detail.
	Ownership(RecordId),
	Relation(RecordId),
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EdgeId::Ownership(id) => write!(f, "own-{id}"),
			EdgeId::Relation(id) => write!(f, "rel-{id}"),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeKind {
	Ownership,
	Relation {
		type_name: String,
		note: Option<String>,
		/// `Some(0.0)` is an explicit value, distinct from unset.
		confidence: Option<f64>,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub id: EdgeId,
	pub source: NodeKey,
	pub target: NodeKey,
	pub kind: EdgeKind,
}

impl GraphEdge {
	pub fn touches(&self, key: NodeKey) -> bool {
		self.source == key || self.target == key
	}

	/// The endpoint across from `key`, if the edge touches it.
	pub fn other(&self, key: NodeKey) -> Option<NodeKey> {
		if self.source == key {
			Some(self.target)
		} else if self.target == key {
			Some(self.source)
		} else {
			None
		}
	}

	pub fn is_relation(&self) -> bool {
		matches!(self.kind, EdgeKind::Relation { .. })
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	/// Relation type names, sorted and deduplicated.
	pub relation_types: Vec<String>,
}

impl Graph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, key: NodeKey) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.key == key)
	}

	/// Smallest box holding every node disc, `None` for an empty graph.
	pub fn bounds(&self) -> Option<(Point, Point)> {
		if self.is_empty() {
			return None;
		}
		let mut min = Point::new(f64::INFINITY, f64::INFINITY);
		let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
		for node in &self.nodes {
			let (p, r) = (node.position, node.radius);
			min.x = min.x.min(p.x - r);
			min.y = min.y.min(p.y - r);
			max.x = max.x.max(p.x + r);
			max.y = max.y.max(p.y + r);
		}
		Some((min, max))
	}

	/// Keep only nodes accepted by `keep`, dropping edges left dangling.
	pub fn retain_nodes(&mut self, mut keep: impl FnMut(&GraphNode) -> bool) {
		self.nodes.retain(|n| keep(n));
		let present: std::collections::HashSet<NodeKey> =
			self.nodes.iter().map(|n| n.key).collect();
		self.edges
			.retain(|e| present.contains(&e.source) && present.contains(&e.target));
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn decodes_collaborator_payload() {
		let raw = r#"{
			"thoughts": [{"id": 1, "title": "Energy", "description": null}],
			"details": [{"id": "7", "text": "sun", "thought_id": 1}],
			"relations": [{"id": 3, "from_detail_id": 7, "to_detail_id": 8,
				"type_name": "supports", "confidence": "0.00"}],
			"relationTypes": [{"id": 1, "name": "supports"}]
		}"#;
		let records = GraphRecords::from_json(raw).unwrap();
		assert_eq!(records.thoughts[0].title.as_deref(), Some("Energy"));
		assert_eq!(records.details[0].id, Some(7));
		assert_eq!(records.relations[0].confidence, Some(0.0));
		assert_eq!(records.relation_types[0].name.as_deref(), Some("supports"));
	}

	#[test]
	fn missing_fields_and_sets_are_empty_not_errors() {
		let records =
			GraphRecords::from_json(r#"{"details": [{"text": "orphan"}, 42]}"#).unwrap();
		assert!(records.thoughts.is_empty());
		assert_eq!(records.details.len(), 1);
		assert_eq!(records.details[0].thought_id, None);
	}

	#[test]
	fn retain_nodes_drops_dangling_edges() {
		let node = |key| GraphNode {
			key,
			label: String::new(),
			info: None,
			radius: 1.0,
			position: Point::ORIGIN,
		};
		let mut graph = Graph {
			nodes: vec![node(NodeKey::Thought(1)), node(NodeKey::Detail(1))],
			edges: vec![GraphEdge {
				id: EdgeId::Ownership(1),
				source: NodeKey::Thought(1),
				target: NodeKey::Detail(1),
				kind: EdgeKind::Ownership,
			}],
			relation_types: vec![],
		};
		graph.retain_nodes(|n| !n.key.is_thought());
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn bounds_cover_node_discs() {
		let node = |key, x, y, radius| GraphNode {
			key,
			label: String::new(),
			info: None,
			radius,
			position: Point::new(x, y),
		};
		assert_eq!(Graph::default().bounds(), None);
		let graph = Graph {
			nodes: vec![
				node(NodeKey::Thought(1), -10.0, 5.0, 16.0),
				node(NodeKey::Detail(1), 40.0, -20.0, 7.0),
			],
			..Graph::default()
		};
		assert_eq!(
			graph.bounds(),
			Some((Point::new(-26.0, -27.0), Point::new(47.0, 21.0)))
		);
	}

	#[test]
	fn keys_render_like_element_ids() {
		assert_eq!(NodeKey::Thought(4).to_string(), "t-4");
		assert_eq!(NodeKey::Detail(9).to_string(), "d-9");
		assert_eq!(EdgeId::Relation(2).to_string(), "rel-2");
	}
}

//! Immutable laid-out graph snapshots and reload coalescing.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use super::types::{Graph, GraphNode, NodeKey};

/// One published, laid-out graph. Valid until the next reload.
#[derive(Clone, Debug, Default)]
pub struct Epoch {
	version: u64,
	graph: Graph,
	index: HashMap<NodeKey, usize>,
	/// Undirected one-hop adjacency over ownership and relation edges.
	neighbors: HashMap<NodeKey, Vec<NodeKey>>,
}

impl Epoch {
	pub fn new(version: u64, graph: Graph) -> Self {
		let index = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.key, i))
			.collect();
		let mut neighbors: HashMap<NodeKey, Vec<NodeKey>> = HashMap::new();
		for edge in &graph.edges {
			neighbors.entry(edge.source).or_default().push(edge.target);
			neighbors.entry(edge.target).or_default().push(edge.source);
		}
		for list in neighbors.values_mut() {
			list.sort();
			list.dedup();
		}
		Self {
			version,
			graph,
			index,
			neighbors,
		}
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn contains(&self, key: NodeKey) -> bool {
		self.index.contains_key(&key)
	}

	pub fn node(&self, key: NodeKey) -> Option<&GraphNode> {
		self.index.get(&key).map(|&i| &self.graph.nodes[i])
	}

	pub fn neighbors(&self, key: NodeKey) -> &[NodeKey] {
		self.neighbors.get(&key).map(Vec::as_slice).unwrap_or(&[])
	}
}

/// Hands out monotonically increasing epoch versions.
#[derive(Debug)]
pub struct EpochLine {
	current: Rc<Epoch>,
}

impl Default for EpochLine {
	fn default() -> Self {
		Self {
			current: Rc::new(Epoch::default()),
		}
	}
}

impl EpochLine {
	pub fn current(&self) -> &Rc<Epoch> {
		&self.current
	}

	/// Publish a laid-out graph as the next epoch.
	pub fn publish(&mut self, graph: Graph) -> Rc<Epoch> {
		let version = self.current.version + 1;
		info!(
			"epoch {version} published: {} nodes, {} edges",
			graph.nodes.len(),
			graph.edges.len()
		);
		self.current = Rc::new(Epoch::new(version, graph));
		Rc::clone(&self.current)
	}
}

/// Allows at most one reload in flight; requests arriving meanwhile collapse
/// into a single follow-up.
#[derive(Clone, Debug, Default)]
pub struct ReloadGate {
	in_flight: bool,
	pending: bool,
}

impl ReloadGate {
	/// Returns `true` when the caller should start a reload now.
	pub fn request(&mut self) -> bool {
		if self.in_flight {
			if !self.pending {
				debug!("reload coalesced with the one in flight");
			}
			self.pending = true;
			return false;
		}
		self.in_flight = true;
		true
	}

	/// Mark the in-flight reload done. Returns `true` when a coalesced
	/// request is waiting and the caller should reload again.
	pub fn complete(&mut self) -> bool {
		if self.pending {
			self.pending = false;
			true
		} else {
			self.in_flight = false;
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::atlas::builder::{BuildOptions, build_graph};
	use crate::components::atlas::types::fixtures;
	use crate::config::NodeConfig;
	use pretty_assertions::assert_eq;

	fn small_epoch() -> Epoch {
		let graph = build_graph(&fixtures::small(), BuildOptions::default(), &NodeConfig::default()).graph;
		Epoch::new(1, graph)
	}

	#[test]
	fn adjacency_is_symmetric() {
		let epoch = small_epoch();
		assert_eq!(
			epoch.neighbors(NodeKey::Detail(1)),
			&[NodeKey::Thought(1), NodeKey::Detail(2)]
		);
		assert_eq!(
			epoch.neighbors(NodeKey::Detail(2)),
			&[NodeKey::Thought(1), NodeKey::Detail(1)]
		);
		assert!(epoch.neighbors(NodeKey::Detail(42)).is_empty());
	}

	#[test]
	fn versions_increase_per_publish() {
		let mut line = EpochLine::default();
		assert_eq!(line.current().version(), 0);
		let first = line.publish(Graph::default());
		let second = line.publish(Graph::default());
		assert_eq!((first.version(), second.version()), (1, 2));
		assert_eq!(line.current().version(), 2);
	}

	#[test]
	fn reloads_coalesce_into_one_follow_up() {
		let mut gate = ReloadGate::default();
		assert!(gate.request());
		assert!(!gate.request());
		assert!(!gate.request());
		assert!(gate.complete(), "one follow-up for the coalesced requests");
		assert!(!gate.request(), "the follow-up is still in flight");
		assert!(gate.complete(), "a request during the follow-up queues another");
		assert!(!gate.complete());
		assert!(gate.request());
	}
}

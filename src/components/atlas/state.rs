use std::collections::HashSet;

use log::debug;

use super::epoch::Epoch;
use super::types::{GraphEdge, NodeKey, Point};
use crate::config::ViewConfig;

/// Which node drives the highlight. Selection wins over hover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
	Idle,
	Hovered(NodeKey),
	Selected(NodeKey),
}

impl Focus {
	pub fn node(self) -> Option<NodeKey> {
		match self {
			Focus::Idle => None,
			Focus::Hovered(key) | Focus::Selected(key) => Some(key),
		}
	}
}

/// One-shot request to centre the viewport on a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusCommand {
	pub center: Point,
	pub zoom: f64,
	pub duration_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeEmphasis {
	/// Nothing is focused.
	Normal,
	/// Both endpoints are highlighted.
	Emphasized,
	/// Exactly one endpoint is highlighted.
	Connector,
	Dimmed,
}

/// The focused node plus its one-hop neighbours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSet {
	active: Option<NodeKey>,
	nodes: HashSet<NodeKey>,
}

impl HighlightSet {
	fn around(epoch: &Epoch, active: Option<NodeKey>) -> Self {
		let mut nodes = HashSet::new();
		if let Some(key) = active {
			nodes.insert(key);
			nodes.extend(epoch.neighbors(key).iter().copied());
		}
		Self { active, nodes }
	}

	pub fn is_active(&self) -> bool {
		self.active.is_some()
	}

	pub fn contains(&self, key: NodeKey) -> bool {
		self.nodes.contains(&key)
	}

	/// Full emphasis for every node while nothing is focused.
	pub fn is_emphasized(&self, key: NodeKey) -> bool {
		!self.is_active() || self.contains(key)
	}

	pub fn edge_emphasis(&self, edge: &GraphEdge) -> EdgeEmphasis {
		if !self.is_active() {
			return EdgeEmphasis::Normal;
		}
		match (self.contains(edge.source), self.contains(edge.target)) {
			(true, true) => EdgeEmphasis::Emphasized,
			(true, false) | (false, true) => EdgeEmphasis::Connector,
			(false, false) => EdgeEmphasis::Dimmed,
		}
	}
}

/// Hover/selection state machine over the current epoch.
#[derive(Clone, Debug, Default)]
pub struct InteractionState {
	hovered: Option<NodeKey>,
	selected: Option<NodeKey>,
	last_hovered: Option<NodeKey>,
	highlight: HighlightSet,
}

impl InteractionState {
	pub fn focus(&self) -> Focus {
		match (self.selected, self.hovered) {
			(Some(key), _) => Focus::Selected(key),
			(None, Some(key)) => Focus::Hovered(key),
			(None, None) => Focus::Idle,
		}
	}

	pub fn hovered(&self) -> Option<NodeKey> {
		self.hovered
	}

	pub fn selected(&self) -> Option<NodeKey> {
		self.selected
	}

	/// Most recently hovered node, kept after the pointer leaves.
	#[cfg(test)]
	pub fn last_hovered(&self) -> Option<NodeKey> {
		self.last_hovered
	}

	pub fn highlight(&self) -> &HighlightSet {
		&self.highlight
	}

	pub fn pointer_enter(&mut self, epoch: &Epoch, key: NodeKey) {
		if !epoch.contains(key) || self.hovered == Some(key) {
			return;
		}
		self.hovered = Some(key);
		self.last_hovered = Some(key);
		self.refresh(epoch);
	}

	pub fn pointer_leave(&mut self, epoch: &Epoch) {
		if self.hovered.take().is_some() {
			self.refresh(epoch);
		}
	}

	/// Select `key` and return the camera command for it. Reselecting the
	/// same node returns the same command again.
	pub fn select(&mut self, epoch: &Epoch, key: NodeKey, view: &ViewConfig) -> Option<FocusCommand> {
		let Some(node) = epoch.node(key) else {
			debug!("ignoring selection of {key}: not in epoch {}", epoch.version());
			return None;
		};
		self.selected = Some(key);
		self.refresh(epoch);
		Some(FocusCommand {
			center: node.position,
			zoom: view.focus_zoom,
			duration_ms: view.focus_duration_ms,
		})
	}

	/// Click on empty canvas.
	pub fn clear(&mut self, epoch: &Epoch) {
		self.selected = None;
		self.hovered = None;
		self.refresh(epoch);
	}

	/// Re-anchor on a freshly published epoch, dropping references to nodes
	/// it no longer contains. Returns whether the selection was reset.
	pub fn retain(&mut self, epoch: &Epoch) -> bool {
		let mut reset = false;
		if let Some(key) = self.selected.filter(|k| !epoch.contains(*k)) {
			debug!("selection {key} vanished in epoch {}", epoch.version());
			self.selected = None;
			reset = true;
		}
		if self.hovered.is_some_and(|k| !epoch.contains(k)) {
			self.hovered = None;
		}
		if self.last_hovered.is_some_and(|k| !epoch.contains(k)) {
			self.last_hovered = None;
		}
		self.refresh(epoch);
		reset
	}

	fn refresh(&mut self, epoch: &Epoch) {
		self.highlight = HighlightSet::around(epoch, self.focus().node());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::atlas::builder::{BuildOptions, build_graph};
	use crate::components::atlas::layout::layout;
	use crate::components::atlas::types::{EdgeId, GraphRecords, fixtures};
	use crate::config::{LayoutConfig, NodeConfig};
	use pretty_assertions::assert_eq;

	fn epoch_of(records: &GraphRecords, version: u64) -> Epoch {
		let graph = build_graph(records, BuildOptions::default(), &NodeConfig::default()).graph;
		Epoch::new(version, layout(graph, &LayoutConfig::default()))
	}

	fn keys(epoch: &Epoch, set: &HighlightSet) -> Vec<NodeKey> {
		let mut keys: Vec<_> = epoch
			.graph()
			.nodes
			.iter()
			.map(|n| n.key)
			.filter(|k| set.contains(*k))
			.collect();
		keys.sort();
		keys
	}

	#[test]
	fn selecting_a_detail_highlights_its_one_hop_neighbours() {
		let epoch = epoch_of(&fixtures::small(), 1);
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Detail(1), &ViewConfig::default());
		assert_eq!(state.focus(), Focus::Selected(NodeKey::Detail(1)));
		assert_eq!(
			keys(&epoch, state.highlight()),
			vec![NodeKey::Thought(1), NodeKey::Detail(1), NodeKey::Detail(2)]
		);
	}

	#[test]
	fn highlight_is_exactly_one_hop() {
		let epoch = epoch_of(&fixtures::two_clusters(), 1);
		let mut state = InteractionState::default();
		state.pointer_enter(&epoch, NodeKey::Detail(2));
		assert_eq!(
			keys(&epoch, state.highlight()),
			vec![NodeKey::Thought(1), NodeKey::Detail(2)]
		);
		state.pointer_enter(&epoch, NodeKey::Detail(1));
		assert_eq!(
			keys(&epoch, state.highlight()),
			vec![NodeKey::Thought(1), NodeKey::Detail(1), NodeKey::Detail(4)]
		);
	}

	#[test]
	fn selection_outranks_hover() {
		let epoch = epoch_of(&fixtures::two_clusters(), 1);
		let view = ViewConfig::default();
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Thought(1), &view);
		let before = state.highlight().clone();

		state.pointer_enter(&epoch, NodeKey::Detail(5));
		assert_eq!(state.focus(), Focus::Selected(NodeKey::Thought(1)));
		assert_eq!(state.last_hovered(), Some(NodeKey::Detail(5)));
		assert_eq!(state.highlight(), &before);

		state.pointer_leave(&epoch);
		assert_eq!(state.focus(), Focus::Selected(NodeKey::Thought(1)));
		assert_eq!(state.last_hovered(), Some(NodeKey::Detail(5)));
	}

	#[test]
	fn hover_and_leave_return_to_idle() {
		let epoch = epoch_of(&fixtures::small(), 1);
		let mut state = InteractionState::default();
		state.pointer_enter(&epoch, NodeKey::Detail(2));
		assert_eq!(state.focus(), Focus::Hovered(NodeKey::Detail(2)));
		state.pointer_leave(&epoch);
		assert_eq!(state.focus(), Focus::Idle);
		assert!(!state.highlight().is_active());
	}

	#[test]
	fn canvas_click_returns_to_idle_and_full_emphasis() {
		let epoch = epoch_of(&fixtures::two_clusters(), 1);
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Detail(3), &ViewConfig::default());
		assert!(!state.highlight().is_emphasized(NodeKey::Detail(6)));

		state.clear(&epoch);
		assert_eq!(state.focus(), Focus::Idle);
		for node in &epoch.graph().nodes {
			assert!(state.highlight().is_emphasized(node.key));
		}
		for edge in &epoch.graph().edges {
			assert_eq!(state.highlight().edge_emphasis(edge), EdgeEmphasis::Normal);
		}
	}

	#[test]
	fn edge_emphasis_distinguishes_connectors() {
		let epoch = epoch_of(&fixtures::two_clusters(), 1);
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Detail(1), &ViewConfig::default());
		let emphasis = |id| {
			let edge = epoch.graph().edges.iter().find(|e| e.id == id).unwrap();
			state.highlight().edge_emphasis(edge)
		};
		assert_eq!(emphasis(EdgeId::Ownership(1)), EdgeEmphasis::Emphasized);
		assert_eq!(emphasis(EdgeId::Relation(1)), EdgeEmphasis::Emphasized);
		assert_eq!(emphasis(EdgeId::Ownership(2)), EdgeEmphasis::Connector);
		assert_eq!(emphasis(EdgeId::Ownership(4)), EdgeEmphasis::Connector);
		assert_eq!(emphasis(EdgeId::Ownership(5)), EdgeEmphasis::Dimmed);
	}

	#[test]
	fn reselecting_reissues_the_same_focus_command() {
		let epoch = epoch_of(&fixtures::small(), 1);
		let view = ViewConfig::default();
		let mut state = InteractionState::default();
		let first = state.select(&epoch, NodeKey::Detail(2), &view).unwrap();
		let again = state.select(&epoch, NodeKey::Detail(2), &view).unwrap();
		assert_eq!(first, again);
		assert_eq!(first.center, epoch.node(NodeKey::Detail(2)).unwrap().position);
		assert_eq!(first.zoom, view.focus_zoom);
		assert_eq!(first.duration_ms, view.focus_duration_ms);
	}

	#[test]
	fn selecting_an_absent_node_is_ignored() {
		let epoch = epoch_of(&fixtures::small(), 1);
		let mut state = InteractionState::default();
		assert!(state.select(&epoch, NodeKey::Detail(99), &ViewConfig::default()).is_none());
		assert_eq!(state.focus(), Focus::Idle);
	}

	#[test]
	fn vanished_selection_resets_to_idle() {
		let mut records = fixtures::small();
		let epoch = epoch_of(&records, 1);
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Detail(2), &ViewConfig::default());

		records.details.retain(|d| d.id != Some(2));
		records.relations.clear();
		let reloaded = epoch_of(&records, 2);
		assert!(state.retain(&reloaded));
		assert_eq!(state.focus(), Focus::Idle);
		assert!(!state.highlight().is_active());
	}

	#[test]
	fn surviving_selection_is_recomputed_on_reload() {
		let mut records = fixtures::small();
		let epoch = epoch_of(&records, 1);
		let mut state = InteractionState::default();
		state.select(&epoch, NodeKey::Detail(1), &ViewConfig::default());

		records.relations.clear();
		let reloaded = epoch_of(&records, 2);
		assert!(!state.retain(&reloaded));
		assert_eq!(
			keys(&reloaded, state.highlight()),
			vec![NodeKey::Thought(1), NodeKey::Detail(1)]
		);
	}
}

//! Everything the canvas holds between events: the published epoch, the
//! layout pass in progress, interaction state and the viewport.
//!
//! All handlers run to completion on the UI thread, so transitions never
//! interleave.

use std::rc::Rc;

use log::{debug, info};

use super::builder::{BuildOptions, build_graph, thought_subgraph};
use super::epoch::{Epoch, EpochLine};
use super::layout::LayoutJob;
use super::present::{Scene, present};
#[cfg(test)]
use super::state::Focus;
use super::state::InteractionState;
use super::types::{GraphRecords, NodeKey, RecordId};
use super::viewport::Viewport;
use crate::config::AtlasConfig;

/// Pointer travel (screen px) beyond which a press is a pan, not a click.
const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Copy, Debug)]
struct Press {
	start_x: f64,
	start_y: f64,
	moved: bool,
}

pub struct AtlasSession {
	config: AtlasConfig,
	epochs: EpochLine,
	job: Option<LayoutJob>,
	interaction: InteractionState,
	pub viewport: Viewport,
	press: Option<Press>,
}

impl AtlasSession {
	pub fn new(config: AtlasConfig, width: f64, height: f64) -> Self {
		Self {
			config,
			epochs: EpochLine::default(),
			job: None,
			interaction: InteractionState::default(),
			viewport: Viewport::new(width, height),
			press: None,
		}
	}

	pub fn epoch(&self) -> &Rc<Epoch> {
		self.epochs.current()
	}

	pub fn selected(&self) -> Option<NodeKey> {
		self.interaction.selected()
	}

	/// Rebuild the model and start a fresh layout pass. `scope` narrows the
	/// graph to one thought's neighbourhood. A pass already in progress is
	/// abandoned; the current epoch stays visible until the new one is
	/// published.
	pub fn rebuild(&mut self, records: &GraphRecords, hide_thoughts: bool, scope: Option<RecordId>) {
		let graph = match scope {
			None => build_graph(records, BuildOptions { hide_thoughts }, &self.config.nodes).graph,
			Some(thought_id) => {
				let mut graph = thought_subgraph(records, thought_id, &self.config.nodes).graph;
				if hide_thoughts {
					graph.retain_nodes(|n| !n.key.is_thought());
				}
				graph
			}
		};
		if self.job.is_some() {
			debug!("superseding layout pass in progress");
		}
		self.job = Some(LayoutJob::new(graph, &self.config.layout));
	}

	/// Advance the layout by one batch and the camera by `dt_ms`. Returns
	/// whether a new epoch was published. A published graph is framed
	/// unless a selection holds the camera.
	pub fn frame(&mut self, dt_ms: f64) -> bool {
		let finished = match self.job.as_mut() {
			Some(job) => job.run_batch(self.config.layout.batch_size),
			None => false,
		};
		let mut published = false;
		if let Some(job) = self.job.take_if(|_| finished) {
			let epoch = self.epochs.publish(job.finish());
			if self.interaction.retain(&epoch) {
				info!("selection cleared: node left the graph");
			}
			if self.interaction.selected().is_none() {
				self.fit_to_graph();
			}
			published = true;
		}
		self.viewport.tick(dt_ms);
		published
	}

	fn fit_to_graph(&mut self) {
		let Some(bounds) = self.epoch().graph().bounds() else {
			return;
		};
		let view = &self.config.view;
		self.viewport.fit(
			bounds,
			view.fit_padding,
			view.min_zoom,
			view.fit_max_zoom.clamp(view.min_zoom, view.max_zoom),
		);
	}

	pub fn scene(&self) -> Scene {
		present(
			self.epoch(),
			&self.interaction,
			&self.config.nodes,
			&self.config.view,
		)
	}

	fn hit(&self, sx: f64, sy: f64) -> Option<NodeKey> {
		let point = self.viewport.screen_to_graph(sx, sy);
		self.scene().node_at(point, self.config.view.hit_slop)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.press = Some(Press {
			start_x: sx,
			start_y: sy,
			moved: false,
		});
		self.viewport.begin_pan(sx, sy);
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(press) = self.press.as_mut() {
			let (dx, dy) = (sx - press.start_x, sy - press.start_y);
			if (dx * dx + dy * dy).sqrt() > CLICK_TOLERANCE {
				press.moved = true;
			}
			if press.moved {
				self.viewport.pan_to(sx, sy);
			}
			return;
		}
		let epoch = Rc::clone(self.epoch());
		match self.hit(sx, sy) {
			Some(key) => self.interaction.pointer_enter(&epoch, key),
			None => self.interaction.pointer_leave(&epoch),
		}
	}

	/// A release without travel is a click: on a node it selects, on empty
	/// canvas it clears.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) {
		self.viewport.end_pan();
		let Some(press) = self.press.take() else {
			return;
		};
		if press.moved {
			return;
		}
		match self.hit(sx, sy) {
			Some(key) => {
				self.select(key);
			}
			None => {
				let epoch = Rc::clone(self.epoch());
				self.interaction.clear(&epoch);
			}
		}
	}

	pub fn pointer_leave(&mut self) {
		self.press = None;
		self.viewport.end_pan();
		let epoch = Rc::clone(self.epoch());
		self.interaction.pointer_leave(&epoch);
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let view = &self.config.view;
		self.viewport
			.zoom_at(sx, sy, delta_y, view.min_zoom, view.max_zoom);
	}

	/// Hover driven from outside the canvas, e.g. the index panel.
	pub fn hover(&mut self, key: Option<NodeKey>) {
		let epoch = Rc::clone(self.epoch());
		match key {
			Some(key) => self.interaction.pointer_enter(&epoch, key),
			None => self.interaction.pointer_leave(&epoch),
		}
	}

	/// Select a node and centre the camera on it. Returns `false` when the
	/// node is not in the current epoch.
	pub fn select(&mut self, key: NodeKey) -> bool {
		let epoch = Rc::clone(self.epoch());
		match self.interaction.select(&epoch, key, &self.config.view) {
			Some(command) => {
				self.viewport.apply_focus(&command);
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
impl AtlasSession {
	fn focus(&self) -> Focus {
		self.interaction.focus()
	}

	fn is_settling(&self) -> bool {
		self.job.is_some()
	}

	/// Run any pending layout to completion.
	fn settle(&mut self) -> bool {
		let mut published = false;
		while self.job.is_some() {
			published |= self.frame(0.0);
		}
		published
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::atlas::types::{EdgeId, fixtures};
	use pretty_assertions::assert_eq;

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	fn session(records: &GraphRecords) -> AtlasSession {
		let mut session = AtlasSession::new(AtlasConfig::default(), W, H);
		session.rebuild(records, false, None);
		session.settle();
		session
	}

	fn screen_of(session: &AtlasSession, key: NodeKey) -> (f64, f64) {
		let p = session.epoch().node(key).unwrap().position;
		let t = session.viewport.transform;
		(p.x * t.k + t.x, p.y * t.k + t.y)
	}

	/// A screen point far from every node.
	fn empty_spot(session: &AtlasSession) -> (f64, f64) {
		let t = session.viewport.transform;
		(t.x + 10_000.0, t.y + 10_000.0)
	}

	#[test]
	fn positions_are_published_only_when_the_pass_completes() {
		let mut session = AtlasSession::new(AtlasConfig::default(), W, H);
		session.rebuild(&fixtures::small(), false, None);
		let batches = AtlasConfig::default().layout.steps / AtlasConfig::default().layout.batch_size;
		for _ in 1..batches {
			assert!(!session.frame(16.0));
			assert!(session.epoch().graph().is_empty());
		}
		assert!(session.frame(16.0));
		assert!(!session.is_settling());
		assert_eq!(session.epoch().version(), 1);
		assert_eq!(session.epoch().graph().nodes.len(), 3);
	}

	#[test]
	fn rebuild_during_layout_supersedes_the_pass() {
		let mut session = AtlasSession::new(AtlasConfig::default(), W, H);
		session.rebuild(&fixtures::small(), false, None);
		session.frame(16.0);
		session.rebuild(&fixtures::small(), true, None);
		session.settle();
		assert_eq!(session.epoch().version(), 1);
		assert!(session.epoch().graph().nodes.iter().all(|n| !n.key.is_thought()));
	}

	#[test]
	fn click_selects_and_canvas_click_clears() {
		let mut session = session(&fixtures::small());
		let (x, y) = screen_of(&session, NodeKey::Detail(1));
		session.pointer_down(x, y);
		session.pointer_up(x, y);
		assert_eq!(session.focus(), Focus::Selected(NodeKey::Detail(1)));
		assert!(session.viewport.is_animating());

		let (ex, ey) = empty_spot(&session);
		session.pointer_down(ex, ey);
		session.pointer_up(ex, ey);
		assert_eq!(session.focus(), Focus::Idle);
		assert!(session.scene().nodes.iter().all(|n| n.opacity == 1.0));
	}

	#[test]
	fn dragging_pans_without_changing_selection() {
		let mut session = session(&fixtures::small());
		session.select(NodeKey::Detail(2));
		session.frame(10_000.0);
		let before = session.viewport.transform;

		let (ex, ey) = empty_spot(&session);
		session.pointer_down(ex, ey);
		session.pointer_move(ex + 40.0, ey + 10.0);
		session.pointer_up(ex + 40.0, ey + 10.0);
		assert_eq!(session.selected(), Some(NodeKey::Detail(2)));
		assert!((session.viewport.transform.x - (before.x + 40.0)).abs() < 1e-6);
	}

	#[test]
	fn hovering_follows_the_pointer() {
		let mut session = session(&fixtures::small());
		let (x, y) = screen_of(&session, NodeKey::Thought(1));
		session.pointer_move(x, y);
		assert_eq!(session.focus(), Focus::Hovered(NodeKey::Thought(1)));
		let (ex, ey) = empty_spot(&session);
		session.pointer_move(ex, ey);
		assert_eq!(session.focus(), Focus::Idle);
	}

	#[test]
	fn reload_without_the_selected_detail_clears_selection() {
		let mut records = fixtures::small();
		let mut session = session(&records);
		assert!(session.select(NodeKey::Detail(2)));

		records.details.retain(|d| d.id != Some(2));
		records.relations.clear();
		session.rebuild(&records, false, None);
		session.settle();
		assert_eq!(session.selected(), None);
		assert_eq!(session.focus(), Focus::Idle);
	}

	#[test]
	fn hiding_thoughts_clears_a_selected_thought() {
		let records = fixtures::small();
		let mut session = session(&records);
		session.select(NodeKey::Thought(1));
		session.rebuild(&records, true, None);
		session.settle();
		assert_eq!(session.focus(), Focus::Idle);
		assert!(!session.select(NodeKey::Thought(1)));
	}

	#[test]
	fn scoped_rebuild_shows_one_thought_neighbourhood() {
		let mut session = AtlasSession::new(AtlasConfig::default(), W, H);
		session.rebuild(&fixtures::two_clusters(), false, Some(2));
		session.settle();
		let mut keys: Vec<_> = session.epoch().graph().nodes.iter().map(|n| n.key).collect();
		keys.sort();
		assert_eq!(
			keys,
			vec![
				NodeKey::Thought(2),
				NodeKey::Detail(1),
				NodeKey::Detail(4),
				NodeKey::Detail(5),
				NodeKey::Detail(6),
			]
		);

		session.rebuild(&fixtures::two_clusters(), true, Some(2));
		session.settle();
		assert!(session.epoch().graph().nodes.iter().all(|n| !n.key.is_thought()));
		assert_eq!(session.epoch().graph().edges.len(), 1);
	}

	/// Twelve thoughts with five details each, cross-linked.
	fn sprawling_records() -> GraphRecords {
		let mut records = GraphRecords::default();
		for t in 1..=12 {
			records.thoughts.push(fixtures::thought(t, &format!("thought {t}")));
			for d in 0..5 {
				let id = (t - 1) * 5 + d + 1;
				records.details.push(fixtures::detail(id, t, &format!("detail {id}")));
			}
		}
		for r in 1..=40 {
			let (from, to) = (r, (r * 7 + 3) % 60 + 1);
			if from != to {
				records.relations.push(fixtures::relation(r, from, to, "supports"));
			}
		}
		records
	}

	#[test]
	fn published_graph_is_framed_on_screen() {
		let session = session(&sprawling_records());
		assert_eq!(session.epoch().graph().nodes.len(), 72);
		for node in &session.epoch().graph().nodes {
			let (x, y) = screen_of(&session, node.key);
			assert!((0.0..=W).contains(&x) && (0.0..=H).contains(&y), "{} at ({x}, {y})", node.key);
		}
	}

	#[test]
	fn selection_keeps_the_camera_across_reloads() {
		let records = sprawling_records();
		let mut session = session(&records);
		assert!(session.select(NodeKey::Detail(7)));
		session.frame(10_000.0);
		let held = session.viewport.transform;

		session.rebuild(&records, false, None);
		assert!(session.settle());
		assert_eq!(session.viewport.transform, held);
	}

	#[test]
	fn toggling_hide_thoughts_restores_the_same_graph() {
		fn shape(session: &AtlasSession) -> (Vec<NodeKey>, Vec<EdgeId>) {
			let graph = session.epoch().graph();
			let mut nodes: Vec<_> = graph.nodes.iter().map(|n| n.key).collect();
			let mut edges: Vec<_> = graph.edges.iter().map(|e| e.id).collect();
			nodes.sort();
			edges.sort();
			(nodes, edges)
		}

		let records = fixtures::two_clusters();
		let mut session = session(&records);
		let shown = shape(&session);

		session.rebuild(&records, true, None);
		session.settle();
		let (nodes, edges) = shape(&session);
		assert!(nodes.iter().all(|k| !k.is_thought()));
		assert_eq!(edges, vec![EdgeId::Relation(1)]);

		session.rebuild(&records, false, None);
		session.settle();
		assert_eq!(shape(&session), shown);
		assert_eq!(session.epoch().version(), 3);
	}
}

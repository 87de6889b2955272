//! Force-directed layout.
//!
//! Four forces act on every step: link springs with a rest length per edge
//! kind, inverse-distance many-body repulsion, a pairwise collision
//! constraint sized by node radius, and centering of the centroid on the
//! origin. The simulation runs a fixed number of steps with a cooling
//! `alpha`, so the result depends only on the input graph and the
//! configuration.
//!
//! Pairwise forces are O(n²) per step; the step loop is exposed in batches so
//! callers can yield between them.

use std::collections::HashMap;

use log::debug;

use super::types::{EdgeKind, Graph, NodeKey, Point};
use crate::config::LayoutConfig;

const ALPHA_MIN: f64 = 0.001;
/// Squared distance below which repulsion stops growing.
const DISTANCE_MIN2: f64 = 1.0;

#[derive(Clone, Debug, Default)]
struct Body {
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	radius: f64,
}

#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	/// Share of the correction applied to the target.
	bias: f64,
}

/// Seeded linear congruential generator, used only to break exact ties.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	const MODULUS: u64 = 1 << 32;

	fn next(&mut self) -> f64 {
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % Self::MODULUS;
		self.0 as f64 / Self::MODULUS as f64
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

/// One layout pass over a fixed node/edge set.
#[derive(Clone, Debug)]
pub struct Simulation {
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	config: LayoutConfig,
	alpha: f64,
	alpha_decay: f64,
	steps_done: usize,
	rng: Lcg,
}

impl Simulation {
	pub fn new(graph: &Graph, config: &LayoutConfig) -> Self {
		let index: HashMap<NodeKey, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.key, i))
			.collect();

		// Phyllotaxis seed: deterministic and evenly spread.
		let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
		let bodies: Vec<Body> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let r = config.initial_radius * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden;
				Body {
					x: r * angle.cos(),
					y: r * angle.sin(),
					radius: node.radius + config.collide_padding,
					..Body::default()
				}
			})
			.collect();

		let mut degree = vec![0usize; bodies.len()];
		let mut pairs = Vec::with_capacity(graph.edges.len());
		for edge in &graph.edges {
			let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
				continue;
			};
			degree[s] += 1;
			degree[t] += 1;
			let distance = match edge.kind {
				EdgeKind::Ownership => config.ownership_distance,
				EdgeKind::Relation { .. } => config.relation_distance,
			};
			pairs.push((s, t, distance));
		}
		let springs = pairs
			.into_iter()
			.map(|(source, target, distance)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Spring {
					source,
					target,
					distance,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		let steps = config.steps.max(1) as f64;
		Self {
			bodies,
			springs,
			config: config.clone(),
			alpha: 1.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / steps),
			steps_done: 0,
			rng: Lcg(1),
		}
	}

	pub fn is_finished(&self) -> bool {
		self.steps_done >= self.config.steps
	}

	pub fn steps_done(&self) -> usize {
		self.steps_done
	}

	/// Advance one relaxation step. No-op once the step budget is spent.
	pub fn step(&mut self) {
		if self.is_finished() {
			return;
		}
		self.alpha += -self.alpha * self.alpha_decay;
		self.apply_springs();
		self.apply_charge();
		self.apply_collision();
		self.apply_centering();

		let keep = 1.0 - self.config.velocity_decay;
		for body in &mut self.bodies {
			body.vx *= keep;
			body.vy *= keep;
			body.x += body.vx;
			body.y += body.vy;
		}
		self.steps_done += 1;
	}

	/// Run up to `n` steps. Returns whether the pass is complete.
	pub fn run_batch(&mut self, n: usize) -> bool {
		for _ in 0..n {
			if self.is_finished() {
				break;
			}
			self.step();
		}
		self.is_finished()
	}

	pub fn positions(&self) -> Vec<Point> {
		self.bodies.iter().map(|b| Point::new(b.x, b.y)).collect()
	}

	fn apply_springs(&mut self) {
		let alpha = self.alpha;
		for i in 0..self.springs.len() {
			let spring = &self.springs[i];
			let (s, t) = (&self.bodies[spring.source], &self.bodies[spring.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.rng.jiggle();
			}
			if y == 0.0 {
				y = self.rng.jiggle();
			}
			let len = (x * x + y * y).sqrt();
			let l = (len - spring.distance) / len * alpha * spring.strength;
			let (fx, fy, b) = (x * l, y * l, spring.bias);
			let (source, target) = (spring.source, spring.target);

			self.bodies[target].vx -= fx * b;
			self.bodies[target].vy -= fy * b;
			self.bodies[source].vx += fx * (1.0 - b);
			self.bodies[source].vy += fy * (1.0 - b);
		}
	}

	fn apply_charge(&mut self) {
		let n = self.bodies.len();
		let strength = self.config.charge_strength * self.alpha;
		for i in 0..n {
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.bodies[j].x - self.bodies[i].x;
				let mut y = self.bodies[j].y - self.bodies[i].y;
				if x == 0.0 {
					x = self.rng.jiggle();
				}
				if y == 0.0 {
					y = self.rng.jiggle();
				}
				let mut l = x * x + y * y;
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				let w = strength / l;
				self.bodies[i].vx += x * w;
				self.bodies[i].vy += y * w;
			}
		}
	}

	fn apply_collision(&mut self) {
		let n = self.bodies.len();
		for i in 0..n {
			let ri = self.bodies[i].radius;
			let xi = self.bodies[i].x + self.bodies[i].vx;
			let yi = self.bodies[i].y + self.bodies[i].vy;
			for j in (i + 1)..n {
				let rj = self.bodies[j].radius;
				let r = ri + rj;
				let mut x = xi - self.bodies[j].x - self.bodies[j].vx;
				let mut y = yi - self.bodies[j].y - self.bodies[j].vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len;
				let (fx, fy) = (x * push, y * push);
				let share = (rj * rj) / (ri * ri + rj * rj);
				self.bodies[i].vx += fx * share;
				self.bodies[i].vy += fy * share;
				self.bodies[j].vx -= fx * (1.0 - share);
				self.bodies[j].vy -= fy * (1.0 - share);
			}
		}
	}

	fn apply_centering(&mut self) {
		if self.bodies.is_empty() {
			return;
		}
		let n = self.bodies.len() as f64;
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let strength = self.config.center_strength;
		let (dx, dy) = (sx / n * strength, sy / n * strength);
		for body in &mut self.bodies {
			body.x -= dx;
			body.y -= dy;
		}
	}
}

/// A graph being laid out. Owns the graph until the pass completes.
#[derive(Clone, Debug)]
pub struct LayoutJob {
	graph: Graph,
	simulation: Simulation,
}

impl LayoutJob {
	pub fn new(graph: Graph, config: &LayoutConfig) -> Self {
		debug!(
			"layout started: {} nodes, {} edges, {} steps",
			graph.nodes.len(),
			graph.edges.len(),
			config.steps
		);
		let simulation = Simulation::new(&graph, config);
		Self { graph, simulation }
	}

	/// Returns whether the pass is complete.
	pub fn run_batch(&mut self, n: usize) -> bool {
		self.simulation.run_batch(n)
	}

	/// Write final positions into the graph and hand it back. Steps not yet
	/// run are run first.
	pub fn finish(mut self) -> Graph {
		while !self.simulation.run_batch(usize::MAX) {}
		for (node, position) in self.graph.nodes.iter_mut().zip(self.simulation.positions()) {
			node.position = position;
		}
		debug!(
			"layout finished after {} steps",
			self.simulation.steps_done()
		);
		self.graph
	}
}

/// Lay out `graph` synchronously.
#[cfg(test)]
pub fn layout(graph: Graph, config: &LayoutConfig) -> Graph {
	LayoutJob::new(graph, config).finish()
}

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::present::{EdgeDraw, NodeDraw, Scene};
use super::state::EdgeEmphasis;
use super::viewport::Viewport;

const BACKGROUND: &str = "#050505";

pub fn render(scene: &Scene, viewport: &Viewport, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	ctx.save();
	let t = viewport.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	for edge in &scene.edges {
		draw_edge(edge, t.k, ctx);
	}
	for node in &scene.nodes {
		draw_node(node, t.k, ctx);
	}
	ctx.restore();
}

fn draw_edge(edge: &EdgeDraw, k: f64, ctx: &CanvasRenderingContext2d) {
	let (dx, dy) = (edge.to.x - edge.from.x, edge.to.y - edge.from.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < edge.from_radius + edge.to_radius {
		return;
	}
	let arrow_size = if edge.marker { 8.0 / k } else { 0.0 };
	let (ux, uy) = (dx / dist, dy / dist);

	ctx.set_global_alpha(edge.opacity);
	ctx.set_stroke_style_str(&edge.stroke);
	ctx.set_line_width(edge.width / k);
	// Edges leaving the highlight set are dashed.
	if edge.emphasis == EdgeEmphasis::Connector {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&(4.0 / k).into(),
			&(4.0 / k).into(),
		));
	}
	ctx.begin_path();
	ctx.move_to(
		edge.from.x + ux * edge.from_radius,
		edge.from.y + uy * edge.from_radius,
	);
	ctx.line_to(
		edge.to.x - ux * (edge.to_radius + arrow_size),
		edge.to.y - uy * (edge.to_radius + arrow_size),
	);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	if edge.marker {
		ctx.set_fill_style_str(&edge.stroke);
		let (tip_x, tip_y) = (edge.to.x - ux * edge.to_radius, edge.to.y - uy * edge.to_radius);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}

	if let Some(label) = &edge.label {
		let (mx, my) = ((edge.from.x + edge.to.x) / 2.0, (edge.from.y + edge.to.y) / 2.0);
		ctx.set_fill_style_str("rgba(220, 220, 235, 0.9)");
		ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
		let _ = ctx.fill_text(label, mx + 4.0 / k, my - 4.0 / k);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_node(node: &NodeDraw, k: f64, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (node.position.x, node.position.y);

	ctx.set_global_alpha(node.opacity);
	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.fill);
	ctx.fill();

	if node.selected {
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.radius + 3.0 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.85)");
		ctx.set_line_width(2.0 / k);
		ctx.stroke();
	}

	if node.label_visible {
		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, x + node.radius + 3.0, y + 3.0);
	}
	ctx.set_global_alpha(1.0);
}

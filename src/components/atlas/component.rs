use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::session::AtlasSession;
use super::types::{GraphRecords, NodeKey, RecordId};
use super::viewport::Viewport;
use crate::config::AtlasConfig;

/// Select-and-centre request from outside the canvas. `seq` changes on every
/// request so reselecting the same node re-centres the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusRequest {
	pub key: NodeKey,
	pub seq: u64,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn surface_size(window: &Window, canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	if fullscreen {
		let w = window.inner_width().ok().and_then(|v| v.as_f64());
		let h = window.inner_height().ok().and_then(|v| v.as_f64());
		return (w.unwrap_or(800.0), h.unwrap_or(600.0));
	}
	let parent = canvas.parent_element();
	(
		parent
			.as_ref()
			.map(|p| p.client_width() as f64)
			.filter(|w| *w > 0.0)
			.unwrap_or(800.0),
		parent
			.as_ref()
			.map(|p| p.client_height() as f64)
			.filter(|h| *h > 0.0)
			.unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas.
fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn publish_selection(session: &AtlasSession, selection: RwSignal<Option<NodeKey>>) {
	let current = session.selected();
	if selection.get_untracked() != current {
		selection.set(current);
	}
}

#[component]
pub fn AtlasCanvas(
	#[prop(into)] records: Signal<GraphRecords>,
	#[prop(into)] hide_thoughts: Signal<bool>,
	/// Restrict the canvas to one thought's neighbourhood.
	#[prop(into)] scope: Signal<Option<RecordId>>,
	/// Written whenever the selected node changes.
	selection: RwSignal<Option<NodeKey>>,
	#[prop(into)] hover_request: Signal<Option<NodeKey>>,
	#[prop(into)] focus_request: Signal<Option<FocusRequest>>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let config = use_context::<AtlasConfig>().unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session = Rc::new(RefCell::new(AtlasSession::new(config, 800.0, 600.0)));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	// New records or a filter toggle start a fresh layout pass.
	let session_data = session.clone();
	Effect::new(move |_| {
		let hide = hide_thoughts.get();
		let scope = scope.get();
		records.with(|r| {
			debug!(
				"rebuilding graph from {} thoughts, {} details, {} relations",
				r.thoughts.len(),
				r.details.len(),
				r.relations.len()
			);
			session_data.borrow_mut().rebuild(r, hide, scope);
		});
	});

	let session_hover = session.clone();
	Effect::new(move |_| {
		let key = hover_request.get();
		session_hover.borrow_mut().hover(key);
	});

	let session_focus = session.clone();
	Effect::new(move |_| {
		let Some(request) = focus_request.get() else {
			return;
		};
		let mut s = session_focus.borrow_mut();
		if !s.select(request.key) {
			debug!("{} is not on the canvas", request.key);
		}
		publish_selection(&s, selection);
	});

	let (session_init, animate_init, resize_init) =
		(session.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			warn!("no browser window; canvas stays blank");
			return;
		};
		let (w, h) = surface_size(&window, &canvas, fullscreen);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		session_init.borrow_mut().viewport = Viewport::new(w, h);

		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());
		let Some(ctx) = ctx else {
			warn!("2d canvas context unavailable");
			return;
		};

		if fullscreen {
			let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
			*resize_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = surface_size(&win, &canvas_resize, true);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				session_resize.borrow_mut().viewport.resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		let mut last_frame: Option<f64> = None;
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			let dt = last_frame.map_or(0.0, |prev| now - prev);
			last_frame = Some(now);
			{
				let mut s = session_anim.borrow_mut();
				if s.frame(dt) {
					publish_selection(&s, selection);
				}
				render::render(&s.scene(), &s.viewport, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		session_md.borrow_mut().pointer_down(x, y);
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		session_mm.borrow_mut().pointer_move(x, y);
	};

	let session_mu = session.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let mut s = session_mu.borrow_mut();
		s.pointer_up(x, y);
		publish_selection(&s, selection);
	};

	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| {
		session_ml.borrow_mut().pointer_leave();
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		session_wh.borrow_mut().wheel(x, y, ev.delta_y());
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="atlas-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

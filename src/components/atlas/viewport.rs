use super::state::FocusCommand;
use super::types::Point;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Screen = graph * k + (x, y).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	fn lerp(self, to: ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed_ms: f64,
	duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct Viewport {
	pub transform: ViewTransform,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	transition: Option<Transition>,
}

impl Viewport {
	/// Origin at the centre of the surface, unit zoom.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			pan: PanState::default(),
			width,
			height,
			transition: None,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Zoom by one wheel notch around the screen point.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64, min_zoom: f64, max_zoom: f64) {
		self.transition = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(min_zoom, max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.transition = None;
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Transform that shows `center` in the middle of the surface at `zoom`.
	pub fn centered_on(&self, center: Point, zoom: f64) -> ViewTransform {
		ViewTransform {
			x: self.width / 2.0 - center.x * zoom,
			y: self.height / 2.0 - center.y * zoom,
			k: zoom,
		}
	}

	/// Jump to the transform that shows the whole `(min, max)` box with
	/// `padding` screen pixels to spare on every side.
	pub fn fit(&mut self, bounds: (Point, Point), padding: f64, min_zoom: f64, max_zoom: f64) {
		let (min, max) = bounds;
		let scale = |room: f64, extent: f64| {
			if extent > 0.0 {
				room.max(1.0) / extent
			} else {
				f64::INFINITY
			}
		};
		let k = scale(self.width - 2.0 * padding, max.x - min.x)
			.min(scale(self.height - 2.0 * padding, max.y - min.y))
			.clamp(min_zoom, max_zoom);
		let center = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
		self.transition = None;
		self.transform = self.centered_on(center, k);
	}

	/// Start animating towards the command's target.
	pub fn apply_focus(&mut self, command: &FocusCommand) {
		let to = self.centered_on(command.center, command.zoom);
		if command.duration_ms <= 0.0 {
			self.transform = to;
			self.transition = None;
			return;
		}
		self.transition = Some(Transition {
			from: self.transform,
			to,
			elapsed_ms: 0.0,
			duration_ms: command.duration_ms,
		});
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Advance the camera transition. Returns whether it is still running.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		let Some(transition) = &mut self.transition else {
			return false;
		};
		transition.elapsed_ms += dt_ms;
		let t = (transition.elapsed_ms / transition.duration_ms).min(1.0);
		if t >= 1.0 {
			self.transform = transition.to;
			self.transition = None;
		} else {
			self.transform = transition.from.lerp(transition.to, ease_out_cubic(t));
		}
		self.is_animating()
	}
}

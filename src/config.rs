//! Runtime configuration for the atlas.
//!
//! Every field has a built-in default. A JSON override can be supplied through
//! the `data-atlas-config` attribute on `<body>`; missing keys keep their
//! defaults.

use serde::Deserialize;

use crate::error::ConfigError;

/// Attribute on `<body>` holding a JSON configuration override.
pub const CONFIG_ATTRIBUTE: &str = "data-atlas-config";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
	pub layout: LayoutConfig,
	pub nodes: NodeConfig,
	pub view: ViewConfig,
	pub index: IndexConfig,
	pub api: ApiConfig,
}

/// Force simulation parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
	/// Fixed number of relaxation steps per layout pass.
	pub steps: usize,
	/// Steps run per animation frame before yielding to the event loop.
	pub batch_size: usize,
	/// Many-body strength; negative values repel.
	pub charge_strength: f64,
	/// Rest length of thought -> detail edges.
	pub ownership_distance: f64,
	/// Rest length of detail -> detail relation edges.
	pub relation_distance: f64,
	pub center_strength: f64,
	/// Added to each node's visual radius for the collision constraint.
	pub collide_padding: f64,
	pub velocity_decay: f64,
	/// Radius of the phyllotaxis seed placement.
	pub initial_radius: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			steps: 300,
			batch_size: 50,
			charge_strength: -250.0,
			ownership_distance: 60.0,
			relation_distance: 120.0,
			center_strength: 1.0,
			collide_padding: 12.0,
			velocity_decay: 0.4,
			initial_radius: 10.0,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
	pub thought_radius: f64,
	pub detail_radius: f64,
	pub thought_color: String,
	pub detail_color: String,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			thought_radius: 16.0,
			detail_radius: 7.0,
			thought_color: "#60a5fa".into(),
			detail_color: "#a78bfa".into(),
		}
	}
}

/// Emphasis and camera parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
	pub focus_zoom: f64,
	pub focus_duration_ms: f64,
	/// Opacity of nodes outside the highlight set.
	pub dim_opacity: f64,
	pub edge_dim_opacity: f64,
	pub edge_connector_opacity: f64,
	/// Edge opacity while nothing is focused.
	pub edge_idle_opacity: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Extra pick distance around a node, in graph units.
	pub hit_slop: f64,
	/// Screen margin kept around the graph when framing it.
	pub fit_padding: f64,
	/// Framing a small graph never zooms in past this.
	pub fit_max_zoom: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			focus_zoom: 1.6,
			focus_duration_ms: 750.0,
			dim_opacity: 0.2,
			edge_dim_opacity: 0.1,
			edge_connector_opacity: 0.35,
			edge_idle_opacity: 0.4,
			min_zoom: 0.1,
			max_zoom: 10.0,
			hit_slop: 4.0,
			fit_padding: 40.0,
			fit_max_zoom: 1.0,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
	/// Maximum number of thought groups listed in the index panel.
	pub limit: usize,
}

impl Default for IndexConfig {
	fn default() -> Self {
		Self { limit: 20 }
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
	pub graph_url: String,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			graph_url: "/api/graph-all".into(),
		}
	}
}

impl AtlasConfig {
	/// Parse a JSON override; absent keys fall back to defaults.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.layout.batch_size == 0 {
			return Err(ConfigError::Invalid {
				field: "layout.batch_size",
				reason: "must be at least 1",
			});
		}
		if !(self.view.min_zoom > 0.0 && self.view.min_zoom <= self.view.max_zoom) {
			return Err(ConfigError::Invalid {
				field: "view.min_zoom",
				reason: "must be positive and not above view.max_zoom",
			});
		}
		if !(0.0..=1.0).contains(&self.layout.velocity_decay) {
			return Err(ConfigError::Invalid {
				field: "layout.velocity_decay",
				reason: "must lie in 0..=1",
			});
		}
		Ok(())
	}

	/// Read the override from the document, falling back to defaults.
	pub fn from_document() -> Self {
		let raw = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.body())
			.and_then(|b| b.get_attribute(CONFIG_ATTRIBUTE));
		let Some(raw) = raw else {
			return Self::default();
		};
		match Self::from_json(&raw) {
			Ok(config) => config,
			Err(err) => {
				log::warn!("ignoring {CONFIG_ATTRIBUTE}: {err}");
				Self::default()
			}
		}
	}
}

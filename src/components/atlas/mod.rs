//! Knowledge graph canvas: model building, force layout, highlight state and
//! presentation.

mod builder;
mod component;
mod epoch;
mod layout;
mod present;
mod render;
mod search;
mod session;
mod state;
mod types;
mod viewport;

pub use builder::{BuildOptions, BuildOutput, build_graph, thought_subgraph};
pub use component::{AtlasCanvas, FocusRequest};
pub use epoch::ReloadGate;
pub use present::SelectionSummary;
pub use search::{IndexEntry, search};
pub use types::{Graph, GraphRecords, NodeKey, RecordId};

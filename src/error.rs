//! Error types. None of them reach the user directly: shape errors are
//! collected as diagnostics, fetch errors become a status line.

use thiserror::Error;

use crate::components::atlas::RecordId;

/// A record dropped while projecting collaborator data into the graph.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataShapeError {
	#[error("{entity} record is missing required field `{field}`")]
	MissingField {
		entity: &'static str,
		field: &'static str,
	},

	#[error("duplicate {entity} id {id}")]
	DuplicateId { entity: &'static str, id: RecordId },

	#[error("detail {detail_id} references unknown thought {thought_id}")]
	UnknownThought {
		detail_id: RecordId,
		thought_id: RecordId,
	},

	#[error("relation {relation_id} references unknown detail {detail_id}")]
	UnknownDetail {
		relation_id: RecordId,
		detail_id: RecordId,
	},

	#[error("relation {relation_id} relates detail {detail_id} to itself")]
	SelfRelation {
		relation_id: RecordId,
		detail_id: RecordId,
	},

	/// The relation is kept, only its confidence is discarded.
	#[error("relation {relation_id} has confidence {value} outside 0..=1")]
	ConfidenceOutOfRange { relation_id: RecordId, value: f64 },
}

/// Failure talking to the storage collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("browser window is unavailable")]
	NoWindow,

	#[error("request failed: {0}")]
	Network(String),

	#[error("server responded with status {0}")]
	Status(u16),

	#[error("response body is not valid graph data: {0}")]
	Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("configuration is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid value for {field}: {reason}")]
	Invalid {
		field: &'static str,
		reason: &'static str,
	},
}

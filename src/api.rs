//! Client for the storage service that owns thoughts, details and relations.

use log::{debug, info};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::components::atlas::GraphRecords;
use crate::error::FetchError;

fn js_error(value: JsValue) -> FetchError {
	FetchError::Network(
		value
			.as_string()
			.unwrap_or_else(|| format!("{value:?}")),
	)
}

/// Fetch the complete record set in one request.
pub async fn fetch_graph_data(url: &str) -> Result<GraphRecords, FetchError> {
	let window = web_sys::window().ok_or(FetchError::NoWindow)?;
	debug!("GET {url}");
	let response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(js_error)?;
	let response: Response = response.dyn_into().map_err(js_error)?;
	if !response.ok() {
		return Err(FetchError::Status(response.status()));
	}
	let body = JsFuture::from(response.text().map_err(js_error)?)
		.await
		.map_err(js_error)?;
	let body = body.as_string().unwrap_or_default();
	let records = GraphRecords::from_json(&body)?;
	info!(
		"received {} thoughts, {} details, {} relations, {} relation types",
		records.thoughts.len(),
		records.details.len(),
		records.relations.len(),
		records.relation_types.len()
	);
	Ok(records)
}

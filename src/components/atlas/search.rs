//! Index panel filtering. Search never touches hover or selection.

use super::types::{Graph, NodeKey};

#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
	pub key: NodeKey,
	pub label: String,
}

/// A thought and the details listed under it.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexGroup {
	pub thought: IndexEntry,
	pub details: Vec<IndexEntry>,
}

/// List thought groups matching `term`, case-insensitively.
///
/// A thought whose title matches is listed with all its details; otherwise it
/// is listed with just the details that match, or omitted when none do. An
/// empty term lists everything. At most `limit` groups are returned.
///
/// `graph` must include thought nodes and ownership edges.
pub fn search(graph: &Graph, term: &str, limit: usize) -> Vec<IndexGroup> {
	let needle = term.trim().to_lowercase();
	let matches = |label: &str| needle.is_empty() || label.to_lowercase().contains(&needle);

	graph
		.nodes
		.iter()
		.filter(|n| n.key.is_thought())
		.filter_map(|thought| {
			let children = graph
				.edges
				.iter()
				.filter(|e| e.source == thought.key && !e.is_relation())
				.filter_map(|e| graph.node(e.target));
			let title_matched = matches(&thought.label);
			let details: Vec<IndexEntry> = children
				.filter(|d| title_matched || matches(&d.label))
				.map(|d| IndexEntry {
					key: d.key,
					label: d.label.clone(),
				})
				.collect();
			(title_matched || !details.is_empty()).then(|| IndexGroup {
				thought: IndexEntry {
					key: thought.key,
					label: thought.label.clone(),
				},
				details,
			})
		})
		.take(limit)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::atlas::builder::{BuildOptions, build_graph};
	use crate::components::atlas::types::{GraphRecords, fixtures};
	use crate::config::NodeConfig;
	use pretty_assertions::assert_eq;

	fn catalog(records: &GraphRecords) -> Graph {
		build_graph(records, BuildOptions::default(), &NodeConfig::default()).graph
	}

	fn alpha_beta() -> GraphRecords {
		GraphRecords {
			thoughts: vec![fixtures::thought(1, "First"), fixtures::thought(2, "Second")],
			details: vec![
				fixtures::detail(1, 1, "alpha fact"),
				fixtures::detail(2, 2, "beta fact"),
			],
			..GraphRecords::default()
		}
	}

	#[test]
	fn detail_match_lists_only_its_thought() {
		let groups = search(&catalog(&alpha_beta()), "alpha", 20);
		assert_eq!(
			groups,
			vec![IndexGroup {
				thought: IndexEntry {
					key: NodeKey::Thought(1),
					label: "First".into()
				},
				details: vec![IndexEntry {
					key: NodeKey::Detail(1),
					label: "alpha fact".into()
				}],
			}]
		);
	}

	#[test]
	fn matching_is_case_insensitive() {
		let groups = search(&catalog(&alpha_beta()), "  BETA ", 20);
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].thought.key, NodeKey::Thought(2));
	}

	#[test]
	fn title_match_lists_all_details() {
		let mut records = alpha_beta();
		records.details.push(fixtures::detail(3, 2, "gamma"));
		let groups = search(&catalog(&records), "second", 20);
		assert_eq!(groups.len(), 1);
		let keys: Vec<_> = groups[0].details.iter().map(|d| d.key).collect();
		assert_eq!(keys, vec![NodeKey::Detail(2), NodeKey::Detail(3)]);
	}

	#[test]
	fn empty_term_lists_everything_up_to_limit() {
		let graph = catalog(&fixtures::two_clusters());
		assert_eq!(search(&graph, "", 20).len(), 2);
		assert_eq!(search(&graph, "", 1).len(), 1);
		assert!(search(&graph, "nothing like this", 20).is_empty());
	}
}

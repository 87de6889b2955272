use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use log::{info, warn};

use crate::api::fetch_graph_data;
use crate::components::atlas::{
	AtlasCanvas, BuildOptions, BuildOutput, FocusRequest, GraphRecords, IndexEntry, NodeKey,
	RecordId, ReloadGate, SelectionSummary, build_graph, search, thought_subgraph,
};
use crate::config::AtlasConfig;
use crate::pages::not_found::NotFound;

/// Whole-graph atlas.
#[component]
pub fn Atlas() -> impl IntoView {
	view! { <AtlasView scope=Signal::stored(None) /> }
}

/// Atlas narrowed to one thought, e.g. `/thought/12`. Anything but a
/// positive id is a 404.
#[component]
pub fn ThoughtAtlas() -> impl IntoView {
	let params = use_params_map();
	let id = Memo::new(move |_| params.with(|p| thought_id(p.get("id").as_deref())));
	move || match id.get() {
		Some(id) => view! { <AtlasView scope=Signal::stored(Some(id)) /> }.into_any(),
		None => view! { <NotFound /> }.into_any(),
	}
}

fn thought_id(raw: Option<&str>) -> Option<RecordId> {
	raw?.parse::<RecordId>().ok().filter(|id| *id > 0)
}

fn confidence_text(confidence: Option<f64>) -> String {
	confidence
		.map(|c| format!(" ({:.0}%)", c * 100.0))
		.unwrap_or_default()
}

#[component]
fn AtlasView(scope: Signal<Option<RecordId>>) -> impl IntoView {
	let config = use_context::<AtlasConfig>().unwrap_or_default();
	let records = RwSignal::new(GraphRecords::default());
	let hide_thoughts = RwSignal::new(false);
	let term = RwSignal::new(String::new());
	let selection = RwSignal::new(None::<NodeKey>);
	let hover_request = RwSignal::new(None::<NodeKey>);
	let focus_request = RwSignal::new(None::<FocusRequest>);
	let status = RwSignal::new(None::<String>);
	let loading = RwSignal::new(false);

	// At most one fetch in flight; refreshes meanwhile fold into one more.
	let gate = Rc::new(RefCell::new(ReloadGate::default()));
	let url = config.api.graph_url.clone();
	let reload = move || {
		if !gate.borrow_mut().request() {
			return;
		}
		let (gate, url) = (gate.clone(), url.clone());
		loading.set(true);
		spawn_local(async move {
			loop {
				match fetch_graph_data(&url).await {
					Ok(data) => {
						records.set(data);
						status.set(None);
					}
					Err(err) => {
						warn!("graph reload failed: {err}");
						status.set(Some(err.to_string()));
					}
				}
				if !gate.borrow_mut().complete() {
					break;
				}
				info!("running coalesced reload");
			}
			loading.set(false);
		});
	};
	reload();

	// Unfiltered model backing the index and the selection panel.
	let style = config.nodes.clone();
	let catalog = Memo::new(move |_| -> BuildOutput {
		let scope = scope.get();
		records.with(|r| match scope {
			Some(id) => thought_subgraph(r, id, &style),
			None => build_graph(r, BuildOptions::default(), &style),
		})
	});
	let skipped = move || catalog.with(|c| c.dropped.len());
	let limit = config.index.limit;
	let groups = Memo::new(move |_| catalog.with(|c| term.with(|t| search(&c.graph, t, limit))));

	let focus = move |key: NodeKey| {
		let seq = focus_request.get_untracked().map_or(0, |r| r.seq + 1);
		focus_request.set(Some(FocusRequest { key, seq }));
	};

	let entry_view = move |entry: IndexEntry, class: &'static str| {
		let key = entry.key;
		view! {
			<li
				class=class
				class:active=move || selection.get() == Some(key)
				on:mouseenter=move |_| hover_request.set(Some(key))
				on:mouseleave=move |_| hover_request.set(None)
				on:click=move |_| focus(key)
			>
				{entry.label}
			</li>
		}
	};

	let summary = move || {
		let key = selection.get()?;
		catalog.with(|c| SelectionSummary::describe(&c.graph, key))
	};

	view! {
		<div class="atlas">
			<aside class="atlas-sidebar">
				<div class="atlas-controls">
					<input
						type="search"
						placeholder="Search thoughts and details"
						prop:value=move || term.get()
						on:input=move |ev| term.set(event_target_value(&ev))
					/>
					<label>
						<input
							type="checkbox"
							prop:checked=move || hide_thoughts.get()
							on:change=move |ev| hide_thoughts.set(event_target_checked(&ev))
						/>
						" Hide thoughts"
					</label>
					<button on:click=move |_| reload() disabled=move || loading.get()>
						"Refresh"
					</button>
				</div>

				{move || status.get().map(|msg| view! { <p class="atlas-status">{msg}</p> })}
				{move || {
					(!loading.get() && records.with(GraphRecords::is_empty))
						.then(|| view! { <p class="atlas-empty">"No thoughts recorded yet."</p> })
				}}
				{move || {
					let n = skipped();
					(n > 0)
						.then(|| {
							view! {
								<p class="atlas-skipped">
									{format!("{n} malformed records skipped (details in the console)")}
								</p>
							}
						})
				}}

				<ul class="atlas-index">
					{move || {
						groups
							.get()
							.into_iter()
							.map(|group| {
								view! {
									<li class="atlas-group">
										<ul>
											{entry_view(group.thought, "atlas-thought")}
											{group
												.details
												.into_iter()
												.map(|d| entry_view(d, "atlas-detail"))
												.collect_view()}
										</ul>
									</li>
								}
							})
							.collect_view()
					}}
				</ul>

				{move || {
					summary()
						.map(|s| {
							view! {
								<section class="atlas-selection">
									<h2>{s.label}</h2>
									<p class="atlas-kind">{s.kind}</p>
									{s.info.map(|info| view! { <p>{info}</p> })}
									<ul>
										{s
											.relations
											.into_iter()
											.map(|r| {
												let arrow = if r.outgoing { "→" } else { "←" };
												let other = r.other;
												view! {
													<li on:click=move |_| focus(other)>
														{format!(
															"{arrow} {} : {}{}",
															r.other_label,
															r.type_name,
															confidence_text(r.confidence),
														)}
														{r.note.map(|n| view! { <small>{n}</small> })}
													</li>
												}
											})
											.collect_view()}
									</ul>
								</section>
							}
						})
				}}
			</aside>

			<div class="atlas-stage">
				<AtlasCanvas
					records=records
					hide_thoughts=hide_thoughts
					scope=scope
					selection=selection
					hover_request=hover_request
					focus_request=focus_request
				/>
			</div>
		</div>
	}
}

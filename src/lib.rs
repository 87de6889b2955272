//! Knowledge atlas: a force-directed map of thoughts, their details and the
//! typed relations between details.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod api;
mod components;
mod config;
mod error;
mod pages;

// Top-Level pages
use crate::config::AtlasConfig;
use crate::pages::atlas::{Atlas, ThoughtAtlas};
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Routes for the whole atlas and per-thought views; anything else is a 404.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	provide_context(AtlasConfig::from_document());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Thought Atlas" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Atlas />
				<Route path=path!("/visual") view=Atlas />
				<Route path=path!("/thought/:id") view=ThoughtAtlas />
			</Routes>
		</Router>
	}
}

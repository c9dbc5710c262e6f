pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod http;
pub mod routes;
pub mod timeout;
pub mod types;

use std::sync::Arc;

use axum::extract::FromRef;

pub use config::Config;
pub use engine::LockStore;

/// Shared application state. Handlers extract `State<AppState>` directly;
/// the `FromRef` impls below let a handler instead ask for just the piece
/// it needs, mirroring the reference stack's sub-state extraction.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<LockStore>,
	pub config: Arc<Config>,
}

impl AppState {
	pub fn new(store: Arc<LockStore>, config: Arc<Config>) -> Self {
		Self { store, config }
	}
}

impl FromRef<AppState> for Arc<LockStore> {
	fn from_ref(state: &AppState) -> Self {
		state.store.clone()
	}
}

impl FromRef<AppState> for Arc<Config> {
	fn from_ref(state: &AppState) -> Self {
		state.config.clone()
	}
}

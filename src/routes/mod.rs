use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// Assembles the full HTTP surface over `AppState`.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(handlers::health))
		.route("/lock", post(handlers::lock))
		.route("/unlock", post(handlers::unlock))
		.route("/unlock-all", post(handlers::unlock_all))
		.route("/status", get(handlers::status))
		.route("/locks", get(handlers::list_locks))
		.route("/queues", get(handlers::list_queues))
		.route("/queue/*path", get(handlers::queue_lookup))
		.with_state(state)
}

use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;

use crate::clock::to_rfc3339;
use crate::types::{LockView, LocksResponse, QueueLookupResponse, QueueView, QueuesResponse, StatusResponse};
use crate::AppState;

fn view(info: crate::engine::LockInfo) -> LockView {
	LockView { session: info.session, file: info.file, acquired_at: to_rfc3339(info.acquired_at) }
}

#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
	let locks = state.store.get_all_locks().await.into_iter().map(view).collect();
	Json(StatusResponse { locks })
}

#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn list_locks(State(state): State<AppState>) -> Json<LocksResponse> {
	let locks: Vec<LockView> = state.store.get_all_locks().await.into_iter().map(view).collect();
	Json(LocksResponse { count: locks.len(), locks })
}

#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn list_queues(State(state): State<AppState>) -> Json<QueuesResponse> {
	let queues: Vec<QueueView> = state
		.store
		.get_all_queues()
		.await
		.into_iter()
		.map(|q| QueueView {
			file: q.file,
			holder: q.holder,
			acquired_at: q.acquired_at.map(to_rfc3339),
			queue_length: q.queue_length,
			waiters: q.waiters,
		})
		.collect();
	Json(QueuesResponse { count: queues.len(), queues })
}

/// `GET /queue/{path...}` — the captured path has its leading `/` stripped
/// by axum's wildcard matcher, so it is re-prepended before lookup.
#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn queue_lookup(State(state): State<AppState>, Path(path): Path<String>) -> Json<QueueLookupResponse> {
	let file = format!("/{path}");
	match state.store.get_queue_info(&file).await {
		Some(info) => Json(QueueLookupResponse::Found {
			file: info.file,
			holder: info.holder,
			queue_length: info.queue_length,
			waiters: info.waiters,
		}),
		None => Json(QueueLookupResponse::Missing { exists: false, file }),
	}
}

use axum::extract::State;
use axum::Json;
use tokio::time::Instant as TokioInstant;
use tracing::instrument;

use crate::http::{AppJson, AppQuery};
use crate::timeout::parse_timeout;
use crate::types::{LockQuery, LockRequest, LockResponse};
use crate::AppState;

/// `POST /lock` — the long-poll acquisition algorithm:
///
/// 1. Enqueue (or recognize an already-queued session) and check immediate
///    acquisition.
/// 2. If not acquired and the caller asked not to wait, return the queued
///    state as-is.
/// 3. Otherwise block on the notification edge, racing a timeout deadline
///    derived from the `timeout` query parameter.
#[axum::debug_handler]
#[instrument(skip(state, body), fields(file = %body.file, session = %body.session))]
pub async fn lock(
	State(state): State<AppState>,
	AppQuery(query): AppQuery<LockQuery>,
	AppJson(body): AppJson<LockRequest>,
) -> Json<LockResponse> {
	let wait = query.wait.unwrap_or(true);
	let timeout = parse_timeout(query.timeout.as_deref());

	let admission = state.store.enqueue_or_acquire(&body.file, &body.session).await;

	if admission.acquired {
		return Json(LockResponse {
			granted: true,
			holder: None,
			error: None,
			waited: Some(0.0),
			position: Some(admission.position),
			queue_length: Some(admission.queue_length),
		});
	}

	if !wait {
		let holder = state.store.get_holder(&body.file).await;
		return Json(LockResponse {
			granted: false,
			holder,
			error: Some(format!("Queued at position {}", admission.position)),
			waited: None,
			position: Some(admission.position),
			queue_length: Some(admission.queue_length),
		});
	}

	let started = TokioInstant::now();
	let deadline = started + timeout;
	let acquired = state.store.wait_for_turn(&body.file, &body.session, deadline).await;
	let waited = started.elapsed().as_secs_f64();

	if acquired {
		let queue_length = state.store.get_queue_info(&body.file).await.map_or(1, |info| info.queue_length);
		Json(LockResponse {
			granted: true,
			holder: None,
			error: None,
			waited: Some(waited),
			position: Some(1),
			queue_length: Some(queue_length),
		})
	} else {
		let position = state.store.position(&body.file, &body.session).await;
		let holder = state.store.get_holder(&body.file).await;
		let queue_length = state.store.get_queue_info(&body.file).await.map_or(position, |info| info.queue_length);
		Json(LockResponse {
			granted: false,
			holder,
			error: Some(format!("Timeout waiting in queue at position {position}")),
			waited: Some(waited),
			position: Some(position),
			queue_length: Some(queue_length),
		})
	}
}

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::http::AppJson;
use crate::types::{UnlockAllRequest, UnlockAllResponse, UnlockRequest, UnlockResponse};
use crate::AppState;

#[axum::debug_handler]
#[instrument(skip(state, body), fields(file = %body.file, session = %body.session))]
pub async fn unlock(State(state): State<AppState>, AppJson(body): AppJson<UnlockRequest>) -> Json<UnlockResponse> {
	let ok = state.store.try_release(&body.file, &body.session).await;
	Json(UnlockResponse { ok })
}

#[axum::debug_handler]
#[instrument(skip(state, body), fields(session = %body.session))]
pub async fn unlock_all(State(state): State<AppState>, AppJson(body): AppJson<UnlockAllRequest>) -> Json<UnlockAllResponse> {
	let count = state.store.release_all(&body.session).await;
	Json(UnlockAllResponse { count })
}

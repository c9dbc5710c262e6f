use axum::Json;
use tracing::instrument;

use crate::types::HealthResponse;

#[axum::debug_handler]
#[instrument(name = "health")]
pub async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { ok: true })
}

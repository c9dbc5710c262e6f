use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures that originate in the HTTP layer itself, not in lock semantics.
///
/// Every outcome of the lock protocol (contention, timeout, release of a
/// non-holder) is carried as data in an `Ok` response body — this enum only
/// covers malformed requests.
#[derive(thiserror::Error, Debug)]
pub enum LockdError {
	#[error("invalid request body: {0}")]
	InvalidBody(#[from] JsonRejection),

	#[error("invalid query string: {0}")]
	InvalidQuery(#[from] QueryRejection),
}

impl LockdError {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::InvalidBody(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
		}
	}
}

impl IntoResponse for LockdError {
	fn into_response(self) -> Response {
		(self.status_code(), self.to_string()).into_response()
	}
}

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::LockdError;

/// A `Json<T>` extractor that reports malformed bodies as [`LockdError`]
/// instead of axum's generic rejection, so the whole service shares one
/// error type end to end (mirrors the reference stack's `FileHostError`
/// wrapping `serde_json::Error` and friends).
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
	T: DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = LockdError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state).await?;
		Ok(AppJson(value))
	}
}

/// A `Query<T>` extractor that reports malformed query strings as
/// [`LockdError`].
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
	T: DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = LockdError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let axum::extract::Query(value) = axum::extract::Query::<T>::from_request_parts(parts, state).await?;
		Ok(AppQuery(value))
	}
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LockRequest {
	pub session: String,
	pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct LockQuery {
	pub wait: Option<bool>,
	pub timeout: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
	pub granted: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub holder: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub waited: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub queue_length: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
	pub session: String,
	pub file: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
	pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct UnlockAllRequest {
	pub session: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockAllResponse {
	pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
	pub session: String,
	pub file: String,
	pub acquired_at: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
	pub locks: Vec<LockView>,
}

#[derive(Debug, Serialize)]
pub struct LocksResponse {
	pub count: usize,
	pub locks: Vec<LockView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
	pub file: String,
	pub holder: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub acquired_at: Option<String>,
	pub queue_length: usize,
	pub waiters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuesResponse {
	pub count: usize,
	pub queues: Vec<QueueView>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueueLookupResponse {
	Found {
		file: String,
		holder: Option<String>,
		#[serde(rename = "queueLength")]
		queue_length: usize,
		waiters: Vec<String>,
	},
	Missing {
		exists: bool,
		file: String,
	},
}

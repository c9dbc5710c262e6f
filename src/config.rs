use clap::Parser;
use serde::{Deserialize, Serialize};

/// Startup configuration. Every field is a CLI flag with an environment
/// variable fallback, matching the reference stack's flat `Config` struct.
#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Localhost FIFO file-lock coordinator", long_about = None)]
pub struct Config {
	/// Address to bind the HTTP listener to. Loopback by convention.
	#[arg(long, env = "LOCKD_LISTEN", default_value = "127.0.0.1:9876")]
	pub listen: String,

	/// How long a holder may keep a lock before it becomes eligible for
	/// eviction by an acquirer or the sweeper.
	#[arg(long, env = "LOCKD_TTL_SECS", default_value = "300")]
	pub ttl_secs: u64,

	/// How often the background sweeper scans for expired holders. Defaults
	/// to `ttl_secs` when unset.
	#[arg(long, env = "LOCKD_SWEEP_PERIOD_SECS")]
	pub sweep_period_secs: Option<u64>,

	/// Emit logs as flattened JSON instead of the human-readable format.
	#[arg(long, env = "LOCKD_LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// `tracing_subscriber::EnvFilter` directive string. Defaults to `info`.
	#[arg(long, env = "RUST_LOG")]
	pub rust_log: Option<String>,
}

impl Config {
	pub fn new() -> Self {
		Self::parse()
	}

	pub fn ttl(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.ttl_secs)
	}

	pub fn sweep_period(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.sweep_period_secs.unwrap_or(self.ttl_secs))
	}
}

impl Default for Config {
	fn default() -> Self {
		Self { listen: "127.0.0.1:9876".to_string(), ttl_secs: 300, sweep_period_secs: None, log_json: false, rust_log: None }
	}
}

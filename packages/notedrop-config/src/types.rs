use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub delivery: Delivery,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Delivery {
	/// Seconds between due-note scans.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// Due notes picked up per scan.
	#[serde(default = "default_batch_size")]
	pub batch_size: i64,
	/// Delivery attempts per job before dead-lettering.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: i32,
	/// Dash-separated retry delays in seconds, last entry repeating.
	#[serde(default = "default_backoff_schedule")]
	pub backoff_schedule: String,
	/// Concurrent delivery workers.
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
	/// Upper bound on one outbound webhook call.
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	/// Milliseconds an idle worker waits before re-checking the queue.
	#[serde(default = "default_claim_interval_ms")]
	pub claim_interval_ms: u64,
	/// Seconds a claimed job stays invisible to other workers.
	#[serde(default = "default_lease_secs")]
	pub lease_secs: i64,
}
impl Default for Delivery {
	fn default() -> Self {
		Self {
			poll_interval_secs: default_poll_interval_secs(),
			batch_size: default_batch_size(),
			max_attempts: default_max_attempts(),
			backoff_schedule: default_backoff_schedule(),
			concurrency: default_concurrency(),
			request_timeout_ms: default_request_timeout_ms(),
			claim_interval_ms: default_claim_interval_ms(),
			lease_secs: default_lease_secs(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	/// Bearer token required on /notes routes; unset disables auth.
	pub api_auth_token: Option<String>,
	#[serde(default = "default_rate_limit_window_secs")]
	pub rate_limit_window_secs: u64,
	#[serde(default = "default_rate_limit_max")]
	pub rate_limit_max: u32,
}
impl Default for Security {
	fn default() -> Self {
		Self {
			api_auth_token: None,
			rate_limit_window_secs: default_rate_limit_window_secs(),
			rate_limit_max: default_rate_limit_max(),
		}
	}
}

fn default_poll_interval_secs() -> u64 {
	5
}

fn default_batch_size() -> i64 {
	100
}

fn default_max_attempts() -> i32 {
	3
}

fn default_backoff_schedule() -> String {
	"1-5-25".to_string()
}

fn default_concurrency() -> usize {
	5
}

fn default_request_timeout_ms() -> u64 {
	10_000
}

fn default_claim_interval_ms() -> u64 {
	500
}

fn default_lease_secs() -> i64 {
	30
}

fn default_rate_limit_window_secs() -> u64 {
	60
}

fn default_rate_limit_max() -> u32 {
	60
}

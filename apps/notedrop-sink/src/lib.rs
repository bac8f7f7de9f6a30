//! Example webhook receiver implementing the idempotent-receipt contract: the
//! first delivery under a key is accepted, duplicates are acknowledged with
//! `duplicate: true` and no repeated side effect.

use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::post,
};
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
	version = notedrop_cli::VERSION,
	rename_all = "kebab",
	styles = notedrop_cli::styles(),
)]
pub struct Args {
	#[arg(long, default_value = "127.0.0.1:4000")]
	pub bind: String,
	/// Respond 500 to every delivery; exercises the retry and dead-letter path.
	#[arg(long)]
	pub fail: bool,
	/// Seconds a seen idempotency key is remembered.
	#[arg(long, default_value_t = 86_400)]
	pub dedup_ttl_secs: u64,
}

#[derive(Clone)]
pub struct SinkState {
	seen: Arc<Mutex<HashMap<String, Instant>>>,
	ttl: Duration,
	fail: bool,
}
impl SinkState {
	pub fn new(ttl: Duration, fail: bool) -> Self {
		Self { seen: Arc::new(Mutex::new(HashMap::new())), ttl, fail }
	}

	/// Test-and-set: true on first sight of the key within the TTL.
	fn record(&self, key: &str, now: Instant) -> bool {
		let mut seen = self.seen.lock().unwrap_or_else(|err| err.into_inner());

		seen.retain(|_, at| now.duration_since(*at) < self.ttl);

		if seen.contains_key(key) {
			return false;
		}

		seen.insert(key.to_string(), now);

		true
	}
}

pub fn router(state: SinkState) -> Router {
	Router::new().route("/sink", post(sink)).with_state(state)
}

async fn sink(
	State(state): State<SinkState>,
	headers: HeaderMap,
	Json(payload): Json<serde_json::Value>,
) -> Response {
	let note_id = headers.get("X-Note-Id").and_then(|value| value.to_str().ok()).unwrap_or("");
	let Some(key) = headers.get("X-Idempotency-Key").and_then(|value| value.to_str().ok()) else {
		return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing idempotency key" })))
			.into_response();
	};

	if state.fail {
		tracing::warn!(note_id = %note_id, "Forced failure response.");

		return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "forced failure" })))
			.into_response();
	}

	if state.record(key, Instant::now()) {
		tracing::info!(note_id = %note_id, payload = %payload, "Accepted delivery.");

		Json(json!({ "ok": true })).into_response()
	} else {
		tracing::info!(note_id = %note_id, "Duplicate delivery ignored.");

		Json(json!({ "ok": true, "duplicate": true })).into_response()
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let addr: SocketAddr = args.bind.parse()?;
	let state = SinkState::new(Duration::from_secs(args.dedup_ttl_secs), args.fail);
	let app = router(state);

	let listener = TcpListener::bind(addr).await?;
	tracing::info!(%addr, "Sink listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_sight_of_a_key_records_it() {
		let state = SinkState::new(Duration::from_secs(60), false);
		let now = Instant::now();

		assert!(state.record("key-a", now));
		assert!(!state.record("key-a", now));
		assert!(state.record("key-b", now));
	}

	#[test]
	fn keys_expire_after_the_ttl() {
		let state = SinkState::new(Duration::from_secs(60), false);
		let start = Instant::now();

		assert!(state.record("key-a", start));
		assert!(state.record("key-a", start + Duration::from_secs(61)));
	}
}

use std::{
	collections::{HashMap, VecDeque},
	net::{IpAddr, Ipv4Addr, SocketAddr},
	sync::Mutex,
	time::{Duration, Instant},
};

use axum::{
	body::Body,
	extract::{ConnectInfo, State},
	http::{Request, StatusCode},
	middleware::Next,
	response::IntoResponse,
};

use crate::{routes::json_error, state::AppState};

/// Sliding-window limiter keyed by client address: a request is admitted when
/// fewer than `max` requests from the same client fall inside the trailing
/// window.
pub struct RateLimiter {
	window: Duration,
	max: usize,
	hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}
impl RateLimiter {
	pub fn new(window: Duration, max: usize) -> Self {
		Self { window, max, hits: Mutex::new(HashMap::new()) }
	}

	pub fn check(&self, key: IpAddr, now: Instant) -> bool {
		let mut hits = self.hits.lock().unwrap_or_else(|err| err.into_inner());
		let window = hits.entry(key).or_default();

		while let Some(&oldest) = window.front() {
			if now.duration_since(oldest) >= self.window {
				window.pop_front();
			} else {
				break;
			}
		}

		if window.len() >= self.max {
			return false;
		}

		window.push_back(now);

		true
	}
}

pub async fn rate_limit_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	let key = req
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|info| info.0.ip())
		.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

	if !state.limiter.check(key, Instant::now()) {
		return json_error(
			StatusCode::TOO_MANY_REQUESTS,
			"rate_limit_exceeded",
			"Rate limit exceeded.",
			None,
		)
		.into_response();
	}

	next.run(req).await
}

#[cfg(test)]
mod tests {
	use super::*;

	const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

	#[test]
	fn admits_up_to_max_within_the_window() {
		let limiter = RateLimiter::new(Duration::from_secs(60), 2);
		let now = Instant::now();

		assert!(limiter.check(CLIENT, now));
		assert!(limiter.check(CLIENT, now));
		assert!(!limiter.check(CLIENT, now));
	}

	#[test]
	fn window_slides_as_old_hits_expire() {
		let limiter = RateLimiter::new(Duration::from_secs(60), 2);
		let start = Instant::now();

		assert!(limiter.check(CLIENT, start));
		assert!(limiter.check(CLIENT, start + Duration::from_secs(30)));
		assert!(!limiter.check(CLIENT, start + Duration::from_secs(45)));
		// The first hit has aged out; one slot is free again.
		assert!(limiter.check(CLIENT, start + Duration::from_secs(61)));
	}

	#[test]
	fn clients_are_limited_independently() {
		let limiter = RateLimiter::new(Duration::from_secs(60), 1);
		let other: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
		let now = Instant::now();

		assert!(limiter.check(CLIENT, now));
		assert!(!limiter.check(CLIENT, now));
		assert!(limiter.check(other, now));
	}
}

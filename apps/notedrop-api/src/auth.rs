use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Request, StatusCode},
	middleware::Next,
	response::IntoResponse,
};

use crate::{
	routes::json_error,
	state::{AppState, AuthState},
};

const HEADER_AUTHORIZATION: &str = "Authorization";

pub async fn auth_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &state.auth) {
		return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Missing or invalid bearer token.", None)
			.into_response();
	}

	next.run(req).await
}

fn is_authorized(headers: &HeaderMap, auth: &AuthState) -> bool {
	match auth {
		AuthState::Off => true,
		AuthState::Bearer { token } =>
			read_bearer_token(headers).is_some_and(|candidate| candidate == token),
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderMap;

	use super::*;

	#[test]
	fn bearer_header_authorizes_matching_token() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_AUTHORIZATION, "Bearer token-a".parse().expect("Invalid header."));

		assert!(is_authorized(&headers, &AuthState::Bearer { token: "token-a".to_string() }));
		assert!(!is_authorized(&headers, &AuthState::Bearer { token: "token-b".to_string() }));
	}

	#[test]
	fn non_bearer_schemes_are_rejected() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_AUTHORIZATION, "Basic dXNlcg==".parse().expect("Invalid header."));

		assert!(!is_authorized(&headers, &AuthState::Bearer { token: "dXNlcg==".to_string() }));
	}

	#[test]
	fn missing_header_passes_only_when_auth_is_off() {
		let headers = HeaderMap::new();

		assert!(is_authorized(&headers, &AuthState::Off));
		assert!(!is_authorized(&headers, &AuthState::Bearer { token: "token-a".to_string() }));
	}
}

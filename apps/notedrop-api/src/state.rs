use std::sync::Arc;

use notedrop_service::NoteService;
use notedrop_storage::db::Db;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub enum AuthState {
	Off,
	Bearer { token: String },
}

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NoteService>,
	pub auth: AuthState,
	pub limiter: Arc<RateLimiter>,
}
impl AppState {
	pub async fn new(config: notedrop_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let auth = match config.security.api_auth_token.clone() {
			Some(token) => AuthState::Bearer { token },
			None => AuthState::Off,
		};
		let limiter = RateLimiter::new(
			std::time::Duration::from_secs(config.security.rate_limit_window_secs),
			config.security.rate_limit_max as usize,
		);

		Ok(Self {
			service: Arc::new(NoteService::new(db)),
			auth,
			limiter: Arc::new(limiter),
		})
	}
}

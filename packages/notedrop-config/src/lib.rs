mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Delivery, Postgres, Security, Service, Storage};

use std::{fs, path::Path};

use notedrop_domain::BackoffSchedule;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.poll_interval_secs == 0 {
		return Err(Error::Validation {
			message: "delivery.poll_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.batch_size <= 0 {
		return Err(Error::Validation {
			message: "delivery.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.max_attempts <= 0 {
		return Err(Error::Validation {
			message: "delivery.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.concurrency == 0 {
		return Err(Error::Validation {
			message: "delivery.concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "delivery.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.claim_interval_ms == 0 {
		return Err(Error::Validation {
			message: "delivery.claim_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.lease_secs <= 0 {
		return Err(Error::Validation {
			message: "delivery.lease_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.delivery.backoff_schedule.parse::<BackoffSchedule>().is_err() {
		return Err(Error::Validation {
			message: format!(
				"delivery.backoff_schedule {:?} must be dash-separated whole seconds, e.g. \"1-5-25\".",
				cfg.delivery.backoff_schedule
			),
		});
	}
	if cfg.security.rate_limit_window_secs == 0 {
		return Err(Error::Validation {
			message: "security.rate_limit_window_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.security.rate_limit_max == 0 {
		return Err(Error::Validation {
			message: "security.rate_limit_max must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.security
		.api_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[service]
http_bind = "127.0.0.1:3000"
log_level = "info"

[storage.postgres]
dsn = "postgres://localhost/notedrop"
pool_max_conns = 4
"#;

	fn parse(raw: &str) -> Config {
		toml::from_str(raw).expect("Failed to parse config.")
	}

	#[test]
	fn minimal_config_gets_delivery_defaults() {
		let cfg = parse(MINIMAL);

		assert_eq!(cfg.delivery.poll_interval_secs, 5);
		assert_eq!(cfg.delivery.batch_size, 100);
		assert_eq!(cfg.delivery.max_attempts, 3);
		assert_eq!(cfg.delivery.backoff_schedule, "1-5-25");
		assert_eq!(cfg.delivery.concurrency, 5);
		assert!(validate(&cfg).is_ok());
	}

	#[test]
	fn empty_auth_token_normalizes_to_disabled() {
		let mut cfg = parse(&format!("{MINIMAL}\n[security]\napi_auth_token = \"  \"\n"));

		normalize(&mut cfg);

		assert_eq!(cfg.security.api_auth_token, None);
	}

	#[test]
	fn bad_backoff_schedule_fails_validation() {
		let mut cfg = parse(MINIMAL);

		cfg.delivery.backoff_schedule = "1-fast-25".to_string();

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn zero_concurrency_fails_validation() {
		let mut cfg = parse(MINIMAL);

		cfg.delivery.concurrency = 0;

		assert!(validate(&cfg).is_err());
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Validation failed: {}", issues.join(" "))]
	Validation { issues: Vec<String> },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<notedrop_storage::Error> for Error {
	fn from(err: notedrop_storage::Error) -> Self {
		match err {
			notedrop_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			notedrop_storage::Error::Domain(inner) => Self::Storage { message: inner.to_string() },
			notedrop_storage::Error::InvalidArgument(message) =>
				Self::Validation { issues: vec![message] },
			notedrop_storage::Error::NotFound(message) => Self::NotFound { message },
			notedrop_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

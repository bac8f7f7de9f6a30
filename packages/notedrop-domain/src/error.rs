#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to format timestamp.")]
	TimestampFormat(#[from] time::error::Format),
	#[error("Invalid backoff schedule: {raw:?}.")]
	InvalidBackoffSchedule { raw: String },
	#[error("Unknown note status: {raw:?}.")]
	UnknownStatus { raw: String },
}

pub mod backoff;
pub mod keys;
pub mod status;

mod error;

pub use backoff::BackoffSchedule;
pub use error::Error;
pub use keys::{idempotency_key, job_id};
pub use status::NoteStatus;

pub type Result<T, E = Error> = std::result::Result<T, E>;

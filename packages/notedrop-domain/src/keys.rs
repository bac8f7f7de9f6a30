use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::Result;

/// Stable queue id for one (note, release window) pair.
///
/// The queue deduplicates on this id, so two pollers racing the same due note
/// cannot put two live jobs in flight.
pub fn job_id(note_id: Uuid, release_at: OffsetDateTime) -> Result<String> {
	let release = release_at.format(&Rfc3339)?;

	Ok(format!("{note_id}_{release}"))
}

/// Receiver-side dedup token: lowercase hex SHA-256 of `"{note_id}:{release_at}"`.
///
/// Identical across every retry of the same delivery window; changes only when
/// the note's release instant changes.
pub fn idempotency_key(note_id: Uuid, release_at: OffsetDateTime) -> Result<String> {
	let release = release_at.format(&Rfc3339)?;
	let digest = Sha256::digest(format!("{note_id}:{release}").as_bytes());

	Ok(format!("{digest:x}"))
}

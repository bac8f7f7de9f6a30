use time::OffsetDateTime;
use uuid::Uuid;

use notedrop_storage::notes;

use crate::{Error, NoteService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReplayResponse {
	pub ok: bool,
}

impl NoteService {
	/// Resets a failed or dead note to `pending`, keeping its attempt log as
	/// audit history. The note's release instant is already in the past, so
	/// the next poll cycle re-schedules it.
	pub async fn replay(&self, note_id: Uuid) -> Result<ReplayResponse> {
		let now = OffsetDateTime::now_utc();

		if notes::replay_note(&self.db, note_id, now).await? {
			tracing::info!(note_id = %note_id, "Note replayed.");

			return Ok(ReplayResponse { ok: true });
		}

		match notes::fetch_note(&self.db, note_id).await? {
			None => Err(Error::NotFound { message: format!("Note {note_id} does not exist.") }),
			Some(note) => Err(Error::Conflict {
				message: format!("Note status {:?} does not permit replay.", note.status),
			}),
		}
	}
}

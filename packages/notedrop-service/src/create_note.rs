use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use url::Url;
use uuid::Uuid;

use notedrop_storage::notes::{self, NewNote};

use crate::{Error, NoteService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
	pub title: String,
	pub body: String,
	/// RFC 3339 UTC instant; the earliest the note may be delivered.
	pub release_at: String,
	pub webhook_url: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateNoteResponse {
	pub id: Uuid,
}

impl NoteService {
	pub async fn create_note(&self, req: CreateNoteRequest) -> Result<CreateNoteResponse> {
		let mut issues = Vec::new();

		if req.title.trim().is_empty() {
			issues.push("title must be non-empty.".to_string());
		}
		if req.body.trim().is_empty() {
			issues.push("body must be non-empty.".to_string());
		}

		let release_at = match OffsetDateTime::parse(&req.release_at, &Rfc3339) {
			Ok(instant) => Some(instant),
			Err(_) => {
				issues.push("releaseAt must be an RFC 3339 datetime.".to_string());

				None
			},
		};

		match Url::parse(&req.webhook_url) {
			Ok(url) if matches!(url.scheme(), "http" | "https") => {},
			_ => issues.push("webhookUrl must be a valid http(s) URL.".to_string()),
		}

		let (Some(release_at), true) = (release_at, issues.is_empty()) else {
			return Err(Error::Validation { issues });
		};

		// Title and body are opaque payload; stored exactly as given.
		let note_id = notes::insert_note(
			&self.db,
			&NewNote {
				title: &req.title,
				body: &req.body,
				release_at,
				webhook_url: &req.webhook_url,
			},
		)
		.await?;

		tracing::info!(note_id = %note_id, release_at = %req.release_at, "Note created.");

		Ok(CreateNoteResponse { id: note_id })
	}
}

use notedrop_domain::NoteStatus;
use notedrop_storage::models::NoteListRow;

use crate::{Error, NoteService, PAGE_SIZE, Result};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ListNotesRequest {
	pub status: Option<String>,
	pub page: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
	pub id: uuid::Uuid,
	pub title: String,
	pub status: String,
	#[serde(with = "time::serde::rfc3339::option")]
	pub delivered_at: Option<time::OffsetDateTime>,
	pub last_attempt_code: Option<i32>,
	#[serde(with = "time::serde::rfc3339")]
	pub release_at: time::OffsetDateTime,
	pub webhook_url: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesResponse {
	pub items: Vec<NoteListItem>,
	pub page: u32,
	pub total: i64,
	pub total_pages: i64,
}

impl NoteService {
	pub async fn list_notes(&self, req: ListNotesRequest) -> Result<ListNotesResponse> {
		let status = match req.status.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(raw) => Some(raw.parse::<NoteStatus>().map_err(|_| Error::Validation {
				issues: vec![format!("status {raw:?} is not a note status.")],
			})?),
		};
		let page = req.page.unwrap_or(1).max(1);
		let offset = (page as i64 - 1) * PAGE_SIZE;

		let mut builder = sqlx::QueryBuilder::new(
			"\
SELECT note_id, title, status, delivered_at, release_at, webhook_url,
	(SELECT a.status_code
	 FROM note_attempts a
	 WHERE a.note_id = notes.note_id
	 ORDER BY a.attempt_id DESC
	 LIMIT 1) AS last_attempt_code
FROM notes",
		);

		if let Some(status) = status {
			builder.push(" WHERE status = ");
			builder.push_bind(status.as_str());
		}

		builder.push(" ORDER BY created_at DESC LIMIT ");
		builder.push_bind(PAGE_SIZE);
		builder.push(" OFFSET ");
		builder.push_bind(offset);

		let rows: Vec<NoteListRow> = builder.build_query_as().fetch_all(&self.db.pool).await?;

		let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM notes");

		if let Some(status) = status {
			count.push(" WHERE status = ");
			count.push_bind(status.as_str());
		}

		let (total,): (i64,) = count.build_query_as().fetch_one(&self.db.pool).await?;

		let items = rows
			.into_iter()
			.map(|row| NoteListItem {
				id: row.note_id,
				title: row.title,
				status: row.status,
				delivered_at: row.delivered_at,
				last_attempt_code: row.last_attempt_code,
				release_at: row.release_at,
				webhook_url: row.webhook_url,
			})
			.collect();

		Ok(ListNotesResponse {
			items,
			page,
			total,
			total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
		})
	}
}

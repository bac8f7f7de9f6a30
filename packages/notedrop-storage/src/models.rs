use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct Note {
	pub note_id: Uuid,
	pub title: String,
	pub body: String,
	pub release_at: OffsetDateTime,
	pub webhook_url: String,
	pub status: String,
	pub delivered_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// One delivery try. Append-only; `attempt_id` is the append order.
#[derive(Debug, sqlx::FromRow)]
pub struct NoteAttempt {
	pub attempt_id: i64,
	pub note_id: Uuid,
	pub attempted_at: OffsetDateTime,
	pub status_code: Option<i32>,
	pub ok: bool,
	pub error: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DeliveryJob {
	pub job_id: String,
	pub note_id: Uuid,
	pub status: String,
	pub attempts: i32,
	pub max_attempts: i32,
	pub backoff_schedule: String,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// List-view projection: a note plus the status code of its latest attempt.
#[derive(Debug, sqlx::FromRow)]
pub struct NoteListRow {
	pub note_id: Uuid,
	pub title: String,
	pub status: String,
	pub delivered_at: Option<OffsetDateTime>,
	pub last_attempt_code: Option<i32>,
	pub release_at: OffsetDateTime,
	pub webhook_url: String,
}

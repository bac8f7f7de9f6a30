use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{Note, NoteAttempt},
};

pub struct NewNote<'a> {
	pub title: &'a str,
	pub body: &'a str,
	pub release_at: OffsetDateTime,
	pub webhook_url: &'a str,
}

pub async fn insert_note(db: &Db, note: &NewNote<'_>) -> Result<Uuid> {
	let note_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO notes (note_id, title, body, release_at, webhook_url, status)
VALUES ($1, $2, $3, $4, $5, 'pending')",
	)
	.bind(note_id)
	.bind(note.title)
	.bind(note.body)
	.bind(note.release_at)
	.bind(note.webhook_url)
	.execute(&db.pool)
	.await?;

	Ok(note_id)
}

pub async fn fetch_note(db: &Db, note_id: Uuid) -> Result<Option<Note>> {
	let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE note_id = $1")
		.bind(note_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(note)
}

/// Pending notes whose release instant has passed, oldest first.
pub async fn due_notes(db: &Db, now: OffsetDateTime, limit: i64) -> Result<Vec<Note>> {
	let notes = sqlx::query_as::<_, Note>(
		"\
SELECT *
FROM notes
WHERE status = 'pending' AND release_at <= $1
ORDER BY release_at ASC
LIMIT $2",
	)
	.bind(now)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(notes)
}

pub async fn append_attempt(
	db: &Db,
	note_id: Uuid,
	attempted_at: OffsetDateTime,
	status_code: Option<i32>,
	ok: bool,
	error: Option<&str>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO note_attempts (note_id, attempted_at, status_code, ok, error)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(note_id)
	.bind(attempted_at)
	.bind(status_code)
	.bind(ok)
	.bind(error)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn fetch_attempts(db: &Db, note_id: Uuid) -> Result<Vec<NoteAttempt>> {
	let attempts = sqlx::query_as::<_, NoteAttempt>(
		"SELECT * FROM note_attempts WHERE note_id = $1 ORDER BY attempt_id ASC",
	)
	.bind(note_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(attempts)
}

/// First success wins: `delivered_at` is never overwritten once set.
pub async fn mark_delivered(db: &Db, note_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"\
UPDATE notes
SET status = 'delivered',
	delivered_at = COALESCE(delivered_at, $1),
	updated_at = $1
WHERE note_id = $2",
	)
	.bind(now)
	.bind(note_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_failed(db: &Db, note_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE notes SET status = 'failed', updated_at = $1 WHERE note_id = $2")
		.bind(now)
		.bind(note_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Unconditional: exhaustion is the terminal outcome of the attempt sequence
/// that produced it, so this write wins over any concurrent status change.
pub async fn mark_dead(db: &Db, note_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE notes SET status = 'dead', updated_at = $1 WHERE note_id = $2")
		.bind(now)
		.bind(note_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Returns false when the note is missing or its status is outside
/// {failed, dead}; attempts are kept as audit history either way.
pub async fn replay_note(db: &Db, note_id: Uuid, now: OffsetDateTime) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE notes
SET status = 'pending', updated_at = $1
WHERE note_id = $2 AND status IN ('failed', 'dead')",
	)
	.bind(now)
	.bind(note_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

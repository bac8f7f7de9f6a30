//! Postgres-backed delivery job queue.
//!
//! Jobs are keyed by a caller-chosen stable id; a live (`PENDING`/`FAILED`) row
//! deduplicates re-submission, workers claim with `FOR UPDATE SKIP LOCKED` plus
//! a lease, and a job whose attempts run out surfaces an exhaustion event
//! instead of another retry.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use notedrop_domain::BackoffSchedule;

use crate::{Result, db::Db, models::DeliveryJob};

const MAX_JOB_ERROR_CHARS: usize = 1_024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnqueueOutcome {
	Enqueued,
	/// A live job with the same id already exists; the note is already
	/// scheduled for this release window.
	Duplicate,
}

/// Terminal queue event: the job's final attempt has failed.
#[derive(Clone, Debug)]
pub struct ExhaustedJob {
	pub job_id: String,
	pub note_id: Uuid,
	pub attempts_made: i32,
}

/// Idempotent w.r.t. `job_id`. A terminal (`DONE`/`EXHAUSTED`) row under the
/// same id is reset to a fresh `PENDING` job, which is what lets a replayed
/// note re-enter the queue without changing its stable id.
pub async fn enqueue(
	db: &Db,
	job_id: &str,
	note_id: Uuid,
	max_attempts: i32,
	backoff_schedule: &str,
) -> Result<EnqueueOutcome> {
	let now = OffsetDateTime::now_utc();
	let result = sqlx::query(
		"\
INSERT INTO delivery_jobs (
	job_id,
	note_id,
	status,
	attempts,
	max_attempts,
	backoff_schedule,
	available_at,
	created_at,
	updated_at
)
VALUES ($1, $2, 'PENDING', 0, $3, $4, $5, $5, $5)
ON CONFLICT (job_id) DO UPDATE
SET status = 'PENDING',
	attempts = 0,
	max_attempts = EXCLUDED.max_attempts,
	backoff_schedule = EXCLUDED.backoff_schedule,
	last_error = NULL,
	available_at = EXCLUDED.available_at,
	updated_at = EXCLUDED.updated_at
WHERE delivery_jobs.status IN ('DONE', 'EXHAUSTED')",
	)
	.bind(job_id)
	.bind(note_id)
	.bind(max_attempts)
	.bind(backoff_schedule)
	.bind(now)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() > 0 {
		Ok(EnqueueOutcome::Enqueued)
	} else {
		Ok(EnqueueOutcome::Duplicate)
	}
}

/// Claims the earliest due job, pushing `available_at` forward by the lease so
/// exactly one worker holds it at a time. A crashed worker's job resurfaces
/// when the lease lapses.
pub async fn claim_next(
	db: &Db,
	now: OffsetDateTime,
	lease_secs: i64,
) -> Result<Option<DeliveryJob>> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, DeliveryJob>(
		"\
SELECT *
FROM delivery_jobs
WHERE status IN ('PENDING', 'FAILED') AND available_at <= $1
ORDER BY available_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;

	let job = if let Some(mut job) = row {
		let lease_until = now + Duration::seconds(lease_secs);

		sqlx::query("UPDATE delivery_jobs SET available_at = $1, updated_at = $2 WHERE job_id = $3")
			.bind(lease_until)
			.bind(now)
			.bind(&job.job_id)
			.execute(&mut *tx)
			.await?;

		job.available_at = lease_until;
		job.updated_at = now;

		Some(job)
	} else {
		None
	};

	tx.commit().await?;

	Ok(job)
}

pub async fn mark_done(db: &Db, job_id: &str) -> Result<()> {
	let now = OffsetDateTime::now_utc();

	sqlx::query("UPDATE delivery_jobs SET status = 'DONE', updated_at = $1 WHERE job_id = $2")
		.bind(now)
		.bind(job_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Records a failed attempt. Below `max_attempts` the job is rescheduled at
/// `now + backoff(attempts_made)`; at `max_attempts` it is marked `EXHAUSTED`
/// and the exhaustion event is returned for the caller to finalize.
pub async fn mark_failed(
	db: &Db,
	job: &DeliveryJob,
	error: &str,
	now: OffsetDateTime,
) -> Result<Option<ExhaustedJob>> {
	let attempts_made = job.attempts.saturating_add(1);
	let error_text = truncate_error(error);

	if attempts_made >= job.max_attempts {
		sqlx::query(
			"\
UPDATE delivery_jobs
SET status = 'EXHAUSTED',
	attempts = $1,
	last_error = $2,
	updated_at = $3
WHERE job_id = $4",
		)
		.bind(attempts_made)
		.bind(&error_text)
		.bind(now)
		.bind(&job.job_id)
		.execute(&db.pool)
		.await?;

		return Ok(Some(ExhaustedJob {
			job_id: job.job_id.clone(),
			note_id: job.note_id,
			attempts_made,
		}));
	}

	let schedule: BackoffSchedule = job.backoff_schedule.parse()?;
	let available_at = now + schedule.delay_for_attempt(attempts_made);

	sqlx::query(
		"\
UPDATE delivery_jobs
SET status = 'FAILED',
	attempts = $1,
	last_error = $2,
	available_at = $3,
	updated_at = $4
WHERE job_id = $5",
	)
	.bind(attempts_made)
	.bind(&error_text)
	.bind(available_at)
	.bind(now)
	.bind(&job.job_id)
	.execute(&db.pool)
	.await?;

	Ok(None)
}

pub async fn fetch_job(db: &Db, job_id: &str) -> Result<Option<DeliveryJob>> {
	let job = sqlx::query_as::<_, DeliveryJob>("SELECT * FROM delivery_jobs WHERE job_id = $1")
		.bind(job_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(job)
}

fn truncate_error(text: &str) -> String {
	if text.chars().count() <= MAX_JOB_ERROR_CHARS {
		return text.to_string();
	}

	let mut out: String = text.chars().take(MAX_JOB_ERROR_CHARS).collect();

	out.push_str("...");

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_errors_pass_through_untruncated() {
		assert_eq!(truncate_error("connection refused"), "connection refused");
	}

	#[test]
	fn long_errors_truncate_with_ellipsis() {
		let long = "x".repeat(MAX_JOB_ERROR_CHARS + 10);
		let out = truncate_error(&long);

		assert_eq!(out.chars().count(), MAX_JOB_ERROR_CHARS + 3);
		assert!(out.ends_with("..."));
	}
}

use std::time::{Duration as StdDuration, Instant};

use color_eyre::Result;
use reqwest::Client;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::time as tokio_time;

use notedrop_config::Delivery;
use notedrop_domain::{NoteStatus, idempotency_key};
use notedrop_storage::{
	db::Db,
	models::{DeliveryJob, Note},
	notes,
	queue::{self, ExhaustedJob},
};

/// Marks a note dead when its delivery job exhausts. The write is
/// unconditional: exhaustion is the terminal outcome of the attempt sequence
/// that produced it, so it wins over any concurrent status change.
#[derive(Clone)]
pub struct FinalizationHandler {
	db: Db,
}
impl FinalizationHandler {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub async fn on_exhausted(&self, event: &ExhaustedJob) -> Result<()> {
		let now = OffsetDateTime::now_utc();

		notes::mark_dead(&self.db, event.note_id, now).await?;

		tracing::error!(
			job_id = %event.job_id,
			note_id = %event.note_id,
			attempts_made = event.attempts_made,
			"Delivery attempts exhausted. Note marked dead."
		);

		Ok(())
	}
}

/// One delivery worker: claims due jobs and executes the webhook call. The
/// pool runs several of these; `SKIP LOCKED` claiming keeps them off each
/// other's jobs.
pub struct DeliveryWorker {
	db: Db,
	cfg: Delivery,
	client: Client,
	finalizer: FinalizationHandler,
}
impl DeliveryWorker {
	pub fn new(db: Db, cfg: Delivery, finalizer: FinalizationHandler) -> Result<Self> {
		let client =
			Client::builder().timeout(StdDuration::from_millis(cfg.request_timeout_ms)).build()?;

		Ok(Self { db, cfg, client, finalizer })
	}

	pub async fn run(self) -> Result<()> {
		loop {
			match self.process_next().await {
				Ok(true) => {},
				Ok(false) => {
					tokio_time::sleep(StdDuration::from_millis(self.cfg.claim_interval_ms)).await;
				},
				Err(err) => {
					tracing::error!(error = %err, "Delivery processing failed.");
					tokio_time::sleep(StdDuration::from_millis(self.cfg.claim_interval_ms)).await;
				},
			}
		}
	}

	/// Claims and executes at most one job. Returns whether a job was claimed.
	pub async fn process_next(&self) -> Result<bool> {
		let now = OffsetDateTime::now_utc();
		let Some(job) = queue::claim_next(&self.db, now, self.cfg.lease_secs).await? else {
			return Ok(false);
		};

		self.deliver(&job).await?;

		Ok(true)
	}

	async fn deliver(&self, job: &DeliveryJob) -> Result<()> {
		let Some(note) = notes::fetch_note(&self.db, job.note_id).await? else {
			tracing::warn!(job_id = %job.job_id, note_id = %job.note_id, "Note missing. Acknowledging job.");
			queue::mark_done(&self.db, &job.job_id).await?;

			return Ok(());
		};

		// A delivered note never gains another attempt, even if a stale job
		// survived a replay race.
		if note.status == NoteStatus::Delivered.as_str() {
			tracing::info!(job_id = %job.job_id, note_id = %note.note_id, "Note already delivered. Acknowledging job.");
			queue::mark_done(&self.db, &job.job_id).await?;

			return Ok(());
		}

		let key = idempotency_key(note.note_id, note.release_at)?;
		let started = Instant::now();
		let outcome = self.post_webhook(&note, &key).await;
		let now = OffsetDateTime::now_utc();

		match outcome {
			Ok(status) if status.is_success() => {
				notes::append_attempt(&self.db, note.note_id, now, Some(status.as_u16() as i32), true, None)
					.await?;
				notes::mark_delivered(&self.db, note.note_id, now).await?;
				queue::mark_done(&self.db, &job.job_id).await?;

				tracing::info!(
					note_id = %note.note_id,
					status_code = status.as_u16(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					attempt = job.attempts + 1,
					"Delivered."
				);
			},
			Ok(status) => {
				notes::append_attempt(&self.db, note.note_id, now, Some(status.as_u16() as i32), false, None)
					.await?;
				notes::mark_failed(&self.db, note.note_id, now).await?;

				let error = format!("Webhook responded {}.", status.as_u16());

				self.fail_job(job, &error, now).await?;
			},
			Err(err) => {
				let error = err.to_string();

				notes::append_attempt(&self.db, note.note_id, now, None, false, Some(&error)).await?;
				notes::mark_failed(&self.db, note.note_id, now).await?;
				self.fail_job(job, &error, now).await?;
			},
		}

		Ok(())
	}

	/// The sender judges delivery solely by the HTTP status code; the body is
	/// not inspected.
	async fn post_webhook(&self, note: &Note, key: &str) -> Result<reqwest::StatusCode, reqwest::Error> {
		let release_at = note
			.release_at
			.format(&Rfc3339)
			.unwrap_or_else(|_| note.release_at.to_string());
		let body = serde_json::json!({
			"title": note.title,
			"body": note.body,
			"releaseAt": release_at,
		});
		let res = self
			.client
			.post(&note.webhook_url)
			.header("X-Note-Id", note.note_id.to_string())
			.header("X-Idempotency-Key", key)
			.json(&body)
			.send()
			.await?;

		Ok(res.status())
	}

	async fn fail_job(&self, job: &DeliveryJob, error: &str, now: OffsetDateTime) -> Result<()> {
		tracing::warn!(
			job_id = %job.job_id,
			note_id = %job.note_id,
			attempt = job.attempts + 1,
			error = %error,
			"Delivery attempt failed."
		);

		if let Some(event) = queue::mark_failed(&self.db, job, error, now).await? {
			self.finalizer.on_exhausted(&event).await?;
		}

		Ok(())
	}
}

use std::time::Duration;

use color_eyre::Result;
use time::OffsetDateTime;
use tokio::time as tokio_time;

use notedrop_config::Delivery;
use notedrop_storage::{
	db::Db,
	notes,
	queue::{self, EnqueueOutcome},
};

/// Scans for due notes on a fixed interval and submits one delivery job per
/// (note, release window). Several poller instances may run concurrently; the
/// queue's stable job id keeps them from double-scheduling.
pub struct Poller {
	db: Db,
	cfg: Delivery,
}
impl Poller {
	pub fn new(db: Db, cfg: Delivery) -> Self {
		Self { db, cfg }
	}

	pub async fn run(self) -> Result<()> {
		loop {
			if let Err(err) = self.poll_once().await {
				tracing::error!(error = %err, "Poll cycle failed.");
			}

			tokio_time::sleep(Duration::from_secs(self.cfg.poll_interval_secs)).await;
		}
	}

	/// One scan: enqueue every due pending note. A duplicate submission means
	/// the note is already scheduled; per-note failures do not abort the batch.
	pub async fn poll_once(&self) -> Result<()> {
		let now = OffsetDateTime::now_utc();
		let due = notes::due_notes(&self.db, now, self.cfg.batch_size).await?;

		if due.is_empty() {
			return Ok(());
		}

		tracing::debug!(count = due.len(), "Found due notes.");

		for note in due {
			let job_id = match notedrop_domain::job_id(note.note_id, note.release_at) {
				Ok(job_id) => job_id,
				Err(err) => {
					tracing::warn!(note_id = %note.note_id, error = %err, "Failed to derive job id.");

					continue;
				},
			};

			match queue::enqueue(
				&self.db,
				&job_id,
				note.note_id,
				self.cfg.max_attempts,
				&self.cfg.backoff_schedule,
			)
			.await
			{
				Ok(EnqueueOutcome::Enqueued) => {
					tracing::info!(job_id = %job_id, note_id = %note.note_id, "Delivery job enqueued.");
				},
				Ok(EnqueueOutcome::Duplicate) => {
					tracing::info!(job_id = %job_id, note_id = %note.note_id, "Note already scheduled. Skipping.");
				},
				Err(err) => {
					tracing::warn!(job_id = %job_id, note_id = %note.note_id, error = %err, "Failed to enqueue delivery job.");
				},
			}
		}

		Ok(())
	}
}

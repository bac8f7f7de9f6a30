use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use notedrop_storage::{
	db::Db,
	notes::{self, NewNote},
	queue::{self, EnqueueOutcome},
};

async fn connect_test_db(test_db: &notedrop_testkit::TestDatabase) -> Db {
	let cfg = notedrop_config::Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

async fn seed_note(db: &Db, release_at: OffsetDateTime) -> Uuid {
	notes::insert_note(
		db,
		&NewNote {
			title: "title",
			body: "body",
			release_at,
			webhook_url: "http://127.0.0.1:4000/sink",
		},
	)
	.await
	.expect("Failed to insert note.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTEDROP_PG_DSN to run."]
async fn live_jobs_dedup_on_job_id() {
	let Some(base_dsn) = notedrop_testkit::env_dsn() else {
		eprintln!("Skipping live_jobs_dedup_on_job_id; set NOTEDROP_PG_DSN to run this test.");
		return;
	};
	let test_db = notedrop_testkit::TestDatabase::new(&base_dsn)
		.await
		.expect("Failed to create test database.");
	let db = connect_test_db(&test_db).await;
	let note_id = seed_note(&db, OffsetDateTime::now_utc()).await;

	let first = queue::enqueue(&db, "job-1", note_id, 3, "1-5-25")
		.await
		.expect("Failed to enqueue job.");
	let second = queue::enqueue(&db, "job-1", note_id, 3, "1-5-25")
		.await
		.expect("Failed to enqueue job.");

	assert_eq!(first, EnqueueOutcome::Enqueued);
	assert_eq!(second, EnqueueOutcome::Duplicate);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTEDROP_PG_DSN to run."]
async fn claim_leases_the_job_against_other_workers() {
	let Some(base_dsn) = notedrop_testkit::env_dsn() else {
		eprintln!(
			"Skipping claim_leases_the_job_against_other_workers; set NOTEDROP_PG_DSN to run this test."
		);
		return;
	};
	let test_db = notedrop_testkit::TestDatabase::new(&base_dsn)
		.await
		.expect("Failed to create test database.");
	let db = connect_test_db(&test_db).await;
	let note_id = seed_note(&db, OffsetDateTime::now_utc()).await;

	queue::enqueue(&db, "job-1", note_id, 3, "1-5-25").await.expect("Failed to enqueue job.");

	let now = OffsetDateTime::now_utc();
	let claimed = queue::claim_next(&db, now, 30).await.expect("Failed to claim job.");

	assert!(claimed.is_some());

	// Still leased; a second worker sees nothing due.
	let second = queue::claim_next(&db, now, 30).await.expect("Failed to claim job.");

	assert!(second.is_none());

	// Past the lease the job resurfaces for redelivery.
	let later = now + Duration::seconds(31);
	let reclaimed = queue::claim_next(&db, later, 30).await.expect("Failed to claim job.");

	assert!(reclaimed.is_some());

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTEDROP_PG_DSN to run."]
async fn failed_jobs_back_off_per_schedule() {
	let Some(base_dsn) = notedrop_testkit::env_dsn() else {
		eprintln!("Skipping failed_jobs_back_off_per_schedule; set NOTEDROP_PG_DSN to run this test.");
		return;
	};
	let test_db = notedrop_testkit::TestDatabase::new(&base_dsn)
		.await
		.expect("Failed to create test database.");
	let db = connect_test_db(&test_db).await;
	let note_id = seed_note(&db, OffsetDateTime::now_utc()).await;

	queue::enqueue(&db, "job-1", note_id, 3, "1-5-25").await.expect("Failed to enqueue job.");

	let now = OffsetDateTime::now_utc();
	let job = queue::claim_next(&db, now, 30)
		.await
		.expect("Failed to claim job.")
		.expect("Expected a due job.");
	let exhausted = queue::mark_failed(&db, &job, "webhook responded 500", now)
		.await
		.expect("Failed to mark job failed.");

	assert!(exhausted.is_none());

	let stored = queue::fetch_job(&db, "job-1")
		.await
		.expect("Failed to fetch job.")
		.expect("Expected the job row.");

	assert_eq!(stored.status, "FAILED");
	assert_eq!(stored.attempts, 1);
	// Timestamps round-trip through Postgres at microsecond precision.
	assert!((stored.available_at - (now + Duration::seconds(1))).abs() < Duration::milliseconds(1));
	assert_eq!(stored.last_error.as_deref(), Some("webhook responded 500"));

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTEDROP_PG_DSN to run."]
async fn final_failure_exhausts_and_reports_the_event() {
	let Some(base_dsn) = notedrop_testkit::env_dsn() else {
		eprintln!(
			"Skipping final_failure_exhausts_and_reports_the_event; set NOTEDROP_PG_DSN to run this test."
		);
		return;
	};
	let test_db = notedrop_testkit::TestDatabase::new(&base_dsn)
		.await
		.expect("Failed to create test database.");
	let db = connect_test_db(&test_db).await;
	let note_id = seed_note(&db, OffsetDateTime::now_utc()).await;

	queue::enqueue(&db, "job-1", note_id, 2, "0-0").await.expect("Failed to enqueue job.");

	let mut exhausted = None;

	for _ in 0..2 {
		let now = OffsetDateTime::now_utc();
		let job = queue::claim_next(&db, now, 30)
			.await
			.expect("Failed to claim job.")
			.expect("Expected a due job.");

		exhausted = queue::mark_failed(&db, &job, "connection refused", now)
			.await
			.expect("Failed to mark job failed.");
	}

	let event = exhausted.expect("Expected an exhaustion event after the final attempt.");

	assert_eq!(event.job_id, "job-1");
	assert_eq!(event.note_id, note_id);
	assert_eq!(event.attempts_made, 2);

	let stored = queue::fetch_job(&db, "job-1")
		.await
		.expect("Failed to fetch job.")
		.expect("Expected the job row.");

	assert_eq!(stored.status, "EXHAUSTED");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTEDROP_PG_DSN to run."]
async fn terminal_jobs_reset_on_reenqueue() {
	let Some(base_dsn) = notedrop_testkit::env_dsn() else {
		eprintln!("Skipping terminal_jobs_reset_on_reenqueue; set NOTEDROP_PG_DSN to run this test.");
		return;
	};
	let test_db = notedrop_testkit::TestDatabase::new(&base_dsn)
		.await
		.expect("Failed to create test database.");
	let db = connect_test_db(&test_db).await;
	let note_id = seed_note(&db, OffsetDateTime::now_utc()).await;

	queue::enqueue(&db, "job-1", note_id, 1, "0").await.expect("Failed to enqueue job.");

	let now = OffsetDateTime::now_utc();
	let job = queue::claim_next(&db, now, 30)
		.await
		.expect("Failed to claim job.")
		.expect("Expected a due job.");
	let exhausted =
		queue::mark_failed(&db, &job, "timed out", now).await.expect("Failed to mark job failed.");

	assert!(exhausted.is_some());

	// A replayed note re-enters the queue under the same stable id.
	let outcome =
		queue::enqueue(&db, "job-1", note_id, 3, "1-5-25").await.expect("Failed to enqueue job.");

	assert_eq!(outcome, EnqueueOutcome::Enqueued);

	let stored = queue::fetch_job(&db, "job-1")
		.await
		.expect("Failed to fetch job.")
		.expect("Expected the job row.");

	assert_eq!(stored.status, "PENDING");
	assert_eq!(stored.attempts, 0);
	assert_eq!(stored.max_attempts, 3);
	assert_eq!(stored.last_error, None);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

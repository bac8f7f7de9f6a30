pub mod create_note;
pub mod list_notes;
pub mod replay;

mod error;

pub use create_note::{CreateNoteRequest, CreateNoteResponse};
pub use error::{Error, Result};
pub use list_notes::{ListNotesRequest, ListNotesResponse, NoteListItem};
pub use replay::ReplayResponse;

use notedrop_storage::db::Db;

pub const PAGE_SIZE: i64 = 20;

pub struct NoteService {
	pub db: Db,
}
impl NoteService {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

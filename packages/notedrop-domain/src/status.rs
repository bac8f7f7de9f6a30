use std::{fmt, str::FromStr};

use crate::Error;

/// Lifecycle of a note.
///
/// `delivered` and `dead` are terminal; replay is the only transition out of a
/// terminal state and it applies to `dead` (and `failed`) alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
	Pending,
	Delivered,
	Failed,
	Dead,
}
impl NoteStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Delivered => "delivered",
			Self::Failed => "failed",
			Self::Dead => "dead",
		}
	}

	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Delivered | Self::Dead)
	}

	/// Replay is a membership test, not an inequality chain; `pending` and
	/// `delivered` notes must never re-enter the schedule through it.
	pub const fn can_replay(self) -> bool {
		matches!(self, Self::Failed | Self::Dead)
	}
}
impl FromStr for NoteStatus {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"pending" => Ok(Self::Pending),
			"delivered" => Ok(Self::Delivered),
			"failed" => Ok(Self::Failed),
			"dead" => Ok(Self::Dead),
			_ => Err(Error::UnknownStatus { raw: raw.to_string() }),
		}
	}
}
impl fmt::Display for NoteStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

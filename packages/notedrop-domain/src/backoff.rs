use std::str::FromStr;

use time::Duration;

use crate::Error;

/// Retry delays parsed from a dash-separated schedule such as `"1-5-25"`:
/// 1s before retry 1, 5s before retry 2, 25s before every retry after that.
/// The last entry repeats for attempts past the end of the schedule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackoffSchedule {
	delays_secs: Vec<u64>,
}
impl BackoffSchedule {
	pub fn delay_for_attempt(&self, attempt: i32) -> Duration {
		let attempt = attempt.max(1) as usize;
		let index = (attempt - 1).min(self.delays_secs.len() - 1);

		Duration::seconds(self.delays_secs[index] as i64)
	}
}
impl FromStr for BackoffSchedule {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let delays_secs = raw
			.split('-')
			.map(|part| part.trim().parse::<u64>())
			.collect::<Result<Vec<_>, _>>()
			.map_err(|_| Error::InvalidBackoffSchedule { raw: raw.to_string() })?;

		if delays_secs.is_empty() {
			return Err(Error::InvalidBackoffSchedule { raw: raw.to_string() });
		}

		Ok(Self { delays_secs })
	}
}

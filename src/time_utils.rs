use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::{trace, warn};

use crate::serde_helpers::DATE_FORMAT;
use crate::{AppError, AppResult};

/// Human-facing timestamp format used in annotations and logs.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month padding:zero]-[day padding:zero] [hour padding:zero]:[minute padding:zero]:[second padding:zero]"
);

/// Closed calendar range `[start, end]`. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "crate::serde_helpers::date")]
    start: Date,
    #[serde(with = "crate::serde_helpers::date")]
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// Number of calendar days in the range, both ends included.
    pub fn len_days(&self) -> u32 {
        ((self.end - self.start).whole_days() + 1) as u32
    }

    /// Every day from `start` to `end` inclusive, in chronological order.
    pub fn days(&self) -> impl Iterator<Item = Date> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.next_day().filter(|next| *next <= end)
        })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = self.start.format(DATE_FORMAT).map_err(|_| std::fmt::Error)?;
        let end = self.end.format(DATE_FORMAT).map_err(|_| std::fmt::Error)?;
        write!(f, "{start}..{end}")
    }
}

/// Build the timestamp for `hour:minute:second` on `date` at the given offset.
#[tracing::instrument(level = "trace")]
pub fn timestamp_on(
    date: Date,
    hour: u8,
    minute: u8,
    second: u8,
    offset: UtcOffset,
) -> AppResult<OffsetDateTime> {
    let time = Time::from_hms(hour, minute, second)?;
    let ts = PrimitiveDateTime::new(date, time).assume_offset(offset);
    trace!("Built timestamp {}", ts);
    Ok(ts)
}

/// The local UTC offset, falling back to UTC when it cannot be determined.
pub fn local_offset() -> UtcOffset {
    match UtcOffset::current_local_offset() {
        Ok(offset) => offset,
        Err(e) => {
            warn!("Unable to determine the local UTC offset, using UTC: {}", e);
            UtcOffset::UTC
        }
    }
}

/// Convert a git commit time into an `OffsetDateTime` in the commit's own offset.
pub fn git_time_to_datetime(time: git2::Time) -> AppResult<OffsetDateTime> {
    let offset = UtcOffset::from_whole_seconds(time.offset_minutes() * 60)?;
    Ok(OffsetDateTime::from_unix_timestamp(time.seconds())?.to_offset(offset))
}

/// Convert an `OffsetDateTime` into the git representation, preserving its offset.
pub fn datetime_to_git_time(dt: &OffsetDateTime) -> git2::Time {
    git2::Time::new(dt.unix_timestamp(), dt.offset().whole_minutes() as i32)
}

//! Date window for fetching events.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::error::{CalEditError, CalEditResult};
use crate::iso8601;
use crate::timestamp::TimestampCodec;

const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Events starting inside this window are fetched.
/// `to` of `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<FixedOffset>,
    pub to: Option<DateTime<FixedOffset>>,
}

impl DateRange {
    /// Build the window from `YYYY-MM-DD` arguments interpreted in the
    /// codec's zone.
    /// - `from`: defaults to the start of today
    /// - `to`: includes the whole day, unbounded if not specified
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        codec: &TimestampCodec,
    ) -> CalEditResult<Self> {
        let from_date = match from {
            Some(s) => parse_date(s)?,
            None => codec.today(),
        };
        let from = at(codec, from_date, NaiveTime::MIN)?;

        let to = match to {
            Some(s) => Some(at(codec, parse_date(s)?, END_OF_DAY)?),
            None => None,
        };

        Ok(DateRange { from, to })
    }

    pub fn from_iso(&self) -> String {
        iso8601::format(&self.from)
    }

    pub fn to_iso(&self) -> Option<String> {
        self.to.as_ref().map(iso8601::format)
    }
}

fn parse_date(s: &str) -> CalEditResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CalEditError::InvalidDate(s.to_string()))
}

fn at(
    codec: &TimestampCodec,
    date: NaiveDate,
    time: NaiveTime,
) -> CalEditResult<DateTime<FixedOffset>> {
    let naive = date.and_time(time);
    codec.resolve(&naive).ok_or_else(|| {
        CalEditError::malformed_timestamp(
            &naive.to_string(),
            "time does not exist in the local timezone",
        )
    })
}

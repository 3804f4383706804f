//! Conversion between the human `yyyy-mm-dd hh:mm:ss` form used in event
//! text and the ISO-8601 timestamps the remote calendar speaks.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone,
    Utc,
};

use crate::error::{CalEditError, CalEditResult};
use crate::iso8601;

/// Timestamp layout used in event text.
pub const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// Converts timestamps between event text and the remote calendar.
///
/// Human timestamps are wall-clock times in the codec's zone: the system
/// local time by default, or a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampCodec {
    zone: Zone,
}

impl Default for TimestampCodec {
    fn default() -> Self {
        Self::local()
    }
}

impl TimestampCodec {
    pub fn local() -> Self {
        TimestampCodec { zone: Zone::Local }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        TimestampCodec {
            zone: Zone::Fixed(offset),
        }
    }

    pub fn utc() -> Self {
        Self::fixed(Utc.fix())
    }

    /// Convert `yyyy-mm-dd hh:mm:ss` to an RFC 3339 UTC timestamp.
    pub fn to_remote(&self, human: &str) -> CalEditResult<String> {
        let instant = self.parse_human(human)?;
        Ok(instant
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Convert any ISO-8601 timestamp to `yyyy-mm-dd hh:mm:ss` in this zone.
    pub fn to_human(&self, remote: &str) -> CalEditResult<String> {
        let instant = iso8601::parse(remote.trim())?;
        Ok(self.display(&instant))
    }

    /// Render an instant as `yyyy-mm-dd hh:mm:ss` in this zone.
    pub fn display(&self, instant: &DateTime<FixedOffset>) -> String {
        match self.zone {
            Zone::Local => instant.with_timezone(&Local).format(HUMAN_FORMAT).to_string(),
            Zone::Fixed(offset) => instant.with_timezone(&offset).format(HUMAN_FORMAT).to_string(),
        }
    }

    /// Parse `yyyy-mm-dd hh:mm:ss` as a wall-clock time in this zone.
    pub fn parse_human(&self, human: &str) -> CalEditResult<DateTime<FixedOffset>> {
        let naive = NaiveDateTime::parse_from_str(human.trim(), HUMAN_FORMAT).map_err(|e| {
            CalEditError::malformed_timestamp(human, format!("{e}, expected yyyy-mm-dd hh:mm:ss"))
        })?;
        self.resolve(&naive).ok_or_else(|| {
            CalEditError::malformed_timestamp(human, "time does not exist in the local timezone")
        })
    }

    /// Attach this zone to a wall-clock time. Ambiguous times (DST fall-back)
    /// resolve to the earlier instant.
    pub fn resolve(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self.zone {
            Zone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Fixed(offset) => offset.from_local_datetime(naive).single(),
        }
    }

    /// Today's date in this zone.
    pub fn today(&self) -> NaiveDate {
        match self.zone {
            Zone::Local => Local::now().date_naive(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset).date_naive(),
        }
    }
}

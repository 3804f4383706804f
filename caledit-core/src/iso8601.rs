//! ISO-8601 date/time parsing and formatting.
//!
//! The parser accepts the W3C date-time profile plus a few extras: basic
//! (separator-free) dates and times, ordinal dates such as `2024-060`, and
//! a comma as the decimal mark. A time of day always needs a timezone
//! designator (`Z` or `±hh[:mm]`); a bare date means midnight UTC.
//!
//! [`format`] only produces the extended form and keeps it as short as the
//! value allows: seconds are dropped when zero, fractions are rendered to
//! hundredths, and the offset is always explicit.

use std::fmt::Write;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, SubsecRound, Timelike,
};

use crate::error::{CalEditError, CalEditResult};

/// Ordinal-day resolution normally settles after one adjustment.
const MAX_ORDINAL_ROUNDS: usize = 8;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Parse an ISO-8601 date or date-time.
///
/// The whole input must be consumed; anything left over is an error.
pub fn parse(input: &str) -> CalEditResult<DateTime<FixedOffset>> {
    Parser::new(input).date_time()
}

/// Parse a standalone timezone designator (`Z`, `+05`, `-03:30`, `+0530`).
pub fn parse_timezone(input: &str) -> CalEditResult<FixedOffset> {
    let mut parser = Parser::new(input);
    let offset = parser.timezone()?;
    parser.finish()?;
    Ok(offset)
}

/// Format a timestamp in the extended ISO-8601 form.
pub fn format(value: &DateTime<FixedOffset>) -> String {
    // Rounding carries into the seconds, so `:00.999` becomes `:01`.
    let value = value.round_subsecs(2);
    let mut out = value.format("%Y-%m-%dT%H:%M").to_string();

    let nanos = value.nanosecond();
    let (second, fraction) = if nanos >= NANOS_PER_SECOND {
        (60, nanos - NANOS_PER_SECOND)
    } else {
        (value.second(), nanos)
    };

    if fraction > 0 {
        let hundredths = fraction / 10_000_000;
        let _ = write!(out, ":{second:02}.{hundredths:02}");
    } else if second > 0 {
        let _ = write!(out, ":{second:02}");
    }

    out.push_str(&format_offset(value.offset()));
    out
}

/// Render an offset as `Z` or `±hh:mm`.
pub fn format_offset(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "Z".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Serde adapter for optional timestamps carried as ISO-8601 strings.
///
/// Empty strings deserialize to `None`.
pub mod option {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&super::format(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| super::parse(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> CalEditError {
        CalEditError::malformed_timestamp(self.input, reason)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Number of consecutive ASCII digits starting at the cursor.
    fn digit_run(&self) -> usize {
        self.bytes[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    }

    /// Consume exactly `count` digits.
    fn digits(&mut self, count: usize, field: &str) -> CalEditResult<u32> {
        if self.digit_run() < count {
            return Err(self.error(format!("expected {count} digits for {field}")));
        }
        let value = self.bytes[self.pos..self.pos + count]
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        self.pos += count;
        Ok(value)
    }

    fn finish(&self) -> CalEditResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error(format!(
                "unexpected trailing text {:?}",
                &self.input[self.pos..]
            )))
        }
    }

    fn date_time(mut self) -> CalEditResult<DateTime<FixedOffset>> {
        let date = self.date()?;

        if self.at_end() {
            return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
        }

        self.eat(b'T');
        let time = self.time()?;
        let offset = self.timezone()?;
        self.finish()?;

        date.and_time(time)
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| self.error("timestamp is out of range"))
    }

    fn date(&mut self) -> CalEditResult<NaiveDate> {
        let year = self.digits(4, "year")? as i32;
        if self.at_end() || self.peek() == Some(b'T') {
            return self.calendar_date(year, 1, 1);
        }

        let extended = self.eat(b'-');
        let run = self.digit_run();

        // Exactly three digits is an ordinal day in both forms.
        if run == 3 {
            let day = self.digits(3, "ordinal day")?;
            return self.ordinal_date(year, day);
        }

        if run < 2 {
            if extended {
                return Err(self.error("expected month or ordinal day after '-'"));
            }
            return self.calendar_date(year, 1, 1);
        }

        let month = self.digits(2, "month")?;
        let has_day = if extended {
            self.eat(b'-')
        } else {
            run >= 4
        };
        let day = if has_day { self.digits(2, "day")? } else { 1 };

        self.calendar_date(year, month, day)
    }

    fn calendar_date(&self, year: i32, month: u32, day: u32) -> CalEditResult<NaiveDate> {
        if !(1..=12).contains(&month) {
            return Err(self.error(format!("illegal month number {month}")));
        }
        if !(1..=31).contains(&day) {
            return Err(self.error(format!("illegal day number {day}")));
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| self.error(format!("day {day} does not exist in month {month}")))
    }

    /// Resolve a day-of-year by adjusting a month/day estimate until its
    /// ordinal matches.
    fn ordinal_date(&self, year: i32, ordinal: u32) -> CalEditResult<NaiveDate> {
        let leap = NaiveDate::from_ymd_opt(year, 2, 29).is_some();
        let days_in_year = if leap { 366 } else { 365 };
        if !(1..=days_in_year).contains(&ordinal) {
            return Err(self.error(format!("illegal ordinal day {ordinal:03}")));
        }

        let month = (ordinal / 30 + 1).min(12);
        let day = ordinal % 30 + 1;
        let mut date = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.checked_add_signed(Duration::days(i64::from(day) - 1)))
            .ok_or_else(|| self.error("year is out of range"))?;

        for _ in 0..MAX_ORDINAL_ROUNDS {
            let current = date.ordinal();
            if current == ordinal && date.year() == year {
                return Ok(date);
            }
            let diff = i64::from(ordinal) - i64::from(current);
            date = date
                .checked_add_signed(Duration::days(diff))
                .ok_or_else(|| self.error("year is out of range"))?;
        }

        Err(self.error(format!("ordinal day {ordinal:03} did not resolve")))
    }

    fn time(&mut self) -> CalEditResult<NaiveTime> {
        let hour = self.digits(2, "hour")?;
        let extended = self.eat(b':');
        let minute = self.digits(2, "minute")?;

        let has_seconds = if extended {
            self.eat(b':')
        } else {
            self.digit_run() >= 2
        };

        let (second, nanos) = if has_seconds {
            let second = self.digits(2, "second")?;
            (second, self.fraction()?)
        } else {
            (0, 0)
        };

        if hour > 23 {
            return Err(self.error(format!("illegal hour number {hour}")));
        }
        if minute > 59 {
            return Err(self.error(format!("illegal minutes number {minute}")));
        }
        if second > 60 {
            return Err(self.error(format!("illegal seconds number {second}")));
        }

        // A leap second is represented by chrono as second 59 with an
        // extra second's worth of nanoseconds.
        let time = if second == 60 {
            NaiveTime::from_hms_nano_opt(hour, minute, 59, NANOS_PER_SECOND + nanos)
        } else {
            NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        };
        time.ok_or_else(|| self.error("time of day is out of range"))
    }

    /// Optional `.fff` or `,fff`, returned as nanoseconds.
    fn fraction(&mut self) -> CalEditResult<u32> {
        if !(self.eat(b'.') || self.eat(b',')) {
            return Ok(0);
        }
        let run = self.digit_run();
        if run == 0 {
            return Err(self.error("expected digits after the decimal mark"));
        }
        let mut nanos = 0u32;
        for (i, b) in self.bytes[self.pos..self.pos + run].iter().enumerate() {
            if i < 9 {
                nanos = nanos * 10 + u32::from(b - b'0');
            }
        }
        for _ in run..9 {
            nanos *= 10;
        }
        self.pos += run;
        Ok(nanos)
    }

    fn timezone(&mut self) -> CalEditResult<FixedOffset> {
        if self.eat(b'Z') {
            return FixedOffset::east_opt(0).ok_or_else(|| self.error("invalid offset"));
        }

        let east = match self.peek() {
            Some(b'+') => true,
            Some(b'-') => false,
            Some(_) => return Err(self.error("expected timezone designator 'Z' or '±hh:mm'")),
            None => return Err(self.error("missing timezone designator")),
        };
        self.pos += 1;

        let hours = self.digits(2, "offset hours")?;
        let minutes = if self.eat(b':') {
            self.digits(2, "offset minutes")?
        } else if self.digit_run() >= 2 {
            self.digits(2, "offset minutes")?
        } else {
            0
        };

        if hours > 23 || minutes > 59 {
            return Err(self.error(format!("illegal offset {hours:02}:{minutes:02}")));
        }

        let seconds = (hours * 3600 + minutes * 60) as i32;
        let offset = if east {
            FixedOffset::east_opt(seconds)
        } else {
            FixedOffset::west_opt(seconds)
        };
        offset.ok_or_else(|| self.error("invalid offset"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().fixed_offset()
    }

    #[test]
    fn parses_extended_date_time_with_offset() {
        let parsed = parse("2010-01-03T10:00:00.000-05:00").unwrap();
        assert_eq!(parsed, utc(2010, 1, 3, 15, 0, 0));
        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn parses_utc_designator() {
        assert_eq!(parse("2011-06-13T09:20:00Z").unwrap(), utc(2011, 6, 13, 9, 20, 0));
    }

    #[test]
    fn parses_basic_forms() {
        assert_eq!(parse("20110613T0920Z").unwrap(), utc(2011, 6, 13, 9, 20, 0));
        assert_eq!(parse("20110613T092030+0100").unwrap(), utc(2011, 6, 13, 8, 20, 30));
    }

    #[test]
    fn time_separator_may_be_omitted() {
        assert_eq!(parse("2011-06-1309:20Z").unwrap(), utc(2011, 6, 13, 9, 20, 0));
    }

    #[test]
    fn date_only_is_midnight_utc() {
        assert_eq!(parse("2011-06-13").unwrap(), utc(2011, 6, 13, 0, 0, 0));
        assert_eq!(parse("2011-06").unwrap(), utc(2011, 6, 1, 0, 0, 0));
        assert_eq!(parse("2011").unwrap(), utc(2011, 1, 1, 0, 0, 0));
    }

    #[test]
    fn offset_minutes_are_optional() {
        assert_eq!(parse("2011-06-13T09:20+02").unwrap(), utc(2011, 6, 13, 7, 20, 0));
    }

    #[test]
    fn ordinal_dates_resolve_to_calendar_dates() {
        assert_eq!(parse("2011-001").unwrap(), utc(2011, 1, 1, 0, 0, 0));
        assert_eq!(parse("2011-060").unwrap(), utc(2011, 3, 1, 0, 0, 0));
        assert_eq!(parse("2012-060").unwrap(), utc(2012, 2, 29, 0, 0, 0));
        assert_eq!(parse("2011365").unwrap(), utc(2011, 12, 31, 0, 0, 0));
        assert_eq!(parse("2012-366T12:00Z").unwrap(), utc(2012, 12, 31, 12, 0, 0));
    }

    #[test]
    fn every_ordinal_day_resolves() {
        for year in [2011, 2012, 1900, 2000] {
            let days = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 };
            for ordinal in 1..=days {
                let parsed = parse(&format!("{year}-{ordinal:03}")).unwrap();
                assert_eq!(parsed.ordinal(), ordinal);
                assert_eq!(parsed.year(), year);
            }
        }
    }

    #[test]
    fn ordinal_out_of_range_is_rejected() {
        assert!(parse("2011-366").is_err());
        assert!(parse("2011-000").is_err());
    }

    #[test]
    fn fractional_seconds_accept_comma() {
        let parsed = parse("2011-06-13T09:20:30,5Z").unwrap();
        assert_eq!(parsed.nanosecond(), 500_000_000);
    }

    #[test]
    fn leap_second_is_accepted() {
        let parsed = parse("2016-12-31T23:59:60Z").unwrap();
        assert_eq!(format(&parsed), "2016-12-31T23:59:60Z");
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        for input in [
            "2011-13-01",
            "2011-00-01",
            "2011-01-32",
            "2011-02-30",
            "2011-06-13T24:00Z",
            "2011-06-13T09:60Z",
            "2011-06-13T09:20:61Z",
            "2011-06-13T09:20+24:00",
        ] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, CalEditError::MalformedTimestamp { .. }),
                "{input} gave {err:?}"
            );
        }
    }

    #[test]
    fn time_requires_timezone() {
        assert!(parse("2011-06-13T09:20:00").is_err());
    }

    #[test]
    fn mixed_date_separators_are_rejected() {
        assert!(parse("2011-0613").is_err());
        assert!(parse("201106-13").is_err());
    }

    #[test]
    fn trailing_text_is_rejected() {
        let err = parse("2011-06-13T09:20Zjunk").unwrap_err();
        assert!(err.to_string().contains("trailing"));
        assert!(parse("").is_err());
        assert!(parse("yesterday").is_err());
    }

    #[test]
    fn format_is_minimal() {
        assert_eq!(format(&utc(2011, 6, 13, 9, 20, 0)), "2011-06-13T09:20Z");
        assert_eq!(format(&utc(2011, 6, 13, 9, 20, 5)), "2011-06-13T09:20:05Z");

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = utc(2011, 6, 13, 14, 20, 0).with_timezone(&offset);
        assert_eq!(format(&local), "2011-06-13T09:20-05:00");
    }

    #[test]
    fn format_rounds_fraction_to_hundredths() {
        let parsed = parse("2011-06-13T09:20:00.456+05:30").unwrap();
        assert_eq!(format(&parsed), "2011-06-13T09:20:00.46+05:30");
    }

    #[test]
    fn fraction_rounding_carries_into_seconds() {
        let parsed = parse("2011-06-13T09:20:00.999Z").unwrap();
        assert_eq!(format(&parsed), "2011-06-13T09:20:01Z");

        let parsed = parse("2011-06-13T09:20:59.996Z").unwrap();
        assert_eq!(format(&parsed), "2011-06-13T09:21Z");

        let parsed = parse("2011-06-13T09:20:00.004Z").unwrap();
        assert_eq!(format(&parsed), "2011-06-13T09:20Z");
    }

    #[test]
    fn parse_format_parse_is_stable() {
        for input in [
            "2010-01-03T10:00:00.000-05:00",
            "2011-06-13T09:20:07Z",
            "20110613T092007+0130",
            "2012-366T23:59:59-11:00",
            "2011-06-13",
        ] {
            let first = parse(input).unwrap();
            let again = parse(&format(&first)).unwrap();
            assert_eq!(first, again, "{input}");
        }
    }

    #[test]
    fn standalone_timezone() {
        assert_eq!(parse_timezone("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_timezone("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_timezone("-0300").unwrap().local_minus_utc(), -10800);
        assert!(parse_timezone("EST").is_err());
        assert!(parse_timezone("+05:30 ").is_err());
    }

    #[test]
    fn serde_option_adapter() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Holder {
            #[serde(default, with = "super::option")]
            at: Option<DateTime<FixedOffset>>,
        }

        let holder: Holder = serde_json::from_str(r#"{"at": "2011-06-13T09:20Z"}"#).unwrap();
        assert_eq!(holder.at, Some(utc(2011, 6, 13, 9, 20, 0)));
        assert_eq!(
            serde_json::to_string(&holder).unwrap(),
            r#"{"at":"2011-06-13T09:20Z"}"#
        );

        let empty: Holder = serde_json::from_str(r#"{"at": ""}"#).unwrap();
        assert_eq!(empty.at, None);
        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.at, None);

        assert!(serde_json::from_str::<Holder>(r#"{"at": "soon"}"#).is_err());
    }
}

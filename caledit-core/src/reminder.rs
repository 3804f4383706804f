//! The `<minutes> minutes by <method>` reminder notation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalEditError, CalEditResult};

const SEPARATOR: &str = " minutes by ";

/// A reminder/alarm for an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event to trigger
    pub minutes: u32,
    /// Notification channel, e.g. "email", "sms", "popup"
    pub method: String,
}

impl Reminder {
    pub fn new(minutes: u32, method: impl Into<String>) -> Self {
        Reminder {
            minutes,
            method: method.into(),
        }
    }
}

/// Parse `"60 minutes by sms"` into a [`Reminder`].
pub fn parse(text: &str) -> CalEditResult<Reminder> {
    let malformed = || CalEditError::MalformedReminder(text.to_string());

    let (minutes, method) = text.trim().split_once(SEPARATOR).ok_or_else(malformed)?;
    let minutes = minutes.trim().parse::<u32>().map_err(|_| malformed())?;
    let method = method.trim();
    if method.is_empty() {
        return Err(malformed());
    }

    Ok(Reminder::new(minutes, method))
}

impl FromStr for Reminder {
    type Err = CalEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.minutes, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_method() {
        assert_eq!(parse("60 minutes by sms").unwrap(), Reminder::new(60, "sms"));
        assert_eq!(parse("  5 minutes by email ").unwrap(), Reminder::new(5, "email"));
    }

    #[test]
    fn missing_method_is_malformed() {
        let err = parse("60 minutes").unwrap_err();
        assert!(matches!(err, CalEditError::MalformedReminder(ref t) if t == "60 minutes"));
        assert!(parse("60 minutes by ").is_err());
    }

    #[test]
    fn non_numeric_minutes_are_malformed() {
        assert!(parse("an hour minutes by sms").is_err());
        assert!(parse("-5 minutes by sms").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn display_is_inverse_of_parse() {
        for text in ["60 minutes by sms", "0 minutes by popup", "1440 minutes by email"] {
            let reminder: Reminder = text.parse().unwrap();
            assert_eq!(reminder.to_string(), text);
        }
    }
}

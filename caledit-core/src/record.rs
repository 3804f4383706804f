//! Parsing of edited event text into records.
//!
//! Events are written as blocks of `key: value` lines separated by blank
//! lines:
//!
//! ```text
//! id: h1vqotvj45rmkaf86rr7cru8cc
//! what: Dentist Appointment
//! when: 2011-06-13 09:20:00
//! remind: 60 minutes by sms
//! remind: 5 minutes by popup
//! ```
//!
//! Values cannot span lines. A newline inside a value is written as `\n`
//! and a literal backslash as `\\`.

use std::iter::Fuse;

use tracing::debug;

/// The attributes of one text block, before action resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub id: Option<String>,
    pub what: Option<String>,
    pub when: Option<String>,
    pub until: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub remind: Vec<String>,
}

impl Record {
    /// True when no recognised attribute was found.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.what.is_none()
            && self.when.is_none()
            && self.until.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.remind.is_empty()
    }

    /// Store one attribute. Returns false for an unknown key.
    ///
    /// `remind` accumulates; every other key keeps its last value.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "id" => &mut self.id,
            "what" => &mut self.what,
            "when" => &mut self.when,
            "until" => &mut self.until,
            "where" => &mut self.location,
            "description" => &mut self.description,
            "remind" => {
                self.remind.push(value);
                return true;
            }
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Name used when reporting progress: the title, else the description,
    /// else the id.
    pub fn label(&self) -> Option<&str> {
        self.what
            .as_deref()
            .or(self.description.as_deref())
            .or(self.id.as_deref())
    }
}

/// Lazily splits lines into blank-line separated blocks and yields one
/// [`Record`] per block.
pub struct RecordParser<I: Iterator> {
    lines: Fuse<I>,
}

impl<I, S> RecordParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(lines: I) -> Self {
        RecordParser {
            lines: lines.fuse(),
        }
    }
}

impl<I, S> Iterator for RecordParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let mut block: Option<Record> = None;

        for line in self.lines.by_ref() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                if block.is_some() {
                    return block;
                }
                continue;
            }

            let record = block.get_or_insert_with(Record::default);
            match parse_line(line) {
                Some((key, value)) => {
                    if !record.set(&key, value) {
                        debug!("Ignoring unknown attribute '{key}'");
                    }
                }
                None => debug!("Ignoring line without 'key: value': {line}"),
            }
        }

        block
    }
}

/// Parse records from a complete text.
pub fn parse_records(text: &str) -> RecordParser<std::str::Lines<'_>> {
    RecordParser::new(text.lines())
}

/// Split a trimmed line into key and value.
///
/// The key runs to the first colon not preceded by a backslash; the value
/// is everything after it, including further colons.
fn parse_line(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut escaped = false;
    let mut colon_at = None;

    for (i, c) in line.char_indices() {
        if escaped {
            if c != ':' {
                key.push('\\');
            }
            key.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ':' => {
                colon_at = Some(i);
                break;
            }
            _ => key.push(c),
        }
    }

    let colon_at = colon_at?;
    let key = key.trim_end();
    if key.is_empty() {
        return None;
    }

    let value = line[colon_at + 1..].trim_start();
    Some((key.to_string(), unescape_value(value)))
}

/// Escape a value so it fits on a single line.
pub(crate) fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

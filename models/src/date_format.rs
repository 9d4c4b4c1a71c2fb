//! Date and time patterns as written in pact documents.
//!
//! Pact files use `SimpleDateFormat` style patterns (`yyyy-MM-dd'T'HH:mm:ss`);
//! they are translated to `chrono` format strings for parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Default pattern for date generators and matchers.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";
/// Default pattern for time generators and matchers.
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm:ss";
/// Default pattern for timestamp generators.
pub const DEFAULT_DATETIME_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ss";

/// Translate a pattern such as `yyyy-MM-dd'T'HH:mm:ss.SSSXXX` into the
/// equivalent `chrono` format string.
#[must_use]
pub fn to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // '' is an escaped quote, otherwise a quoted literal runs to the next quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        i += run;
        let spec = match (c, run) {
            ('y' | 'u', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('H', _) => "%H",
            ('k', _) => "%k",
            ('h', _) => "%I",
            ('K', _) => "%l",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', 3) => "%3f",
            ('S', 6) => "%6f",
            ('S', 9) => "%9f",
            ('S', _) => "%f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('Z', _) => "%z",
            ('X' | 'x', 1) => "%z",
            ('X' | 'x', _) => "%:z",
            ('z', _) => "%Z",
            _ => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn has_zone(chrono_format: &str) -> bool {
    chrono_format.contains("%z") || chrono_format.contains("%:z")
}

/// Check that a value is a date in the pattern (ISO date when empty).
///
/// # Errors
///
/// Returns the parse failure as a message.
pub fn validate_date(value: &str, pattern: &str) -> Result<(), String> {
    let pattern = if pattern.is_empty() { DEFAULT_DATE_FORMAT } else { pattern };
    NaiveDate::parse_from_str(value, &to_chrono_format(pattern))
        .map(|_| ())
        .map_err(|err| err.to_string())
}

/// Check that a value is a time in the pattern (ISO time when empty).
///
/// # Errors
///
/// Returns the parse failure as a message.
pub fn validate_time(value: &str, pattern: &str) -> Result<(), String> {
    let pattern = if pattern.is_empty() { DEFAULT_TIME_FORMAT } else { pattern };
    let format = to_chrono_format(pattern);
    if has_zone(&format) {
        // chrono needs a date to parse an offset, so anchor the value on a fixed day
        DateTime::parse_from_str(&format!("2000-01-01 {value}"), &format!("%Y-%m-%d {format}"))
            .map(|_| ())
            .map_err(|err| err.to_string())
    } else {
        NaiveTime::parse_from_str(value, &format)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// Check that a value is a timestamp in the pattern. With an empty pattern,
/// RFC 3339 and ISO local date-times are accepted.
///
/// # Errors
///
/// Returns the parse failure as a message.
pub fn validate_timestamp(value: &str, pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return DateTime::parse_from_rfc3339(value)
            .map(|_| ())
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|_| ()))
            .map_err(|err| err.to_string());
    }
    let format = to_chrono_format(pattern);
    if has_zone(&format) {
        DateTime::parse_from_str(value, &format)
            .map(|_| ())
            .map_err(|err| err.to_string())
    } else {
        NaiveDateTime::parse_from_str(value, &format)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

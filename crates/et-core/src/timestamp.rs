//! Timestamp extraction from free-form log lines.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Canonical output format: date, time and a six-digit fraction.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const PARSE_FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";
const PARSE_FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

static FRACTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+)").expect("valid timestamp regex")
});

static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})").expect("valid timestamp regex")
});

/// Pulls the first timestamp out of a log line.
///
/// A timestamp with a sub-second fraction is preferred anywhere in the line;
/// failing that, a whole-second timestamp is accepted with a zero fraction.
/// Returns `None` when neither form is present or the matched text is not a
/// valid calendar date.
pub fn extract_timestamp(line: &str) -> Option<NaiveDateTime> {
    if let Some(m) = FRACTIONAL_RE.find(line) {
        return NaiveDateTime::parse_from_str(m.as_str(), PARSE_FORMAT_FRACTIONAL).ok();
    }

    let m = SECONDS_RE.find(line)?;
    NaiveDateTime::parse_from_str(m.as_str(), PARSE_FORMAT_SECONDS).ok()
}

/// Formats a timestamp in the canonical high-precision form.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

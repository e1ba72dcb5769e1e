use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::ObjectError;

/// An identity plus timestamp as it appears in commit and tag headers:
/// `Name <email> 1700000000 +0000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g. -300 for EST).
    pub tz_offset: i32,
}

impl Signature {
    /// Create a signature stamped with the current local time.
    pub fn now(name: impl Into<BString>, email: impl Into<BString>) -> Self {
        let now = Local::now();
        Self {
            name: name.into(),
            email: email.into(),
            timestamp: now.timestamp(),
            tz_offset: now.offset().local_minus_utc() / 60,
        }
    }

    /// Parse from git format: `Name <email> timestamp ±HHMM`.
    pub fn parse(input: &BStr) -> Result<Self, ObjectError> {
        let input = input.as_bytes();

        // Split off the date portion at the last '>'.
        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '>'".into()))?;
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '<'".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];

        let date_str = std::str::from_utf8(input[gt_pos + 1..].trim())
            .map_err(|_| ObjectError::InvalidSignature("non-UTF-8 date".into()))?;
        let (timestamp, tz_offset) = parse_raw_date(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            timestamp,
            tz_offset,
        })
    }

    /// Format in git's canonical form: `Name <email> timestamp ±HHMM`.
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::from(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(format!("{} {}", self.timestamp, format_tz(self.tz_offset)).as_bytes());
        out
    }
}

/// Parse the raw date portion `"<secs> ±HHMM"`.
pub fn parse_raw_date(input: &str) -> Result<(i64, i32), ObjectError> {
    let mut parts = input.split_whitespace();
    let ts_str = parts
        .next()
        .ok_or_else(|| ObjectError::InvalidSignature("missing timestamp".into()))?;
    let tz_str = parts
        .next()
        .ok_or_else(|| ObjectError::InvalidSignature("missing timezone".into()))?;

    let timestamp: i64 = ts_str
        .parse()
        .map_err(|_| ObjectError::InvalidSignature(format!("bad timestamp: {ts_str}")))?;

    // Timezone is the decimal form ±HHMM.
    let tz: i32 = tz_str
        .parse()
        .map_err(|_| ObjectError::InvalidSignature(format!("bad timezone: {tz_str}")))?;
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    let minutes = sign * ((abs / 100) * 60 + abs % 100);

    Ok((timestamp, minutes))
}

/// Format a minutes-from-UTC offset as git's `±HHMM`.
fn format_tz(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { -1 } else { 1 };
    let abs = offset_minutes.unsigned_abs() as i32;
    format!("{:+05}", sign * ((abs / 60) * 100 + abs % 60))
}

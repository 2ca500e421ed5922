use serde::Deserialize;
use std::fmt;

/// Time unit for wait values (task delays, intervals, heartbeats)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    /// Parse TimeUnit from its full name, singular or plural, any case
    /// ("milliseconds", "Second", ...).
    /// For shorthand notations like "5s", "10m", use `parse_duration` instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "millisecond" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "second" | "seconds" => Ok(TimeUnit::Seconds),
            "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "hour" | "hours" => Ok(TimeUnit::Hours),
            "day" | "days" => Ok(TimeUnit::Days),
            _ => Err(format!("Invalid time unit: {}", s)),
        }
    }
}

impl TimeUnit {
    /// Convert `value` in this unit to milliseconds, `None` on overflow.
    pub fn to_millis(&self, value: u64) -> Option<u64> {
        let factor = match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Days => 86_400_000,
        };
        value.checked_mul(factor)
    }

    /// Parse a duration string like "5s", "10m", "2h", "500ms"
    ///
    /// Only lowercase suffixes are accepted and no whitespace is allowed
    /// between the number and the suffix.
    pub fn parse_duration(s: &str) -> Option<(u64, TimeUnit)> {
        let s = s.trim();
        let split_pos = s.find(|c: char| !c.is_ascii_digit())?;
        if split_pos == 0 {
            return None;
        }

        let (num_str, unit_str) = s.split_at(split_pos);
        let value = num_str.parse::<u64>().ok()?;

        let time_unit = match unit_str {
            "ms" => TimeUnit::Milliseconds,
            "s" => TimeUnit::Seconds,
            "m" => TimeUnit::Minutes,
            "h" => TimeUnit::Hours,
            "d" => TimeUnit::Days,
            _ => return None,
        };

        Some((value, time_unit))
    }

    /// Parse a spelled-out duration like "5 seconds" or "1 Minute".
    pub fn parse_spelled(s: &str) -> Option<(u64, TimeUnit)> {
        let mut parts = s.split_whitespace();
        let (num_str, unit_str) = (parts.next()?, parts.next()?);
        if parts.next().is_some() || !num_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = num_str.parse::<u64>().ok()?;
        let time_unit = unit_str.parse::<TimeUnit>().ok()?;
        Some((value, time_unit))
    }
}

/// Parse a wait given as plain milliseconds ("250"), shorthand ("5s") or
/// spelled out ("5 seconds").
pub fn parse_millis(s: &str) -> Option<u64> {
    let s = s.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    let (value, unit) = TimeUnit::parse_duration(s).or_else(|| TimeUnit::parse_spelled(s))?;
    unit.to_millis(value)
}

/// A wait as it appears in task parameters or scheduler options.
///
/// Config files and callers may give either a number of milliseconds or a
/// duration shorthand; the text form is only resolved when the value is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WaitValue {
    Millis(u64),
    Text(String),
}

impl WaitValue {
    /// Resolve to milliseconds, handing back the offending text on failure.
    pub fn to_millis(&self) -> Result<u64, String> {
        match self {
            WaitValue::Millis(ms) => Ok(*ms),
            WaitValue::Text(text) => parse_millis(text).ok_or_else(|| text.clone()),
        }
    }
}

impl Default for WaitValue {
    fn default() -> Self {
        WaitValue::Millis(0)
    }
}

impl fmt::Display for WaitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitValue::Millis(ms) => write!(f, "{}ms", ms),
            WaitValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for WaitValue {
    fn from(ms: u64) -> Self {
        WaitValue::Millis(ms)
    }
}

impl From<&str> for WaitValue {
    fn from(text: &str) -> Self {
        WaitValue::Text(text.to_string())
    }
}

impl From<String> for WaitValue {
    fn from(text: String) -> Self {
        WaitValue::Text(text)
    }
}

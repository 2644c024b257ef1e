//! TTL Normalization Module
//!
//! Turns the loosely-typed TTL argument accepted by `TtlStore::set` into a
//! well-formed expiration policy. Nothing here ever fails: inputs that cannot
//! be read as a number degrade to "no expiration".

use std::time::Duration;

use serde_json::Value;

// == Raw TTL ==
/// A TTL argument as supplied by a caller, before normalization.
///
/// Values are measured in milliseconds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawTtl {
    /// No TTL argument was given
    #[default]
    Absent,
    /// An explicit null
    Null,
    /// A numeric TTL, possibly fractional or negative
    Number(f64),
    /// A textual TTL such as `"10"` or `" 2.5 "`
    Text(String),
    /// Anything else (booleans, arrays, objects)
    Other,
}

// == Normalized TTL ==
/// Outcome of normalizing a present, numeric TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Expire once this much time has elapsed since insertion
    Expires(Duration),
    /// A negative TTL; the entry must not be stored
    Negative,
}

/// Normalizes a raw TTL.
///
/// Returns `None` when the entry should never expire: the TTL was absent,
/// null, or not a number. Otherwise returns the expiration policy.
pub fn normalize_ttl(raw: &RawTtl) -> Option<Ttl> {
    let millis = match raw {
        RawTtl::Absent | RawTtl::Null | RawTtl::Other => return None,
        RawTtl::Number(n) => *n,
        RawTtl::Text(s) => parse_millis(s)?,
    };

    if millis.is_nan() {
        return None;
    }
    if millis < 0.0 {
        return Some(Ttl::Negative);
    }
    Some(Ttl::Expires(millis_to_duration(millis)))
}

/// Parses a numeric string, ignoring surrounding whitespace.
fn parse_millis(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Converts non-negative milliseconds to a `Duration` at nanosecond
/// resolution, saturating at `Duration::MAX`.
fn millis_to_duration(millis: f64) -> Duration {
    let nanos = millis * 1_000_000.0;
    if nanos >= u64::MAX as f64 {
        return Duration::MAX;
    }
    // `-0.0` lands here as zero
    Duration::from_nanos(nanos.max(0.0) as u64)
}

/// Converts a `Duration` back to fractional milliseconds.
pub fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_nanos()) / 1_000_000.0
}

// == Conversions ==
macro_rules! raw_ttl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RawTtl {
                fn from(value: $ty) -> Self {
                    RawTtl::Number(value as f64)
                }
            }
        )*
    };
}

raw_ttl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for RawTtl {
    fn from(value: &str) -> Self {
        RawTtl::Text(value.to_string())
    }
}

impl From<String> for RawTtl {
    fn from(value: String) -> Self {
        RawTtl::Text(value)
    }
}

impl From<()> for RawTtl {
    fn from(_: ()) -> Self {
        RawTtl::Absent
    }
}

impl<T: Into<RawTtl>> From<Option<T>> for RawTtl {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawTtl::Absent, Into::into)
    }
}

impl From<&Value> for RawTtl {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawTtl::Null,
            Value::Number(n) => n.as_f64().map_or(RawTtl::Other, RawTtl::Number),
            Value::String(s) => RawTtl::Text(s.clone()),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => RawTtl::Other,
        }
    }
}

impl From<Value> for RawTtl {
    fn from(value: Value) -> Self {
        RawTtl::from(&value)
    }
}

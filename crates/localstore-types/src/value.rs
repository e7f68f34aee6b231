//! Dynamically-typed value cell held by the store cache.
//!
//! A [`Value`] is stored untyped and given a type on read through the
//! coercion methods (`to_i32`, `to_f32`, `to_text`, ...). The numeric
//! rules follow conventional narrowing: integers and floats convert into
//! each other, floats truncate toward zero, and a 64-bit float read as
//! 32-bit loses precision.
//!
//! # JSON mapping
//!
//! | Variant    | Written as          | Read back as |
//! |------------|---------------------|--------------|
//! | `Null`     | `null`              | `Null`       |
//! | `Bool`     | `true` / `false`    | `Bool`       |
//! | `Int`      | integer number      | `Int`        |
//! | `Float`    | number with fraction| `Float`      |
//! | `String`   | string              | `String`     |
//! | `DateTime` | RFC 3339 string     | `String`     |
//! | `Object`   | nested JSON         | `Object`     |

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::{LocalStoreError, Result};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A scalar or structured payload stored under a key.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Explicit absence of a value (JSON `null`).
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer; 32-bit inputs are widened.
    Int(i64),
    /// Floating point number; 32-bit inputs are widened.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Arbitrary structured tree (mapping or sequence).
    Object(JsonValue),
}

impl Value {
    /// Returns a short lowercase name of the variant, used in error
    /// messages and listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Object(_) => "object",
        }
    }

    /// Converts the value into its JSON form.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::DateTime(dt) => JsonValue::String(format_datetime(dt)),
            Self::Object(tree) => tree.clone(),
        }
    }

    /// Builds a value from a loosely-typed JSON decode.
    ///
    /// Integers that do not fit in `i64` fall back to `Float`.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::String(s),
            tree @ (JsonValue::Array(_) | JsonValue::Object(_)) => Self::Object(tree),
        }
    }

    // -- Coercions -------------------------------------------------------

    /// Coerces to a 64-bit integer.
    ///
    /// Floats truncate toward zero; booleans map to `1`/`0`; strings are
    /// parsed as an integer, then as a float.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::TypeMismatch`] for null, timestamps, objects,
    /// unparsable strings, NaN, and floats outside the `i64` range.
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            Self::Float(f) => truncate_float(*f, "long"),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(i);
                }
                match trimmed.parse::<f64>() {
                    Ok(f) => truncate_float(f, "long"),
                    Err(_) => Err(LocalStoreError::TypeMismatch {
                        reason: format!("string {s:?} is not a number"),
                    }),
                }
            }
            other => Err(mismatch(other, "long")),
        }
    }

    /// Coerces to a 32-bit integer with the same rules as
    /// [`to_i64`](Self::to_i64), plus a range check.
    pub fn to_i32(&self) -> Result<i32> {
        let wide = self.to_i64().map_err(|e| retarget(e, self, "int"))?;
        i32::try_from(wide).map_err(|_| LocalStoreError::TypeMismatch {
            reason: format!("{wide} does not fit in a 32-bit int"),
        })
    }

    /// Coerces to a 64-bit float.
    ///
    /// Integers convert (large magnitudes round); booleans map to
    /// `1.0`/`0.0`; strings are parsed.
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(i) => Ok(*i as f64),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse::<f64>().map_err(|_| {
                LocalStoreError::TypeMismatch {
                    reason: format!("string {s:?} is not a number"),
                }
            }),
            other => Err(mismatch(other, "double")),
        }
    }

    /// Coerces to a 32-bit float.
    ///
    /// Narrowing from `f64` rounds to the nearest representable `f32`, so
    /// a double-precision value generally does not survive exactly.
    pub fn to_f32(&self) -> Result<f32> {
        let wide = self.to_f64().map_err(|e| retarget(e, self, "float"))?;
        Ok(wide as f32)
    }

    /// Coerces to a boolean.
    ///
    /// Accepts booleans, the strings `true`/`false` (any case), and
    /// numbers (non-zero is `true`).
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(i) => Ok(*i != 0),
            Self::Float(f) => Ok(*f != 0.0),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(LocalStoreError::TypeMismatch {
                        reason: format!("string {s:?} is not a boolean"),
                    })
                }
            }
            other => Err(mismatch(other, "bool")),
        }
    }

    /// Returns the canonical text form of the value.
    ///
    /// Objects render as compact JSON, timestamps as RFC 3339.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Self::Null => Err(mismatch(self, "string")),
            other => Ok(other.to_string()),
        }
    }

    /// Coerces to a UTC timestamp.
    ///
    /// Strings are parsed as RFC 3339 (the form timestamps take after a
    /// save/load round trip); integers are Unix seconds.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Ok(*dt),
            Self::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| LocalStoreError::TypeMismatch {
                    reason: format!("string {s:?} is not an RFC 3339 timestamp: {e}"),
                }),
            Self::Int(secs) => Utc.timestamp_opt(*secs, 0).single().ok_or_else(|| {
                LocalStoreError::TypeMismatch {
                    reason: format!("{secs} is out of range for a timestamp"),
                }
            }),
            other => Err(mismatch(other, "datetime")),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn mismatch(value: &Value, requested: &str) -> LocalStoreError {
    LocalStoreError::TypeMismatch {
        reason: format!("stored {} cannot be read as {requested}", value.kind()),
    }
}

/// Rewrites a kind-mismatch raised by a wider coercion so it names the
/// accessor the caller actually used.
fn retarget(err: LocalStoreError, value: &Value, requested: &str) -> LocalStoreError {
    match value {
        Value::Null | Value::DateTime(_) | Value::Object(_) => mismatch(value, requested),
        _ => err,
    }
}

fn truncate_float(f: f64, requested: &str) -> Result<i64> {
    let truncated = f.trunc();
    // i64::MIN as f64 is exact (-2^63); i64::MAX as f64 rounds up to 2^63.
    if truncated.is_nan() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(LocalStoreError::TypeMismatch {
            reason: format!("{f} cannot be read as {requested}"),
        });
    }
    Ok(truncated as i64)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            Self::Object(tree) => write!(f, "{tree}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Self::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Widens through the shortest decimal that round-trips the `f32`, so
/// `101.0234_f32` is stored and printed as `101.0234` rather than its
/// exact binary expansion. Narrowing back with [`Value::to_f32`] yields
/// the original value.
impl From<f32> for Value {
    fn from(f: f32) -> Self {
        let wide = f
            .to_string()
            .parse::<f64>()
            .unwrap_or_else(|_| f64::from(f));
        Self::Float(wide)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Self::from_json(json)
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Object(tree) => tree.serialize(serializer),
            other => other.to_json().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Self::from_json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

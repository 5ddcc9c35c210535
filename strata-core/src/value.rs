//! ## strata-core::value
//! **Sum-typed values carried on the data bus and in metric maps**
//!
//! Streams exchange data through string keys mapping to [`Value`]. Readers
//! get an `Option` back and decide their own default; an absent key is a
//! normal condition, never an engine error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between a stream name and its metric key (`price.last`).
pub const NAMESPACE_SEPARATOR: char = '.';

/// A flat, ordered metric map. Ordering is by key so serialisation is stable.
pub type Metrics = BTreeMap<String, Value>;

/// Keyword parameters handed to factories and stored into a context.
pub type Params = BTreeMap<String, Value>;

/// Prefixes `key` with `prefix` and [`NAMESPACE_SEPARATOR`].
#[inline]
pub fn namespaced(prefix: &str, key: &str) -> String {
    format!("{prefix}{NAMESPACE_SEPARATOR}{key}")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<f64>),
}

impl Value {
    /// Numeric view; booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness: null, false, zero, empty string and empty list are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(v) => !v.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// Int and Float compare numerically so `1 == 1.0` holds for parameter filters.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write_float(f, *v),
            Value::Str(s) => f.write_str(s),
            Value::List(v) => write!(f, "{v:?}"),
        }
    }
}

/// Shortest round-trip form with the fractional part kept (`1.0`), and a
/// signed two-digit exponent outside `[1e-4, 1e16)`: `1e-07`, `1.5e+16`.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        return f.write_str("nan");
    }
    let repr = format!("{v:?}");
    match repr.split_once('e') {
        None => f.write_str(&repr),
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            write!(f, "{mantissa}e{sign}{digits:0>2}")
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(Value::Int)
            .unwrap_or(Value::Float(v as f64))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// The shared blackboard streams publish to and read from within an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBus {
    entries: BTreeMap<String, Value>,
}

impl DataBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Numeric read; `None` when the key is unset or not numeric.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(Value::as_f64)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Params> for DataBus {
    fn from(entries: Params) -> Self {
        Self { entries }
    }
}

impl Extend<(String, Value)> for DataBus {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numeric_values_compare_across_variants() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Float(1.5));
        assert_ne!(Value::Int(1), Value::Str("1".into()));
        assert_ne!(Value::Bool(true), Value::Int(1));
    }

    #[test]
    fn display_keeps_float_fraction() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Float(1e-7).to_string(), "1e-07");
        assert_eq!(Value::Float(1e16).to_string(), "1e+16");
        assert_eq!(Value::Float(-1.5e-300).to_string(), "-1.5e-300");
        assert_eq!(Value::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Float(f64::NAN).to_string(), "nan");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Value::from("x").to_string(), "x");
    }

    #[test]
    fn untagged_json_picks_narrowest_variant() {
        let parsed: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 2.5, "a", [1.0, 2.0]]"#)
            .expect("valid json");
        assert!(matches!(parsed[0], Value::Null));
        assert!(matches!(parsed[1], Value::Bool(true)));
        assert!(matches!(parsed[2], Value::Int(3)));
        assert!(matches!(parsed[3], Value::Float(v) if v == 2.5));
        assert_eq!(parsed[4].as_str(), Some("a"));
        assert_eq!(parsed[5].as_list(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn data_bus_reads_default_to_none() {
        let mut bus = DataBus::new();
        assert_eq!(bus.get_f64("price.price"), None);
        bus.insert("price.price", 101.5);
        assert_eq!(bus.get_f64("price.price"), Some(101.5));
        bus.insert("label", "up");
        assert_eq!(bus.get_f64("label"), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::from("").is_truthy());
    }

    proptest! {
        #[test]
        fn integral_floats_equal_their_ints(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(Value::Int(n), Value::Float(n as f64));
            prop_assert_eq!(Value::from(n).as_f64(), Some(n as f64));
        }

        #[test]
        fn json_round_trip_keeps_scalars(x in -1.0e6f64..1.0e6, s in "[a-z]{0,8}") {
            let values = vec![Value::Float(x), Value::Str(s)];
            let json = serde_json::to_string(&values).unwrap();
            let back: Vec<Value> = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, values);
        }
    }
}

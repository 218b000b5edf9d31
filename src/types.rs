//! Logical column types and dynamically typed scalar values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The closed set of column types a [`Table`](crate::Table) can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    Utf8,
    Bool,
}

impl DataType {
    /// Stable one-byte tag used by the on-disk format.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Int64 => 1,
            Self::Float64 => 2,
            Self::Utf8 => 3,
            Self::Bool => 4,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Int64),
            2 => Some(Self::Float64),
            3 => Some(Self::Utf8),
            4 => Some(Self::Bool),
            _ => None,
        }
    }

    /// Width in bytes of one stored value, or `None` for variable-width types.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int64 | Self::Float64 => Some(8),
            Self::Utf8 | Self::Bool => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "utf8",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A single, dynamically typed cell.
///
/// `Value` is totally ordered and hashable so it can serve as a grouping key.
/// Floats compare with IEEE total ordering and hash by bit pattern, which
/// makes `NaN == NaN` and `-0.0 != 0.0`. Across variants the order is
/// `Null < Bool < Int64 < Float64 < Utf8`.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Bool(bool),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The type of a non-null value.
    #[must_use]
    pub const fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int64(_) => Some(DataType::Int64),
            Self::Float64(_) => Some(DataType::Float64),
            Self::Utf8(_) => Some(DataType::Utf8),
            Self::Bool(_) => Some(DataType::Bool),
        }
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.data_type()
            .map_or_else(|| "null".to_string(), |t| t.to_string())
    }

    /// Canonical text form: integers without leading zeros, floats in shortest
    /// round-trip form, strings as-is, `true`/`false`. `None` for null.
    #[must_use]
    pub fn to_canonical_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int64(v) => Some(v.to_string()),
            Self::Float64(v) => Some(v.to_string()),
            Self::Utf8(v) => Some(v.clone()),
            Self::Bool(v) => Some(v.to_string()),
        }
    }

    /// Convert into `target`, widening integers to floats and rendering
    /// anything as text. Returns `None` when no lossless conversion exists.
    #[must_use]
    pub fn cast(&self, target: DataType) -> Option<Self> {
        match (self, target) {
            (Self::Null, _) => Some(Self::Null),
            (v, t) if v.data_type() == Some(t) => Some(v.clone()),
            (Self::Int64(v), DataType::Float64) => Some(Self::Float64(*v as f64)),
            (v, DataType::Utf8) => v.to_canonical_string().map(Self::Utf8),
            (Self::Utf8(s), t) => Self::parse_as(s, t),
            _ => None,
        }
    }

    /// Parse text as a value of the given type.
    #[must_use]
    pub fn parse_as(text: &str, target: DataType) -> Option<Self> {
        match target {
            DataType::Int64 => text.parse().ok().map(Self::Int64),
            DataType::Float64 => text.parse().ok().map(Self::Float64),
            DataType::Utf8 => Some(Self::Utf8(text.to_string())),
            DataType::Bool => match text {
                "true" | "TRUE" | "True" => Some(Self::Bool(true)),
                "false" | "FALSE" | "False" => Some(Self::Bool(false)),
                _ => None,
            },
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int64(_) => 2,
            Self::Float64(_) => 3,
            Self::Utf8(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => a.cmp(b),
            (Self::Float64(a), Self::Float64(b)) => a.total_cmp(b),
            (Self::Utf8(a), Self::Utf8(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.to_bits().hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Bool(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_canonical_string() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NA"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

//! Predicates over partition columns, used to prune fragments before reading.

use super::partition::PartitionKey;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

type KeyPredicate = dyn Fn(&PartitionKey) -> bool + Send + Sync;

/// A boolean expression evaluated against each fragment's [`PartitionKey`].
///
/// Literals are compared with exact typed equality after being cast to the
/// partition column's type, so `eq("Month", 5)` matches an `Int64` column and
/// `eq("Month", "5")` does too.
#[derive(Clone)]
pub enum PartitionFilter {
    Eq(String, Value),
    IsIn(String, Vec<Value>),
    IsNull(String),
    Not(Box<PartitionFilter>),
    And(Box<PartitionFilter>, Box<PartitionFilter>),
    Or(Box<PartitionFilter>, Box<PartitionFilter>),
    Custom(Arc<KeyPredicate>),
}

impl PartitionFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::IsIn(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    /// Arbitrary predicate over the whole key; not checked against the schema.
    pub fn custom(f: impl Fn(&PartitionKey) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Resolve column names against the partition schema and cast literals
    /// to the column types.
    ///
    /// # Errors
    /// [`Error::UnknownColumn`] for a column that is not a partition column,
    /// [`Error::TypeMismatch`] for a literal that cannot be cast.
    pub fn bind(&self, partitions: &Schema) -> Result<Self> {
        let cast = |column: &str, v: &Value| -> Result<Value> {
            let field = partitions
                .field(column)
                .ok_or_else(|| Error::unknown_column(column))?;
            v.cast(field.data_type).ok_or_else(|| Error::TypeMismatch {
                column: column.to_string(),
                expected: field.data_type,
                found: v.type_name(),
            })
        };
        Ok(match self {
            Self::Eq(c, v) => Self::Eq(c.clone(), cast(c, v)?),
            Self::IsIn(c, vs) => Self::IsIn(
                c.clone(),
                vs.iter().map(|v| cast(c, v)).collect::<Result<_>>()?,
            ),
            Self::IsNull(c) => {
                if partitions.field(c).is_none() {
                    return Err(Error::unknown_column(c.as_str()));
                }
                Self::IsNull(c.clone())
            }
            Self::Not(f) => Self::Not(Box::new(f.bind(partitions)?)),
            Self::And(a, b) => Self::And(Box::new(a.bind(partitions)?), Box::new(b.bind(partitions)?)),
            Self::Or(a, b) => Self::Or(Box::new(a.bind(partitions)?), Box::new(b.bind(partitions)?)),
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        })
    }

    /// Evaluate against a key. Comparisons with null are false.
    #[must_use]
    pub fn matches(&self, key: &PartitionKey) -> bool {
        let non_null = |c: &str| key.get(c).filter(|v| !v.is_null());
        match self {
            Self::Eq(c, v) => !v.is_null() && non_null(c) == Some(v),
            Self::IsIn(c, vs) => non_null(c).is_some_and(|k| vs.contains(k)),
            Self::IsNull(c) => key.get(c).is_some_and(Value::is_null),
            Self::Not(f) => !f.matches(key),
            Self::And(a, b) => a.matches(key) && b.matches(key),
            Self::Or(a, b) => a.matches(key) || b.matches(key),
            Self::Custom(f) => f(key),
        }
    }
}

impl fmt::Debug for PartitionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq(c, v) => write!(f, "{c} == {v}"),
            Self::IsIn(c, vs) => {
                let list: Vec<String> = vs.iter().map(ToString::to_string).collect();
                write!(f, "{c} in [{}]", list.join(", "))
            }
            Self::IsNull(c) => write!(f, "is_null({c})"),
            Self::Not(inner) => write!(f, "!({inner:?})"),
            Self::And(a, b) => write!(f, "({a:?} && {b:?})"),
            Self::Or(a, b) => write!(f, "({a:?} || {b:?})"),
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}

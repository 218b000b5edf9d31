//! Typed column storage.
//!
//! A [`ColumnBuffer`] pairs a [`ColumnData`] payload (one contiguous `Vec` per
//! type, chosen once at construction) with a validity [`Bitmap`]. Null slots
//! always hold the type's zero value (`0`, `0.0`, `""`, `false`), so two
//! buffers with the same logical content compare equal.

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use crate::schema::Field;
use crate::types::{DataType, Value};

/// Contiguous values of a single type.
#[derive(Clone, Debug)]
pub enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
    Bool(Vec<bool>),
}

impl ColumnData {
    #[must_use]
    pub fn empty(data_type: DataType) -> Self {
        Self::with_capacity(data_type, 0)
    }

    #[must_use]
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Int64 => Self::Int64(Vec::with_capacity(capacity)),
            DataType::Float64 => Self::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => Self::Utf8(Vec::with_capacity(capacity)),
            DataType::Bool => Self::Bool(Vec::with_capacity(capacity)),
        }
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::Bool(_) => DataType::Bool,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Utf8(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value; `Value::Null` appends the zero value.
    fn push(&mut self, value: &Value) -> std::result::Result<(), ()> {
        match (self, value) {
            (Self::Int64(v), Value::Null) => v.push(0),
            (Self::Float64(v), Value::Null) => v.push(0.0),
            (Self::Utf8(v), Value::Null) => v.push(String::new()),
            (Self::Bool(v), Value::Null) => v.push(false),
            (Self::Int64(v), Value::Int64(x)) => v.push(*x),
            (Self::Float64(v), Value::Float64(x)) => v.push(*x),
            (Self::Utf8(v), Value::Utf8(x)) => v.push(x.clone()),
            (Self::Bool(v), Value::Bool(x)) => v.push(*x),
            _ => return Err(()),
        }
        Ok(())
    }

    fn value(&self, idx: usize) -> Value {
        match self {
            Self::Int64(v) => Value::Int64(v[idx]),
            Self::Float64(v) => Value::Float64(v[idx]),
            Self::Utf8(v) => Value::Utf8(v[idx].clone()),
            Self::Bool(v) => Value::Bool(v[idx]),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Int64(v) => Self::Int64(rows.iter().map(|&i| v[i]).collect()),
            Self::Float64(v) => Self::Float64(rows.iter().map(|&i| v[i]).collect()),
            Self::Utf8(v) => Self::Utf8(rows.iter().map(|&i| v[i].clone()).collect()),
            Self::Bool(v) => Self::Bool(rows.iter().map(|&i| v[i]).collect()),
        }
    }

    fn extend_from(&mut self, other: &Self) -> std::result::Result<(), ()> {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => a.extend_from_slice(b),
            (Self::Float64(a), Self::Float64(b)) => a.extend_from_slice(b),
            (Self::Utf8(a), Self::Utf8(b)) => a.extend_from_slice(b),
            (Self::Bool(a), Self::Bool(b)) => a.extend_from_slice(b),
            _ => return Err(()),
        }
        Ok(())
    }
}

impl PartialEq for ColumnData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

/// One named column: typed values plus a validity bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBuffer {
    name: String,
    data: ColumnData,
    validity: Bitmap,
}

impl ColumnBuffer {
    /// Assemble a column from raw parts.
    ///
    /// Null slots are reset to the zero value so equality stays logical.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] if `validity` and `data` differ in length.
    pub fn try_new(name: impl Into<String>, mut data: ColumnData, validity: Bitmap) -> Result<Self> {
        let name = name.into();
        if data.len() != validity.len() {
            return Err(Error::InvalidTable(format!(
                "column {name}: {} values but {} validity bits",
                data.len(),
                validity.len()
            )));
        }
        if validity.count_unset() > 0 {
            zero_nulls(&mut data, &validity);
        }
        Ok(Self {
            name,
            data,
            validity,
        })
    }

    /// A column where every slot is valid.
    pub fn non_null(name: impl Into<String>, data: ColumnData) -> Self {
        let validity = Bitmap::all_set(data.len());
        Self {
            name: name.into(),
            data,
            validity,
        }
    }

    pub fn int64(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let data = ColumnData::Int64(values.into_iter().map(Option::unwrap_or_default).collect());
        Self {
            name: name.into(),
            data,
            validity,
        }
    }

    pub fn float64(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let data =
            ColumnData::Float64(values.into_iter().map(Option::unwrap_or_default).collect());
        Self {
            name: name.into(),
            data,
            validity,
        }
    }

    pub fn utf8<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let data = ColumnData::Utf8(
            values
                .into_iter()
                .map(|v| v.map(Into::into).unwrap_or_default())
                .collect(),
        );
        Self {
            name: name.into(),
            data,
            validity,
        }
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let data = ColumnData::Bool(values.into_iter().map(Option::unwrap_or_default).collect());
        Self {
            name: name.into(),
            data,
            validity,
        }
    }

    /// Build a column of `data_type` from dynamically typed values.
    ///
    /// # Errors
    /// [`Error::TypeMismatch`] when a non-null value has another type.
    pub fn from_values(
        name: impl Into<String>,
        data_type: DataType,
        values: &[Value],
    ) -> Result<Self> {
        let name = name.into();
        let mut data = ColumnData::with_capacity(data_type, values.len());
        let mut validity = Bitmap::with_capacity(values.len());
        for v in values {
            data.push(v).map_err(|()| Error::TypeMismatch {
                column: name.clone(),
                expected: data_type,
                found: v.type_name(),
            })?;
            validity.push(!v.is_null());
        }
        Ok(Self {
            name,
            data,
            validity,
        })
    }

    /// `len` copies of `value`; a null `value` yields an all-null column.
    ///
    /// # Errors
    /// [`Error::TypeMismatch`] when `value` is not of `data_type`.
    pub fn constant(
        name: impl Into<String>,
        data_type: DataType,
        value: &Value,
        len: usize,
    ) -> Result<Self> {
        let name = name.into();
        if value.data_type().is_some_and(|t| t != data_type) {
            return Err(Error::TypeMismatch {
                column: name,
                expected: data_type,
                found: value.type_name(),
            });
        }
        let data = match (data_type, value) {
            (DataType::Int64, Value::Int64(v)) => ColumnData::Int64(vec![*v; len]),
            (DataType::Int64, _) => ColumnData::Int64(vec![0; len]),
            (DataType::Float64, Value::Float64(v)) => ColumnData::Float64(vec![*v; len]),
            (DataType::Float64, _) => ColumnData::Float64(vec![0.0; len]),
            (DataType::Utf8, Value::Utf8(v)) => ColumnData::Utf8(vec![v.clone(); len]),
            (DataType::Utf8, _) => ColumnData::Utf8(vec![String::new(); len]),
            (DataType::Bool, Value::Bool(v)) => ColumnData::Bool(vec![*v; len]),
            (DataType::Bool, _) => ColumnData::Bool(vec![false; len]),
        };
        let validity = if value.is_null() {
            Bitmap::all_unset(len)
        } else {
            Bitmap::all_set(len)
        };
        Ok(Self {
            name,
            data,
            validity,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    #[must_use]
    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type())
    }

    #[must_use]
    pub const fn data(&self) -> &ColumnData {
        &self.data
    }

    #[must_use]
    pub const fn validity(&self) -> &Bitmap {
        &self.validity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn null_count(&self) -> usize {
        self.validity.count_unset()
    }

    #[must_use]
    pub fn is_null(&self, idx: usize) -> bool {
        !self.validity.get(idx)
    }

    /// The value at `idx`, or `Value::Null`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    #[must_use]
    pub fn value(&self, idx: usize) -> Value {
        if self.is_null(idx) {
            Value::Null
        } else {
            self.data.value(idx)
        }
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(|i| self.value(i))
    }

    /// Gather `rows` (in the given order) into a new column.
    ///
    /// # Panics
    /// Panics if any index is out of range.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            data: self.data.take(rows),
            validity: rows.iter().map(|&i| self.validity.get(i)).collect(),
        }
    }

    /// Append all rows of `other`.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when the types differ.
    pub fn extend_from(&mut self, other: &Self) -> Result<()> {
        self.data.extend_from(&other.data).map_err(|()| {
            Error::SchemaMismatch(format!(
                "cannot append {} column {} to {} column {}",
                other.data_type(),
                other.name,
                self.data_type(),
                self.name
            ))
        })?;
        self.validity.extend_from(&other.validity);
        Ok(())
    }
}

fn zero_nulls(data: &mut ColumnData, validity: &Bitmap) {
    let nulls = (0..validity.len()).filter(|&i| !validity.get(i));
    match data {
        ColumnData::Int64(v) => nulls.for_each(|i| v[i] = 0),
        ColumnData::Float64(v) => nulls.for_each(|i| v[i] = 0.0),
        ColumnData::Utf8(v) => nulls.for_each(|i| v[i].clear()),
        ColumnData::Bool(v) => nulls.for_each(|i| v[i] = false),
    }
}

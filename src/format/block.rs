//! Column block encoding: validity bitmap followed by the value array.

use crate::bitmap::Bitmap;
use crate::column::{ColumnBuffer, ColumnData};
use crate::error::{Error, Result};
use crate::schema::Field;
use crate::types::DataType;

/// Serialize one column into an uncompressed block.
pub(super) fn encode(column: &ColumnBuffer) -> Result<Vec<u8>> {
    let n = column.len();
    let validity = column.validity().as_bytes();
    let mut out = Vec::with_capacity(validity.len() + n * 8);
    out.extend_from_slice(validity);
    match column.data() {
        ColumnData::Int64(values) => {
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        ColumnData::Float64(values) => {
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        ColumnData::Bool(values) => {
            let bits: Bitmap = values.iter().copied().collect();
            out.extend_from_slice(bits.as_bytes());
        }
        ColumnData::Utf8(values) => {
            for v in values {
                let len = u32::try_from(v.len()).map_err(|_| {
                    Error::InvalidTable(format!(
                        "column {}: string of {} bytes exceeds the format limit",
                        column.name(),
                        v.len()
                    ))
                })?;
                out.extend_from_slice(&len.to_le_bytes());
                out.extend_from_slice(v.as_bytes());
            }
        }
    }
    Ok(out)
}

/// Bounds-checked cursor over a decoded block.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    column: &'a str,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "column {}: payload shorter than the row count implies",
                    self.column
                ))
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    fn fixed<const N: usize>(&mut self, rows: usize) -> Result<impl Iterator<Item = [u8; N]> + 'a> {
        let bytes = self.take(rows.checked_mul(N).ok_or_else(|| {
            Error::corrupt(format!("column {}: row count overflows", self.column))
        })?)?;
        Ok(bytes.chunks_exact(N).map(|c| {
            let mut b = [0u8; N];
            b.copy_from_slice(c);
            b
        }))
    }
}

/// Rebuild a column from an uncompressed block.
///
/// The block must hold exactly `rows` values; short and over-long payloads
/// are both reported as corruption.
pub(super) fn decode(field: &Field, rows: usize, block: &[u8]) -> Result<ColumnBuffer> {
    let mut cur = Cursor {
        buf: block,
        pos: 0,
        column: &field.name,
    };
    let bitmap_len = rows.div_ceil(8);
    let validity = Bitmap::from_bytes(cur.take(bitmap_len)?.to_vec(), rows)
        .ok_or_else(|| Error::corrupt(format!("column {}: bad validity bitmap", field.name)))?;

    let data = match field.data_type {
        DataType::Int64 => {
            ColumnData::Int64(cur.fixed::<8>(rows)?.map(i64::from_le_bytes).collect())
        }
        DataType::Float64 => {
            ColumnData::Float64(cur.fixed::<8>(rows)?.map(f64::from_le_bytes).collect())
        }
        DataType::Bool => {
            let bits = Bitmap::from_bytes(cur.take(bitmap_len)?.to_vec(), rows).ok_or_else(|| {
                Error::corrupt(format!("column {}: bad boolean payload", field.name))
            })?;
            ColumnData::Bool(bits.iter().collect())
        }
        DataType::Utf8 => {
            let mut values = Vec::with_capacity(rows.min(block.len() / 4));
            for _ in 0..rows {
                let len = cur.take_u32()? as usize;
                let bytes = cur.take(len)?;
                let s = std::str::from_utf8(bytes).map_err(|_| {
                    Error::corrupt(format!("column {}: string is not UTF-8", field.name))
                })?;
                values.push(s.to_string());
            }
            ColumnData::Utf8(values)
        }
    };
    if cur.pos != block.len() {
        return Err(Error::corrupt(format!(
            "column {}: {} trailing bytes after {rows} values",
            field.name,
            block.len() - cur.pos
        )));
    }
    ColumnBuffer::try_new(field.name.clone(), data, validity)
}

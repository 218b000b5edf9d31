//! The self-describing file header: magic, version, codec, schema, row count.

use super::{FORMAT_VERSION, MAGIC, MAX_NAME_LEN, truncated};
use crate::error::{Error, Result};
use crate::io::compression::Compression;
use crate::schema::{Field, Schema};
use crate::types::DataType;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Everything a reader needs before touching column data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub schema: Schema,
    pub row_count: u64,
    pub compression: Compression,
}

impl FileHeader {
    /// Serialize the header; returns the number of bytes written.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] for a name longer than the format allows,
    /// [`Error::Io`] when the sink fails.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<u64> {
        let mut buf = Vec::with_capacity(32 + self.schema.len() * 16);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf.push(self.compression.tag());
        buf.push(0);
        let field_count = u32::try_from(self.schema.len())
            .map_err(|_| Error::InvalidTable("too many columns for one file".to_string()))?;
        buf.extend_from_slice(&field_count.to_le_bytes());
        for field in &self.schema.fields {
            let name = field.name.as_bytes();
            if name.len() > MAX_NAME_LEN {
                return Err(Error::InvalidTable(format!(
                    "column name longer than {MAX_NAME_LEN} bytes"
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
            buf.extend_from_slice(name);
            buf.push(field.data_type.tag());
        }
        buf.extend_from_slice(&self.row_count.to_le_bytes());
        w.write_all(&buf).map_err(|e| Error::io(PathBuf::new(), e))?;
        Ok(buf.len() as u64)
    }

    /// Parse a header from the start of `r`.
    ///
    /// # Errors
    /// [`Error::CorruptFile`] on a bad magic, unsupported version, unknown
    /// codec or type tag, oversized or non-UTF-8 names, duplicate names, or
    /// truncation. Other read failures are [`Error::Io`].
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let magic: [u8; 4] = read_array(r, "magic")?;
        if &magic != MAGIC {
            return Err(Error::corrupt(format!("bad magic bytes {magic:02x?}")));
        }
        let version = u16::from_le_bytes(read_array(r, "version")?);
        if version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {version}"
            )));
        }
        let [codec, _reserved]: [u8; 2] = read_array(r, "codec")?;
        let compression = Compression::from_tag(codec)
            .ok_or_else(|| Error::corrupt(format!("unknown compression tag {codec}")))?;

        let field_count = u32::from_le_bytes(read_array(r, "field count")?) as usize;
        let mut fields = Vec::with_capacity(field_count.min(1024));
        for i in 0..field_count {
            let name_len = u32::from_le_bytes(read_array(r, "field name length")?) as usize;
            if name_len > MAX_NAME_LEN {
                return Err(Error::corrupt(format!(
                    "field #{i} declares a {name_len}-byte name"
                )));
            }
            let mut name = vec![0u8; name_len];
            r.read_exact(&mut name).map_err(|e| truncated(e, "field name"))?;
            let name = String::from_utf8(name)
                .map_err(|_| Error::corrupt(format!("field #{i} name is not UTF-8")))?;
            let [tag]: [u8; 1] = read_array(r, "field type")?;
            let data_type = DataType::from_tag(tag)
                .ok_or_else(|| Error::corrupt(format!("field {name} has unknown type tag {tag}")))?;
            fields.push(Field::new(name, data_type));
        }
        let schema = Schema::try_new(fields).map_err(|e| Error::corrupt(e.to_string()))?;
        let row_count = u64::from_le_bytes(read_array(r, "row count")?);
        Ok(Self {
            schema,
            row_count,
            compression,
        })
    }

    /// Row count as an in-memory index type.
    ///
    /// # Errors
    /// [`Error::CorruptFile`] when the count does not fit in `usize`.
    pub fn rows(&self) -> Result<usize> {
        usize::try_from(self.row_count)
            .map_err(|_| Error::corrupt(format!("row count {} is too large", self.row_count)))
    }
}

pub(super) fn read_array<R: Read, const N: usize>(r: &mut R, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
    Ok(buf)
}

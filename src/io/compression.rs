//! Compression for column blocks and text files.
//!
//! Two consumers share this module:
//! - The column file format compresses each column block independently with
//!   [`Compression::compress`] / [`Compression::decompress`]. The codec is
//!   recorded in the file header, so readers never need to be told.
//! - Text adapters (CSV, JSONL) call [`auto_detect_reader`] and
//!   [`auto_detect_writer`]. These pick a codec from the file extension and,
//!   for reads, fall back to magic bytes.
//!
//! ## Built-in Codecs
//!
//! - **Gzip** (`.gz`) via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature: `compression-zstd`)
//!
//! A codec whose feature is disabled is still a valid enum value. Using it
//! reports an `Unsupported` I/O error instead of silently writing plain data.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Block/stream codec identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zstd,
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

impl Compression {
    /// Header tag stored in column files.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Gzip => 1,
            Self::Zstd => 2,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Gzip),
            2 => Some(Self::Zstd),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Codec implied by a file name such as `rows.csv.gz`.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        if name.ends_with(".gz") || name.ends_with(".gzip") {
            Self::Gzip
        } else if name.ends_with(".zst") || name.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if head.starts_with(ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Compress one in-memory block.
    ///
    /// # Errors
    /// I/O errors from the encoder, or `Unsupported` when the codec's feature
    /// is disabled.
    pub fn compress(self, block: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::None => Ok(block.to_vec()),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => {
                let mut enc =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(block)?;
                enc.finish()
            }
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => zstd::stream::encode_all(block, 3),
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }

    /// Decompress one block produced by [`Compression::compress`].
    ///
    /// # Errors
    /// I/O errors from the decoder (malformed input surfaces here), or
    /// `Unsupported` when the codec's feature is disabled.
    pub fn decompress(self, block: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::None => Ok(block.to_vec()),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => {
                let mut out = Vec::new();
                flate2::read::GzDecoder::new(block).read_to_end(&mut out)?;
                Ok(out)
            }
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => zstd::stream::decode_all(block),
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }

    fn wrap_reader(self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        match self {
            Self::None => Ok(reader),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => {
                zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
            }
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }

    fn wrap_writer(self, writer: Box<dyn Write>) -> io::Result<Box<dyn Write>> {
        match self {
            Self::None => Ok(writer),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => Ok(Box::new(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            ))),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => zstd::stream::write::Encoder::new(writer, 3)
                .map(|e| Box::new(e.auto_finish()) as Box<dyn Write>),
            #[allow(unreachable_patterns)]
            other => Err(unsupported(other)),
        }
    }
}

fn unsupported(codec: Compression) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{} compression support is not compiled in", codec.name()),
    )
}

/// Wrap a reader with decompression chosen from the path, then magic bytes.
///
/// # Errors
/// Returns an error if the decoder cannot be constructed.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    let by_ext = Compression::from_path(&path_hint);
    if by_ext != Compression::None {
        return by_ext
            .wrap_reader(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", by_ext.name()));
    }

    let mut buf_reader = BufReader::new(reader);
    let head = buf_reader.fill_buf().context("sniff compression magic")?;
    let by_magic = Compression::from_magic(head);
    by_magic
        .wrap_reader(Box::new(buf_reader))
        .with_context(|| format!("wrap reader with {} codec", by_magic.name()))
}

/// Wrap a writer with compression chosen from the path extension.
///
/// # Errors
/// Returns an error if the encoder cannot be constructed.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Write>> {
    let codec = Compression::from_path(&path_hint);
    codec
        .wrap_writer(Box::new(BufWriter::new(writer)))
        .with_context(|| format!("wrap writer with {} codec", codec.name()))
}

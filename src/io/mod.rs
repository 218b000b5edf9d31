//! Interop adapters: text formats, Parquet and Arrow IPC.
//!
//! Adapters return `anyhow::Result` with file and row context attached. Core
//! errors from table construction convert through `?`.

pub mod compression;
pub mod glob;
pub mod rows;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(any(feature = "io-parquet", feature = "io-ipc"))))]
#[cfg(any(feature = "io-parquet", feature = "io-ipc"))]
pub mod arrow;

#[cfg_attr(docsrs, doc(cfg(feature = "io-parquet")))]
#[cfg(feature = "io-parquet")]
pub mod parquet;

#[cfg_attr(docsrs, doc(cfg(feature = "io-ipc")))]
#[cfg(feature = "io-ipc")]
pub mod ipc;

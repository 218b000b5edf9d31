//! Testing utilities for code built on ironframe tables.
//!
//! - **Assertions**: [`assert_tables_equal`] compares schema, row count and
//!   every cell, naming the first difference. [`assert_tables_equal_unordered`]
//!   ignores row and column order, which is what a partitioned round trip
//!   preserves.
//! - **Fixtures**: small deterministic tables covering the common shapes.
//!
//! ```no_run
//! use ironframe::dataset::{Dataset, write_dataset};
//! use ironframe::options::WriteOptions;
//! use ironframe::testing::*;
//!
//! #[test]
//! fn month_partitions_round_trip() -> anyhow::Result<()> {
//!     let dir = tempfile::tempdir()?;
//!     let aq = airquality();
//!     write_dataset(&aq, dir.path(), &["Month"], &WriteOptions::default())?;
//!     let back = Dataset::open(dir.path())?.to_table()?;
//!     assert_tables_equal_unordered(&back, &aq);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

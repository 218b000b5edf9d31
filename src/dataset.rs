//! Partitioned multi-file datasets.
//!
//! [`write_dataset`] splits a [`Table`](crate::Table) by the values of its
//! partition columns and writes one directory per distinct key:
//!
//! ```text
//! root/Month=5/Day=1/part-0.ifr
//! root/Month=5/Day=2/part-0.ifr
//! ...
//! ```
//!
//! [`Dataset::open`] walks such a tree back, types the `col=value` segments,
//! and [`Dataset::read`] rebuilds the table with the partition columns
//! re-attached from the paths.
//!
//! ```no_run
//! use ironframe::dataset::{Dataset, PartitionFilter, write_dataset};
//! use ironframe::options::WriteOptions;
//! use ironframe::testing::airquality;
//! # fn main() -> ironframe::Result<()> {
//! let summary = write_dataset(&airquality(), "aq", &["Month"], &WriteOptions::default())?;
//! assert_eq!(summary.partitions, 5);
//!
//! let ds = Dataset::open("aq")?;
//! let may = ds.read(None, Some(&PartitionFilter::eq("Month", 5)))?;
//! assert_eq!(may.num_rows(), 31);
//! # Ok(()) }
//! ```

mod filter;
mod partition;
mod reader;
mod writer;

pub use filter::PartitionFilter;
pub use partition::{
    NULL_PARTITION, PartitionGroup, PartitionKey, decode_value, encode_value, parse_segment, plan,
};
pub use reader::{Dataset, Fragment};
pub use writer::{WriteSummary, write_dataset};

use crate::error::{Error, Result};

/// Run `f` over every item, optionally on the rayon pool.
///
/// Results come back in input order. Sequential runs stop at the first
/// failure. Parallel runs finish every item and fold all failures into one
/// error.
pub(crate) fn run_all<I, T, F>(items: &[I], parallel: bool, f: F) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Sync + Send,
{
    #[cfg(feature = "parallel-io")]
    if parallel && items.len() > 1 {
        use rayon::prelude::*;
        let results: Vec<Result<T>> = items.par_iter().map(&f).collect();
        let mut out = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for r in results {
            match r {
                Ok(v) => out.push(v),
                Err(e) => errors.push(e),
            }
        }
        return match Error::aggregate(errors) {
            Some(e) => Err(e),
            None => Ok(out),
        };
    }
    #[cfg(not(feature = "parallel-io"))]
    let _ = parallel;

    items.iter().map(f).collect()
}

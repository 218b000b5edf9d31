//! Pre-built tables for tests and examples.

use crate::column::ColumnBuffer;
use crate::table::Table;

fn build(columns: Vec<ColumnBuffer>) -> Table {
    match Table::try_new(columns) {
        Ok(t) => t,
        Err(e) => unreachable!("fixture columns are consistent: {e}"),
    }
}

/// Three rows: `group` = A, B, C and `score` = 99, 97, 99.
///
/// # Example
///
/// ```
/// use ironframe::testing::sample_scores;
///
/// let t = sample_scores();
/// assert_eq!(t.num_rows(), 3);
/// assert_eq!(t.column_names(), vec!["group", "score"]);
/// ```
#[must_use]
pub fn sample_scores() -> Table {
    build(vec![
        ColumnBuffer::utf8("group", vec![Some("A"), Some("B"), Some("C")]),
        ColumnBuffer::int64("score", vec![Some(99), Some(97), Some(99)]),
    ])
}

/// Days per month of the May through September season.
const SEASON: [(i64, i64); 5] = [(5, 31), (6, 30), (7, 31), (8, 31), (9, 30)];

/// A deterministic stand-in for the classic daily air quality table.
///
/// 153 rows, one per day from May 1 to September 30, with columns `Ozone`
/// and `Solar.R` (Int64, some nulls), `Wind` (Float64), `Temp`, `Month` and
/// `Day` (Int64).
#[must_use]
pub fn airquality() -> Table {
    let days: Vec<(i64, i64)> = SEASON
        .iter()
        .flat_map(|&(month, n)| (1..=n).map(move |day| (month, day)))
        .collect();
    let idx = || (0..days.len() as i64);

    build(vec![
        ColumnBuffer::int64(
            "Ozone",
            idx().map(|i| (i % 4 != 1).then_some((i * 37) % 150 + 1)).collect(),
        ),
        ColumnBuffer::int64(
            "Solar.R",
            idx().map(|i| (i % 30 != 4).then_some((i * 53) % 330 + 7)).collect(),
        ),
        ColumnBuffer::float64(
            "Wind",
            idx().map(|i| Some(((i * 13) % 190) as f64 / 10.0 + 1.7)).collect(),
        ),
        ColumnBuffer::int64("Temp", idx().map(|i| Some(56 + (i * 7) % 42)).collect()),
        ColumnBuffer::int64("Month", days.iter().map(|&(m, _)| Some(m)).collect()),
        ColumnBuffer::int64("Day", days.iter().map(|&(_, d)| Some(d)).collect()),
    ])
}

/// Four rows covering every column type, with nulls in each column and a
/// string that needs escaping as a partition value.
#[must_use]
pub fn mixed_types() -> Table {
    build(vec![
        ColumnBuffer::int64("id", vec![Some(1), Some(2), Some(3), None]),
        ColumnBuffer::float64("ratio", vec![Some(0.5), None, Some(-1.25), Some(1e10)]),
        ColumnBuffer::utf8("label", vec![Some("a"), Some(""), None, Some("a/b=c")]),
        ColumnBuffer::boolean("flag", vec![Some(true), None, Some(false), Some(true)]),
    ])
}

//! Table assertions with readable failure messages.

use crate::table::Table;

/// Assert that two tables are identical: schema, row count, every cell.
///
/// # Panics
///
/// Panics on the first difference, naming the column and row.
///
/// # Example
///
/// ```
/// use ironframe::testing::{assert_tables_equal, sample_scores};
///
/// assert_tables_equal(&sample_scores(), &sample_scores());
/// ```
pub fn assert_tables_equal(actual: &Table, expected: &Table) {
    assert_eq!(
        actual.schema(),
        expected.schema(),
        "Schema mismatch:\n  Expected: {}\n  Actual: {}",
        expected.schema(),
        actual.schema()
    );
    assert_eq!(
        actual.num_rows(),
        expected.num_rows(),
        "Row count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.num_rows(),
        actual.num_rows()
    );
    for (a, e) in actual.columns().iter().zip(expected.columns()) {
        for row in 0..expected.num_rows() {
            let (av, ev) = (a.value(row), e.value(row));
            assert_eq!(
                av,
                ev,
                "Value mismatch in column {} at row {row}:\n  Expected: {ev:?}\n  Actual: {av:?}",
                e.name()
            );
        }
    }
}

/// Assert that two tables hold the same multiset of rows under the same
/// named columns, ignoring row order and column order.
///
/// # Panics
///
/// Panics if a column of `expected` is missing from `actual`, if `actual` has
/// extra columns, or if the sorted rows differ.
pub fn assert_tables_equal_unordered(actual: &Table, expected: &Table) {
    let names = expected.column_names();
    assert_eq!(
        actual.num_columns(),
        expected.num_columns(),
        "Column count mismatch:\n  Expected: {:?}\n  Actual: {:?}",
        names,
        actual.column_names()
    );
    let aligned = match actual.project(&names) {
        Ok(t) => t,
        Err(e) => panic!(
            "Column mismatch: {e}\n  Expected: {names:?}\n  Actual: {:?}",
            actual.column_names()
        ),
    };
    assert_tables_equal(&aligned.sort_by_all_columns(), &expected.sort_by_all_columns());
}

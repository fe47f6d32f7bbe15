//! Row matching

use crate::codec::Record;

/// True if every field of `predicate` is on `row` with an equal value.
///
/// Extra fields on the row are ignored, so the empty predicate matches every
/// row. A predicate field the row lacks never matches.
pub fn is_subset_of(predicate: &Record, row: &Record) -> bool {
    predicate.iter().all(|(field, value)| row.get(field) == Some(value))
}

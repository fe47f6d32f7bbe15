//! JSON output for CLI
//!
//! Every successful command prints one JSON array on a single stdout line.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a JSON array of rows (or field names) to stdout
pub fn write_rows<T: Serialize>(rows: &[T]) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_rows_to(&mut stdout, rows)
}

pub(crate) fn write_rows_to<W: Write, T: Serialize>(out: &mut W, rows: &[T]) -> CliResult<()> {
    serde_json::to_writer(&mut *out, rows)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Record;

    #[test]
    fn test_rows_keep_field_order() {
        let rows = vec![Record::new().with("name", "a").with("age", "1")];
        let mut out = Vec::new();
        write_rows_to(&mut out, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[{\"name\":\"a\",\"age\":\"1\"}]\n"
        );
    }

    #[test]
    fn test_empty_result() {
        let mut out = Vec::new();
        write_rows_to::<_, Record>(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}

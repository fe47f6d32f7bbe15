//! Record codec for delimited files
//!
//! Streaming decode of a delimited file into records keyed by header, and
//! streaming encode of records back into delimited text with a header line.
//!
//! # Invariants
//!
//! - Every decoded record has exactly the header's fields, in header order
//! - `decode(encode(r)) == r` for every record, including values containing
//!   the delimiter, quotes, CR or LF
//! - The encoder never emits a header onto a file that already has content
//!   when opened in append mode

pub mod format;
mod reader;
mod record;
mod writer;

pub use reader::RecordReader;
pub use record::{Header, Record};
pub use writer::RecordWriter;

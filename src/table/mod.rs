//! Table handle and CRUD verbs
//!
//! ```ignore
//! let users = Table::open("users.csv", ["name", "age"], TableConfig::default()).await?;
//! users.add(vec![Record::new().with("name", "a").with("age", "1")]).await?;
//! let adults = users.get(Some(&Record::new().with("age", "18"))).await?;
//! ```
//!
//! A handle is cheap to clone; clones share nothing but configuration, and
//! every mutation coordinates through the table's lock artifact.

mod crud;
mod init;
pub mod predicate;

use std::path::Path;

use crate::codec::Header;
use crate::editor::Editor;

pub use predicate::is_subset_of;

/// An opened table
#[derive(Debug, Clone)]
pub struct Table {
    editor: Editor,
    header: Header,
}

impl Table {
    /// Header the table was opened with
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn path(&self) -> &Path {
        self.editor.path()
    }

    pub fn delimiter(&self) -> char {
        self.editor.delimiter()
    }

    /// Underlying editor, for streaming reads and custom rewrites
    pub fn editor(&self) -> &Editor {
        &self.editor
    }
}

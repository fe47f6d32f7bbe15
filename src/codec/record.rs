//! Record and header types
//!
//! A `Record` is an ordered list of `(field, value)` pairs. Records decoded
//! from a file always carry exactly the header's fields in header order;
//! records built by callers may be partial.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::errors::{DbError, DbResult};

/// Ordered, unique field names of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    fields: Arc<[String]>,
}

impl Header {
    /// Builds a header, rejecting empty and duplicate field names.
    pub fn new<I, S>(fields: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(DbError::format_error("Header must name at least one field"));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.is_empty() {
                return Err(DbError::format_error("Header contains an empty field name"));
            }
            if !seen.insert(field.as_str()) {
                return Err(DbError::format_error(format!(
                    "Header contains duplicate field: {}",
                    field
                )));
            }
        }

        Ok(Self {
            fields: fields.into(),
        })
    }

    /// Field names in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a constructed header
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the header names this field
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Zips decoded values with the field names
    pub(crate) fn record_from_values(&self, values: Vec<String>) -> Record {
        Record {
            fields: self.fields.iter().cloned().zip(values).collect(),
        }
    }

    /// Rejects records carrying fields this header does not name.
    pub fn check_record(&self, record: &Record) -> DbResult<()> {
        match record.keys().find(|k| !self.contains(k)) {
            Some(unknown) => Err(DbError::format_error(format!(
                "Field '{}' is not part of the table header",
                unknown
            ))
            .with_details(format!("header: {}", self.fields.join(",")))),
            None => Ok(()),
        }
    }

    /// Returns the record's values in header order, empty for missing fields.
    pub fn values_of<'a>(&'a self, record: &'a Record) -> DbResult<Vec<&'a str>> {
        self.check_record(record)?;
        Ok(self
            .fields
            .iter()
            .map(|f| record.get(f).unwrap_or(""))
            .collect())
    }

    /// Rebuilds a record in header order, filling missing fields with "".
    pub fn normalize(&self, record: &Record) -> DbResult<Record> {
        let values = self.values_of(record)?;
        Ok(Record {
            fields: self
                .fields
                .iter()
                .cloned()
                .zip(values.into_iter().map(str::to_string))
                .collect(),
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(","))
    }
}

/// One row: field name → value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(field, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.set(k, v);
        }
        record
    }

    /// Builder-style `set`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, replacing its value in place if present
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Value of a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(field, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrites this record's fields with every field of `patch`
    pub fn apply(&mut self, patch: &Record) {
        for (k, v) in patch.iter() {
            self.set(k, v);
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

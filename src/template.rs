//! Record templates: decoding one fixed-width line into named values and
//! encoding named values back into a line.
//!
//! The engine only talks to templates through [`RecordTemplate`], one per
//! record kind. [`FixedWidthTemplate`] is the column-slicing implementation
//! built from a kind's field layout.
//!
//! Field values are bytes. Nothing is decoded or re-encoded on the way
//! through, so files in Latin-1 or any other single-byte encoding survive a
//! read and rewrite unchanged. [`Record::get`] offers a text view for values
//! that happen to be UTF-8.

use std::collections::BTreeMap;

use crate::error::{FlrError, Result};
use crate::layout::{CanonicalLayout, FieldDescriptor};

/// A decoded record: its kind plus field values in layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    kind: String,
    fields: Vec<(String, Vec<u8>)>,
}

impl Record {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any existing value with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The value as text. `None` if the field is absent or not valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_bytes(name)
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn fields(&self) -> &[(String, Vec<u8>)] {
        &self.fields
    }
}

/// Encode/decode contract for one record kind.
pub trait RecordTemplate {
    /// The record kind this template handles.
    fn kind(&self) -> &str;

    /// Decode one line (terminator already removed or not) into a record.
    fn build_record(&self, line: &[u8]) -> Record;

    /// Encode a record into a fixed-width line with no terminator.
    /// Fields the record lacks are written as blanks.
    fn build_line(&self, record: &Record) -> Vec<u8>;

    /// Encode positional values, one per layout field in order.
    fn build_line_from_values(&self, values: &[&str]) -> Vec<u8>;
}

/// Template that slices and pads fields by byte column.
#[derive(Debug, Clone)]
pub struct FixedWidthTemplate {
    kind: String,
    fields: Vec<FieldDescriptor>,
    first_column: usize,
    extra_columns: Vec<String>,
}

impl FixedWidthTemplate {
    pub fn new(
        kind: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        first_column: usize,
        extra_columns: Vec<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            fields,
            first_column,
            extra_columns,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn offset(&self, field: &FieldDescriptor) -> usize {
        field.start.saturating_sub(self.first_column)
    }

    /// Width of an encoded line: the furthest byte any field reaches.
    pub fn line_width(&self) -> usize {
        self.fields
            .iter()
            .map(|f| self.offset(f) + f.len)
            .max()
            .unwrap_or(0)
    }

    fn encode<'v>(
        &self,
        value_of: impl Fn(usize, &FieldDescriptor) -> Option<&'v [u8]>,
    ) -> Vec<u8> {
        let mut line = vec![b' '; self.line_width()];
        for (i, field) in self.fields.iter().enumerate() {
            let Some(value) = value_of(i, field) else {
                continue;
            };
            let offset = self.offset(field);
            let n = fitted_len(value, field.len);
            line[offset..offset + n].copy_from_slice(&value[..n]);
        }
        line
    }
}

/// How many leading bytes of `value` fit in `width`. UTF-8 text is cut on a
/// character boundary and the remainder padded; other bytes are cut exactly.
fn fitted_len(value: &[u8], width: usize) -> usize {
    if value.len() <= width {
        return value.len();
    }
    match std::str::from_utf8(value) {
        Ok(text) => (0..=width).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0),
        Err(_) => width,
    }
}

/// Remove one trailing `\n` or `\r\n`.
pub fn chomp(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl RecordTemplate for FixedWidthTemplate {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn build_record(&self, line: &[u8]) -> Record {
        let bytes = chomp(line);
        let mut record = Record::new(self.kind.as_str());
        for field in &self.fields {
            let start = self.offset(field).min(bytes.len());
            let end = (start + field.len).min(bytes.len());
            record.set(field.name.as_str(), &bytes[start..end]);
        }
        for extra in &self.extra_columns {
            record.set(extra.as_str(), "");
        }
        record
    }

    fn build_line(&self, record: &Record) -> Vec<u8> {
        self.encode(|_, field| record.get_bytes(&field.name))
    }

    fn build_line_from_values(&self, values: &[&str]) -> Vec<u8> {
        self.encode(|i, _| values.get(i).map(|v| v.as_bytes()))
    }
}

/// The templates for every record kind of a file, keyed by kind.
#[derive(Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, Box<dyn RecordTemplate>>,
}

impl TemplateSet {
    /// One [`FixedWidthTemplate`] per layout kind.
    pub fn from_layout(
        layout: CanonicalLayout,
        first_column: usize,
        extra_columns: &[String],
    ) -> Self {
        let mut set = Self::default();
        for (kind, fields) in layout {
            set.insert(Box::new(FixedWidthTemplate::new(
                kind,
                fields,
                first_column,
                extra_columns.to_vec(),
            )));
        }
        set
    }

    /// Add or replace the template for its kind.
    pub fn insert(&mut self, template: Box<dyn RecordTemplate>) {
        self.templates.insert(template.kind().to_string(), template);
    }

    pub fn get(&self, kind: &str) -> Option<&dyn RecordTemplate> {
        self.templates.get(kind).map(|t| t.as_ref())
    }

    /// Like [`get`](Self::get), but a missing kind is a write-side mismatch.
    pub fn require(&self, kind: &str) -> Result<&dyn RecordTemplate> {
        self.get(kind).ok_or_else(|| FlrError::KindMismatchOnWrite {
            kind: kind.to_string(),
            known: self.kinds().join(","),
        })
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}

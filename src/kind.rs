//! Record kind resolution.
//!
//! A file holds either a single record kind, or several kinds told apart by a
//! discriminator string at a fixed column. Discriminators are kept in an
//! ordered list and evaluated front to back; the first match wins, so a line
//! matched by more than one discriminator always resolves to the earliest.

/// Recognizes one record kind in a multi-kind file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    pub kind: String,
    pub match_text: String,
    /// 1-based column where `match_text` must start.
    pub column: usize,
}

impl Discriminator {
    pub fn new(kind: impl Into<String>, match_text: impl Into<String>, column: usize) -> Self {
        Self {
            kind: kind.into(),
            match_text: match_text.into(),
            column,
        }
    }

    /// True if the line, read from `column` onward, begins with `match_text`.
    pub fn matches(&self, line: &[u8]) -> bool {
        let offset = self.column.saturating_sub(1);
        line.get(offset..)
            .is_some_and(|rest| rest.starts_with(self.match_text.as_bytes()))
    }
}

/// The record kinds a file may contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKinds {
    /// Every non-blank line is this kind.
    Single(String),
    /// Lines are recognized by discriminator, first match wins.
    Discriminated(Vec<Discriminator>),
}

/// Outcome of resolving one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindResolution<'a> {
    /// Empty or whitespace-only line; no record here.
    Blank,
    Known(&'a str),
    Unknown,
}

impl RecordKinds {
    pub fn single(kind: impl Into<String>) -> Self {
        RecordKinds::Single(kind.into())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, RecordKinds::Single(_))
    }

    /// Kind names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            RecordKinds::Single(kind) => vec![kind.as_str()],
            RecordKinds::Discriminated(list) => list.iter().map(|d| d.kind.as_str()).collect(),
        }
    }

    /// Determine which kind `line` is. Pure function of the line bytes;
    /// only ASCII whitespace counts as blank.
    pub fn resolve(&self, line: impl AsRef<[u8]>) -> KindResolution<'_> {
        let line = line.as_ref();
        if line.iter().all(u8::is_ascii_whitespace) {
            return KindResolution::Blank;
        }
        match self {
            RecordKinds::Single(kind) => KindResolution::Known(kind),
            RecordKinds::Discriminated(list) => list
                .iter()
                .find(|d| d.matches(line))
                .map_or(KindResolution::Unknown, |d| KindResolution::Known(&d.kind)),
        }
    }
}

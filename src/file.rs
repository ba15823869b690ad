//! The record file session.
//!
//! [`FlrFile`] binds a storage handle to a record configuration. It owns the
//! read mode (sequential scanner or fast chunked reader), the templates for
//! every record kind, and the flag that drives separator placement on write.
//!
//! # Example
//!
//! ```
//! use flr_file::{FlrConfig, FlrFile, RecordKinds, layout::DeclarativeLayout};
//! use std::io::Cursor;
//!
//! let mut layout = DeclarativeLayout::new();
//! layout.insert(
//!     "A".to_string(),
//!     [("x".to_string(), 1..=3), ("y".to_string(), 4..=5)].into_iter().collect(),
//! );
//! let config = FlrConfig::new(RecordKinds::single("A"), layout);
//!
//! let mut file = FlrFile::new(Cursor::new("abc12\ndef34\n"), config)?;
//! let records: Vec<_> = file.records().collect::<Result<_, _>>()?;
//! assert_eq!(records[1].get("x"), Some("def"));
//! # Ok::<(), flr_file::FlrError>(())
//! ```

use std::io::{BufRead, Seek, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::{FlrError, Result};
use crate::iter::Records;
use crate::kind::{KindResolution, RecordKinds};
use crate::layout::LayoutSpec;
use crate::range_set::RangeSet;
use crate::reader::{FastReader, RawRecord, ReadMode, SequentialReader};
use crate::storage::{FileStorage, OpenMode};
use crate::template::{Record, RecordTemplate, TemplateSet};

/// Everything needed to interpret a record file.
#[derive(Debug, Clone)]
pub struct FlrConfig {
    pub kinds: RecordKinds,
    pub layout: LayoutSpec,
    /// Column number of the first byte of a line, as layouts count columns.
    pub logical_first_column: usize,
    /// Names appended to every decoded record with empty values.
    pub extra_columns: Vec<String>,
    /// Fast-mode chunk size in bytes; `None` uses the default budget.
    pub buffer_budget: Option<u64>,
    /// Written between consecutive records.
    pub separator: String,
}

impl FlrConfig {
    pub fn new(kinds: RecordKinds, layout: impl Into<LayoutSpec>) -> Self {
        Self {
            kinds,
            layout: layout.into(),
            logical_first_column: 1,
            extra_columns: Vec::new(),
            buffer_budget: None,
            separator: "\n".to_string(),
        }
    }

    pub fn with_logical_first_column(mut self, column: usize) -> Self {
        self.logical_first_column = column;
        self
    }

    pub fn with_extra_columns(mut self, columns: Vec<String>) -> Self {
        self.extra_columns = columns;
        self
    }

    pub fn with_buffer_budget(mut self, bytes: u64) -> Self {
        self.buffer_budget = Some(bytes);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

/// A fixed-width record file session over storage `S`.
#[derive(Debug)]
pub struct FlrFile<S> {
    storage: S,
    kinds: RecordKinds,
    templates: TemplateSet,
    buffer_budget: Option<u64>,
    separator: String,
    mode: ReadMode,
    has_written: bool,
}

impl<S> FlrFile<S> {
    /// Bind an already-open storage handle to `config`.
    ///
    /// Fails with `ConfigurationConflict` if a configured kind has no layout.
    pub fn new(storage: S, config: FlrConfig) -> Result<Self> {
        let templates = TemplateSet::from_layout(
            config.layout.into_canonical(),
            config.logical_first_column,
            &config.extra_columns,
        );
        if let Some(missing) = config
            .kinds
            .names()
            .into_iter()
            .find(|k| templates.get(k).is_none())
        {
            return Err(FlrError::ConfigurationConflict(format!(
                "no layout for record type {missing}"
            )));
        }
        Ok(Self {
            storage,
            kinds: config.kinds,
            templates,
            buffer_budget: config.buffer_budget,
            separator: config.separator,
            mode: ReadMode::default(),
            has_written: false,
        })
    }

    pub fn kinds(&self) -> &RecordKinds {
        &self.kinds
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn is_fast(&self) -> bool {
        matches!(self.mode, ReadMode::Fast(_))
    }

    /// Logical index of the last line or record read.
    pub fn line_number(&self) -> u64 {
        match &self.mode {
            ReadMode::Sequential(r) => r.line_number(),
            ReadMode::Fast(r) => r.last_index(),
        }
    }

    pub fn fast_reader(&self) -> Option<&FastReader> {
        match &self.mode {
            ReadMode::Fast(r) => Some(r),
            ReadMode::Sequential(_) => None,
        }
    }

    /// Direct access to the storage. Reads or writes made through it bypass
    /// the session's cursors and separator tracking.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Give back the storage without flushing or closing it.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Restrict the sequential scanner to lines whose logical index is in
    /// `filter`. Not available in fast mode, where ranges go through
    /// [`set_ranges`](Self::set_ranges).
    pub fn set_line_filter(&mut self, filter: RangeSet) -> Result<()> {
        match &mut self.mode {
            ReadMode::Sequential(r) => {
                r.set_filter(Some(filter));
                Ok(())
            }
            ReadMode::Fast(_) => Err(FlrError::ConfigurationConflict(
                "line filters apply to sequential reading; use set_ranges in fast mode".to_string(),
            )),
        }
    }

    fn single_kind(&self) -> Option<&str> {
        match &self.kinds {
            RecordKinds::Single(kind) => Some(kind.as_str()),
            RecordKinds::Discriminated(_) => None,
        }
    }

    /// Decode a raw record through its kind's template.
    ///
    /// The fast path always uses the single configured kind; the sequential
    /// path resolves the kind from the text.
    pub fn build_record(&self, raw: &RawRecord) -> Result<Record> {
        let kind = match (&self.mode, self.kinds.resolve(&raw.text)) {
            (ReadMode::Fast(_), _) => self.single_kind(),
            (_, KindResolution::Known(kind)) => Some(kind),
            (_, KindResolution::Unknown | KindResolution::Blank) => None,
        };
        let template = kind
            .and_then(|k| self.templates.get(k))
            .ok_or(FlrError::UnknownRecordKind { line: raw.index })?;
        Ok(template.build_record(&raw.text))
    }
}

impl<S: BufRead + Seek> FlrFile<S> {
    /// Switch to the chunked fixed-width reader. Only single-kind files
    /// qualify. The record width is measured from the first line, and the
    /// whole file is planned until [`set_ranges`](Self::set_ranges) narrows it.
    pub fn enable_fast(&mut self) -> Result<()> {
        if !self.kinds.is_single() {
            return Err(FlrError::ConfigurationConflict(
                "Cannot set fast mode with more than one record type.".to_string(),
            ));
        }
        if self.is_fast() {
            return Ok(());
        }
        let reader = FastReader::new(&mut self.storage, self.buffer_budget)?;
        info!("Fast mode enabled, record width {}", reader.record_width());
        self.mode = ReadMode::Fast(reader);
        Ok(())
    }

    /// Read only the records in `ranges`. Requires a single-kind file in
    /// fast mode, and may be called once.
    pub fn set_ranges(&mut self, ranges: RangeSet) -> Result<()> {
        if !self.kinds.is_single() {
            return Err(FlrError::ConfigurationConflict(format!(
                "Cannot read selected ranges because input file has multiple record types {}",
                self.kinds.names().join(",")
            )));
        }
        match &mut self.mode {
            ReadMode::Fast(reader) => {
                reader.set_ranges(ranges)?;
                debug!("Ranges assigned, {} chunk(s) pending", reader.pending_chunks().count());
                Ok(())
            }
            ReadMode::Sequential(_) => Err(FlrError::ConfigurationConflict(
                "ranges can only be assigned after fast mode is enabled".to_string(),
            )),
        }
    }

    /// True when no more input remains for the active read path.
    pub fn is_finished(&mut self) -> Result<bool> {
        match &self.mode {
            ReadMode::Fast(reader) => Ok(reader.is_finished()),
            ReadMode::Sequential(_) => Ok(self.storage.fill_buf()?.is_empty()),
        }
    }

    /// Next raw record that passed kind and range filtering, or `None` at
    /// end of input.
    pub fn next_raw_record(&mut self) -> Result<Option<RawRecord>> {
        match &mut self.mode {
            ReadMode::Fast(reader) => reader.next_raw(&mut self.storage),
            ReadMode::Sequential(reader) => reader.next_known(&mut self.storage, &self.kinds),
        }
    }

    /// Next decoded record from the active read path.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        match self.next_raw_record()? {
            Some(raw) => self.build_record(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Next physical line, unfiltered. Sequential mode only.
    pub fn next_line(&mut self) -> Result<Option<RawRecord>> {
        sequential_mut(&mut self.mode)?.read_line(&mut self.storage)
    }

    /// Decode the next non-blank line directly, bypassing kind and range
    /// filtering. A line of unknown kind is an error naming its line number.
    pub fn read_line_record(&mut self) -> Result<Option<Record>> {
        loop {
            let Some(raw) = sequential_mut(&mut self.mode)?.read_line(&mut self.storage)? else {
                return Ok(None);
            };
            if self.kinds.resolve(&raw.text) != KindResolution::Blank {
                return self.build_record(&raw).map(Some);
            }
        }
    }

    /// Lazy, forward-only traversal of the remaining records.
    pub fn records(&mut self) -> Records<'_, S> {
        Records::new(self)
    }
}

fn sequential_mut(mode: &mut ReadMode) -> Result<&mut SequentialReader> {
    match mode {
        ReadMode::Sequential(r) => Ok(r),
        ReadMode::Fast(_) => Err(FlrError::ConfigurationConflict(
            "direct line access is not available in fast mode".to_string(),
        )),
    }
}

impl<S: Write> FlrFile<S> {
    /// Append a record. Multi-kind files pick the template named by the
    /// record's kind; single-kind files use their only kind, but a record
    /// naming some other unknown kind is still rejected.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let kind = match self.single_kind() {
            Some(single) => {
                if !record.kind().is_empty() && self.templates.get(record.kind()).is_none() {
                    return Err(FlrError::KindMismatchOnWrite {
                        kind: record.kind().to_string(),
                        known: self.templates.kinds().join(","),
                    });
                }
                single
            }
            None => record.kind(),
        };
        let line = self.templates.require(kind)?.build_line(record);
        self.emit(&line)
    }

    /// Append a record given as positional values in layout order. In a
    /// multi-kind file the last value names the kind.
    pub fn write_values(&mut self, values: &[&str]) -> Result<()> {
        let line = match self.single_kind() {
            Some(single) => self.templates.require(single)?.build_line_from_values(values),
            None => match values.split_last() {
                Some((kind, fields)) => self.templates.require(kind)?.build_line_from_values(fields),
                None => self.templates.require("")?.build_line_from_values(&[]),
            },
        };
        self.emit(&line)
    }

    fn emit(&mut self, line: &[u8]) -> Result<()> {
        if self.has_written {
            self.storage.write_all(self.separator.as_bytes())?;
        } else {
            self.has_written = true;
        }
        self.storage.write_all(line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.storage.flush()?;
        Ok(())
    }
}

impl FlrFile<FileStorage> {
    /// Open `path`, run `f` on the session, and close the file afterwards
    /// whether or not `f` succeeded. An error from `f` wins over a close error.
    pub fn open<T>(
        path: impl AsRef<Path>,
        mode: OpenMode,
        config: FlrConfig,
        f: impl FnOnce(&mut FlrFile<FileStorage>) -> Result<T>,
    ) -> Result<T> {
        let path = path.as_ref();
        info!("Opening record file {} ({:?})", path.display(), mode);
        let mut file = FlrFile::new(FileStorage::open(path, mode)?, config)?;
        let result = f(&mut file);
        let closed = file.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Flush and close the underlying file.
    pub fn close(self) -> Result<()> {
        debug!("Closing record file");
        self.storage.close()?;
        Ok(())
    }
}

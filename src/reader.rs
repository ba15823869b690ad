//! The two read paths over a record file.
//!
//! - [`SequentialReader`]: line scanner. Handles any number of record kinds,
//!   skips blank and unrecognized lines and lines outside its filter.
//! - [`FastReader`]: single-kind, fixed-width buffered reader. Reads whole
//!   chunks with one seek + bulk read each, then slices records out of memory.
//!
//! A session is in exactly one of these modes at a time ([`ReadMode`]).

use std::collections::VecDeque;
use std::io::{BufRead, Read, Seek, SeekFrom};

use log::{debug, trace};

use crate::chunk::{Chunk, default_budget, normalize_budget, plan_chunks};
use crate::error::{FlrError, Result};
use crate::kind::{KindResolution, RecordKinds};
use crate::range_set::RangeSet;

/// Raw bytes of one record and its 1-based logical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub index: u64,
    pub text: Vec<u8>,
}

/// Line-by-line scanner state.
#[derive(Debug, Clone, Default)]
pub struct SequentialReader {
    line_number: u64,
    filter: Option<RangeSet>,
}

impl SequentialReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical number of the last line consumed (0 before the first read).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn filter(&self) -> Option<&RangeSet> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<RangeSet>) {
        self.filter = filter;
    }

    fn in_range(&self, index: u64) -> bool {
        self.filter.as_ref().is_none_or(|f| f.contains(index))
    }

    /// Consume the next physical line, whatever it holds.
    pub fn read_line<S: BufRead>(&mut self, storage: &mut S) -> Result<Option<RawRecord>> {
        let mut bytes = Vec::new();
        if storage.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(RawRecord {
            index: self.line_number,
            text: bytes,
        }))
    }

    /// Advance to the next line of a known kind whose index passes the filter.
    pub fn next_known<S: BufRead>(
        &mut self,
        storage: &mut S,
        kinds: &RecordKinds,
    ) -> Result<Option<RawRecord>> {
        while let Some(raw) = self.read_line(storage)? {
            let known = matches!(kinds.resolve(&raw.text), KindResolution::Known(_));
            if known && self.in_range(raw.index) {
                return Ok(Some(raw));
            }
            trace!("Skipping line {} (known kind: {known})", raw.index);
        }
        Ok(None)
    }
}

/// Chunked reader for single-kind fixed-width files.
#[derive(Debug, Clone)]
pub struct FastReader {
    record_width: u64,
    record_count: u64,
    budget: u64,
    chunks: VecDeque<Chunk>,
    ranges: Option<RangeSet>,
    buffer: Option<Vec<u8>>,
    buffer_first_index: u64,
    position: usize,
    last_index: u64,
}

impl FastReader {
    /// Measure the record width from the first line, then plan the whole
    /// file. Leaves the storage positioned at the start.
    ///
    /// `budget` is rounded down to whole records; `None` picks
    /// [`default_budget`].
    pub fn new<S: BufRead + Seek>(storage: &mut S, budget: Option<u64>) -> Result<Self> {
        storage.seek(SeekFrom::Start(0))?;
        let mut first = Vec::new();
        let record_width = storage.read_until(b'\n', &mut first)? as u64;
        let file_len = storage.seek(SeekFrom::End(0))?;
        storage.seek(SeekFrom::Start(0))?;

        let budget = match budget {
            Some(b) => normalize_budget(b, record_width),
            None => default_budget(record_width),
        };
        debug!("Fast mode: record width {record_width}, file length {file_len}, budget {budget}");

        let record_count = match record_width {
            0 => 0,
            w => file_len.div_ceil(w),
        };
        let mut reader = Self {
            record_width,
            record_count,
            budget,
            chunks: VecDeque::new(),
            ranges: None,
            buffer: None,
            buffer_first_index: 0,
            position: 0,
            last_index: 0,
        };
        if record_count > 0 {
            let whole = RangeSet::new(vec![1..=record_count])?;
            reader.chunks = plan_chunks(&whole, record_width, record_count, budget).into();
        }
        Ok(reader)
    }

    pub fn record_width(&self) -> u64 {
        self.record_width
    }

    /// Records in the file, counting a partial final record.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn ranges(&self) -> Option<&RangeSet> {
        self.ranges.as_ref()
    }

    /// Chunks not yet read.
    pub fn pending_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Index of the last record returned (0 before the first).
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    /// Replace the whole-file plan with one covering only `ranges`.
    /// Allowed once per session.
    pub fn set_ranges(&mut self, ranges: RangeSet) -> Result<()> {
        if self.ranges.is_some() {
            return Err(FlrError::ConfigurationConflict(
                "ranges have already been assigned for this file".to_string(),
            ));
        }
        self.chunks = plan_chunks(&ranges, self.record_width, self.record_count, self.budget).into();
        self.buffer = None;
        self.position = 0;
        self.ranges = Some(ranges);
        Ok(())
    }

    /// No buffered chunk and no chunk left to read.
    pub fn is_finished(&self) -> bool {
        self.buffer.is_none() && self.chunks.is_empty()
    }

    /// Pull the next chunk into memory. Returns false when none remain.
    fn fill<S: Read + Seek>(&mut self, storage: &mut S) -> Result<bool> {
        while let Some(chunk) = self.chunks.pop_front() {
            storage.seek(SeekFrom::Start(chunk.offset))?;
            let mut buf = Vec::new();
            storage.by_ref().take(chunk.len).read_to_end(&mut buf)?;
            trace!(
                "Read chunk at {} ({} of {} bytes)",
                chunk.offset,
                buf.len(),
                chunk.len
            );
            if buf.is_empty() {
                continue;
            }
            self.buffer_first_index = chunk.offset / self.record_width + 1;
            self.buffer = Some(buf);
            self.position = 0;
            return Ok(true);
        }
        Ok(false)
    }

    /// Slice the next record out of the current chunk, reading a new chunk
    /// when the current one is used up. A short read at end of file yields
    /// its trailing partial record as the last one.
    pub fn next_raw<S: Read + Seek>(&mut self, storage: &mut S) -> Result<Option<RawRecord>> {
        if self.buffer.is_none() && !self.fill(storage)? {
            return Ok(None);
        }
        let Some(buf) = self.buffer.as_ref() else {
            return Ok(None);
        };

        let start = self.position;
        let end = (start + self.record_width as usize).min(buf.len());
        let text = buf[start..end].to_vec();
        let exhausted = end >= buf.len();

        let index = self.buffer_first_index + start as u64 / self.record_width;
        self.position = end;
        if exhausted {
            self.buffer = None;
            self.position = 0;
        }
        self.last_index = index;
        Ok(Some(RawRecord { index, text }))
    }
}

/// Which read path a session uses.
#[derive(Debug, Clone)]
pub enum ReadMode {
    Sequential(SequentialReader),
    Fast(FastReader),
}

impl Default for ReadMode {
    fn default() -> Self {
        ReadMode::Sequential(SequentialReader::new())
    }
}

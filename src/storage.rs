//! File-backed storage for a record file session.
//!
//! A session needs line reads, absolute seeks and bulk reads when reading,
//! and plain writes when writing. [`FileStorage`] opens a path in one
//! direction and refuses operations in the other.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// How to open a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Create or truncate.
    Write,
    /// Create if missing, append otherwise.
    Append,
}

/// A file opened for reading or writing.
#[derive(Debug)]
pub enum FileStorage {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> io::Result<Self> {
        let path = path.as_ref();
        Ok(match mode {
            OpenMode::Read => FileStorage::Reader(BufReader::new(File::open(path)?)),
            OpenMode::Write => FileStorage::Writer(BufWriter::new(File::create(path)?)),
            OpenMode::Append => FileStorage::Writer(BufWriter::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
        })
    }

    /// Flush pending writes. Dropping the storage afterwards closes the file.
    pub fn close(self) -> io::Result<()> {
        match self {
            FileStorage::Reader(_) => Ok(()),
            FileStorage::Writer(mut w) => w.flush(),
        }
    }
}

fn wrong_direction(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot {op}: record file opened in the other direction"),
    )
}

impl Read for FileStorage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileStorage::Reader(r) => r.read(buf),
            FileStorage::Writer(_) => Err(wrong_direction("read")),
        }
    }
}

impl BufRead for FileStorage {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            FileStorage::Reader(r) => r.fill_buf(),
            FileStorage::Writer(_) => Err(wrong_direction("read")),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let FileStorage::Reader(r) = self {
            r.consume(amt);
        }
    }
}

impl Seek for FileStorage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            FileStorage::Reader(r) => r.seek(pos),
            FileStorage::Writer(w) => w.seek(pos),
        }
    }
}

impl Write for FileStorage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileStorage::Reader(_) => Err(wrong_direction("write")),
            FileStorage::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileStorage::Reader(_) => Ok(()),
            FileStorage::Writer(w) => w.flush(),
        }
    }
}

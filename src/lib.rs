//! # flr-file
//!
//! Reader and writer for files of fixed-width text records.
//!
//! A single file may interleave several record kinds, each with its own
//! field layout and, when more than one kind is present, a discriminator
//! string at a fixed column that identifies it.
//!
//! ## Overview
//!
//! - **Layouts**: per-kind field lists, from column ranges or explicit descriptors
//! - **Kind resolution**: single kind, or first matching discriminator
//! - **Sequential reading**: line scanner, any number of kinds, optional line filter
//! - **Fast reading**: single-kind fixed-width files read in bulk chunks
//!   covering only the requested record ranges
//! - **Writing**: records encoded through their kind's template, one
//!   separator between consecutive records
//!
//! ## Example
//!
//! ```
//! use flr_file::{FlrFile, RangeSet, parse_layout};
//! use std::io::Cursor;
//!
//! let config = parse_layout("KIND A\nFIELD A x 1-3\nFIELD A y 4-5\n")?;
//! let mut file = FlrFile::new(Cursor::new("abc12\ndef34\nghi56\n"), config)?;
//!
//! file.enable_fast()?;
//! file.set_ranges(RangeSet::parse("2..3")?)?;
//!
//! let xs: Vec<String> = file
//!     .records()
//!     .map(|r| r.map(|rec| rec.get("x").unwrap_or_default().to_string()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(xs, vec!["def", "ghi"]);
//! # Ok::<(), flr_file::FlrError>(())
//! ```

pub mod chunk;
pub mod dsl;
pub mod error;
pub mod file;
pub mod iter;
pub mod kind;
pub mod layout;
pub mod range_set;
pub mod reader;
pub mod storage;
pub mod template;

pub use chunk::{Chunk, plan_chunks};
pub use dsl::parse_layout;
pub use error::{FlrError, Result};
pub use file::{FlrConfig, FlrFile};
pub use iter::Records;
pub use kind::{Discriminator, KindResolution, RecordKinds};
pub use layout::{FieldDescriptor, LayoutSpec};
pub use range_set::RangeSet;
pub use reader::RawRecord;
pub use storage::{FileStorage, OpenMode};
pub use template::{FixedWidthTemplate, Record, RecordTemplate, TemplateSet};

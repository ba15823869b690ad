//! Parser for layout definition text.
//!
//! Definition format:
//! ```text
//! # Two record kinds, told apart by the first column
//! KIND header MATCH "H" AT 1
//! KIND detail MATCH "D" AT 1
//! FIELD header title 2-20
//! FIELD detail amount 2..9
//! EXTRA source
//! FIRSTCOL 1
//! BUDGET 1000000
//! ```
//!
//! - `KIND name` declares the only kind of a single-kind file
//! - `KIND name MATCH "text" AT col` declares a discriminated kind; the
//!   first non-blank character after MATCH delimits the text
//! - `FIELD kind name a-b` (or `a..b`) adds an inclusive column range
//! - `EXTRA name` appends an always-blank column to decoded records
//! - `FIRSTCOL n` sets the column number of a line's first byte
//! - `BUDGET n` sets the fast-mode chunk size in bytes
//! - Lines starting with `#` are comments
//!
//! Discriminated kinds are tried in the order they are declared.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::{FlrError, Result};
use crate::file::FlrConfig;
use crate::kind::{Discriminator, RecordKinds};
use crate::layout::DeclarativeLayout;

/// One parsed definition line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// KIND name [MATCH "text" AT col]
    Kind {
        name: String,
        discriminator: Option<(String, usize)>,
    },
    /// FIELD kind name a-b
    Field {
        kind: String,
        name: String,
        columns: RangeInclusive<usize>,
    },
    /// EXTRA name
    Extra { name: String },
    /// FIRSTCOL n
    FirstColumn { column: usize },
    /// BUDGET n
    Budget { bytes: u64 },
}

/// Parse definition text into directives, reporting the first bad line.
pub fn parse_directives(text: &str) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let directive = parse_directive(line).map_err(|e| {
            FlrError::LayoutDefinition(format!("Line {}: {}", line_num + 1, e))
        })?;
        directives.push(directive);
    }
    Ok(directives)
}

/// Parse definition text into a session configuration.
pub fn parse_layout(text: &str) -> Result<FlrConfig> {
    build_config(parse_directives(text)?).map_err(FlrError::LayoutDefinition)
}

fn build_config(directives: Vec<Directive>) -> std::result::Result<FlrConfig, String> {
    let mut plain: Vec<String> = Vec::new();
    let mut discriminators: Vec<Discriminator> = Vec::new();
    let mut layout = DeclarativeLayout::new();
    let mut extra = Vec::new();
    let mut first_column = None;
    let mut budget = None;

    for directive in directives {
        match directive {
            Directive::Kind {
                name,
                discriminator,
            } => {
                if layout.contains_key(&name) {
                    return Err(format!("record kind '{name}' declared twice"));
                }
                layout.insert(name.clone(), BTreeMap::new());
                match discriminator {
                    Some((text, column)) => {
                        discriminators.push(Discriminator::new(name, text, column))
                    }
                    None => plain.push(name),
                }
            }
            Directive::Field {
                kind,
                name,
                columns,
            } => {
                let fields = layout
                    .get_mut(&kind)
                    .ok_or_else(|| format!("FIELD {name} names undeclared kind '{kind}'"))?;
                fields.insert(name, columns);
            }
            Directive::Extra { name } => extra.push(name),
            Directive::FirstColumn { column } => first_column = Some(column),
            Directive::Budget { bytes } => budget = Some(bytes),
        }
    }

    let kinds = match (plain.len(), discriminators.is_empty()) {
        (0, true) => return Err("no KIND declared".to_string()),
        (1, true) => RecordKinds::Single(plain.remove(0)),
        (0, false) => RecordKinds::Discriminated(discriminators),
        (_, true) => return Err("only one KIND may omit MATCH".to_string()),
        (_, false) => {
            return Err("KIND without MATCH cannot be mixed with discriminated kinds".to_string());
        }
    };

    let mut config = FlrConfig::new(kinds, layout).with_extra_columns(extra);
    if let Some(column) = first_column {
        config = config.with_logical_first_column(column);
    }
    if let Some(bytes) = budget {
        config = config.with_buffer_budget(bytes);
    }
    Ok(config)
}

fn parse_directive(line: &str) -> std::result::Result<Directive, String> {
    let keyword = line.split_whitespace().next().unwrap_or(line);
    let rest = line[keyword.len()..].trim();
    match keyword.to_uppercase().as_str() {
        "KIND" => parse_kind(rest),
        "FIELD" => parse_field(rest),
        "EXTRA" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [name] => Ok(Directive::Extra {
                name: name.to_string(),
            }),
            _ => Err("EXTRA requires exactly one column name".to_string()),
        },
        "FIRSTCOL" => {
            let column = rest.parse().map_err(|_| "FIRSTCOL requires a number")?;
            Ok(Directive::FirstColumn { column })
        }
        "BUDGET" => {
            let bytes = rest.parse().map_err(|_| "BUDGET requires a number of bytes")?;
            Ok(Directive::Budget { bytes })
        }
        _ => Err(format!("Unknown directive: {keyword}")),
    }
}

/// Parse `name [MATCH <delim>text<delim> AT col]`.
fn parse_kind(rest: &str) -> std::result::Result<Directive, String> {
    let name = rest
        .split_whitespace()
        .next()
        .ok_or("KIND requires a name")?
        .to_string();
    let after_name = rest[name.len()..].trim_start();
    if after_name.is_empty() {
        return Ok(Directive::Kind {
            name,
            discriminator: None,
        });
    }

    let Some(match_part) = strip_keyword(after_name, "MATCH") else {
        return Err(format!("expected MATCH after KIND {name}"));
    };
    let (text, tail) = parse_match_text(match_part)?;
    if text.is_empty() {
        return Err("MATCH text cannot be empty".to_string());
    }
    let Some(column) = strip_keyword(tail.trim_start(), "AT") else {
        return Err("MATCH requires AT <column>".to_string());
    };
    let column: usize = column
        .trim()
        .parse()
        .map_err(|_| "Invalid column number after AT")?;
    if column == 0 {
        return Err("discriminator columns start at 1".to_string());
    }
    Ok(Directive::Kind {
        name,
        discriminator: Some((text, column)),
    })
}

/// Parse `kind name a-b`.
fn parse_field(rest: &str) -> std::result::Result<Directive, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [kind, name, columns] = parts.as_slice() else {
        return Err("FIELD requires kind, name and columns".to_string());
    };
    let (lo, hi) = columns
        .split_once("..")
        .or_else(|| columns.split_once('-'))
        .ok_or_else(|| format!("Invalid column range '{columns}'; use a-b or a..b"))?;
    let lo: usize = lo.parse().map_err(|_| format!("Invalid start column in '{columns}'"))?;
    let hi: usize = hi
        .trim_start_matches('=')
        .parse()
        .map_err(|_| format!("Invalid end column in '{columns}'"))?;
    if hi < lo {
        return Err(format!("Column range '{columns}' ends before it starts"));
    }
    Ok(Directive::Field {
        kind: kind.to_string(),
        name: name.to_string(),
        columns: lo..=hi,
    })
}

/// Case-insensitive keyword prefix followed by whitespace or end of input.
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    let tail = &s[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && (tail.is_empty() || tail.starts_with(char::is_whitespace)) {
        Some(tail)
    } else {
        None
    }
}

/// Read the discriminator text of a MATCH clause. The text is quoted by
/// whatever character opens it (`"HDR"`, `/A"B/`), so a discriminator may
/// hold spaces or double quotes. Returns the text and what follows the
/// closing quote.
fn parse_match_text(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let Some(quote) = s.chars().next() else {
        return Err("MATCH needs quoted text".to_string());
    };
    match s[quote.len_utf8()..].split_once(quote) {
        Some((text, tail)) => Ok((text.to_string(), tail)),
        None => Err(format!("MATCH text is missing its closing {quote}")),
    }
}

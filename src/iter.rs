//! Lazy traversal over the records of a session.

use std::io::{BufRead, Seek};

use crate::error::Result;
use crate::file::FlrFile;
use crate::template::Record;

/// Forward-only iterator over decoded records.
///
/// Each item has already passed kind and range filtering. The iterator
/// advances the session's own cursor, so it cannot be restarted, and it
/// stops for good after the first error.
///
/// Created by [`FlrFile::records`].
pub struct Records<'a, S> {
    file: &'a mut FlrFile<S>,
    done: bool,
}

impl<'a, S> Records<'a, S> {
    pub(crate) fn new(file: &'a mut FlrFile<S>) -> Self {
        Self { file, done: false }
    }
}

impl<S: BufRead + Seek> Iterator for Records<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.file.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, S: BufRead + Seek> IntoIterator for &'a mut FlrFile<S> {
    type Item = Result<Record>;
    type IntoIter = Records<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        Records::new(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::file::{FlrConfig, FlrFile};
    use crate::kind::{Discriminator, RecordKinds};
    use crate::layout::{CanonicalLayout, FieldDescriptor};
    use std::io::Cursor;

    fn config() -> FlrConfig {
        let mut layout = CanonicalLayout::new();
        layout.insert("a".to_string(), vec![FieldDescriptor::new("v", 2, 2)]);
        layout.insert("b".to_string(), vec![FieldDescriptor::new("v", 2, 3)]);
        FlrConfig::new(
            RecordKinds::Discriminated(vec![
                Discriminator::new("a", "A", 1),
                Discriminator::new("b", "B", 1),
            ]),
            layout,
        )
    }

    #[test]
    fn test_for_loop_over_session() {
        let mut file = FlrFile::new(Cursor::new("A01\nB002\nA03\n"), config()).unwrap();
        let mut values = Vec::new();
        for record in &mut file {
            values.push(record.unwrap().get("v").unwrap().to_string());
        }
        assert_eq!(values, vec!["01", "002", "03"]);
    }

    #[test]
    fn test_not_restartable() {
        let mut file = FlrFile::new(Cursor::new("A01\nA02\n"), config()).unwrap();
        assert_eq!(file.records().take(1).count(), 1);
        assert_eq!(file.records().count(), 1);
        assert_eq!(file.records().count(), 0);
    }

    #[test]
    fn test_unknown_trailing_line_ends_cleanly() {
        let mut file = FlrFile::new(Cursor::new("A01\nB002\nQ???\n"), config()).unwrap();
        let records: Vec<_> = file.records().collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_ok()));
    }
}

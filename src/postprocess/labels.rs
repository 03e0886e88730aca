//! Class label table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::InitializationError;
use crate::postprocess::detection::UNKNOWN_LABEL;

/// Ordered, index-addressed class names, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a plain-text label resource: one label per line, blank lines skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut labels = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let label = line.trim();
            if !label.is_empty() {
                labels.push(label.to_string());
            }
        }
        Ok(Self { labels })
    }

    /// Load a label file. An unreadable or empty file is fatal to startup.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InitializationError> {
        let path = path.as_ref();
        let io_err = |source| InitializationError::LabelIo {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let table = Self::from_reader(BufReader::new(file)).map_err(io_err)?;
        if table.is_empty() {
            return Err(InitializationError::EmptyLabelTable);
        }

        tracing::debug!(path = %path.display(), count = table.len(), "loaded label table");
        Ok(table)
    }

    /// Label for `class_id`, if the table has one.
    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.labels.get(class_id).map(String::as_str)
    }

    /// Label for `class_id`, falling back to `"Unknown"`.
    pub fn name_or_unknown(&self, class_id: usize) -> &str {
        self.get(class_id).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

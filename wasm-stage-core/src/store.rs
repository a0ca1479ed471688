//! In-memory staging area for uploaded files.
//!
//! The [`FileStore`] is the single owner of "what has been uploaded". Records
//! keep their insertion position; re-adding a path replaces the record in
//! place (last write wins, never a duplicate).

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::classify::{classify, FileKind};
use crate::encoding::{encode, EncodedBytes};

/// Content as handed over by the caller, before classification.
#[derive(Debug, Clone)]
pub enum RawContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl RawContent {
    fn byte_len(&self) -> usize {
        match self {
            RawContent::Bytes(b) => b.len(),
            RawContent::Text(t) => t.len(),
        }
    }
}

impl From<Vec<u8>> for RawContent {
    fn from(bytes: Vec<u8>) -> Self {
        RawContent::Bytes(bytes)
    }
}

impl From<&[u8]> for RawContent {
    fn from(bytes: &[u8]) -> Self {
        RawContent::Bytes(bytes.to_vec())
    }
}

impl From<String> for RawContent {
    fn from(text: String) -> Self {
        RawContent::Text(text)
    }
}

impl From<&str> for RawContent {
    fn from(text: &str) -> Self {
        RawContent::Text(text.to_string())
    }
}

/// Stored content. The variant always agrees with the record's `is_binary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Encoded(EncodedBytes),
}

impl FileContent {
    /// The string carried on the wire and handed to the converter.
    pub fn as_transport_str(&self) -> &str {
        match self {
            FileContent::Text(t) => t,
            FileContent::Encoded(e) => e.as_str(),
        }
    }
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub is_binary: bool,
    pub content: FileContent,
}

impl StagedFile {
    fn new(path: &str, raw: RawContent) -> Self {
        let classification = classify(path);
        let size_bytes = raw.byte_len() as u64;
        let content = if classification.is_binary {
            match raw {
                RawContent::Bytes(b) => FileContent::Encoded(encode(&b)),
                RawContent::Text(t) => FileContent::Encoded(encode(t.as_bytes())),
            }
        } else {
            match raw {
                RawContent::Bytes(b) => match String::from_utf8_lossy(&b) {
                    Cow::Borrowed(text) => FileContent::Text(text.to_string()),
                    Cow::Owned(text) => {
                        warn!(
                            path = %path,
                            size_bytes,
                            "Text file is not valid UTF-8; invalid sequences replaced"
                        );
                        FileContent::Text(text)
                    }
                },
                RawContent::Text(t) => FileContent::Text(t),
            }
        };
        StagedFile {
            path: path.to_string(),
            kind: classification.kind,
            size_bytes,
            is_binary: classification.is_binary,
            content,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct FileStore {
    files: Vec<StagedFile>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify, encode if binary, and insert or overwrite `path`.
    pub fn add(&mut self, path: &str, raw: impl Into<RawContent>) -> &StagedFile {
        let record = StagedFile::new(path, raw.into());
        debug!(
            path,
            kind = %record.kind,
            size = record.size_bytes,
            binary = record.is_binary,
            "Staged file"
        );
        match self.position(path) {
            Some(idx) => {
                self.files[idx] = record;
                &self.files[idx]
            }
            None => {
                self.files.push(record);
                &self.files[self.files.len() - 1]
            }
        }
    }

    /// Remove `path` if present. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.position(path) {
            Some(idx) => {
                self.files.remove(idx);
                debug!(path, "Removed staged file");
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Ordered copy of the current records.
    pub fn snapshot(&self) -> Vec<StagedFile> {
        self.files.clone()
    }

    pub fn get(&self, path: &str) -> Option<&StagedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn has_compilable(&self) -> bool {
        self.files.iter().any(|f| f.kind.is_compilable())
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|f| f.path == path)
    }
}

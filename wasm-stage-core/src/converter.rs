//! Native in-process converter used for local mode.

use tracing::debug;

use crate::classify::FileKind;
use crate::contract::{FileInfo, LocalConverter};
use crate::manifest::{render_index, ManifestDocument};
use crate::store::FileContent;

#[derive(Debug, Clone)]
struct Registered {
    name: String,
    kind: FileKind,
    size: u64,
    content: FileContent,
}

impl Registered {
    fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            kind: self.kind.label().to_string(),
            size: self.size,
        }
    }
}

/// File registry that renders the manifest and index document itself.
///
/// Registration appends; the store already guarantees unique paths, so no
/// de-duplication happens here.
#[derive(Debug, Default)]
pub struct BuiltinConverter {
    files: Vec<Registered>,
}

impl BuiltinConverter {
    pub fn new() -> Self {
        Self::default()
    }

    fn infos(&self) -> Vec<FileInfo> {
        self.files.iter().map(Registered::info).collect()
    }
}

impl LocalConverter for BuiltinConverter {
    fn reset(&mut self) {
        debug!(dropped = self.files.len(), "Converter registry reset");
        self.files.clear();
    }

    fn register_file(&mut self, path: &str, kind: FileKind, size: u64, content: &FileContent) {
        self.files.push(Registered {
            name: path.to_string(),
            kind,
            size,
            content: content.clone(),
        });
    }

    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn file_info(&self, index: usize) -> Option<FileInfo> {
        self.files.get(index).map(Registered::info)
    }

    fn generate_manifest(&self) -> String {
        let doc = ManifestDocument {
            files: self.infos(),
        };
        serde_json::to_string(&doc).unwrap_or_default()
    }

    fn generate_index(&self) -> String {
        render_index(&self.infos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode;

    #[test]
    fn size_is_taken_from_registration() {
        let mut conv = BuiltinConverter::new();
        conv.register_file("a.wav", FileKind::Audio, 7, &FileContent::Encoded(encode(&[0; 7])));
        assert_eq!(conv.file_info(0).unwrap().size, 7);
        assert_eq!(conv.file_info(1), None);
    }

    #[test]
    fn manifest_lists_files_in_order() {
        let mut conv = BuiltinConverter::new();
        conv.register_file("a.txt", FileKind::Text, 3, &FileContent::Text("abc".into()));
        conv.register_file("b.json", FileKind::Json, 2, &FileContent::Text("{}".into()));
        let value: serde_json::Value = serde_json::from_str(&conv.generate_manifest()).unwrap();
        assert_eq!(value["files"][0]["name"], "a.txt");
        assert_eq!(value["files"][1]["type"], "JSON");
        let doc: ManifestDocument = serde_json::from_value(value).unwrap();
        assert_eq!(doc.total_size(), 5);
    }

    #[test]
    fn reset_empties_registry() {
        let mut conv = BuiltinConverter::new();
        conv.register_file("a.txt", FileKind::Text, 1, &FileContent::Text("x".into()));
        conv.reset();
        assert_eq!(conv.file_count(), 0);
        assert_eq!(conv.generate_manifest(), r#"{"files":[]}"#);
    }
}

//! Project description: mode selection, manifest JSON and the index document.
//!
//! Both generation paths converge on the same manifest shape
//! (`{"files":[{"name","type","size"}]}`) and the same index layout, so the
//! caller can render either without knowing which path produced it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::{FileInfo, LocalConverter};
use crate::store::{FileContent, StagedFile};

/// Which generation path a process request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Manifest and index come from the in-process converter.
    Local,
    /// Output is gated on a remote compilation.
    Compiled,
}

/// Compiled iff at least one staged file is a source or header.
pub fn select_mode(snapshot: &[StagedFile]) -> ProcessMode {
    if snapshot.iter().any(|f| f.kind.is_compilable()) {
        ProcessMode::Compiled
    } else {
        ProcessMode::Local
    }
}

/// Manifest wire shape shared by both modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub files: Vec<FileInfo>,
}

impl ManifestDocument {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub kind: crate::classify::FileKind,
    pub size_bytes: u64,
}

/// Transient description of the staged set, rebuilt on every process request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectManifest {
    pub entries: Vec<ManifestEntry>,
}

impl ProjectManifest {
    pub fn from_snapshot(snapshot: &[StagedFile]) -> Self {
        ProjectManifest {
            entries: snapshot
                .iter()
                .map(|f| ManifestEntry {
                    path: f.path.clone(),
                    kind: f.kind,
                    size_bytes: f.size_bytes,
                })
                .collect(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }

    pub fn file_infos(&self) -> Vec<FileInfo> {
        self.entries
            .iter()
            .map(|e| FileInfo {
                name: e.path.clone(),
                kind: e.kind.label().to_string(),
                size: e.size_bytes,
            })
            .collect()
    }

    pub fn to_document(&self) -> ManifestDocument {
        ManifestDocument {
            files: self.file_infos(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings and integers only; serialization cannot fail.
        serde_json::to_string(&self.to_document()).unwrap_or_default()
    }

    pub fn to_index(&self) -> String {
        render_index(&self.file_infos())
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Index document listing every file with its type and size.
pub fn render_index(files: &[FileInfo]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Converted Project</title></head>\n<body>\n<h1>Project Files</h1>\n<ul>\n",
    );
    for f in files {
        html.push_str(&format!(
            "<li>{} ({}, {} bytes)</li>\n",
            escape_html(&f.name),
            escape_html(&f.kind),
            f.size
        ));
    }
    html.push_str("</ul>\n</body>\n</html>");
    html
}

/// Quick structural facts about a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub file: String,
    pub lines: usize,
    pub size: u64,
    pub has_main: bool,
}

impl SourceAnalysis {
    /// Line count is newlines + 1; `has_main` is a plain text search.
    pub fn of(path: &str, text: &str) -> Self {
        SourceAnalysis {
            file: path.to_string(),
            lines: text.matches('\n').count() + 1,
            size: text.len() as u64,
            has_main: text.contains("int main"),
        }
    }
}

/// Analyse every translation unit in the snapshot, in store order.
pub fn analyze_sources(snapshot: &[StagedFile]) -> Vec<SourceAnalysis> {
    snapshot
        .iter()
        .filter(|f| f.kind.is_translation_unit())
        .filter_map(|f| match &f.content {
            FileContent::Text(text) => Some(SourceAnalysis::of(&f.path, text)),
            FileContent::Encoded(_) => None,
        })
        .collect()
}

/// Everything the local path produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalOutput {
    /// Converter output, verbatim.
    pub manifest_json: String,
    /// Converter output, verbatim.
    pub index_html: String,
    pub files: Vec<FileInfo>,
}

/// Register the snapshot with the converter and collect its outputs.
pub fn build_local<C>(converter: &mut C, snapshot: &[StagedFile]) -> LocalOutput
where
    C: LocalConverter + ?Sized,
{
    converter.reset();
    for f in snapshot {
        converter.register_file(&f.path, f.kind, f.size_bytes, &f.content);
        debug!(path = %f.path, kind = %f.kind, "Registered file with converter");
    }

    let manifest_json = converter.generate_manifest();
    let index_html = converter.generate_index();
    let files: Vec<FileInfo> = (0..converter.file_count())
        .filter_map(|i| converter.file_info(i))
        .collect();

    info!(files = files.len(), "Local manifest generated");

    LocalOutput {
        manifest_json,
        index_html,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;

    #[test]
    fn mode_selection_partitions_on_compilable() {
        let mut store = FileStore::new();
        assert_eq!(select_mode(&store.snapshot()), ProcessMode::Local);
        store.add("art.png", vec![1, 2, 3]);
        store.add("notes.txt", "hi");
        assert_eq!(select_mode(&store.snapshot()), ProcessMode::Local);
        store.add("include/math.h", "int add(int, int);");
        assert_eq!(select_mode(&store.snapshot()), ProcessMode::Compiled);
    }

    #[test]
    fn manifest_json_shape() {
        let mut store = FileStore::new();
        store.add("main.cpp", "int main(){}");
        let manifest = ProjectManifest::from_snapshot(&store.snapshot());
        let value: serde_json::Value = serde_json::from_str(&manifest.to_json()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"files":[{"name":"main.cpp","type":"C++ Source","size":12}]})
        );
        assert_eq!(manifest.total_size(), 12);
    }

    #[test]
    fn analysis_counts_lines_and_main() {
        let a = SourceAnalysis::of("main.cpp", "#include <cstdio>\nint main() {\n  return 0;\n}");
        assert_eq!(a.lines, 4);
        assert!(a.has_main);
        assert!(!SourceAnalysis::of("util.c", "static int x;").has_main);
    }

    #[test]
    fn only_translation_units_are_analysed() {
        let mut store = FileStore::new();
        store.add("game.h", "int f();");
        store.add("game.cpp", "int f() { return 1; }\n");
        store.add("notes.txt", "int main");
        let analysis = analyze_sources(&store.snapshot());
        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis[0].file, "game.cpp");
        assert_eq!(analysis[0].lines, 2);
    }

    #[test]
    fn index_escapes_names() {
        let html = render_index(&[FileInfo {
            name: "<b>.txt".into(),
            kind: "Text".into(),
            size: 1,
        }]);
        assert!(html.contains("<li>&lt;b&gt;.txt (Text, 1 bytes)</li>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}

//! File classification by extension.
//!
//! Classification is a pure function of the path: the same path always yields
//! the same [`Classification`], regardless of content or call order.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Semantic kind of a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    CppSource,
    Header,
    CSource,
    Image,
    Audio,
    WindowsLibrary,
    SharedObject,
    Text,
    Json,
    Script,
    Unknown,
}

impl FileKind {
    /// Display name, also used as the manifest `type` field.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::CppSource => "C++ Source",
            FileKind::Header => "Header",
            FileKind::CSource => "C Source",
            FileKind::Image => "Image",
            FileKind::Audio => "Audio",
            FileKind::WindowsLibrary => "Windows Library",
            FileKind::SharedObject => "Shared Object",
            FileKind::Text => "Text",
            FileKind::Json => "JSON",
            FileKind::Script => "Script",
            FileKind::Unknown => "Unknown",
        }
    }

    /// Sources and headers: anything the remote compiler consumes as code.
    pub fn is_compilable(&self) -> bool {
        matches!(
            self,
            FileKind::CppSource | FileKind::Header | FileKind::CSource
        )
    }

    /// Compilable files that are compiled on their own (not headers).
    pub fn is_translation_unit(&self) -> bool {
        matches!(self, FileKind::CppSource | FileKind::CSource)
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            FileKind::Image | FileKind::Audio | FileKind::WindowsLibrary | FileKind::SharedObject
        )
    }

    fn from_extension(ext: &str) -> Self {
        match ext {
            "cpp" | "cc" => FileKind::CppSource,
            "h" | "hpp" => FileKind::Header,
            "c" => FileKind::CSource,
            "png" | "jpg" | "jpeg" => FileKind::Image,
            "ogg" | "wav" | "mp3" => FileKind::Audio,
            "dll" => FileKind::WindowsLibrary,
            "so" => FileKind::SharedObject,
            "txt" => FileKind::Text,
            "json" => FileKind::Json,
            "vas" => FileKind::Script,
            _ => FileKind::Unknown,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of [`classify`]: the kind and whether its content travels encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: FileKind,
    pub is_binary: bool,
}

/// Lower-cased text after the last `.` of the final path segment.
pub fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rfind('.')
        .map(|dot| file_name[dot + 1..].to_ascii_lowercase())
}

/// Classify a path by its extension.
pub fn classify(path: &str) -> Classification {
    let kind = extension(path)
        .map(|ext| FileKind::from_extension(&ext))
        .unwrap_or(FileKind::Unknown);

    if kind == FileKind::Unknown {
        info!(path, "Unrecognised extension, classifying as Unknown");
    }

    Classification {
        kind,
        is_binary: kind.is_binary(),
    }
}

//! Writes process results to the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use wasm_stage_core::artifact::{preview_document, JS_FILENAME, WASM_FILENAME};
use wasm_stage_core::{ArtifactSet, CompiledOutput, LocalOutput};

pub const MANIFEST_FILENAME: &str = "manifest.json";
pub const INDEX_FILENAME: &str = "index.html";
pub const PREVIEW_FILENAME: &str = "preview.html";

/// Local mode: `manifest.json` and `index.html`. Returns the written paths.
pub fn write_local(dir: &Path, output: &LocalOutput) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;
    let written = vec![
        write(dir, MANIFEST_FILENAME, pretty_json(&output.manifest_json)?.as_bytes())?,
        write(dir, INDEX_FILENAME, output.index_html.as_bytes())?,
    ];
    info!(dir = %dir.display(), files = written.len(), "Wrote local output");
    Ok(written)
}

/// Compiled mode: manifest and index, both artifacts, and a preview page
/// that loads them from the same directory.
pub fn write_compiled(
    dir: &Path,
    output: &CompiledOutput,
    artifacts: &ArtifactSet,
) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;
    let mut written = vec![
        write(dir, MANIFEST_FILENAME, pretty_json(&output.manifest.to_json())?.as_bytes())?,
        write(dir, INDEX_FILENAME, output.manifest.to_index().as_bytes())?,
    ];
    for download in artifacts.downloads() {
        written.push(write(dir, download.filename, download.bytes)?);
    }
    // On disk the refs are plain sibling files, not artifact:// URIs.
    let preview = preview_document(JS_FILENAME, WASM_FILENAME);
    written.push(write(dir, PREVIEW_FILENAME, preview.as_bytes())?);

    info!(
        dir = %dir.display(),
        files = written.len(),
        generation = output.generation,
        "Wrote compiled output"
    );
    Ok(written)
}

fn pretty_json(raw: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("Converter produced an invalid manifest")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

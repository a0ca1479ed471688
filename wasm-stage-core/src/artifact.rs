//! Compiled artifacts: decoding, loadable references, preview and downloads.
//!
//! The assembler holds at most one [`ArtifactSet`]. Each set is stamped with a
//! generation; references issued for an older generation never resolve again,
//! whether the set was replaced by a newer compilation or released by `clear`.

use tracing::{debug, info};
use uuid::Uuid;

use crate::encoding::{decode, EncodedBytes, EncodingError};

pub const JS_FILENAME: &str = "output.js";
pub const WASM_FILENAME: &str = "output.wasm";
pub const JS_CONTENT_TYPE: &str = "application/javascript";
pub const WASM_CONTENT_TYPE: &str = "application/wasm";

/// Opaque handle to one artifact of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    generation: u64,
    id: Uuid,
    name: &'static str,
}

impl ArtifactRef {
    fn issue(generation: u64, name: &'static str) -> Self {
        ArtifactRef {
            generation,
            id: Uuid::new_v4(),
            name,
        }
    }

    pub fn uri(&self) -> String {
        format!("artifact://{}/{}", self.id, self.name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A file offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download<'a> {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: &'a [u8],
}

#[derive(Debug)]
pub struct ArtifactSet {
    generation: u64,
    js: Vec<u8>,
    wasm: Vec<u8>,
    js_ref: ArtifactRef,
    wasm_ref: ArtifactRef,
}

impl ArtifactSet {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn js(&self) -> &[u8] {
        &self.js
    }

    pub fn wasm(&self) -> &[u8] {
        &self.wasm
    }

    pub fn js_ref(&self) -> &ArtifactRef {
        &self.js_ref
    }

    pub fn wasm_ref(&self) -> &ArtifactRef {
        &self.wasm_ref
    }

    /// Preview page loading the module through this set's references.
    pub fn preview_document(&self) -> String {
        preview_document(&self.js_ref.uri(), &self.wasm_ref.uri())
    }

    pub fn downloads(&self) -> [Download<'_>; 2] {
        [
            Download {
                filename: JS_FILENAME,
                content_type: JS_CONTENT_TYPE,
                bytes: &self.js,
            },
            Download {
                filename: WASM_FILENAME,
                content_type: WASM_CONTENT_TYPE,
                bytes: &self.wasm,
            },
        ]
    }
}

/// Preview page for a loader at `js_src` whose module lives at `wasm_src`.
///
/// The loader asks `Module.locateFile` where the `.wasm` file is, so the page
/// installs that hook before the loader script runs.
pub fn preview_document(js_src: &str, wasm_src: &str) -> String {
    let js_src = crate::manifest::escape_html(js_src);
    let wasm_src = wasm_src.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Preview</title></head>
<body>
<canvas id="canvas" oncontextmenu="event.preventDefault()"></canvas>
<pre id="output"></pre>
<script>
var Module = {{
  canvas: document.getElementById('canvas'),
  print: function (text) {{ document.getElementById('output').textContent += text + '\n'; }},
  locateFile: function (path) {{ return path.endsWith('.wasm') ? '{wasm_src}' : path; }}
}};
</script>
<script src="{js_src}"></script>
</body>
</html>"#
    )
}

#[derive(Debug, Default)]
pub struct ArtifactAssembler {
    current: Option<ArtifactSet>,
    generation: u64,
}

impl ArtifactAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode both artifacts and make them the current set.
    ///
    /// Nothing changes unless both decode: a corrupt payload leaves the
    /// previous set and its references intact.
    pub fn assemble(
        &mut self,
        js: &EncodedBytes,
        wasm: &EncodedBytes,
    ) -> Result<&ArtifactSet, EncodingError> {
        let js = decode(js)?;
        let wasm = decode(wasm)?;

        self.generation += 1;
        let generation = self.generation;
        if let Some(old) = self.current.take() {
            debug!(generation = old.generation, "Revoked superseded artifact references");
        }
        info!(
            generation,
            js_bytes = js.len(),
            wasm_bytes = wasm.len(),
            "Assembled artifact set"
        );

        Ok(self.current.insert(ArtifactSet {
            generation,
            js,
            wasm,
            js_ref: ArtifactRef::issue(generation, JS_FILENAME),
            wasm_ref: ArtifactRef::issue(generation, WASM_FILENAME),
        }))
    }

    pub fn current(&self) -> Option<&ArtifactSet> {
        self.current.as_ref()
    }

    /// Bytes behind `r`, or `None` once its set has been replaced or released.
    pub fn resolve(&self, r: &ArtifactRef) -> Option<&[u8]> {
        let set = self.current.as_ref()?;
        if *r == set.js_ref {
            Some(&set.js)
        } else if *r == set.wasm_ref {
            Some(&set.wasm)
        } else {
            None
        }
    }

    /// Drop the current set. Returns whether there was one.
    pub fn release(&mut self) -> bool {
        match self.current.take() {
            Some(old) => {
                debug!(generation = old.generation, "Released artifact set");
                true
            }
            None => false,
        }
    }
}

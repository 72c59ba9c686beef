//! Script minification.
//!
//! Every top-level `.js` file in the source script directory (non-recursive)
//! is minified to `js/NAME.min.js` in the output tree, with a version-3
//! source map written next to it. The map carries the original source text
//! inline so debugging works without resolving paths back into the source
//! tree.

use crate::config::SitePaths;
use minify_js::{minify, Session, TopLevelMode};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix applied to minified script file names.
pub const MIN_SUFFIX: &str = ".min.js";

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}: {message}")]
    Minify { file: PathBuf, message: String },
    #[error("Source map serialization failed: {0}")]
    SourceMap(#[from] serde_json::Error),
}

/// Minified name for a script source: `menu.js` becomes `menu.min.js`.
pub fn minified_name(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    Some(format!("{stem}{MIN_SUFFIX}"))
}

/// Minify one script source.
///
/// minify-js asserts internally on some branch shapes instead of returning
/// its error type; an unwind out of the library is reported as a minify
/// failure, never allowed to take the process down.
fn minify_source(code: &[u8]) -> Result<Vec<u8>, String> {
    let outcome = std::panic::catch_unwind(|| {
        let session = Session::new();
        let mut minified = Vec::new();
        minify(&session, TopLevelMode::Global, code, &mut minified)
            .map(|()| minified)
            .map_err(|e| format!("{e:?}"))
    });
    match outcome {
        Ok(Ok(minified)) => Ok(minified),
        Ok(Err(e)) => Err(e),
        Err(panic) => Err(panic_text(panic.as_ref())),
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "minifier panicked".to_string()
    }
}

/// Version-3 source map for one minified script.
///
/// minify-js does not track positions, so the map carries a single
/// start-of-file segment plus the full original text; enough for a browser
/// to show the readable source.
fn source_map(min_name: &str, source_name: &str, source_text: &str) -> serde_json::Value {
    serde_json::json!({
        "version": 3,
        "file": min_name,
        "sources": [source_name],
        "sourcesContent": [source_text],
        "names": [],
        "mappings": "AAAA",
    })
}

/// Minify all top-level scripts into the output js directory.
///
/// A missing script directory yields an empty result, matching glob
/// semantics. Returns the written `.min.js` paths, sorted by file name.
pub fn minify_all(paths: &SitePaths) -> Result<Vec<PathBuf>, ScriptError> {
    let js_dir = paths.js_dir();
    if !js_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&js_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "js"))
        .collect();
    sources.sort();

    let out_dir = paths.out_js();
    std::fs::create_dir_all(&out_dir)?;

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(min_name) = minified_name(&source) else {
            continue;
        };
        let code = std::fs::read(&source)?;

        let mut minified = minify_source(&code).map_err(|message| ScriptError::Minify {
            file: source.clone(),
            message,
        })?;

        let map_name = format!("{min_name}.map");
        minified.extend_from_slice(format!("\n//# sourceMappingURL={map_name}\n").as_bytes());

        let dest = out_dir.join(&min_name);
        std::fs::write(&dest, &minified)?;

        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let map = source_map(&min_name, &source_name, &String::from_utf8_lossy(&code));
        std::fs::write(out_dir.join(&map_name), serde_json::to_string(&map)?)?;

        written.push(dest);
    }
    Ok(written)
}

//! Markup minification.
//!
//! Every top-level `.html` file in the source root is rewritten into the
//! output root with whitespace collapsed, comments stripped, redundant
//! attribute quotes removed, and the doctype shortened. Markup is assumed
//! well-formed; a parse failure aborts the task with byte position and a
//! snippet of the offending context.

use crate::config::SitePaths;
use minify_html_onepass::{with_friendly_error, Cfg};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}: parse error at byte {position}: {message}\n  {context}")]
    Parse {
        file: PathBuf,
        position: usize,
        message: String,
        context: String,
    },
}

/// Minify a single HTML document; `file` is only used for error context.
pub fn minify_bytes(src: &[u8], file: &std::path::Path) -> Result<Vec<u8>, MarkupError> {
    let mut code = src.to_vec();
    // Embedded JS/CSS passes through untouched; those have their own tasks.
    let cfg = Cfg::new();
    match with_friendly_error(&mut code, &cfg) {
        Ok(len) => {
            code.truncate(len);
            Ok(code)
        }
        Err(e) => Err(MarkupError::Parse {
            file: file.to_path_buf(),
            position: e.position,
            message: e.message,
            context: e.code_context,
        }),
    }
}

/// Minify all top-level markup files into the output root.
///
/// Returns the written paths, sorted by file name.
pub fn minify_all(paths: &SitePaths) -> Result<Vec<PathBuf>, MarkupError> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(&paths.source)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "html"))
        .collect();
    sources.sort();

    std::fs::create_dir_all(&paths.output)?;

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let html = std::fs::read(&source)?;
        let minified = minify_bytes(&html, &source)?;
        // file_name is present: read_dir only yields named entries
        let dest = paths.output.join(source.file_name().unwrap_or_default());
        std::fs::write(&dest, minified)?;
        written.push(dest);
    }
    Ok(written)
}

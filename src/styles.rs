//! Stylesheet compilation.
//!
//! Bundles the single entry stylesheet (`css/styles.css`) with every file it
//! pulls in via `@import`, adds vendor prefixes for the browser baseline,
//! minifies, and writes `css/styles.min.css` plus a source map next to it.
//!
//! Errors carry the offending file and line so a watch session can report a
//! bad edit and keep running; the one-shot build path propagates them instead.

use crate::config::SitePaths;
use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use std::path::PathBuf;
use thiserror::Error;

/// Output file name for the compiled stylesheet.
pub const CSS_MIN: &str = "styles.min.css";

/// Output file name for the stylesheet source map.
pub const CSS_MAP: &str = "styles.min.css.map";

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },
    #[error("CSS print failed: {0}")]
    Print(String),
    #[error("Source map serialization failed: {0}")]
    SourceMap(String),
}

/// Map a located lightningcss error onto [`StyleError::Syntax`].
///
/// lightningcss reports 0-based lines; operators expect 1-based.
fn syntax_error<T: std::fmt::Display>(
    err: lightningcss::error::Error<T>,
    fallback: &std::path::Path,
) -> StyleError {
    match err.loc {
        Some(loc) => StyleError::Syntax {
            file: loc.filename,
            line: loc.line + 1,
            column: loc.column,
            message: err.kind.to_string(),
        },
        None => StyleError::Syntax {
            file: fallback.display().to_string(),
            line: 0,
            column: 0,
            message: err.kind.to_string(),
        },
    }
}

/// Browser baseline used for vendor prefixing and syntax lowering.
fn browser_baseline() -> Browsers {
    // Versions are encoded as major << 16 | minor << 8 | patch.
    Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16),
        ios_saf: Some(14 << 16),
        ..Browsers::default()
    }
}

/// Compile the entry stylesheet into the output css directory.
///
/// Returns the path of the written `.min.css` file.
pub fn compile(paths: &SitePaths) -> Result<PathBuf, StyleError> {
    let entry = paths.css_entry();
    let targets = Targets {
        browsers: Some(browser_baseline()),
        ..Targets::default()
    };

    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut stylesheet = bundler
        .bundle(&entry)
        .map_err(|e| syntax_error(e, &entry))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| syntax_error(e, &entry))?;

    let project_root = paths.source.display().to_string();
    let mut map = SourceMap::new(&project_root);
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: Some(&mut map),
            project_root: Some(&project_root),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Print(e.to_string()))?;

    let out_dir = paths.out_css();
    std::fs::create_dir_all(&out_dir)?;

    let mut code = result.code;
    code.push_str("\n/*# sourceMappingURL=");
    code.push_str(CSS_MAP);
    code.push_str(" */\n");
    let css_path = out_dir.join(CSS_MIN);
    std::fs::write(&css_path, code)?;

    let json = map
        .to_json(None)
        .map_err(|e| StyleError::SourceMap(format!("{e:?}")))?;
    std::fs::write(out_dir.join(CSS_MAP), json)?;

    Ok(css_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site(tmp: &TempDir) -> SitePaths {
        let paths = SitePaths::new(tmp.path().join("source"), tmp.path().join("build"));
        fs::create_dir_all(paths.css_dir()).unwrap();
        paths
    }

    #[test]
    fn compile_bundles_imports_and_minifies() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(
            paths.css_dir().join("base.css"),
            "body {\n  margin: 0;\n  padding: 0;\n}\n",
        )
        .unwrap();
        fs::write(
            paths.css_entry(),
            "@import \"base.css\";\n.page {\n  color: #ff0000;\n}\n",
        )
        .unwrap();

        let out = compile(&paths).unwrap();
        assert_eq!(out, paths.out_css().join(CSS_MIN));

        let css = fs::read_to_string(&out).unwrap();
        // Imported rules are inlined, the @import is gone
        assert!(css.contains("margin"));
        assert!(!css.contains("@import"));
        // Minified: no indentation survives
        assert!(!css.contains("  "));
        // Source map reference is path-stable (file name only)
        assert!(css.contains("sourceMappingURL=styles.min.css.map"));
        assert!(paths.out_css().join(CSS_MAP).exists());
    }

    #[test]
    fn compile_adds_vendor_prefixes() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(paths.css_entry(), ".menu { user-select: none; }\n").unwrap();

        let out = compile(&paths).unwrap();
        let css = fs::read_to_string(out).unwrap();
        assert!(css.contains("-webkit-user-select"), "css was: {css}");
    }

    #[test]
    fn missing_import_reports_file_context() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(paths.css_entry(), "@import \"does-not-exist.css\";\n").unwrap();

        let err = compile(&paths).unwrap_err();
        match err {
            StyleError::Syntax { file, .. } => {
                assert!(!file.is_empty());
            }
            other => panic!("expected syntax error, got: {other}"),
        }
    }

    #[test]
    fn missing_entry_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        assert!(compile(&paths).is_err());
    }

    #[test]
    fn recompile_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(paths.css_entry(), ".a { color: blue; }\n").unwrap();

        let first = fs::read(compile(&paths).unwrap()).unwrap();
        let second = fs::read(compile(&paths).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

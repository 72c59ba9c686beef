//! Verbatim copies: fonts, favicon ico files, and the web manifest.
//!
//! These assets are already in their final form. The copy is an allow-list,
//! not a catch-all: `fonts/*.woff{,2}` into `fonts/`, plus root-level
//! `*.ico` and `manifest.webmanifest` into the output root. Anything else
//! in those places is ignored.

use crate::config::SitePaths;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Web app manifest file name, copied from the source root.
pub const MANIFEST_FILE: &str = "manifest.webmanifest";

#[derive(Error, Debug)]
pub enum StaticError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn is_font(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "woff" | "woff2"))
}

fn sorted_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, StaticError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && keep(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Copy the static allow-list into the output tree.
///
/// Returns the written paths, fonts first, then root-level files.
pub fn copy(paths: &SitePaths) -> Result<Vec<PathBuf>, StaticError> {
    let mut written = Vec::new();

    let fonts = sorted_files(&paths.fonts_dir(), is_font)?;
    if !fonts.is_empty() {
        std::fs::create_dir_all(paths.out_fonts())?;
    }
    for font in fonts {
        // read_dir only yields named entries
        let dest = paths.out_fonts().join(font.file_name().unwrap_or_default());
        std::fs::copy(&font, &dest)?;
        written.push(dest);
    }

    let roots = sorted_files(&paths.source, |p| {
        p.extension().is_some_and(|e| e == "ico")
            || p.file_name().is_some_and(|n| n == MANIFEST_FILE)
    })?;
    std::fs::create_dir_all(&paths.output)?;
    for file in roots {
        let dest = paths.output.join(file.file_name().unwrap_or_default());
        std::fs::copy(&file, &dest)?;
        written.push(dest);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site(tmp: &TempDir) -> SitePaths {
        let paths = SitePaths::new(tmp.path().join("source"), tmp.path().join("build"));
        fs::create_dir_all(&paths.source).unwrap();
        paths
    }

    #[test]
    fn copies_fonts_ico_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::create_dir_all(paths.fonts_dir()).unwrap();
        fs::write(paths.fonts_dir().join("body.woff2"), b"wOF2").unwrap();
        fs::write(paths.fonts_dir().join("body.woff"), b"wOFF").unwrap();
        fs::write(paths.source.join("favicon.ico"), b"ico").unwrap();
        fs::write(paths.source.join(MANIFEST_FILE), b"{}").unwrap();

        let written = copy(&paths).unwrap();
        assert_eq!(written.len(), 4);
        assert!(paths.out_fonts().join("body.woff2").exists());
        assert!(paths.out_fonts().join("body.woff").exists());
        assert!(paths.output.join("favicon.ico").exists());
        assert!(paths.output.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn ignores_files_outside_the_allow_list() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::create_dir_all(paths.fonts_dir()).unwrap();
        fs::write(paths.fonts_dir().join("notes.txt"), b"skip").unwrap();
        fs::write(paths.fonts_dir().join("old.ttf"), b"skip").unwrap();
        fs::write(paths.source.join("README.md"), b"skip").unwrap();

        let written = copy(&paths).unwrap();
        assert!(written.is_empty());
        assert!(!paths.out_fonts().exists());
        assert!(!paths.output.join("README.md").exists());
    }

    #[test]
    fn missing_fonts_dir_is_fine() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(paths.source.join("favicon.ico"), b"ico").unwrap();

        let written = copy(&paths).unwrap();
        assert_eq!(written, vec![paths.output.join("favicon.ico")]);
    }

    #[test]
    fn copies_are_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::write(paths.source.join(MANIFEST_FILE), b"{\"name\":\"site\"}").unwrap();

        copy(&paths).unwrap();
        assert_eq!(
            fs::read(paths.source.join(MANIFEST_FILE)).unwrap(),
            fs::read(paths.output.join(MANIFEST_FILE)).unwrap()
        );
    }
}

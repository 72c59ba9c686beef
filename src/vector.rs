//! Vector image handling: SVG minification and the sprite sheet.
//!
//! SVGs split into two populations by their place in the image tree:
//!
//! - general SVGs are minified standalone and mirrored into the output tree,
//! - files under `icons/` and `backgrounds/` are merged into one sprite
//!   sheet, `img/stack.svg`, addressable as `stack.svg#NAME` where NAME is
//!   the source file stem. Sprite sources never appear standalone in the
//!   output.
//!
//! Minification is a streaming event rewrite: comments, the XML declaration,
//! doctype, processing instructions, and inter-element whitespace are
//! dropped; element content and attributes pass through unchanged.

use crate::config::{SitePaths, SPRITE_FILE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{file}: XML error at byte {position}: {message}")]
    Parse {
        file: PathBuf,
        position: usize,
        message: String,
    },
    #[error("SVG emit failed: {0}")]
    Emit(String),
}

fn is_svg(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "svg")
}

/// Collect SVG paths under `img/`, relative to the image root, sorted.
fn svg_sources(paths: &SitePaths) -> Result<Vec<PathBuf>, VectorError> {
    let img_dir = paths.img_dir();
    if !img_dir.exists() {
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(&img_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_svg(entry.path()) {
            let rel = entry
                .path()
                .strip_prefix(&img_dir)
                .unwrap_or(entry.path())
                .to_path_buf();
            sources.push(rel);
        }
    }
    Ok(sources)
}

/// Minify one SVG document.
pub fn minify_svg(src: &str, file: &Path) -> Result<String, VectorError> {
    let mut reader = Reader::from_str(src);
    let mut writer = Writer::new(Vec::new());
    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Eof) => break,
            // Structural noise dropped wholesale
            Ok(Event::Comment(_))
            | Ok(Event::Decl(_))
            | Ok(Event::DocType(_))
            | Ok(Event::PI(_)) => {}
            Ok(Event::Text(text)) => {
                // Inter-element whitespace carries no meaning in SVG
                let raw: &[u8] = text.as_ref();
                if raw.iter().all(|b| b.is_ascii_whitespace()) {
                    continue;
                }
                writer
                    .write_event(Event::Text(text))
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Ok(event) => {
                writer
                    .write_event(event)
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Err(e) => {
                return Err(VectorError::Parse {
                    file: file.to_path_buf(),
                    position,
                    message: e.to_string(),
                })
            }
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| VectorError::Emit(e.to_string()))
}

/// Rewrite an icon document into a sprite fragment.
///
/// The root `<svg>` element gets `id="{stem}"` and loses `xmlns`, `width`,
/// and `height` (the sheet's root carries the namespace; sizing comes from
/// the kept `viewBox`). Everything inside passes through minified.
fn sprite_fragment(src: &str, stem: &str, file: &Path) -> Result<String, VectorError> {
    let mut reader = Reader::from_str(src);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Comment(_))
            | Ok(Event::Decl(_))
            | Ok(Event::DocType(_))
            | Ok(Event::PI(_)) => {}
            Ok(Event::Text(text)) => {
                let raw: &[u8] = text.as_ref();
                if raw.iter().all(|b| b.is_ascii_whitespace()) {
                    continue;
                }
                writer
                    .write_event(Event::Text(text))
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Ok(Event::Start(start)) => {
                let event = if depth == 0 && start.name().as_ref() == b"svg" {
                    Event::Start(retarget_root(&start, stem, file)?)
                } else {
                    Event::Start(start)
                };
                depth += 1;
                writer
                    .write_event(event)
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Ok(Event::End(end)) => {
                depth = depth.saturating_sub(1);
                writer
                    .write_event(Event::End(end))
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Ok(event) => {
                writer
                    .write_event(event)
                    .map_err(|e| VectorError::Emit(e.to_string()))?;
            }
            Err(e) => {
                return Err(VectorError::Parse {
                    file: file.to_path_buf(),
                    position,
                    message: e.to_string(),
                })
            }
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| VectorError::Emit(e.to_string()))
}

fn retarget_root<'a>(
    start: &BytesStart<'_>,
    stem: &str,
    file: &Path,
) -> Result<BytesStart<'a>, VectorError> {
    let mut root = BytesStart::new("svg");
    root.push_attribute(("id", stem));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| VectorError::Parse {
            file: file.to_path_buf(),
            position: 0,
            message: e.to_string(),
        })?;
        let key = attr.key.as_ref();
        if matches!(key, b"xmlns" | b"width" | b"height" | b"id") {
            continue;
        }
        root.push_attribute(attr);
    }
    Ok(root)
}

/// Minify every SVG outside the sprite subsets into the output tree.
pub fn general(paths: &SitePaths) -> Result<usize, VectorError> {
    let sources: Vec<PathBuf> = svg_sources(paths)?
        .into_iter()
        .filter(|rel| !SitePaths::is_sprite_source(rel))
        .collect();
    for rel in &sources {
        let src = std::fs::read_to_string(paths.img_dir().join(rel))?;
        let minified = minify_svg(&src, rel)?;
        let dest = paths.out_img().join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, minified)?;
    }
    Ok(sources.len())
}

/// Assemble the sprite sheet from the icon and background subsets.
///
/// Fragments are concatenated in walk order (alphabetical by path, so
/// backgrounds before icons). The sheet hides every fragment except the one
/// addressed in the URL hash. No sources means no sheet is written.
pub fn sprite(paths: &SitePaths) -> Result<Option<PathBuf>, VectorError> {
    let sources: Vec<PathBuf> = svg_sources(paths)?
        .into_iter()
        .filter(|rel| SitePaths::is_sprite_source(rel))
        .collect();
    if sources.is_empty() {
        return Ok(None);
    }

    let mut fragments = String::new();
    for rel in &sources {
        let stem = rel
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let src = std::fs::read_to_string(paths.img_dir().join(rel))?;
        fragments.push_str(&sprite_fragment(&src, stem, rel)?);
    }

    let sheet = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\">\
         <style>svg:not(:target){{display:none}}</style>{fragments}</svg>"
    );

    std::fs::create_dir_all(paths.out_img())?;
    let dest = paths.out_img().join(SPRITE_FILE);
    std::fs::write(&dest, sheet)?;
    Ok(Some(dest))
}

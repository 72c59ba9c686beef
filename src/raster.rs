//! Raster image optimization.
//!
//! Three paths over the same `img/` walk:
//!
//! - [`optimize`]: decode and re-encode PNG (best compression, adaptive
//!   filtering) and JPEG (configured quality) into the output tree.
//! - [`copy`]: byte-for-byte copy, the fast path for development builds.
//! - [`webp`]: an additional `.webp` variant per PNG/JPEG at the configured
//!   quality. The favicon subset is skipped; favicons must stay in
//!   platform-native formats.
//!
//! Files are processed in parallel with rayon; a missing or undecodable
//! source fails the whole task (no partial-success policy).

use crate::config::{ImagesConfig, SitePaths};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use rayon::prelude::*;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to decode {file}: {message}")]
    Decode { file: PathBuf, message: String },
    #[error("Failed to encode {file}: {message}")]
    Encode { file: PathBuf, message: String },
}

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}

/// Collect PNG/JPEG paths under `img/`, relative to the image root, sorted.
fn raster_sources(paths: &SitePaths) -> Result<Vec<PathBuf>, RasterError> {
    let img_dir = paths.img_dir();
    if !img_dir.exists() {
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(&img_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_raster(entry.path()) {
            // strip_prefix cannot fail: the walk is rooted at img_dir
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

fn prepare_dest(paths: &SitePaths, rel: &Path) -> Result<PathBuf, RasterError> {
    let dest = paths.out_img().join(rel);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(dest)
}

fn decode(paths: &SitePaths, rel: &Path) -> Result<DynamicImage, RasterError> {
    let source = paths.img_dir().join(rel);
    image::open(&source).map_err(|e| RasterError::Decode {
        file: source,
        message: e.to_string(),
    })
}

/// Re-encode one raster image into the output tree.
fn optimize_one(paths: &SitePaths, rel: &Path, images: &ImagesConfig) -> Result<(), RasterError> {
    let img = decode(paths, rel)?;
    let dest = prepare_dest(paths, rel)?;
    let file = std::fs::File::create(&dest)?;
    let writer = BufWriter::new(file);

    let ext = rel
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let result = match ext.as_str() {
        "png" => img.write_with_encoder(PngEncoder::new_with_quality(
            writer,
            CompressionType::Best,
            FilterType::Adaptive,
        )),
        _ => img.write_with_encoder(JpegEncoder::new_with_quality(
            writer,
            images.jpeg_quality,
        )),
    };
    result.map_err(|e| RasterError::Encode {
        file: dest,
        message: e.to_string(),
    })
}

/// Encode one raster image as a WebP variant next to its optimized form.
fn webp_one(paths: &SitePaths, rel: &Path, images: &ImagesConfig) -> Result<(), RasterError> {
    let img = decode(paths, rel)?;
    let dest = prepare_dest(paths, &rel.with_extension("webp"))?;

    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let memory = encoder.encode(images.webp_quality);
    std::fs::write(&dest, &*memory)?;
    Ok(())
}

/// Lossy/lossless re-encode of every PNG/JPEG into the output tree.
pub fn optimize(paths: &SitePaths, images: &ImagesConfig) -> Result<usize, RasterError> {
    let sources = raster_sources(paths)?;
    sources
        .par_iter()
        .try_for_each(|rel| optimize_one(paths, rel, images))?;
    Ok(sources.len())
}

/// Copy-only fast path: the same walk, no re-encoding.
pub fn copy(paths: &SitePaths) -> Result<usize, RasterError> {
    let sources = raster_sources(paths)?;
    sources.par_iter().try_for_each(|rel| {
        let dest = prepare_dest(paths, rel)?;
        std::fs::copy(paths.img_dir().join(rel), dest)?;
        Ok::<(), RasterError>(())
    })?;
    Ok(sources.len())
}

/// WebP variants for every PNG/JPEG outside the favicon subset.
pub fn webp(paths: &SitePaths, images: &ImagesConfig) -> Result<usize, RasterError> {
    let sources: Vec<PathBuf> = raster_sources(paths)?
        .into_iter()
        .filter(|rel| !SitePaths::is_favicon(rel))
        .collect();
    sources
        .par_iter()
        .try_for_each(|rel| webp_one(paths, rel, images))?;
    Ok(sources.len())
}

//! Configuration loading and the source/output tree contract.
//!
//! The pipeline reads a fixed directory layout:
//!
//! ```text
//! source/                      # Source root (read-only input)
//! ├── index.html               # Top-level markup files
//! ├── manifest.webmanifest
//! ├── *.ico
//! ├── css/
//! │   ├── styles.css           # Stylesheet entry (pulls partials via @import)
//! │   └── ...
//! ├── js/                      # Top-level scripts (non-recursive)
//! ├── img/
//! │   ├── favicons/            # Never converted to WebP
//! │   ├── icons/               # Merged into the sprite sheet
//! │   ├── backgrounds/         # Merged into the sprite sheet
//! │   └── ...
//! └── fonts/                   # woff/woff2, copied verbatim
//! ```
//!
//! and writes a mirrored `build/` tree (`css/`, `js/`, `img/`, `fonts/`,
//! root-level html/ico/manifest). Both roots, plus encoder and server knobs,
//! can be overridden in an optional `kiln.toml`; a missing file just means
//! defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Stylesheet entry file, relative to the css directory.
pub const CSS_ENTRY: &str = "styles.css";

/// Sprite sheet output file name inside the output image directory.
pub const SPRITE_FILE: &str = "stack.svg";

/// Image subdirectory excluded from WebP generation.
pub const FAVICONS_DIR: &str = "favicons";

/// Image subdirectories merged into the sprite sheet (and excluded from
/// standalone SVG output).
pub const SPRITE_DIRS: &[&str] = &["icons", "backgrounds"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration, deserialized from `kiln.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Source root, read-only input.
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Output root, rebuilt on every run.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG re-encode quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// WebP encode quality (0.0-100.0).
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_webp_quality() -> f32 {
    90.0
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            webp_quality: default_webp_quality(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address for the dev server.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Open the served URL in a browser on start.
    #[serde(default)]
    pub open: bool,
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            open: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce window for file-change events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist; the implicit `kiln.toml` lookup falls back
    /// to defaults when the file is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Resolved filesystem layout derived from the configured roots.
///
/// All transforms take paths from here; nothing else hardcodes a directory
/// name, so a layout migration is a one-place change.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl SitePaths {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.paths.source, &config.paths.output)
    }

    pub fn css_dir(&self) -> PathBuf {
        self.source.join("css")
    }

    pub fn css_entry(&self) -> PathBuf {
        self.css_dir().join(CSS_ENTRY)
    }

    pub fn js_dir(&self) -> PathBuf {
        self.source.join("js")
    }

    pub fn img_dir(&self) -> PathBuf {
        self.source.join("img")
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.source.join("fonts")
    }

    pub fn out_css(&self) -> PathBuf {
        self.output.join("css")
    }

    pub fn out_js(&self) -> PathBuf {
        self.output.join("js")
    }

    pub fn out_img(&self) -> PathBuf {
        self.output.join("img")
    }

    pub fn out_fonts(&self) -> PathBuf {
        self.output.join("fonts")
    }

    /// Whether an image-tree relative path sits in the favicon subset.
    pub fn is_favicon(rel: &Path) -> bool {
        rel.starts_with(FAVICONS_DIR)
    }

    /// Whether an image-tree relative path sits in a sprite subset
    /// (icons or backgrounds).
    pub fn is_sprite_source(rel: &Path) -> bool {
        SPRITE_DIRS.iter().any(|d| rel.starts_with(d))
    }
}

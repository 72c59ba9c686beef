//! Project scaffolding.
//!
//! `kiln init` writes a small working site into the source root: markup with
//! a no-JS-safe navigation block, a stylesheet entry that pulls a partial
//! via `@import`, the menu toggle script, sprite icons, a placeholder photo,
//! and the web manifest. Every file exercises a different transform, so a
//! fresh project proves the whole pipeline on its first build.

use crate::config::SitePaths;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} already exists (use --force to overwrite)")]
    Exists(PathBuf),
    #[error("Failed to write placeholder image: {0}")]
    Encode(String),
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>New site</title>
    <link rel="icon" href="favicon.ico">
    <link rel="manifest" href="manifest.webmanifest">
    <link rel="stylesheet" href="css/styles.min.css">
  </head>
  <body>
    <nav class="site-nav site-nav--nojs">
      <button class="site-nav__toggle" type="button" aria-label="Toggle menu">
        <svg width="24" height="24"><use href="img/stack.svg#icon-burger"></use></svg>
      </button>
      <ul class="site-nav__list">
        <li><a href="index.html">Home</a></li>
      </ul>
    </nav>
    <main>
      <h1>It builds</h1>
      <picture>
        <source srcset="img/photo.webp" type="image/webp">
        <img src="img/photo.png" width="64" height="64" alt="Placeholder">
      </picture>
    </main>
    <script src="js/menu.min.js"></script>
  </body>
</html>
"#;

const STYLES_CSS: &str = r#"@import "base.css";

.site-nav__list {
  list-style: none;
  margin: 0;
  padding: 0;
}

.site-nav--closed .site-nav__list {
  display: none;
}

.site-nav--nojs .site-nav__toggle {
  display: none;
}

main {
  user-select: none;
}
"#;

const BASE_CSS: &str = r#"body {
  margin: 0;
  font-family: system-ui, sans-serif;
}
"#;

const MENU_JS: &str = r#"var nav = document.querySelector('.site-nav');
var toggle = document.querySelector('.site-nav__toggle');

nav.classList.remove('site-nav--nojs');
nav.classList.add('site-nav--closed');

toggle.addEventListener('click', function () {
  nav.classList.toggle('site-nav--opened');
  nav.classList.toggle('site-nav--closed');
});
"#;

const ICON_BURGER: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <path d="M3 6h18M3 12h18M3 18h18" stroke="currentColor" stroke-width="2"/>
</svg>
"#;

const ICON_CLOSE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <path d="M5 5l14 14M19 5L5 19" stroke="currentColor" stroke-width="2"/>
</svg>
"#;

const BG_WAVE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 28">
  <path d="M0 14q30 -14 60 0t60 0v14H0z" fill="currentColor"/>
</svg>
"#;

const MANIFEST: &str = r#"{
  "name": "New site",
  "short_name": "site",
  "start_url": "/",
  "display": "standalone",
  "icons": [
    { "src": "img/favicons/favicon-32.png", "sizes": "32x32", "type": "image/png" }
  ]
}
"#;

// Carries only the WOFF2 magic; the pipeline copies fonts as opaque bytes.
const PLACEHOLDER_WOFF2: &[u8] = b"wOF2\0\0\0\0";

fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), InitError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn write_placeholder_png(path: &Path, size: u32) -> Result<(), InitError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = image::RgbImage::from_fn(size, size, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            image::Rgb([220, 220, 220])
        } else {
            image::Rgb([180, 180, 180])
        }
    });
    img.save(path).map_err(|e| InitError::Encode(e.to_string()))
}

fn write_placeholder_ico(path: &Path) -> Result<(), InitError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = image::RgbaImage::from_pixel(32, 32, image::Rgba([90, 90, 90, 255]));
    img.save(path).map_err(|e| InitError::Encode(e.to_string()))
}

/// Scaffold a fresh source tree under the configured source root.
///
/// Refuses to touch an existing tree unless `force` is set.
pub fn scaffold(paths: &SitePaths, force: bool) -> Result<(), InitError> {
    if paths.source.exists() && !force {
        return Err(InitError::Exists(paths.source.clone()));
    }

    write_file(&paths.source.join("index.html"), INDEX_HTML)?;
    write_file(&paths.source.join("manifest.webmanifest"), MANIFEST)?;
    write_file(&paths.css_entry(), STYLES_CSS)?;
    write_file(&paths.css_dir().join("base.css"), BASE_CSS)?;
    write_file(&paths.js_dir().join("menu.js"), MENU_JS)?;
    write_file(&paths.img_dir().join("icons/icon-burger.svg"), ICON_BURGER)?;
    write_file(&paths.img_dir().join("icons/icon-close.svg"), ICON_CLOSE)?;
    write_file(&paths.img_dir().join("backgrounds/bg-wave.svg"), BG_WAVE)?;
    write_placeholder_png(&paths.img_dir().join("photo.png"), 64)?;
    write_placeholder_png(&paths.img_dir().join("favicons/favicon-32.png"), 32)?;
    write_placeholder_ico(&paths.source.join("favicon.ico"))?;
    write_file(&paths.fonts_dir().join("placeholder.woff2"), PLACEHOLDER_WOFF2)?;

    println!("    scaffolded {}", paths.source.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site(tmp: &TempDir) -> SitePaths {
        SitePaths::new(tmp.path().join("source"), tmp.path().join("build"))
    }

    #[test]
    fn scaffold_writes_one_file_per_transform() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        scaffold(&paths, false).unwrap();

        assert!(paths.source.join("index.html").exists());
        assert!(paths.source.join("manifest.webmanifest").exists());
        assert!(paths.css_entry().exists());
        assert!(paths.css_dir().join("base.css").exists());
        assert!(paths.js_dir().join("menu.js").exists());
        assert!(paths.img_dir().join("icons/icon-burger.svg").exists());
        assert!(paths.img_dir().join("backgrounds/bg-wave.svg").exists());
        assert!(paths.img_dir().join("photo.png").exists());
        assert!(paths.img_dir().join("favicons/favicon-32.png").exists());
        assert!(paths.source.join("favicon.ico").exists());
        assert!(paths.fonts_dir().join("placeholder.woff2").exists());
    }

    #[test]
    fn scaffold_refuses_an_existing_tree() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::create_dir_all(&paths.source).unwrap();

        assert!(matches!(
            scaffold(&paths, false),
            Err(InitError::Exists(_))
        ));
    }

    #[test]
    fn force_overwrites_an_existing_tree() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        fs::create_dir_all(&paths.source).unwrap();
        fs::write(paths.source.join("index.html"), "old").unwrap();

        scaffold(&paths, true).unwrap();
        let html = fs::read_to_string(paths.source.join("index.html")).unwrap();
        assert!(html.contains("site-nav"));
    }

    #[test]
    fn menu_script_swaps_nav_state_classes() {
        // No DOM at build time; assert the state machine textually. Both
        // classes flip in the same handler, so exactly one is ever present
        // after the closed-by-default initialization.
        assert!(MENU_JS.contains("classList.remove('site-nav--nojs')"));
        assert!(MENU_JS.contains("classList.add('site-nav--closed')"));
        assert!(MENU_JS.contains("classList.toggle('site-nav--opened')"));
        assert!(MENU_JS.contains("classList.toggle('site-nav--closed')"));
    }

    #[test]
    fn scaffolded_script_minifies_cleanly() {
        let tmp = TempDir::new().unwrap();
        let paths = site(&tmp);
        scaffold(&paths, false).unwrap();

        let written = crate::scripts::minify_all(&paths).unwrap();
        assert_eq!(written, vec![paths.out_js().join("menu.min.js")]);
    }
}

//! # Kiln
//!
//! An asset build pipeline for hand-written static sites. Your `source/`
//! tree holds readable HTML, CSS, JS, and images; `kiln` bakes them into a
//! `build/` tree that is minified, prefixed, optimized, and ready to deploy.
//!
//! # Architecture: Clean, Then Transform
//!
//! Every build starts from an empty output tree and runs one transform per
//! asset class:
//!
//! ```text
//! source/*.html        →  minify          →  build/*.html
//! source/css/styles.css → bundle+prefix   →  build/css/styles.min.css (+map)
//! source/js/*.js       →  minify          →  build/js/*.min.js (+map)
//! source/img/ png,jpg  →  re-encode/copy  →  build/img/  (+.webp variants)
//! source/img/ svg      →  minify          →  build/img/  (sprite dirs → stack.svg)
//! source/fonts, ico, manifest  →  copy    →  build/
//! ```
//!
//! The transforms are independent, so after the clean they all run in
//! parallel. There is no incremental state to invalidate: the output is a
//! pure function of the source tree and the configuration.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `kiln.toml` loading and the source/output layout contract |
//! | [`styles`] | Stylesheet bundling, prefixing, minification, source maps |
//! | [`markup`] | HTML minification |
//! | [`scripts`] | JS minification with `.min.js` renaming and source maps |
//! | [`raster`] | PNG/JPEG optimization, dev-mode copy, WebP variants |
//! | [`vector`] | SVG minification and the `stack.svg` sprite sheet |
//! | [`statics`] | Verbatim copies: fonts, ico files, web manifest |
//! | [`graph`] | Task graph: stages, parallel groups, the `TaskRunner` seam |
//! | [`pipeline`] | Task dispatch; `build`, `develop`, `css_only`, `clean` |
//! | [`serve`] | Dev server with counter-based live reload |
//! | [`watch`] | Debounced source watching and incremental rebuilds |
//! | [`init`] | `kiln init` project scaffold |
//!
//! # Development Mode
//!
//! `kiln` with no subcommand runs the dev build (raster images copied, not
//! re-encoded), then serves the output tree and watches the source. Style
//! edits are hot-swapped into open pages without a reload; markup and
//! script edits trigger a full reload.

pub mod config;
pub mod graph;
pub mod init;
pub mod markup;
pub mod pipeline;
pub mod raster;
pub mod scripts;
pub mod serve;
pub mod statics;
pub mod styles;
pub mod vector;
pub mod watch;

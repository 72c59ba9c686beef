//! Watch mode for the development loop.
//!
//! Watches the source root, classifies debounced change batches into the
//! transform kinds that can be rebuilt incrementally (styles, scripts,
//! markup), reruns just those transforms, and bumps the reload hub so open
//! pages pick up the result. A failed rebuild is reported and watching
//! continues; the next save gets another chance.
//!
//! Changes outside the incremental kinds (images, fonts) are ignored here;
//! restarting the dev build covers those.

use crate::config::SitePaths;
use crate::serve::ReloadHub;
use crate::{markup, scripts, styles};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    Init(notify::Error),
    #[error("Failed to watch {path}: {source}")]
    Path {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("Watch channel closed: {0}")]
    Channel(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Incrementally rebuildable change kinds, in rebuild order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Styles,
    Scripts,
    Markup,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Styles => "styles",
            Kind::Scripts => "scripts",
            Kind::Markup => "markup",
        }
    }
}

/// Classify a changed path against the source layout.
///
/// Stylesheets anywhere under `css/` count (imports can nest); scripts and
/// markup only at their top level, matching what the transforms read.
pub fn classify(paths: &SitePaths, changed: &Path) -> Option<Kind> {
    let ext = changed.extension().and_then(|e| e.to_str())?;
    match ext {
        "css" if changed.starts_with(paths.css_dir()) => Some(Kind::Styles),
        "js" if changed.parent() == Some(paths.js_dir().as_path()) => Some(Kind::Scripts),
        "html" if changed.parent() == Some(paths.source.as_path()) => Some(Kind::Markup),
        _ => None,
    }
}

/// Rerun the transform for one change kind and signal the hub.
///
/// Stylesheet rebuilds bump the css counter only, so the page keeps its
/// state; everything else needs a full reload.
pub fn handle_change(paths: &SitePaths, hub: &ReloadHub, kind: Kind) -> Result<(), String> {
    match kind {
        Kind::Styles => {
            styles::compile(paths).map_err(|e| e.to_string())?;
            hub.bump_css();
        }
        Kind::Scripts => {
            scripts::minify_all(paths).map_err(|e| e.to_string())?;
            hub.bump_reload();
        }
        Kind::Markup => {
            markup::minify_all(paths).map_err(|e| e.to_string())?;
            hub.bump_reload();
        }
    }
    Ok(())
}

fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs() % 86400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Watch the source root and rebuild on change. Blocks until the watch
/// channel closes.
pub fn watch(paths: &SitePaths, hub: Arc<ReloadHub>, debounce_ms: u64) -> Result<(), WatchError> {
    // Event paths arrive absolute; classify against the same form.
    let source = std::fs::canonicalize(&paths.source)?;
    let canonical = SitePaths::new(&source, &paths.output);

    let (tx, rx) = channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(debounce_ms), tx).map_err(WatchError::Init)?;
    debouncer
        .watcher()
        .watch(&source, RecursiveMode::Recursive)
        .map_err(|e| WatchError::Path {
            path: source.clone(),
            source: e,
        })?;

    println!("[{}] Watching {} for changes...", timestamp(), source.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let mut kinds = BTreeSet::new();
                for event in &events {
                    if !matches!(event.kind, DebouncedEventKind::Any) {
                        continue;
                    }
                    if let Some(kind) = classify(&canonical, &event.path) {
                        if let Some(name) = event.path.file_name() {
                            println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                        }
                        kinds.insert(kind);
                    }
                }
                for kind in kinds {
                    match handle_change(&canonical, &hub, kind) {
                        Ok(()) => {
                            println!("[{}] Rebuilt {}", timestamp(), kind.name());
                        }
                        Err(message) => {
                            eprintln!("[{}] {} failed: {}", timestamp(), kind.name(), message);
                        }
                    }
                }
            }
            Ok(Err(error)) => {
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}

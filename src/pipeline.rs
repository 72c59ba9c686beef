//! The pipeline: task dispatch over the site layout.
//!
//! [`Pipeline`] owns the resolved paths, the configuration, and the reload
//! hub, and implements [`TaskRunner`] so the task graph can drive it. The
//! entry points mirror the CLI:
//!
//! | entry        | graph                                 |
//! |--------------|---------------------------------------|
//! | [`build`]    | clean, then all transforms (parallel) |
//! | [`develop`]  | dev build, then serve and watch       |
//! | [`css_only`] | the stylesheet transform alone        |
//!
//! [`build`]: Pipeline::build
//! [`develop`]: Pipeline::develop
//! [`css_only`]: Pipeline::css_only

use crate::config::{Config, SitePaths};
use crate::graph::{TaskGraph, TaskId, TaskRunner};
use crate::serve::ReloadHub;
use crate::{markup, raster, scripts, serve, statics, styles, vector, watch};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Style(#[from] styles::StyleError),
    #[error(transparent)]
    Markup(#[from] markup::MarkupError),
    #[error(transparent)]
    Script(#[from] scripts::ScriptError),
    #[error(transparent)]
    Raster(#[from] raster::RasterError),
    #[error(transparent)]
    Vector(#[from] vector::VectorError),
    #[error(transparent)]
    Static(#[from] statics::StaticError),
    #[error(transparent)]
    Serve(#[from] serve::ServeError),
    #[error(transparent)]
    Watch(#[from] watch::WatchError),
}

pub struct Pipeline {
    paths: SitePaths,
    config: Config,
    hub: Arc<ReloadHub>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            paths: SitePaths::from_config(&config),
            config,
            hub: Arc::new(ReloadHub::new()),
        }
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Delete the output tree. A missing tree is already clean.
    pub fn clean(&self) -> Result<(), PipelineError> {
        match std::fs::remove_dir_all(&self.paths.output) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run the full production build.
    pub fn build(&self) -> Result<(), PipelineError> {
        TaskGraph::production().run(self)
    }

    /// Run the development build, then serve and watch. Blocks until the
    /// watcher exits.
    pub fn develop(&self) -> Result<(), PipelineError> {
        TaskGraph::development().run(self)
    }

    /// Compile the stylesheet, nothing else.
    pub fn css_only(&self) -> Result<(), PipelineError> {
        println!("==> {}", TaskId::Styles);
        styles::compile(&self.paths)?;
        Ok(())
    }
}

impl TaskRunner for Pipeline {
    type Error = PipelineError;

    fn run(&self, task: TaskId) -> Result<(), PipelineError> {
        println!("==> {task}");
        match task {
            TaskId::Clean => self.clean()?,
            TaskId::Styles => {
                styles::compile(&self.paths)?;
            }
            TaskId::Markup => {
                markup::minify_all(&self.paths)?;
            }
            TaskId::Scripts => {
                scripts::minify_all(&self.paths)?;
            }
            TaskId::OptimizeImages => {
                raster::optimize(&self.paths, &self.config.images)?;
            }
            TaskId::CopyImages => {
                raster::copy(&self.paths)?;
            }
            TaskId::WebpImages => {
                raster::webp(&self.paths, &self.config.images)?;
            }
            TaskId::Svg => {
                vector::general(&self.paths)?;
            }
            TaskId::Sprite => {
                vector::sprite(&self.paths)?;
            }
            TaskId::CopyStatic => {
                statics::copy(&self.paths)?;
            }
            TaskId::Serve => {
                serve::spawn(
                    self.paths.output.clone(),
                    &self.config.server.addr,
                    self.hub.clone(),
                    self.config.server.open,
                )?;
            }
            TaskId::Watch => {
                watch::watch(&self.paths, self.hub.clone(), self.config.watch.debounce_ms)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        Config {
            paths: PathsConfig {
                source: tmp.path().join("source"),
                output: tmp.path().join("build"),
            },
            ..Config::default()
        }
    }

    fn scaffold_minimal(tmp: &TempDir) {
        let source = tmp.path().join("source");
        fs::create_dir_all(source.join("css")).unwrap();
        fs::write(source.join("css/styles.css"), "body { margin: 0; }\n").unwrap();
        fs::write(
            source.join("index.html"),
            "<!DOCTYPE html><html><body>  <p>hi</p>  </body></html>",
        )
        .unwrap();
    }

    #[test]
    fn clean_of_missing_output_is_ok() {
        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config_in(&tmp));
        pipeline.clean().unwrap();
    }

    #[test]
    fn clean_removes_the_output_tree() {
        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config_in(&tmp));
        fs::create_dir_all(tmp.path().join("build/css")).unwrap();
        fs::write(tmp.path().join("build/css/old.css"), "stale").unwrap();

        pipeline.clean().unwrap();
        assert!(!tmp.path().join("build").exists());
    }

    #[test]
    fn build_produces_the_core_outputs() {
        let tmp = TempDir::new().unwrap();
        scaffold_minimal(&tmp);
        let pipeline = Pipeline::new(config_in(&tmp));
        pipeline.build().unwrap();

        let build = tmp.path().join("build");
        assert!(build.join("css/styles.min.css").exists());
        assert!(build.join("css/styles.min.css.map").exists());
        assert!(build.join("index.html").exists());
    }

    #[test]
    fn build_replaces_stale_output() {
        let tmp = TempDir::new().unwrap();
        scaffold_minimal(&tmp);
        fs::create_dir_all(tmp.path().join("build")).unwrap();
        fs::write(tmp.path().join("build/stale.html"), "old").unwrap();

        let pipeline = Pipeline::new(config_in(&tmp));
        pipeline.build().unwrap();
        assert!(!tmp.path().join("build/stale.html").exists());
    }

    #[test]
    fn css_only_skips_everything_else() {
        let tmp = TempDir::new().unwrap();
        scaffold_minimal(&tmp);
        let pipeline = Pipeline::new(config_in(&tmp));
        pipeline.css_only().unwrap();

        let build = tmp.path().join("build");
        assert!(build.join("css/styles.min.css").exists());
        assert!(!build.join("index.html").exists());
    }

    #[test]
    fn broken_stylesheet_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        scaffold_minimal(&tmp);
        fs::write(
            tmp.path().join("source/css/styles.css"),
            "@import \"missing.css\";\n",
        )
        .unwrap();

        let pipeline = Pipeline::new(config_in(&tmp));
        assert!(matches!(
            pipeline.build(),
            Err(PipelineError::Style(_))
        ));
    }
}

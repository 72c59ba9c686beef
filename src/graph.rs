//! Build orchestration.
//!
//! A build is a sequence of stages; a stage is either one task or a set of
//! independent tasks run in parallel. Stages run strictly in order, so the
//! clean always finishes before any output is written, and the dev server
//! only starts once the first build is complete.
//!
//! The graph knows nothing about what tasks do. Execution goes through
//! [`TaskRunner`], which keeps the shape testable with a recording mock.

use rayon::prelude::*;
use std::fmt;

/// Every task the pipeline can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Clean,
    Styles,
    Markup,
    Scripts,
    OptimizeImages,
    CopyImages,
    WebpImages,
    Svg,
    Sprite,
    CopyStatic,
    Serve,
    Watch,
}

impl TaskId {
    pub fn name(self) -> &'static str {
        match self {
            TaskId::Clean => "clean",
            TaskId::Styles => "styles",
            TaskId::Markup => "markup",
            TaskId::Scripts => "scripts",
            TaskId::OptimizeImages => "optimize-images",
            TaskId::CopyImages => "copy-images",
            TaskId::WebpImages => "webp-images",
            TaskId::Svg => "svg",
            TaskId::Sprite => "sprite",
            TaskId::CopyStatic => "copy-static",
            TaskId::Serve => "serve",
            TaskId::Watch => "watch",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of a build.
#[derive(Debug, Clone)]
pub enum Stage {
    Task(TaskId),
    Parallel(Vec<TaskId>),
}

/// Executes a single task. Implemented by the pipeline; mocked in tests.
pub trait TaskRunner {
    type Error: Send;

    fn run(&self, task: TaskId) -> Result<(), Self::Error>;
}

/// An ordered sequence of stages.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    stages: Vec<Stage>,
}

impl TaskGraph {
    /// The full production build: clean, then every transform in parallel.
    pub fn production() -> Self {
        Self {
            stages: vec![
                Stage::Task(TaskId::Clean),
                Stage::Parallel(vec![
                    TaskId::Styles,
                    TaskId::Markup,
                    TaskId::Scripts,
                    TaskId::OptimizeImages,
                    TaskId::WebpImages,
                    TaskId::Svg,
                    TaskId::Sprite,
                    TaskId::CopyStatic,
                ]),
            ],
        }
    }

    /// The development build: raster images are copied rather than
    /// re-encoded, and the build ends in the server and watcher.
    pub fn development() -> Self {
        Self {
            stages: vec![
                Stage::Task(TaskId::Clean),
                Stage::Parallel(vec![
                    TaskId::Styles,
                    TaskId::Markup,
                    TaskId::Scripts,
                    TaskId::CopyImages,
                    TaskId::WebpImages,
                    TaskId::Svg,
                    TaskId::Sprite,
                    TaskId::CopyStatic,
                ]),
                Stage::Task(TaskId::Serve),
                Stage::Task(TaskId::Watch),
            ],
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// All tasks in schedule order, parallel stages flattened.
    pub fn tasks(&self) -> Vec<TaskId> {
        let mut tasks = Vec::new();
        for stage in &self.stages {
            match stage {
                Stage::Task(task) => tasks.push(*task),
                Stage::Parallel(group) => tasks.extend(group.iter().copied()),
            }
        }
        tasks
    }

    /// Run the graph to completion, stage by stage.
    ///
    /// Within a parallel stage every task runs even if a sibling fails; the
    /// first error in schedule order is the one reported.
    pub fn run<R>(&self, runner: &R) -> Result<(), R::Error>
    where
        R: TaskRunner + Sync,
    {
        for stage in &self.stages {
            match stage {
                Stage::Task(task) => runner.run(*task)?,
                Stage::Parallel(group) => {
                    let results: Vec<Result<(), R::Error>> =
                        group.par_iter().map(|task| runner.run(*task)).collect();
                    for result in results {
                        result?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<TaskId>>,
        fail_on: Option<TaskId>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(task: TaskId) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_on: Some(task),
            }
        }
    }

    impl TaskRunner for Recorder {
        type Error = String;

        fn run(&self, task: TaskId) -> Result<(), String> {
            self.seen.lock().unwrap().push(task);
            if self.fail_on == Some(task) {
                return Err(format!("{task} failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn production_cleans_before_anything_else() {
        let recorder = Recorder::new();
        TaskGraph::production().run(&recorder).unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0], TaskId::Clean);
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn production_has_every_transform_and_no_dev_tasks() {
        let tasks = TaskGraph::production().tasks();
        assert!(tasks.contains(&TaskId::OptimizeImages));
        assert!(tasks.contains(&TaskId::Sprite));
        assert!(!tasks.contains(&TaskId::CopyImages));
        assert!(!tasks.contains(&TaskId::Serve));
        assert!(!tasks.contains(&TaskId::Watch));
    }

    #[test]
    fn development_copies_images_and_ends_in_serve_then_watch() {
        let tasks = TaskGraph::development().tasks();
        assert!(tasks.contains(&TaskId::CopyImages));
        assert!(!tasks.contains(&TaskId::OptimizeImages));
        assert_eq!(tasks[tasks.len() - 2], TaskId::Serve);
        assert_eq!(tasks[tasks.len() - 1], TaskId::Watch);
    }

    #[test]
    fn clean_failure_stops_the_build() {
        let recorder = Recorder::failing_on(TaskId::Clean);
        let err = TaskGraph::production().run(&recorder).unwrap_err();
        assert_eq!(err, "clean failed");
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn parallel_failure_propagates_after_the_stage() {
        let recorder = Recorder::failing_on(TaskId::Markup);
        let err = TaskGraph::production().run(&recorder).unwrap_err();
        assert_eq!(err, "markup failed");
        // Siblings in the stage still ran
        assert_eq!(recorder.seen.lock().unwrap().len(), 9);
    }
}

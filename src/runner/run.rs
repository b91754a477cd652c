//! Sequential execution of resolved leaves
//!
//! A run resolves the requested names first, then executes leaves one at a
//! time in order. The first failure stops the run; leaves after it never start.

use crate::config::ConfigStore;
use crate::error::BriskError;
use crate::runner::files::expand_mappings;
use crate::runner::registry::{LeafId, ResolvedLeaf, TaskRegistry};
use crate::runner::{Context, TargetConfig, Verbosity};
use crate::ui;
use std::time::{Duration, Instant};

/// Lifecycle of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resolving,
    /// Index of the leaf currently executing
    Executing(usize),
    Failed,
    Done,
}

/// A leaf that completed successfully
#[derive(Debug, Clone)]
pub struct LeafRun {
    pub id: LeafId,
    pub elapsed: Duration,
}

/// Why a run stopped
#[derive(Debug)]
pub struct RunFailure {
    /// The failing leaf; `None` when resolution itself failed
    pub leaf: Option<LeafId>,
    pub error: BriskError,
}

/// Outcome of one run
#[derive(Debug, Default)]
pub struct RunResult {
    pub executed: Vec<LeafRun>,
    pub failure: Option<RunFailure>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Convert into a `Result`, dropping the timings
    pub fn into_result(self) -> Result<(), BriskError> {
        match self.failure {
            None => Ok(()),
            Some(failure) => Err(failure.error),
        }
    }
}

/// Executes task names against a registry and a config store
pub struct Runner<'a> {
    registry: &'a TaskRegistry,
    store: &'a ConfigStore,
    ctx: &'a Context,
    state: RunState,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a TaskRegistry, store: &'a ConfigStore, ctx: &'a Context) -> Self {
        Runner {
            registry,
            store,
            ctx,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Resolve and execute `names` in order, stopping at the first failure
    pub fn run(&mut self, names: &[String]) -> RunResult {
        // Done and Failed are terminal for a run, not for the runner
        self.state = RunState::Resolving;

        let leaves = match self.registry.resolve_all(names) {
            Ok(leaves) => leaves,
            Err(e) => {
                self.state = RunState::Failed;
                return RunResult {
                    executed: Vec::new(),
                    failure: Some(RunFailure {
                        leaf: None,
                        error: e.into(),
                    }),
                };
            }
        };

        let mut result = RunResult::default();
        for (index, leaf) in leaves.iter().enumerate() {
            self.state = RunState::Executing(index);
            let started = Instant::now();

            if let Err(error) = self.execute(leaf) {
                self.ctx
                    .print_error(&format!("Task \"{}\" failed: {}", leaf.id, error));
                self.state = RunState::Failed;
                result.failure = Some(RunFailure {
                    leaf: Some(leaf.id.clone()),
                    error,
                });
                break;
            }

            result.executed.push(LeafRun {
                id: leaf.id.clone(),
                elapsed: started.elapsed(),
            });
        }

        if result.success() {
            self.state = RunState::Done;
        }

        if self.ctx.verbosity >= Verbosity::Verbose && !result.executed.is_empty() {
            let entries: Vec<_> = result
                .executed
                .iter()
                .map(|run| (run.id.to_string(), run.elapsed))
                .collect();
            eprintln!("\n{}", ui::timings(&entries));
        }

        result
    }

    fn execute(&self, leaf: &ResolvedLeaf) -> Result<(), BriskError> {
        self.ctx.print_task_start(&leaf.id.to_string());

        let target = TargetConfig::load(self.store, &leaf.id.task, &leaf.id.target)?;
        let files = expand_mappings(self.ctx, &target.mappings)?;
        self.ctx.print_debug(&format!(
            "{} file mapping(s) for {}",
            files.len(),
            leaf.id
        ));

        leaf.adapter.apply(self.ctx, &target, &files)?;

        self.ctx.print_task_complete(&leaf.id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Adapter, AdapterKind};
    use crate::error::{AdapterError, AdapterResult, TaskError};
    use crate::runner::registry::LeafTask;
    use crate::runner::FilePair;
    use serde_yaml::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records each target it is applied to, failing on one of them
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<String>,
    }

    impl Adapter for Recorder {
        fn kind(&self) -> AdapterKind {
            AdapterKind::Concat
        }

        fn apply(&self, _: &Context, target: &TargetConfig, _: &[FilePair]) -> AdapterResult<()> {
            self.calls.lock().unwrap().push(target.id());
            if self.fail_on.as_deref() == Some(target.id().as_str()) {
                return Err(AdapterError::Unsupported("boom".to_string()));
            }
            Ok(())
        }
    }

    struct Counter(AtomicUsize);

    impl Adapter for Counter {
        fn kind(&self) -> AdapterKind {
            AdapterKind::Copy
        }

        fn apply(&self, _: &Context, _: &TargetConfig, _: &[FilePair]) -> AdapterResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn quiet_ctx() -> Context {
        Context::new()
            .with_base_dir(std::env::temp_dir())
            .with_verbosity(Verbosity::Silent)
    }

    fn setup(fail_on: Option<&str>) -> (TaskRegistry, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::new(Recorder {
            calls: calls.clone(),
            fail_on: fail_on.map(str::to_string),
        });

        let mut registry = TaskRegistry::new();
        registry.register("a", LeafTask::new(recorder.clone(), names(&["one", "two"])));
        registry.register("b", LeafTask::new(recorder.clone(), names(&["one"])));
        registry.register("c", LeafTask::new(recorder, names(&["one"])));
        registry.register_alias("all", names(&["a", "b", "c"]));
        (registry, calls)
    }

    #[test]
    fn test_runs_leaves_in_order() {
        let (registry, calls) = setup(None);
        let store = ConfigStore::new(Value::Null);
        let ctx = quiet_ctx();
        let mut runner = Runner::new(&registry, &store, &ctx);

        let result = runner.run(&names(&["all"]));
        assert!(result.success());
        assert_eq!(runner.state(), RunState::Done);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a:one", "a:two", "b:one", "c:one"]
        );
        assert_eq!(result.executed.len(), 4);
    }

    #[test]
    fn test_failure_stops_the_run() {
        let (registry, calls) = setup(Some("b:one"));
        let store = ConfigStore::new(Value::Null);
        let ctx = quiet_ctx();
        let mut runner = Runner::new(&registry, &store, &ctx);

        let result = runner.run(&names(&["all"]));
        assert!(!result.success());
        assert_eq!(runner.state(), RunState::Failed);
        // third leaf failed: two completed, the fourth never started
        assert_eq!(result.executed.len(), 2);
        assert_eq!(*calls.lock().unwrap(), vec!["a:one", "a:two", "b:one"]);

        let failure = result.failure.unwrap();
        assert_eq!(failure.leaf.unwrap().to_string(), "b:one");
    }

    #[test]
    fn test_resolution_failure_executes_nothing() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut registry = TaskRegistry::new();
        registry.register("copy", LeafTask::new(counter.clone(), names(&["main"])));
        registry.register_alias("build", names(&["copy", "missing"]));

        let store = ConfigStore::new(Value::Null);
        let ctx = quiet_ctx();
        let mut runner = Runner::new(&registry, &store, &ctx);

        let result = runner.run(&names(&["build"]));
        let failure = result.failure.unwrap();
        assert!(failure.leaf.is_none());
        assert!(matches!(
            failure.error,
            BriskError::Task(TaskError::Unknown(ref name)) if name == "missing"
        ));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_runner_can_run_again_after_failure() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut registry = TaskRegistry::new();
        registry.register("copy", LeafTask::new(counter.clone(), names(&["main"])));

        let store = ConfigStore::new(Value::Null);
        let ctx = quiet_ctx();
        let mut runner = Runner::new(&registry, &store, &ctx);

        assert!(!runner.run(&names(&["nope"])).success());
        assert_eq!(runner.state(), RunState::Failed);

        assert!(runner.run(&names(&["copy"])).success());
        assert_eq!(runner.state(), RunState::Done);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_request_is_done() {
        let registry = TaskRegistry::new();
        let store = ConfigStore::new(Value::Null);
        let ctx = quiet_ctx();
        let mut runner = Runner::new(&registry, &store, &ctx);

        assert_eq!(runner.state(), RunState::Idle);
        let result = runner.run(&[]);
        assert!(result.success());
        assert_eq!(runner.state(), RunState::Done);
    }
}

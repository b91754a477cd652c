//! Watch session
//!
//! Watches the project directory and, whenever files matching a watch
//! target's patterns change, runs that target's tasks through the runner.
//! Events that arrive while tasks run are coalesced into the next batch.

use crate::config::Project;
use crate::error::{BriskError, TaskError};
use crate::runner::{Context, RunResult, Runner, TargetConfig, TaskRegistry};
use crate::ui;
use anyhow::Context as _;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(250);

/// One watch target: patterns and the tasks they trigger
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub name: String,
    pub patterns: Vec<String>,
    pub tasks: Vec<String>,
    include: GlobSet,
    exclude: GlobSet,
}

impl WatchTarget {
    pub fn new(name: &str, patterns: Vec<String>, tasks: Vec<String>) -> Result<Self, BriskError> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        for pattern in &patterns {
            let (negated, body) = match pattern.strip_prefix('!') {
                Some(body) => (true, body),
                None => (false, pattern.as_str()),
            };
            // a leading slash anchors at the project root, like a bare pattern
            let body = body.trim_start_matches('/');
            let glob = GlobBuilder::new(body)
                .literal_separator(true)
                .build()
                .map_err(|e| crate::error::AdapterError::Pattern {
                    pattern: pattern.clone(),
                    error: e.to_string(),
                })?;
            if negated {
                exclude.add(glob);
            } else {
                include.add(glob);
            }
        }

        let build = |builder: GlobSetBuilder| {
            builder.build().map_err(|e| crate::error::AdapterError::Pattern {
                pattern: patterns.join(", "),
                error: e.to_string(),
            })
        };
        let include = build(include)?;
        let exclude = build(exclude)?;

        Ok(WatchTarget {
            name: name.to_string(),
            patterns,
            tasks,
            include,
            exclude,
        })
    }

    /// Whether a path relative to the project root triggers this target
    pub fn matches(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

/// Read the watch targets of `task` (all of them, or just `target`)
pub fn load_targets(
    project: &Project,
    task: &str,
    target: Option<&str>,
) -> Result<Vec<WatchTarget>, BriskError> {
    let def = project
        .buildfile
        .task(task)
        .ok_or_else(|| TaskError::Unknown(task.to_string()))?;

    let names = match target {
        Some(name) if def.target_names().iter().any(|t| t == name) => vec![name.to_string()],
        Some(name) => return Err(TaskError::Unknown(format!("{}:{}", task, name)).into()),
        None => def.target_names(),
    };

    let mut targets = Vec::new();
    for name in names {
        let config = TargetConfig::load(&project.store, task, &name)?;
        let tasks = config.list_option("tasks")?;
        targets.push(WatchTarget::new(&name, config.all_patterns(), tasks)?);
    }
    Ok(targets)
}

/// Targets triggered by any of `changed`, in declaration order
pub fn matching_targets<'a>(targets: &'a [WatchTarget], changed: &[PathBuf]) -> Vec<&'a WatchTarget> {
    targets
        .iter()
        .filter(|target| changed.iter().any(|path| target.matches(path)))
        .collect()
}

/// Watch the project until interrupted
pub fn watch(
    project: &Project,
    registry: &TaskRegistry,
    ctx: &Context,
    targets: &[WatchTarget],
) -> anyhow::Result<()> {
    let root = ctx
        .base_dir
        .canonicalize()
        .with_context(|| format!("cannot watch {}", ctx.base_dir.display()))?;

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(DEBOUNCE, None, tx)?;
    debouncer.watch(&root, RecursiveMode::Recursive)?;

    for target in targets {
        ctx.print_debug(&format!(
            "watch:{} {} -> {}",
            target.name,
            target.patterns.join(", "),
            target.tasks.join(", ")
        ));
    }

    let mut runner = Runner::new(registry, &project.store, ctx);
    ctx.print_info("Waiting...");

    while let Ok(batch) = rx.recv() {
        let mut changed = BTreeSet::new();
        collect_changes(batch, &root, &mut changed, ctx);
        drain(&rx, &root, &mut changed, ctx);
        if changed.is_empty() {
            continue;
        }

        let changed: Vec<PathBuf> = changed.into_iter().collect();
        let triggered = matching_targets(targets, &changed);
        if triggered.is_empty() {
            continue;
        }

        for path in &changed {
            ctx.print_info(&format!(">> File \"{}\" changed.", path.display()));
        }
        for target in triggered {
            ctx.print_debug(&format!("watch:{} triggered", target.name));
            let result = runner.run(&target.tasks);
            report(ctx, &result);
        }

        ctx.print_info("Waiting...");
    }

    Ok(())
}

fn drain(
    rx: &Receiver<DebounceEventResult>,
    root: &Path,
    changed: &mut BTreeSet<PathBuf>,
    ctx: &Context,
) {
    while let Ok(batch) = rx.try_recv() {
        collect_changes(batch, root, changed, ctx);
    }
}

fn collect_changes(
    batch: DebounceEventResult,
    root: &Path,
    changed: &mut BTreeSet<PathBuf>,
    ctx: &Context,
) {
    match batch {
        Ok(events) => {
            for event in events {
                if !matches!(
                    event.event.kind,
                    EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                ) {
                    continue;
                }
                for path in &event.event.paths {
                    if let Ok(rel) = path.strip_prefix(root) {
                        changed.insert(rel.to_path_buf());
                    }
                }
            }
        }
        Err(errors) => {
            for error in errors {
                ctx.print_warn(&format!("Watch error: {}", error));
            }
        }
    }
}

fn report(ctx: &Context, result: &RunResult) {
    ctx.print_info(&ui::summary(result.success()));
}

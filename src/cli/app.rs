//! Main CLI application

use crate::adapters::AdapterKind;
use crate::config::{load_project, load_project_auto, validate_buildfile, Project};
use crate::error::BriskError;
use crate::runner::{Context, Runner, TaskNode, TaskRegistry, Verbosity};
use crate::ui;
use crate::watch::{self, WatchTarget};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// Task run when none is named
const DEFAULT_TASK: &str = "default";

/// CLI application
pub struct App {
    /// Loaded buildfile
    project: Project,
    /// Task graph built from the buildfile
    registry: TaskRegistry,
    /// Execution context
    ctx: Context,
}

/// Task names from the command line, with watch requests split off
#[derive(Debug, Default, PartialEq)]
pub struct Request {
    /// Names to run first, in order
    pub tasks: Vec<String>,
    /// Watch tasks to start afterwards: task name and optional target
    pub watches: Vec<(String, Option<String>)>,
}

impl App {
    /// Create a new app from a buildfile found by searching upwards
    pub fn new(verbosity: Verbosity) -> Result<Self, BriskError> {
        Self::from_project(load_project_auto()?, verbosity)
    }

    /// Create app with a specific buildfile
    pub fn with_buildfile(path: PathBuf, verbosity: Verbosity) -> Result<Self, BriskError> {
        Self::from_project(load_project(&path)?, verbosity)
    }

    /// Validate a loaded project and prepare its task graph
    pub fn from_project(project: Project, verbosity: Verbosity) -> Result<Self, BriskError> {
        let mut ctx = Context::new()
            .with_base_dir(
                project
                    .root_dir
                    .canonicalize()
                    .unwrap_or_else(|_| project.root_dir.clone()),
            )
            .with_verbosity(verbosity);
        if let Some(path) = &project.path {
            ctx = ctx.with_config_path(path.clone());
        }

        for warning in &project.warnings {
            ctx.print_warn(warning);
        }

        validate_buildfile(&project.buildfile, project.store.root())?;
        let registry = TaskRegistry::from_buildfile(&project.buildfile)?;

        Ok(App {
            project,
            registry,
            ctx,
        })
    }

    /// Print every task with its description
    pub fn list(&self) {
        print!("{}", task_list(&self.registry));
    }

    /// Run the named tasks, then any requested watch session.
    ///
    /// Returns `Ok(false)` when a task failed; the failure has already been
    /// reported.
    pub fn run(&self, names: &[String]) -> Result<bool, BriskError> {
        let request = split_request(&self.registry, names);

        if !request.tasks.is_empty() {
            let mut runner = Runner::new(&self.registry, &self.project.store, &self.ctx);
            let result = runner.run(&request.tasks);
            if let Some(failure) = &result.failure {
                // Resolution failures have no leaf and were not printed yet
                if failure.leaf.is_none() {
                    self.ctx.print_error(&failure.error.to_string());
                }
                self.ctx.print_info(&format!("\n{}", ui::summary(false)));
                return Ok(false);
            }
            if request.watches.is_empty() {
                self.ctx.print_info(&format!("\n{}", ui::summary(true)));
            }
        }

        if request.watches.is_empty() {
            return Ok(true);
        }

        let mut targets: Vec<WatchTarget> = Vec::new();
        for (task, target) in &request.watches {
            self.ctx
                .print_task_start(&format!("{}{}", task, target_suffix(target)));
            targets.extend(watch::load_targets(&self.project, task, target.as_deref())?);
        }

        watch::watch(&self.project, &self.registry, &self.ctx, &targets)
            .map_err(|e| BriskError::Watch(format!("{:#}", e)))?;
        Ok(true)
    }
}

fn target_suffix(target: &Option<String>) -> String {
    target
        .as_ref()
        .map(|t| format!(":{}", t))
        .unwrap_or_default()
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("brisk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A YAML-based static asset build runner")
        .arg(
            Arg::new("tasks")
                .value_name("TASK")
                .help("Tasks to run (task, task:target or alias); defaults to \"default\"")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to brisk.yml buildfile"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output, including per-task timings")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List available tasks and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script and exit"),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Requested task names, or the default task
fn task_names(matches: &ArgMatches) -> Vec<String> {
    let names: Vec<String> = matches
        .get_many::<String>("tasks")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if names.is_empty() {
        vec![DEFAULT_TASK.to_string()]
    } else {
        names
    }
}

/// Separate watch tasks, which run last and never return, from the rest
pub fn split_request(registry: &TaskRegistry, names: &[String]) -> Request {
    let mut request = Request::default();
    for name in names {
        let (task, target) = match name.split_once(':') {
            Some((task, target)) => (task, Some(target.to_string())),
            None => (name.as_str(), None),
        };
        match registry.get(task) {
            Some(TaskNode::Leaf(leaf)) if leaf.adapter.kind() == AdapterKind::Watch => {
                request.watches.push((task.to_string(), target));
            }
            _ => request.tasks.push(name.clone()),
        }
    }
    request
}

/// `--list` output: tasks first, then aliases, in declaration order
pub fn task_list(registry: &TaskRegistry) -> String {
    let width = registry
        .entries()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    let mut tasks = String::new();
    let mut aliases = String::new();
    for (name, node) in registry.entries() {
        match node {
            TaskNode::Leaf(leaf) => {
                let description = leaf.description.clone().unwrap_or_else(|| {
                    format!("{} ({})", leaf.adapter.kind(), leaf.targets.join(", "))
                });
                tasks.push_str(&format!("  {:width$}  {}\n", name, description, width = width));
            }
            TaskNode::Alias(alias) => {
                let description = alias.description.clone().unwrap_or_else(|| {
                    let quoted: Vec<_> = alias.tasks.iter().map(|t| format!("\"{}\"", t)).collect();
                    format!("Alias for {} task(s).", quoted.join(", "))
                });
                aliases.push_str(&format!("  {:width$}  {}\n", name, description, width = width));
            }
        }
    }

    let mut out = String::from("Available tasks:\n");
    out.push_str(&tasks);
    if !aliases.is_empty() {
        out.push_str("\nAliases:\n");
        out.push_str(&aliases);
    }
    out
}

/// Run the CLI application.
///
/// Returns `Ok(false)` when a task failed and the process should exit non-zero.
pub fn run() -> Result<bool, BriskError> {
    run_from(std::env::args())
}

/// Run with explicit arguments
pub fn run_from<I, T>(args: I) -> Result<bool, BriskError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    if let Some(shell) = matches.get_one::<Shell>("completions") {
        let mut cmd = build_command();
        generate(*shell, &mut cmd, "brisk", &mut io::stdout());
        return Ok(true);
    }

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }
    let verbosity = get_verbosity(&matches);

    let app = match matches.get_one::<PathBuf>("file") {
        Some(path) => App::with_buildfile(path.clone(), verbosity)?,
        None => App::new(verbosity)?,
    };

    if matches.get_flag("list") {
        app.list();
        return Ok(true);
    }

    app.run(&task_names(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_buildfile;

    fn registry(yaml: &str) -> TaskRegistry {
        let (buildfile, _) = parse_buildfile(yaml).unwrap();
        TaskRegistry::from_buildfile(&buildfile).unwrap()
    }

    const BUILDFILE: &str = r#"
tasks:
  concat:
    description: Join scripts
    targets:
      js: {src: a.js, dest: b.js}
  jsmin:
    targets:
      js: {src: b.js, dest: b.min.js}
  watch:
    targets:
      js: {files: ['*.js'], tasks: [js]}
aliases:
  js: [concat, jsmin]
"#;

    #[test]
    fn test_get_verbosity_normal() {
        let matches = build_command().get_matches_from(vec!["brisk"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_get_verbosity_silent_wins() {
        let matches = build_command().get_matches_from(vec!["brisk", "-v", "-s"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Silent);
    }

    #[test]
    fn test_default_task_name() {
        let matches = build_command().get_matches_from(vec!["brisk"]);
        assert_eq!(task_names(&matches), vec!["default"]);

        let matches = build_command().get_matches_from(vec!["brisk", "css", "js"]);
        assert_eq!(task_names(&matches), vec!["css", "js"]);
    }

    #[test]
    fn test_file_arg() {
        let matches = build_command().get_matches_from(vec!["brisk", "-f", "demo/brisk.yml", "js"]);
        assert_eq!(
            matches.get_one::<PathBuf>("file"),
            Some(&PathBuf::from("demo/brisk.yml"))
        );
        assert_eq!(task_names(&matches), vec!["js"]);
    }

    #[test]
    fn test_split_request_defers_watch() {
        let registry = registry(BUILDFILE);
        let request = split_request(
            &registry,
            &["watch:js".to_string(), "js".to_string(), "watch".to_string()],
        );
        assert_eq!(request.tasks, vec!["js"]);
        assert_eq!(
            request.watches,
            vec![
                ("watch".to_string(), Some("js".to_string())),
                ("watch".to_string(), None)
            ]
        );
    }

    #[test]
    fn test_task_list() {
        colored::control::set_override(false);
        let list = task_list(&registry(BUILDFILE));
        assert!(list.starts_with("Available tasks:\n"));
        assert!(list.contains("concat  Join scripts"));
        assert!(list.contains("jsmin   jsmin (js)"));
        assert!(list.contains("Aliases:\n  js      Alias for \"concat\", \"jsmin\" task(s)."));
    }
}

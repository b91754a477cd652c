//! Task registry and alias resolution
//!
//! Tasks form a directed graph: alias nodes point at other tasks by name,
//! leaf nodes carry an adapter and their targets. Resolution flattens the
//! graph depth-first into the ordered list of leaves to execute.

use crate::adapters::{self, Adapter, AdapterKind};
use crate::config::Buildfile;
use crate::error::{ConfigError, ConfigResult, TaskError, TaskResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A task bound to an adapter
#[derive(Clone)]
pub struct LeafTask {
    pub adapter: Arc<dyn Adapter>,
    /// Target names in declaration order
    pub targets: Vec<String>,
    pub description: Option<String>,
}

impl LeafTask {
    pub fn new(adapter: Arc<dyn Adapter>, targets: Vec<String>) -> Self {
        LeafTask {
            adapter,
            targets,
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

impl fmt::Debug for LeafTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafTask")
            .field("adapter", &self.adapter.kind())
            .field("targets", &self.targets)
            .finish()
    }
}

/// A task made of other tasks
#[derive(Debug, Clone)]
pub struct AliasTask {
    pub tasks: Vec<String>,
    pub description: Option<String>,
}

/// A node of the task graph
#[derive(Debug, Clone)]
pub enum TaskNode {
    Leaf(LeafTask),
    Alias(AliasTask),
}

/// Identity of one executable leaf: `task:target`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeafId {
    pub task: String,
    pub target: String,
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.task, self.target)
    }
}

/// A leaf ready to run
#[derive(Clone)]
pub struct ResolvedLeaf {
    pub id: LeafId,
    pub adapter: Arc<dyn Adapter>,
}

impl fmt::Debug for ResolvedLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.adapter.kind())
    }
}

/// Registry of named tasks
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    nodes: HashMap<String, TaskNode>,
    /// Registration order, for listing
    order: Vec<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from a validated buildfile
    pub fn from_buildfile(buildfile: &Buildfile) -> ConfigResult<Self> {
        let mut registry = TaskRegistry::new();

        for (name, task) in &buildfile.tasks {
            let adapter_name = task.adapter_name(name);
            let kind =
                AdapterKind::from_name(adapter_name).ok_or_else(|| ConfigError::UnknownAdapter {
                    task: name.clone(),
                    adapter: adapter_name.to_string(),
                })?;
            registry.register(
                name,
                LeafTask::new(adapters::for_kind(kind), task.target_names())
                    .with_description(task.description.clone()),
            );
        }

        for (name, alias) in &buildfile.aliases {
            registry.register_alias_described(name, alias.tasks.clone(), alias.description.clone());
        }

        Ok(registry)
    }

    /// Register a leaf task. Re-registering a name replaces it.
    pub fn register(&mut self, name: &str, task: LeafTask) {
        self.insert(name, TaskNode::Leaf(task));
    }

    /// Register an alias. Referenced names need not exist yet.
    pub fn register_alias(&mut self, name: &str, tasks: Vec<String>) {
        self.register_alias_described(name, tasks, None);
    }

    pub fn register_alias_described(
        &mut self,
        name: &str,
        tasks: Vec<String>,
        description: Option<String>,
    ) {
        self.insert(name, TaskNode::Alias(AliasTask { tasks, description }));
    }

    fn insert(&mut self, name: &str, node: TaskNode) {
        if self.nodes.insert(name.to_string(), node).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Look up a task
    pub fn get(&self, name: &str) -> Option<&TaskNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Tasks in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TaskNode)> {
        self.order
            .iter()
            .filter_map(|name| self.nodes.get(name).map(|node| (name.as_str(), node)))
    }

    /// Flatten a task name into the ordered leaves it runs
    pub fn resolve(&self, name: &str) -> TaskResult<Vec<ResolvedLeaf>> {
        let mut leaves = Vec::new();
        let mut stack = Vec::new();
        self.resolve_into(name, &mut stack, &mut leaves)?;
        Ok(leaves)
    }

    /// Resolve several names, concatenating their leaves
    pub fn resolve_all(&self, names: &[String]) -> TaskResult<Vec<ResolvedLeaf>> {
        let mut leaves = Vec::new();
        for name in names {
            leaves.extend(self.resolve(name)?);
        }
        Ok(leaves)
    }

    fn resolve_into(
        &self,
        name: &str,
        stack: &mut Vec<String>,
        leaves: &mut Vec<ResolvedLeaf>,
    ) -> TaskResult<()> {
        if let Some((task, target)) = name.split_once(':') {
            return match self.nodes.get(task) {
                Some(TaskNode::Leaf(leaf)) if leaf.targets.iter().any(|t| t == target) => {
                    leaves.push(ResolvedLeaf {
                        id: LeafId {
                            task: task.to_string(),
                            target: target.to_string(),
                        },
                        adapter: leaf.adapter.clone(),
                    });
                    Ok(())
                }
                _ => Err(TaskError::Unknown(name.to_string())),
            };
        }

        if stack.iter().any(|t| t == name) {
            stack.push(name.to_string());
            return Err(TaskError::Cyclic(stack.join(" -> ")));
        }

        match self.nodes.get(name) {
            None => Err(TaskError::Unknown(name.to_string())),
            Some(TaskNode::Leaf(leaf)) => {
                for target in &leaf.targets {
                    leaves.push(ResolvedLeaf {
                        id: LeafId {
                            task: name.to_string(),
                            target: target.clone(),
                        },
                        adapter: leaf.adapter.clone(),
                    });
                }
                Ok(())
            }
            Some(TaskNode::Alias(alias)) => {
                stack.push(name.to_string());
                for child in &alias.tasks {
                    self.resolve_into(child, stack, leaves)?;
                }
                stack.pop();
                Ok(())
            }
        }
    }
}

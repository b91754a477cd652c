//! Core configuration types
//!
//! This module defines the data structures that represent a brisk.yml buildfile.
//! Target bodies stay as raw YAML values: their templates are only resolved
//! when the target runs.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Name/value pairs in declaration order
pub type Ordered<T> = Vec<(String, T)>;

/// Top-level buildfile structure
///
/// Keys other than the ones below are free-form template variables
/// (`loc`, `banner`, ...) and are only reachable through the config store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Buildfile {
    /// Path of the package metadata document, exposed to templates as `pkg`
    #[serde(default)]
    pub package: Option<String>,

    /// Leaf tasks, each bound to one adapter
    #[serde(default, deserialize_with = "deserialize_ordered")]
    pub tasks: Ordered<TaskDef>,

    /// Composite tasks made of other task names
    #[serde(default, deserialize_with = "deserialize_ordered")]
    pub aliases: Ordered<Alias>,
}

/// A leaf task definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDef {
    /// Adapter kind; defaults to the task name
    #[serde(default)]
    pub adapter: Option<String>,

    /// Description shown by `--list`
    #[serde(default)]
    pub description: Option<String>,

    /// Options shared by every target (targets override them)
    #[serde(default)]
    pub options: Mapping,

    /// Named targets, unresolved
    #[serde(default, deserialize_with = "deserialize_ordered")]
    pub targets: Ordered<Value>,
}

impl TaskDef {
    /// The adapter kind name this task is bound to
    pub fn adapter_name<'a>(&'a self, task_name: &'a str) -> &'a str {
        self.adapter.as_deref().unwrap_or(task_name)
    }

    /// Names of the targets in declaration order
    pub fn target_names(&self) -> Vec<String> {
        self.targets.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// An alias task: an ordered list of other task names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alias {
    /// Description shown by `--list`
    pub description: Option<String>,

    /// Task names, each `name` or `name:target`
    pub tasks: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AliasDef {
    Single(String),
    List(Vec<String>),
    Detailed {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        tasks: Vec<String>,
    },
}

impl<'de> Deserialize<'de> for Alias {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match AliasDef::deserialize(deserializer)? {
            AliasDef::Single(task) => Alias {
                description: None,
                tasks: vec![task],
            },
            AliasDef::List(tasks) => Alias {
                description: None,
                tasks,
            },
            AliasDef::Detailed { description, tasks } => Alias { description, tasks },
        })
    }
}

impl Buildfile {
    /// Look up a leaf task by name
    pub fn task(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Look up an alias by name
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }
}

/// Custom deserializer for mappings whose declaration order matters
fn deserialize_ordered<'de, D, T>(deserializer: D) -> Result<Ordered<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                let name = match key {
                    Value::String(s) => s,
                    other => {
                        return Err(D::Error::custom(format!(
                            "expected a string key, found {:?}",
                            other
                        )))
                    }
                };
                let item = match item {
                    // `name:` with nothing after it
                    Value::Null => serde_yaml::from_value(Value::Mapping(Mapping::new())),
                    other => serde_yaml::from_value(other),
                }
                .map_err(|e| D::Error::custom(format!("{}: {}", name, e)))?;
                entries.push((name, item));
            }
            Ok(entries)
        }
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a mapping")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_buildfile() {
        let yaml = r#"
tasks:
  concat:
    targets:
      js:
        src: [a.js, b.js]
        dest: main.js
"#;
        let buildfile: Buildfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(buildfile.tasks.len(), 1);
        let task = buildfile.task("concat").unwrap();
        assert_eq!(task.adapter_name("concat"), "concat");
        assert_eq!(task.target_names(), vec!["js"]);
    }

    #[test]
    fn test_targets_keep_declaration_order() {
        let yaml = r#"
tasks:
  minify:
    adapter: cssmin
    targets:
      zeta: {src: z.css, dest: z.min.css}
      alpha: {src: a.css, dest: a.min.css}
      mid: {src: m.css, dest: m.min.css}
"#;
        let buildfile: Buildfile = serde_yaml::from_str(yaml).unwrap();
        let task = buildfile.task("minify").unwrap();
        assert_eq!(task.adapter_name("minify"), "cssmin");
        assert_eq!(task.target_names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_alias_forms() {
        let yaml = r#"
aliases:
  default: build
  build: [test, css, js]
  docs:
    description: Build the docs
    tasks: [topdoc, cleanup]
"#;
        let buildfile: Buildfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(buildfile.alias("default").unwrap().tasks, vec!["build"]);
        assert_eq!(buildfile.alias("build").unwrap().tasks, vec!["test", "css", "js"]);
        let docs = buildfile.alias("docs").unwrap();
        assert_eq!(docs.description.as_deref(), Some("Build the docs"));
        assert_eq!(docs.tasks.len(), 2);
        let names: Vec<_> = buildfile.aliases.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["default", "build", "docs"]);
    }

    #[test]
    fn test_free_form_keys_are_ignored() {
        let yaml = r#"
package: bower.json
loc:
  src: src
banner: "/*! <%= pkg.name %> */"
"#;
        let buildfile: Buildfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(buildfile.package.as_deref(), Some("bower.json"));
        assert!(buildfile.tasks.is_empty());
    }

    #[test]
    fn test_tasks_must_be_a_mapping() {
        let result: Result<Buildfile, _> = serde_yaml::from_str("tasks: [a, b]");
        assert!(result.is_err());
    }
}

//! Runtime representation of one task target
//!
//! A target body is normalized from any of the accepted buildfile forms
//! into merged options plus a list of [`FileMapping`]s.

use crate::config::ConfigStore;
use crate::error::{AdapterError, AdapterResult, ConfigError, ConfigResult};
use crate::runner::files::FileMapping;
use serde_yaml::{Mapping, Value};

/// Keys of a target body that describe files rather than options
const FILE_KEYS: &[&str] = &["src", "dest", "files", "cwd", "expand", "flatten", "ext"];

/// Fully resolved configuration for one target
#[derive(Debug, Clone, Default)]
pub struct TargetConfig {
    /// Task name
    pub task: String,

    /// Target name
    pub target: String,

    /// Task options overridden by target options
    pub options: Mapping,

    /// File mappings, not yet expanded
    pub mappings: Vec<FileMapping>,
}

impl TargetConfig {
    /// A target with no options or files
    pub fn empty(task: &str, target: &str) -> Self {
        TargetConfig {
            task: task.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    /// Read a target from the store, resolving its templates now
    pub fn load(store: &ConfigStore, task: &str, target: &str) -> ConfigResult<Self> {
        let Some(task_value) = store.get_raw(&["tasks", task]) else {
            return Ok(Self::empty(task, target));
        };

        let task_options = match task_value.get("options") {
            Some(options) => store.process(options)?,
            None => Value::Null,
        };
        let data = match task_value.get("targets").and_then(|t| t.get(target)) {
            Some(data) => store.process(data)?,
            None => Value::Null,
        };

        Self::from_value(task, target, &task_options, &data)
    }

    /// Build a target from resolved task options and a resolved target body
    pub fn from_value(
        task: &str,
        target: &str,
        task_options: &Value,
        data: &Value,
    ) -> ConfigResult<Self> {
        let invalid = |reason: String| {
            ConfigError::Invalid(format!("target '{}:{}': {}", task, target, reason))
        };

        let mut options = match task_options {
            Value::Mapping(map) => map.clone(),
            Value::Null => Mapping::new(),
            _ => return Err(invalid("task options must be a mapping".to_string())),
        };

        let mut mappings = Vec::new();

        match data {
            Value::Null => {}
            Value::String(_) | Value::Sequence(_) => {
                mappings.push(FileMapping {
                    src: string_list(data).map_err(invalid)?,
                    ..Default::default()
                });
            }
            Value::Mapping(map) => {
                let mut extra = Mapping::new();
                for (key, value) in map {
                    let Some(key_str) = key.as_str() else {
                        return Err(invalid("keys must be strings".to_string()));
                    };
                    if key_str != "options" && !FILE_KEYS.contains(&key_str) {
                        extra.insert(key.clone(), value.clone());
                    }
                }

                match map.get("options") {
                    Some(Value::Mapping(target_options)) => {
                        for (k, v) in target_options {
                            options.insert(k.clone(), v.clone());
                        }
                    }
                    Some(Value::Null) | None => {}
                    Some(_) => return Err(invalid("options must be a mapping".to_string())),
                }
                for (k, v) in extra {
                    if !options.contains_key(&k) {
                        options.insert(k, v);
                    }
                }

                if map.contains_key("src") {
                    mappings.push(mapping_from(map).map_err(invalid)?);
                } else if let Some(files) = map.get("files") {
                    mappings.extend(files_from(files).map_err(invalid)?);
                }
            }
            _ => return Err(invalid("expected a mapping or a list of patterns".to_string())),
        }

        Ok(TargetConfig {
            task: task.to_string(),
            target: target.to_string(),
            options,
            mappings,
        })
    }

    /// `task:target`
    pub fn id(&self) -> String {
        format!("{}:{}", self.task, self.target)
    }

    /// Raw option value
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key).filter(|v| !v.is_null())
    }

    /// Optional string option
    pub fn str_option(&self, key: &str) -> AdapterResult<Option<String>> {
        match self.option(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(invalid_option(key, "expected a string")),
        }
    }

    /// String option that must be present
    pub fn required_str(&self, key: &str) -> AdapterResult<String> {
        self.str_option(key)?
            .ok_or_else(|| AdapterError::MissingOption(key.to_string()))
    }

    /// Boolean option with a default
    pub fn bool_option(&self, key: &str, default: bool) -> AdapterResult<bool> {
        match self.option(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s == "true" => Ok(true),
            Some(Value::String(s)) if s == "false" => Ok(false),
            Some(_) => Err(invalid_option(key, "expected true or false")),
        }
    }

    /// Numeric option with a default
    pub fn f64_option(&self, key: &str, default: f64) -> AdapterResult<f64> {
        match self.option(key) {
            None => Ok(default),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| invalid_option(key, "expected a number")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| invalid_option(key, "expected a number")),
            Some(_) => Err(invalid_option(key, "expected a number")),
        }
    }

    /// Option holding a string or a list of strings
    pub fn list_option(&self, key: &str) -> AdapterResult<Vec<String>> {
        match self.option(key) {
            None => Ok(Vec::new()),
            Some(value) => string_list(value).map_err(|e| invalid_option(key, &e)),
        }
    }

    /// Every source pattern of every mapping
    pub fn all_patterns(&self) -> Vec<String> {
        self.mappings.iter().flat_map(|m| m.src.iter().cloned()).collect()
    }
}

fn invalid_option(key: &str, error: &str) -> AdapterError {
    AdapterError::InvalidOption {
        name: key.to_string(),
        error: error.to_string(),
    }
}

fn string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(seq) => {
            let mut out = Vec::with_capacity(seq.len());
            for item in seq {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    // a list-valued template inside a list splices in place
                    Value::Sequence(inner) => {
                        for nested in inner {
                            match nested {
                                Value::String(s) => out.push(s.clone()),
                                other => {
                                    return Err(format!("expected a string, found {:?}", other))
                                }
                            }
                        }
                    }
                    other => return Err(format!("expected a string, found {:?}", other)),
                }
            }
            Ok(out)
        }
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a string or a list, found {:?}", other)),
    }
}

fn optional_string(map: &Mapping, key: &str) -> Result<Option<String>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("'{}' must be a string, found {:?}", key, other)),
    }
}

fn flag(map: &Mapping, key: &str) -> Result<bool, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("'{}' must be true or false, found {:?}", key, other)),
    }
}

fn mapping_from(map: &Mapping) -> Result<FileMapping, String> {
    Ok(FileMapping {
        cwd: optional_string(map, "cwd")?,
        src: string_list(map.get("src").unwrap_or(&Value::Null))?,
        dest: optional_string(map, "dest")?,
        expand: flag(map, "expand")?,
        flatten: flag(map, "flatten")?,
        ext: optional_string(map, "ext")?,
    })
}

fn files_from(files: &Value) -> Result<Vec<FileMapping>, String> {
    match files {
        // files: { dest: src }
        Value::Mapping(map) => map
            .iter()
            .map(|(dest, src)| {
                let dest = dest
                    .as_str()
                    .ok_or_else(|| "destination keys must be strings".to_string())?;
                Ok(FileMapping {
                    src: string_list(src)?,
                    dest: Some(dest.to_string()),
                    ..Default::default()
                })
            })
            .collect(),
        // files: [ {cwd, src, dest, expand}, ... ] or a plain pattern list
        Value::Sequence(items) => {
            let mut mappings = Vec::new();
            let mut loose = Vec::new();
            for item in items {
                match item {
                    Value::String(s) => loose.push(s.clone()),
                    Value::Mapping(map) => mappings.push(mapping_from(map)?),
                    other => return Err(format!("unexpected files entry {:?}", other)),
                }
            }
            if !loose.is_empty() {
                mappings.insert(
                    0,
                    FileMapping {
                        src: loose,
                        ..Default::default()
                    },
                );
            }
            Ok(mappings)
        }
        Value::String(s) => Ok(vec![FileMapping {
            src: vec![s.clone()],
            ..Default::default()
        }]),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("unexpected files value {:?}", other)),
    }
}

//! Buildfile validation
//!
//! Checks that run once after parsing, before any task is resolved.

use crate::adapters::AdapterKind;
use crate::config::template::Template;
use crate::config::types::Buildfile;
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::collections::HashSet;

/// Validate a parsed buildfile and every template in its document
pub fn validate_buildfile(buildfile: &Buildfile, root: &Value) -> ConfigResult<()> {
    for (name, task) in &buildfile.tasks {
        validate_name("task", name)?;

        let adapter = task.adapter_name(name);
        if AdapterKind::from_name(adapter).is_none() {
            return Err(ConfigError::UnknownAdapter {
                task: name.clone(),
                adapter: adapter.to_string(),
            });
        }

        if task.targets.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Task '{}' has no targets",
                name
            )));
        }
        for (target, _) in &task.targets {
            validate_name("target", target)?;
        }
    }

    for (name, _) in &buildfile.aliases {
        validate_name("alias", name)?;
        if buildfile.task(name).is_some() {
            return Err(ConfigError::Invalid(format!(
                "Alias '{}' has the same name as a task",
                name
            )));
        }
    }

    detect_circular_aliases(buildfile)?;
    validate_templates(root)
}

fn validate_name(kind: &str, name: &str) -> ConfigResult<()> {
    if name.is_empty() || name.contains(':') || name.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "Invalid {} name '{}' (must be non-empty, without ':' or spaces)",
            kind, name
        )));
    }
    Ok(())
}

/// Detect cycles between aliases
fn detect_circular_aliases(buildfile: &Buildfile) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for (name, _) in &buildfile.aliases {
        let mut stack = Vec::new();
        check_alias_cycle(buildfile, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check one alias; leaf tasks and unknown names end the walk
fn check_alias_cycle(
    buildfile: &Buildfile,
    name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|entry| entry == name) {
        stack.push(name.to_string());
        return Err(ConfigError::CircularAlias(stack.join(" -> ")));
    }

    if visited.contains(name) {
        return Ok(());
    }

    let Some(alias) = buildfile.alias(name) else {
        return Ok(());
    };

    stack.push(name.to_string());
    for entry in &alias.tasks {
        // `task:target` always names a leaf
        if entry.contains(':') {
            continue;
        }
        check_alias_cycle(buildfile, entry, visited, stack)?;
    }
    stack.pop();
    visited.insert(name.to_string());

    Ok(())
}

/// Parse every template string in the document so syntax errors surface early
fn validate_templates(value: &Value) -> ConfigResult<()> {
    match value {
        Value::String(s) if Template::is_template(s) => Template::parse(s).map(|_| ()),
        Value::Sequence(items) => items.iter().try_for_each(validate_templates),
        Value::Mapping(map) => map.values().try_for_each(validate_templates),
        Value::Tagged(tagged) => validate_templates(&tagged.value),
        _ => Ok(()),
    }
}

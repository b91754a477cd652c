//! Configuration store with template resolution
//!
//! The store holds the whole buildfile document plus the package metadata
//! (under `pkg`) as one YAML value tree. String values may contain
//! `<%= expr %>` templates that are resolved when the value is read.

use crate::config::template::{path_to_string, Expr, Part, Segment, Template};
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::env;

/// Maximum nesting of template references before giving up
pub const MAX_TEMPLATE_DEPTH: usize = 32;

/// Rendered in place of missing nested values
const UNDEFINED: &str = "undefined";

/// Immutable, template-aware view of the build configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: Value,
}

impl ConfigStore {
    /// Create a store from a document root
    pub fn new(root: Value) -> Self {
        let root = match root {
            Value::Null => Value::Mapping(Mapping::new()),
            other => other,
        };
        ConfigStore { root }
    }

    /// Create a store from a document root and package metadata exposed as `pkg`
    pub fn with_package(root: Value, pkg: Value) -> Self {
        let mut store = Self::new(root);
        if let Value::Mapping(map) = &mut store.root {
            map.insert(Value::String("pkg".to_string()), pkg);
        }
        store
    }

    /// The unresolved document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up a dotted path and resolve any templates it contains
    pub fn get(&self, path: &str) -> ConfigResult<Value> {
        let segments = crate::config::template::parse_path(path)?;
        match self.lookup(&segments)? {
            Lookup::Found(value) => Resolver::new(self).process_at(value, 1, path),
            Lookup::Owned(value) => Ok(value),
            Lookup::Undefined => Ok(Value::String(UNDEFINED.to_string())),
        }
    }

    /// Look up a dotted path without resolving templates
    pub fn get_raw(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.root;
        for key in path {
            current = current.as_mapping()?.get(*key)?;
        }
        Some(current)
    }

    /// Resolve every template inside a value tree
    pub fn process(&self, value: &Value) -> ConfigResult<Value> {
        Resolver::new(self).process_at(value, 0, "<value>")
    }

    /// Resolve the templates of a single string
    pub fn process_str(&self, s: &str) -> ConfigResult<String> {
        match Resolver::new(self).process_string(s, 0)? {
            Value::String(out) => Ok(out),
            other => Ok(stringify(&other)),
        }
    }

    fn lookup<'a>(&'a self, path: &[Segment]) -> ConfigResult<Lookup<'a>> {
        let Some((Segment::Key(first), rest)) = path.split_first() else {
            return Err(ConfigError::UndefinedReference(path_to_string(path)));
        };

        let Some(mut current) = self.root.as_mapping().and_then(|m| m.get(first.as_str())) else {
            if first == "env" {
                return Ok(env_lookup(rest));
            }
            return Err(ConfigError::UndefinedReference(path_to_string(path)));
        };

        for segment in rest {
            let next = match (segment, current) {
                (Segment::Key(key), Value::Mapping(map)) => map.get(key.as_str()),
                (Segment::Index(i), Value::Sequence(seq)) => seq.get(*i),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Ok(Lookup::Undefined),
            }
        }

        Ok(Lookup::Found(current))
    }
}

/// One read of the store; references resolved during it are reused
struct Resolver<'a> {
    store: &'a ConfigStore,
    resolved: HashMap<String, Value>,
}

impl<'a> Resolver<'a> {
    fn new(store: &'a ConfigStore) -> Self {
        Resolver {
            store,
            resolved: HashMap::new(),
        }
    }

    fn process_at(&mut self, value: &Value, depth: usize, origin: &str) -> ConfigResult<Value> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(ConfigError::TemplateDepth(origin.to_string()));
        }

        match value {
            Value::String(s) => self.process_string(s, depth),
            Value::Sequence(seq) => seq
                .iter()
                .map(|item| self.process_at(item, depth, origin))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut out = Mapping::new();
                for (k, v) in map {
                    // keys name destinations in `files: {dest: src}`
                    let key = match k {
                        Value::String(s) => {
                            Value::String(stringify(&self.process_string(s, depth)?))
                        }
                        other => other.clone(),
                    };
                    out.insert(key, self.process_at(v, depth, origin)?);
                }
                Ok(Value::Mapping(out))
            }
            Value::Tagged(tagged) => self.process_at(&tagged.value, depth, origin),
            other => Ok(other.clone()),
        }
    }

    fn process_string(&mut self, s: &str, depth: usize) -> ConfigResult<Value> {
        if !Template::is_template(s) {
            return Ok(Value::String(s.to_string()));
        }
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(ConfigError::TemplateDepth(s.to_string()));
        }

        let template = Template::parse(s)?;

        if let Some(path) = template.as_single_path() {
            return self.eval_path(path, depth);
        }

        let mut out = String::new();
        for part in &template.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Expr(expr) => out.push_str(&stringify(&self.eval(expr, depth)?)),
            }
        }
        Ok(Value::String(out))
    }

    fn eval(&mut self, expr: &Expr, depth: usize) -> ConfigResult<Value> {
        match expr {
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Path(path) => self.eval_path(path, depth),
            Expr::Concat(terms) => {
                let mut out = String::new();
                for term in terms {
                    out.push_str(&stringify(&self.eval(term, depth)?));
                }
                Ok(Value::String(out))
            }
        }
    }

    fn eval_path(&mut self, path: &[Segment], depth: usize) -> ConfigResult<Value> {
        let name = path_to_string(path);
        if let Some(value) = self.resolved.get(&name) {
            return Ok(value.clone());
        }
        let store = self.store;
        match store.lookup(path)? {
            Lookup::Found(value) => {
                let value = self.process_at(value, depth + 1, &name)?;
                self.resolved.insert(name, value.clone());
                Ok(value)
            }
            Lookup::Owned(value) => Ok(value),
            Lookup::Undefined => Ok(Value::String(UNDEFINED.to_string())),
        }
    }
}

enum Lookup<'a> {
    Found(&'a Value),
    Owned(Value),
    Undefined,
}

fn env_lookup(rest: &[Segment]) -> Lookup<'static> {
    match rest {
        [Segment::Key(name)] => match env::var(name) {
            Ok(value) => Lookup::Owned(Value::String(value)),
            Err(_) => Lookup::Undefined,
        },
        _ => Lookup::Undefined,
    }
}

/// Convert a resolved value to the text used inside larger strings
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(seq) => seq.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Mapping(_) => "[object Object]".to_string(),
        Value::Tagged(tagged) => stringify(&tagged.value),
    }
}

//! Buildfile parsing and discovery

use crate::config::store::ConfigStore;
use crate::config::types::Buildfile;
use crate::error::{BriskError, ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default buildfile names to search for
const BUILDFILE_NAMES: &[&str] = &["brisk.yml", "brisk.yaml"];

/// Metadata document used when the buildfile does not name one
const DEFAULT_PACKAGE: &str = "package.json";

/// A parsed buildfile together with its template store
#[derive(Debug, Clone)]
pub struct Project {
    /// Buildfile path
    pub path: Option<PathBuf>,

    /// Directory all patterns are relative to
    pub root_dir: PathBuf,

    /// Typed view of the buildfile
    pub buildfile: Buildfile,

    /// Template-aware view of the whole document
    pub store: ConfigStore,

    /// Non-fatal problems found while loading (missing metadata, bad .env)
    pub warnings: Vec<String>,
}

/// Find the buildfile by searching current and parent directories
pub fn find_buildfile() -> ConfigResult<PathBuf> {
    find_buildfile_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the buildfile starting from a specific directory
pub fn find_buildfile_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in BUILDFILE_NAMES {
            let path = current_dir.join(file_name);
            searched_paths.push(path.display().to_string());

            if path.is_file() {
                return Ok(path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a buildfile document into its typed form and its raw value
pub fn parse_buildfile(yaml: &str) -> Result<(Buildfile, Value), BriskError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let value = match value {
        Value::Null => Value::Mapping(Mapping::new()),
        Value::Mapping(_) => value,
        _ => {
            return Err(ConfigError::Invalid("buildfile must be a mapping".to_string()).into())
        }
    };
    let buildfile: Buildfile = serde_yaml::from_value(value.clone())?;
    Ok((buildfile, value))
}

/// Load a buildfile from disk, along with its package metadata and `.env`
pub fn load_project(path: &Path) -> Result<Project, BriskError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e)))?;

    let root_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut project = load_project_from_str(&contents, &root_dir)?;
    project.path = Some(path.to_path_buf());
    Ok(project)
}

/// Build a project from buildfile text rooted at `root_dir`
pub fn load_project_from_str(yaml: &str, root_dir: &Path) -> Result<Project, BriskError> {
    let (buildfile, value) = parse_buildfile(yaml)?;
    let mut warnings = Vec::new();

    let env_file = root_dir.join(".env");
    if env_file.is_file() {
        if let Err(e) = dotenvy::from_path(&env_file) {
            warnings.push(format!("Failed to load {}: {}", env_file.display(), e));
        }
    }

    let pkg = load_package(root_dir, buildfile.package.as_deref(), &mut warnings);
    let store = ConfigStore::with_package(value, pkg);

    Ok(Project {
        path: None,
        root_dir: root_dir.to_path_buf(),
        buildfile,
        store,
        warnings,
    })
}

/// Read the package metadata document.
///
/// A missing or malformed document never fails the build: templates that
/// reference its fields render `undefined` instead.
fn load_package(root_dir: &Path, name: Option<&str>, warnings: &mut Vec<String>) -> Value {
    let explicit = name.is_some();
    let path = root_dir.join(name.unwrap_or(DEFAULT_PACKAGE));
    let empty = Value::Mapping(Mapping::new());

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            if explicit {
                warnings.push(format!("Failed to read {}: {}", path.display(), e));
            }
            return empty;
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(json) => json,
        Err(e) => {
            warnings.push(format!("Failed to parse {}: {}", path.display(), e));
            return empty;
        }
    };

    match serde_yaml::to_value(&json) {
        Ok(value) => value,
        Err(e) => {
            warnings.push(format!("Failed to convert {}: {}", path.display(), e));
            empty
        }
    }
}

/// Load the buildfile with automatic discovery
pub fn load_project_auto() -> Result<Project, BriskError> {
    let path = find_buildfile()?;
    load_project(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_buildfile() {
        let yaml = r#"
tasks:
  concat:
    targets:
      js: {src: a.js, dest: b.js}
"#;
        let (buildfile, value) = parse_buildfile(yaml).unwrap();
        assert_eq!(buildfile.tasks.len(), 1);
        assert!(value.get("tasks").is_some());
    }

    #[test]
    fn test_parse_empty_buildfile() {
        let (buildfile, _) = parse_buildfile("").unwrap();
        assert!(buildfile.tasks.is_empty());
    }

    #[test]
    fn test_parse_rejects_scalars() {
        assert!(parse_buildfile("just text").is_err());
    }

    #[test]
    fn test_find_buildfile_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("brisk.yml");
        fs::write(&path, "tasks: {}").unwrap();

        let found = find_buildfile_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_find_buildfile_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("brisk.yaml");
        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();
        fs::write(&path, "tasks: {}").unwrap();

        let found = find_buildfile_from(sub_dir).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_buildfile_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_buildfile_from(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_package_metadata_is_exposed_as_pkg() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("bower.json"),
            r#"{"name": "cf-demo", "version": "1.2.0", "author": {"name": "CFPB"}}"#,
        )
        .unwrap();
        let path = temp_dir.path().join("brisk.yml");
        fs::write(
            &path,
            r#"
package: bower.json
banner: "<%= pkg.name %> v<%= pkg.version %> by <%= pkg.author.name %>"
"#,
        )
        .unwrap();

        let project = load_project(&path).unwrap();
        assert!(project.warnings.is_empty());
        assert_eq!(project.root_dir, temp_dir.path());
        assert_eq!(
            project.store.get("banner").unwrap(),
            Value::String("cf-demo v1.2.0 by CFPB".to_string())
        );
    }

    #[test]
    fn test_missing_package_metadata_warns() {
        let temp_dir = TempDir::new().unwrap();
        let project = load_project_from_str(
            "package: bower.json\nbanner: \"<%= pkg.name %>\"",
            temp_dir.path(),
        )
        .unwrap();
        assert_eq!(project.warnings.len(), 1);
        assert_eq!(
            project.store.get("banner").unwrap(),
            Value::String("undefined".to_string())
        );
    }

    #[test]
    fn test_malformed_package_metadata_warns() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{ not json").unwrap();
        let project = load_project_from_str("tasks: {}", temp_dir.path()).unwrap();
        assert_eq!(project.warnings.len(), 1);
    }

    #[test]
    fn test_default_package_is_optional() {
        let temp_dir = TempDir::new().unwrap();
        let project = load_project_from_str("tasks: {}", temp_dir.path()).unwrap();
        assert!(project.warnings.is_empty());
    }
}

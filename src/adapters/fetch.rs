//! Import already-downloaded front-end components
//!
//! Components live under `componentsDir`, one directory each. A component's
//! `bower.json` (or `.bower.json`) `main` entry names the files to import;
//! without one, every file of the component is imported. Files are routed by
//! type through `layout`, or land in `targetDir/<component>`.

use crate::adapters::{normalize_path, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Fetch;

const DEFAULT_COMPONENTS_DIR: &str = "bower_components";
const DEFAULT_TARGET_DIR: &str = "lib";
const MANIFESTS: &[&str] = &["bower.json", ".bower.json"];

/// Where each component file goes
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// `targetDir/<component>`
    ByComponent,
    /// `targetDir/<type>/<component>`
    ByType,
    /// Listed types go to a directory relative to `targetDir`, others by component
    Mapped(BTreeMap<String, String>),
}

impl Layout {
    fn from_target(target: &TargetConfig) -> AdapterResult<Self> {
        let invalid = || AdapterError::InvalidOption {
            name: "layout".to_string(),
            error: "expected byComponent, byType or a mapping of file types to directories"
                .to_string(),
        };
        match target.option("layout") {
            None => Ok(Layout::ByComponent),
            Some(Value::String(s)) if s == "byComponent" => Ok(Layout::ByComponent),
            Some(Value::String(s)) if s == "byType" => Ok(Layout::ByType),
            Some(Value::Mapping(map)) => {
                let mut types = BTreeMap::new();
                for (key, value) in map {
                    match (key.as_str(), value.as_str()) {
                        (Some(k), Some(v)) => {
                            types.insert(k.to_string(), v.to_string());
                        }
                        _ => return Err(invalid()),
                    }
                }
                Ok(Layout::Mapped(types))
            }
            Some(_) => Err(invalid()),
        }
    }

    /// Directory, relative to `targetDir`, for a file of `file_type`
    fn directory(&self, file_type: &str, component: &str) -> PathBuf {
        match self {
            Layout::ByComponent => PathBuf::from(component),
            Layout::ByType => Path::new(file_type).join(component),
            Layout::Mapped(types) => match types.get(file_type) {
                Some(dir) => PathBuf::from(dir),
                None => PathBuf::from(component),
            },
        }
    }
}

impl Adapter for Fetch {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Fetch
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, _files: &[FilePair]) -> AdapterResult<()> {
        if target.bool_option("install", false)? {
            return Err(AdapterError::Unsupported(
                "installing components is not supported; download them first and set install: false"
                    .to_string(),
            ));
        }

        let components_dir = ctx.base_dir.join(
            target
                .str_option("componentsDir")?
                .unwrap_or_else(|| DEFAULT_COMPONENTS_DIR.to_string()),
        );
        let target_dir = ctx.base_dir.join(
            target
                .str_option("targetDir")?
                .unwrap_or_else(|| DEFAULT_TARGET_DIR.to_string()),
        );
        let layout = Layout::from_target(target)?;
        let verbose = target.bool_option("verbose", false)?;

        if target.bool_option("cleanTargetDir", false)? && target_dir.is_dir() {
            fs::remove_dir_all(&target_dir).map_err(|e| AdapterError::write(&target_dir, e))?;
            ctx.print_debug(&format!("Cleaned {}", ctx.display_path(&target_dir)));
        }

        if !components_dir.is_dir() {
            ctx.print_warn(&format!(
                "Components directory \"{}\" not found.",
                ctx.display_path(&components_dir)
            ));
            return Ok(());
        }

        let mut imported = 0;
        for component in list_dirs(&components_dir)? {
            let name = component
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            for (file, rel) in component_files(&component)? {
                let file_name = match rel.file_name() {
                    Some(file_name) => PathBuf::from(file_name),
                    None => continue,
                };
                let file_type = file_type(&rel);
                let routed = layout.directory(file_type, &name);
                // files routed by type are flattened
                let dest = if routed == Path::new(&name) {
                    normalize_path(&target_dir.join(routed).join(&rel))
                } else {
                    normalize_path(&target_dir.join(routed).join(file_name))
                };

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| AdapterError::write(parent, e))?;
                }
                fs::copy(&file, &dest).map_err(|e| AdapterError::write(&dest, e))?;
                imported += 1;

                if verbose {
                    ctx.print_info(&format!(
                        "{} {} -> {}",
                        name,
                        rel.display(),
                        ctx.display_path(&dest)
                    ));
                }
            }
        }

        ctx.print_info(&format!("Imported {} file(s)", imported));
        Ok(())
    }
}

fn list_dirs(dir: &Path) -> AdapterResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| AdapterError::read(dir, e))? {
        let entry = entry.map_err(|e| AdapterError::read(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Files to import from a component, with their paths relative to it
fn component_files(component: &Path) -> AdapterResult<Vec<(PathBuf, PathBuf)>> {
    if let Some(main) = manifest_main(component)? {
        return Ok(main
            .into_iter()
            .map(|rel| (component.join(&rel), rel))
            .filter(|(file, _)| file.is_file())
            .collect());
    }

    let mut files = Vec::new();
    collect_files(component, component, &mut files)?;
    files.sort();
    Ok(files)
}

/// The `main` entry of the component manifest, if any
fn manifest_main(component: &Path) -> AdapterResult<Option<Vec<PathBuf>>> {
    for name in MANIFESTS {
        let path = component.join(name);
        if !path.is_file() {
            continue;
        }
        let contents = fs::read_to_string(&path).map_err(|e| AdapterError::read(&path, e))?;
        let manifest: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| AdapterError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let main = match manifest.get("main") {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => continue,
        };
        return Ok(Some(
            main.iter()
                .map(|m| PathBuf::from(m.trim_start_matches("./")))
                .collect(),
        ));
    }
    Ok(None)
}

fn collect_files(
    root: &Path,
    dir: &Path,
    files: &mut Vec<(PathBuf, PathBuf)>,
) -> AdapterResult<()> {
    for entry in fs::read_dir(dir).map_err(|e| AdapterError::read(dir, e))? {
        let entry = entry.map_err(|e| AdapterError::read(dir, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_files(root, &path, files)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            if !MANIFESTS.iter().any(|m| rel == Path::new(m)) {
                files.push((path.clone(), rel.to_path_buf()));
            }
        }
    }
    Ok(())
}

/// File type used by `layout`, from the extension (and `fonts/` for svg)
pub fn file_type(rel: &Path) -> &'static str {
    let ext = rel
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let in_fonts = rel.components().any(|c| c.as_os_str() == "fonts");
    match ext.as_str() {
        "svg" if in_fonts => "fonts",
        "eot" | "ttf" | "woff" | "woff2" | "otf" => "fonts",
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" => "img",
        "js" => "js",
        "css" => "css",
        "less" => "less",
        "scss" | "sass" => "scss",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Verbosity;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn target(yaml: &str) -> TargetConfig {
        let data: Value = serde_yaml::from_str(yaml).unwrap();
        TargetConfig::from_value("bower", "cf", &Value::Null, &data).unwrap()
    }

    fn ctx(root: &Path) -> Context {
        Context::new()
            .with_base_dir(root.to_path_buf())
            .with_verbosity(Verbosity::Silent)
    }

    #[test]
    fn test_file_types() {
        assert_eq!(file_type(Path::new("img/logo.png")), "img");
        assert_eq!(file_type(Path::new("fonts/icons.svg")), "fonts");
        assert_eq!(file_type(Path::new("icons.svg")), "img");
        assert_eq!(file_type(Path::new("a.WOFF")), "fonts");
        assert_eq!(file_type(Path::new("cf.less")), "less");
        assert_eq!(file_type(Path::new("README.md")), "other");
    }

    #[test]
    fn test_import_with_mapped_layout() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("bower_components");
        touch(
            &components,
            "cf-icons/bower.json",
            r#"{"main": ["src/cf-icons.less", "src/fonts/cf-icons.woff", "./img/arrow.png"]}"#,
        );
        touch(&components, "cf-icons/src/cf-icons.less", ".cf-icon {}");
        touch(&components, "cf-icons/src/fonts/cf-icons.woff", "woff");
        touch(&components, "cf-icons/img/arrow.png", "png");
        touch(&components, "cf-icons/README.md", "not main");
        touch(&components, "jquery/jquery.js", "jq");
        touch(&components, "jquery/.hidden", "x");

        let target = target(
            r#"
options:
  targetDir: src/vendor/
  layout: {img: ../static/img, fonts: ../static/fonts}
"#,
        );
        Fetch.apply(&ctx(root.path()), &target, &[]).unwrap();

        let src = root.path().join("src");
        assert!(src.join("vendor/cf-icons/src/cf-icons.less").is_file());
        assert!(src.join("static/fonts/cf-icons.woff").is_file());
        assert!(src.join("static/img/arrow.png").is_file());
        assert!(!src.join("vendor/cf-icons/README.md").exists());
        assert!(src.join("vendor/jquery/jquery.js").is_file());
        assert!(!src.join("vendor/jquery/.hidden").exists());
    }

    #[test]
    fn test_by_type_layout() {
        let root = TempDir::new().unwrap();
        touch(&root.path().join("bower_components"), "box/box.css", "b{}");

        let target = target("{options: {targetDir: lib, layout: byType}}");
        Fetch.apply(&ctx(root.path()), &target, &[]).unwrap();
        assert!(root.path().join("lib/css/box/box.css").is_file());
    }

    #[test]
    fn test_clean_target_dir() {
        let root = TempDir::new().unwrap();
        touch(root.path(), "lib/stale.txt", "old");
        touch(&root.path().join("bower_components"), "a/a.js", "a");

        let target = target("{options: {targetDir: lib, cleanTargetDir: true}}");
        Fetch.apply(&ctx(root.path()), &target, &[]).unwrap();
        assert!(!root.path().join("lib/stale.txt").exists());
        assert!(root.path().join("lib/a/a.js").is_file());
    }

    #[test]
    fn test_install_is_unsupported() {
        let root = TempDir::new().unwrap();
        let target = target("{options: {install: true}}");
        assert!(matches!(
            Fetch.apply(&ctx(root.path()), &target, &[]),
            Err(AdapterError::Unsupported(_))
        ));
    }
}

//! Delete matched files and directories

use crate::adapters::{normalize_path, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use std::fs;

pub struct Clean;

impl Adapter for Clean {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Clean
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let force = target.bool_option("force", false)?;
        let root = normalize_path(&ctx.base_dir);

        let mut deleted = 0;
        for pair in files {
            for path in &pair.src {
                if !path.exists() {
                    continue;
                }
                let normalized = normalize_path(path);
                if !force && (!normalized.starts_with(&root) || normalized == root) {
                    return Err(AdapterError::OutsideProject(path.clone()));
                }

                if path.is_dir() {
                    fs::remove_dir_all(path).map_err(|e| AdapterError::write(path, e))?;
                } else {
                    fs::remove_file(path).map_err(|e| AdapterError::write(path, e))?;
                }
                ctx.print_debug(&format!("Deleted {}", ctx.display_path(path)));
                deleted += 1;
            }
        }

        ctx.print_info(&format!("{} path(s) deleted", deleted));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{expand_mappings, Verbosity};
    use serde_yaml::Value;
    use std::path::Path;
    use tempfile::TempDir;

    fn target(yaml: &str) -> TargetConfig {
        let data: Value = serde_yaml::from_str(yaml).unwrap();
        TargetConfig::from_value("cleanup", "ie", &Value::Null, &data).unwrap()
    }

    fn ctx(root: &Path) -> Context {
        Context::new()
            .with_base_dir(root.to_path_buf())
            .with_verbosity(Verbosity::Silent)
    }

    #[test]
    fn test_clean_deletes_matches() {
        let root = TempDir::new().unwrap();
        let icons = root.path().join("_includes/identity/icons");
        fs::create_dir_all(&icons).unwrap();
        fs::write(icons.join("main.html"), "keep").unwrap();
        fs::write(icons.join("main.ie.html"), "drop").unwrap();

        let target = target("['_includes/**/main.ie.html']");
        let ctx = ctx(root.path());
        let files = expand_mappings(&ctx, &target.mappings).unwrap();
        Clean.apply(&ctx, &target, &files).unwrap();

        assert!(icons.join("main.html").exists());
        assert!(!icons.join("main.ie.html").exists());
    }

    #[test]
    fn test_clean_refuses_outside_project() {
        let outer = TempDir::new().unwrap();
        let project = outer.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(outer.path().join("precious.txt"), "x").unwrap();

        let ctx = ctx(&project);
        let pair = FilePair {
            src: vec![project.join("../precious.txt")],
            dest: None,
            dest_is_dir: false,
        };

        let result = Clean.apply(&ctx, &target("{}"), &[pair.clone()]);
        assert!(matches!(result, Err(AdapterError::OutsideProject(_))));
        assert!(outer.path().join("precious.txt").exists());

        Clean
            .apply(&ctx, &target("{options: {force: true}}"), &[pair])
            .unwrap();
        assert!(!outer.path().join("precious.txt").exists());
    }
}

//! Copy files and create matched directories

use crate::adapters::{Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use std::fs;
use std::path::Path;

pub struct CopyFiles;

impl Adapter for CopyFiles {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Copy
    }

    fn apply(&self, ctx: &Context, _target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let mut copied = 0;
        let mut created = 0;

        for pair in files {
            let dest = pair
                .dest
                .as_ref()
                .ok_or_else(|| AdapterError::MissingOption("dest".to_string()))?;

            let sources: Vec<_> = pair.src.iter().filter(|p| p.exists()).collect();
            if sources.len() > 1 && !pair.dest_is_dir {
                return Err(AdapterError::Unsupported(format!(
                    "cannot copy {} sources onto the single file \"{}\" (end dest with '/' for a directory)",
                    sources.len(),
                    ctx.display_path(dest)
                )));
            }

            for src in sources {
                let out = if pair.dest_is_dir {
                    match src.file_name() {
                        Some(name) => dest.join(name),
                        None => dest.clone(),
                    }
                } else {
                    dest.clone()
                };

                if src.is_dir() {
                    fs::create_dir_all(&out).map_err(|e| AdapterError::write(&out, e))?;
                    created += 1;
                } else {
                    copy_file(src, &out)?;
                    ctx.print_debug(&format!(
                        "Copying {} -> {}",
                        ctx.display_path(src),
                        ctx.display_path(&out)
                    ));
                    copied += 1;
                }
            }
        }

        let dirs = if created > 0 {
            format!("Created {} directories, copied ", created)
        } else {
            "Copied ".to_string()
        };
        ctx.print_info(&format!("{}{} file(s)", dirs, copied));
        Ok(())
    }
}

fn copy_file(src: &Path, dest: &Path) -> AdapterResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| AdapterError::write(parent, e))?;
    }
    fs::copy(src, dest).map_err(|e| AdapterError::write(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{expand_mappings, Verbosity};
    use serde_yaml::Value;
    use tempfile::TempDir;

    fn run(root: &TempDir, target_yaml: &str) -> AdapterResult<()> {
        let data: Value = serde_yaml::from_str(target_yaml).unwrap();
        let target = TargetConfig::from_value("copy", "main", &Value::Null, &data).unwrap();
        let ctx = Context::new()
            .with_base_dir(root.path().to_path_buf())
            .with_verbosity(Verbosity::Silent);
        let files = expand_mappings(&ctx, &target.mappings)?;
        CopyFiles.apply(&ctx, &target, &files)
    }

    fn touch(root: &TempDir, rel: &str, contents: &str) {
        let path = root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_expanded_tree() {
        let root = TempDir::new().unwrap();
        touch(&root, "src/index.html", "<p>hi</p>");
        touch(&root, "src/static/img/logo.png", "png");
        touch(&root, "src/static/img/icons/a.svg", "svg");

        run(
            &root,
            r#"
files:
  - {expand: true, cwd: src, src: ['*.html'], dest: dist}
  - {expand: true, cwd: src/static, src: ['img/**/*'], dest: dist/static}
"#,
        )
        .unwrap();

        let dist = root.path().join("dist");
        assert_eq!(fs::read_to_string(dist.join("index.html")).unwrap(), "<p>hi</p>");
        assert!(dist.join("static/img/logo.png").is_file());
        assert!(dist.join("static/img/icons").is_dir());
        assert_eq!(fs::read_to_string(dist.join("static/img/icons/a.svg")).unwrap(), "svg");
    }

    #[test]
    fn test_copy_into_directory_dest() {
        let root = TempDir::new().unwrap();
        touch(&root, "a.txt", "a");
        touch(&root, "b.txt", "b");

        run(&root, "{src: ['*.txt'], dest: out/}").unwrap();
        assert!(root.path().join("out/a.txt").is_file());
        assert!(root.path().join("out/b.txt").is_file());
    }

    #[test]
    fn test_copy_many_onto_one_file_fails() {
        let root = TempDir::new().unwrap();
        touch(&root, "a.txt", "a");
        touch(&root, "b.txt", "b");

        let result = run(&root, "{src: ['*.txt'], dest: out.txt}");
        assert!(matches!(result, Err(AdapterError::Unsupported(_))));
    }

    #[test]
    fn test_copy_single_file_rename() {
        let root = TempDir::new().unwrap();
        touch(&root, "vendor/shiv.min.js", "shiv");

        run(&root, "{files: {static/js/shiv.js: vendor/shiv.min.js}}").unwrap();
        assert_eq!(
            fs::read_to_string(root.path().join("static/js/shiv.js")).unwrap(),
            "shiv"
        );
    }
}

//! Insert a banner into existing files
//!
//! Sources are rewritten in place; any destination of the mapping is ignored.

use crate::adapters::{read_text, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};

pub struct Banner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    Bottom,
}

impl Adapter for Banner {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Banner
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let banner = target.str_option("banner")?.unwrap_or_default();
        let linebreak = target.bool_option("linebreak", true)?;
        let position = match target.str_option("position")?.as_deref() {
            None | Some("top") => Position::Top,
            Some("bottom") => Position::Bottom,
            Some(other) => {
                return Err(AdapterError::InvalidOption {
                    name: "position".to_string(),
                    error: format!("expected top or bottom, got '{}'", other),
                })
            }
        };

        for pair in files {
            for src in pair.existing_files() {
                let contents = read_text(src)?;
                let output = add_banner(&contents, &banner, position, linebreak);
                write_text(ctx, src, &output)?;
            }
        }
        Ok(())
    }
}

fn add_banner(contents: &str, banner: &str, position: Position, linebreak: bool) -> String {
    let gap = if linebreak { "\n" } else { "" };
    match position {
        Position::Top => format!("{}{}{}", banner, gap, contents),
        Position::Bottom => format!("{}{}{}", contents, gap, banner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{expand_mappings, Verbosity};
    use serde_yaml::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_banner_positions() {
        assert_eq!(add_banner("x", "/*! b */", Position::Top, true), "/*! b */\nx");
        assert_eq!(add_banner("x", "/*! b */", Position::Bottom, true), "x\n/*! b */");
        assert_eq!(add_banner("x", "/*! b */", Position::Top, false), "/*! b */x");
    }

    #[test]
    fn test_banner_rewrites_matches_in_place() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("static/js")).unwrap();
        fs::write(root.path().join("static/js/main.min.js"), "var a=1;").unwrap();
        fs::write(root.path().join("static/js/main.js"), "var a = 1;").unwrap();

        let data: Value = serde_yaml::from_str(
            "{options: {banner: '/*! demo */'}, files: {src: ['static/js/*.min.js']}}",
        )
        .unwrap();
        let target = TargetConfig::from_value("usebanner", "js", &Value::Null, &data).unwrap();
        let ctx = Context::new()
            .with_base_dir(root.path().to_path_buf())
            .with_verbosity(Verbosity::Silent);
        let files = expand_mappings(&ctx, &target.mappings).unwrap();
        Banner.apply(&ctx, &target, &files).unwrap();

        let min = fs::read_to_string(root.path().join("static/js/main.min.js")).unwrap();
        assert_eq!(min, "/*! demo */\nvar a=1;");
        let plain = fs::read_to_string(root.path().join("static/js/main.js")).unwrap();
        assert_eq!(plain, "var a = 1;");
    }

    #[test]
    fn test_banner_rejects_unknown_position() {
        let data: Value = serde_yaml::from_str("{options: {position: middle}}").unwrap();
        let target = TargetConfig::from_value("usebanner", "js", &Value::Null, &data).unwrap();
        let ctx = Context::new().with_verbosity(Verbosity::Silent);
        assert!(matches!(
            Banner.apply(&ctx, &target, &[]),
            Err(AdapterError::InvalidOption { .. })
        ));
    }
}

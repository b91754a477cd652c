//! Stylesheet compilation with `grass`

use crate::adapters::{output_path, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{expand, Context, FilePair, TargetConfig};
use grass::OutputStyle;
use std::path::PathBuf;

pub struct Stylesheet;

impl Adapter for Stylesheet {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Stylesheet
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let load_paths: Vec<PathBuf> = expand(&ctx.base_dir, &target.list_option("paths")?)?
            .into_iter()
            .map(|rel| ctx.base_dir.join(rel))
            .filter(|path| path.is_dir())
            .collect();
        for path in &load_paths {
            ctx.print_debug(&format!("Load path {}", ctx.display_path(path)));
        }

        let style = if target.bool_option("compress", false)? {
            OutputStyle::Compressed
        } else {
            OutputStyle::Expanded
        };
        let options = grass::Options::default()
            .style(style)
            .load_paths(&load_paths);

        for pair in files {
            let sources: Vec<_> = pair.existing_files().collect();
            if sources.is_empty() {
                return Err(AdapterError::NoInputFiles(pair.label()));
            }

            let mut compiled = Vec::new();
            for src in &sources {
                let css = grass::from_path(src, &options).map_err(|e| AdapterError::Stylesheet {
                    path: src.to_path_buf(),
                    message: e.to_string(),
                })?;
                compiled.push(css);
            }

            let dest = match &pair.dest {
                Some(_) => output_path(pair, sources[0]).to_path_buf(),
                None => sources[0].with_extension("css"),
            };
            write_text(ctx, &dest, &compiled.join("\n"))?;
        }
        Ok(())
    }
}

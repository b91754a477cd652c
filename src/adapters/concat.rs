//! Concatenate sources in order

use crate::adapters::{read_sources, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};

pub struct Concat;

impl Adapter for Concat {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Concat
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let separator = target
            .str_option("separator")?
            .unwrap_or_else(|| "\n".to_string());
        let banner = target.str_option("banner")?.unwrap_or_default();
        let footer = target.str_option("footer")?.unwrap_or_default();

        for pair in files {
            let dest = pair
                .dest
                .as_ref()
                .ok_or_else(|| AdapterError::MissingOption("dest".to_string()))?;

            let sources = read_sources(ctx, pair)?;
            if sources.is_empty() {
                ctx.print_warn(&format!(
                    "No source files for \"{}\"; writing banner and footer only.",
                    ctx.display_path(dest)
                ));
            }

            let output = format!("{}{}{}", banner, sources.join(&separator), footer);
            write_text(ctx, dest, &output)?;
        }
        Ok(())
    }
}

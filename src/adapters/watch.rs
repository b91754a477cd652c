//! Watch targets
//!
//! A watch target holds `files` patterns and the `tasks` to run when a
//! matching file changes. Watching needs a long-lived session, so these
//! targets are only honoured when requested on the command line.

use crate::adapters::{Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};

pub struct Watch;

impl Adapter for Watch {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Watch
    }

    fn apply(&self, _ctx: &Context, target: &TargetConfig, _files: &[FilePair]) -> AdapterResult<()> {
        Err(AdapterError::Unsupported(format!(
            "watch target \"{}\" can only be started from the command line",
            target.id()
        )))
    }
}

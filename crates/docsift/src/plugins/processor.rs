//! Indexing plugin trait.
//!
//! Indexing plugins run after extraction: they may derive sub-documents from
//! the raw page and adjust the finished summary.

use crate::Result;
use crate::plugins::Plugin;
use crate::types::{SubDoc, Summary};
use url::Url;

/// Ordering of indexing plugins within one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessingStage {
    /// Runs first
    Early,

    #[default]
    Middle,

    /// Runs last
    Late,
}

/// Post-extraction capability.
///
/// Errors are logged by the dispatcher and never discard the summary.
pub trait IndexingPlugin: Plugin {
    /// Derive additional documents from the raw page bytes.
    fn process_page(&self, _content: &[u8], _url: &Url) -> Result<Vec<SubDoc>> {
        Ok(Vec::new())
    }

    /// Adjust the summary after `process_page` results have been appended.
    fn process_summary(&self, _summary: &mut Summary, _url: &Url) -> Result<()> {
        Ok(())
    }

    fn processing_stage(&self) -> ProcessingStage {
        ProcessingStage::Middle
    }
}

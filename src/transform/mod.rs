//! The unit of work applied to each item
//!
//! Workers only see the [`Transform`] trait. The production implementation
//! is [`ImageTransform`] (resize, watermark, re-encode); tests plug in
//! closures with controlled timing and failure behavior.

pub mod pipeline;
pub mod watermark;

pub use pipeline::ImageTransform;

use crate::discovery::WorkItem;
use crate::error::TransformResult;

/// A transform applied to one work item
///
/// Implementations must be safe to call from several worker threads at once.
/// A returned error is counted against the item and never aborts the worker.
pub trait Transform: Send + Sync {
    fn apply(&self, item: &WorkItem) -> TransformResult<()>;
}

impl<F> Transform for F
where
    F: Fn(&WorkItem) -> TransformResult<()> + Send + Sync,
{
    fn apply(&self, item: &WorkItem) -> TransformResult<()> {
        self(item)
    }
}

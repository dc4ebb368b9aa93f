use std::path::Path;

use crate::types::{Chunk, Constraints, MetadataMap, Source};

/// The retrieval engine behind a [`crate::db::NeuralDb`] handle.
///
/// Indexing, ranking and the on-disk layout belong to the implementation;
/// the handle only passes data and paths through.
pub trait RetrievalEngine: Send {
    /// Opens the state persisted at `path`, creating it when absent.
    fn open(path: &Path) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Indexes all chunks of one document as a single unit. `metadata` is
    /// index-aligned with `chunks`. On error nothing from the call is kept.
    fn insert(
        &mut self,
        chunks: &[String],
        metadata: &[MetadataMap],
        document: &str,
        doc_id: &str,
        doc_version: Option<u32>,
    ) -> anyhow::Result<()>;

    /// Up to `k` chunks satisfying `constraints`, best first. Never called with `k == 0`.
    fn query(&self, query: &str, k: usize, constraints: &Constraints) -> anyhow::Result<Vec<(Chunk, f32)>>;

    /// Removes a document's chunks; with `keep_latest` only its older versions.
    fn delete(&mut self, doc_id: &str, keep_latest: bool) -> anyhow::Result<()>;

    /// Every stored document version, in no particular order.
    fn sources(&self) -> anyhow::Result<Vec<Source>>;

    fn save(&self, path: &Path) -> anyhow::Result<()>;
}

//! Staging area for one insertion.

use crate::error::{check_index, Result};
use crate::types::{MetadataMap, MetadataValue};

/// Chunks and per-chunk metadata accumulated before a single insert.
///
/// `chunks` and `metadata` always have the same length: adding a chunk adds an
/// empty metadata map at the same index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    chunks: Vec<String>,
    metadata: Vec<MetadataMap>,
    document: String,
    doc_id: String,
    doc_version: Option<u32>,
}

impl Document {
    pub fn new(document: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            doc_id: doc_id.into(),
            ..Self::default()
        }
    }

    pub fn add_chunk(&mut self, text: impl Into<String>) {
        self.chunks.push(text.into());
        self.metadata.push(MetadataMap::new());
    }

    /// Last write wins.
    pub fn set_version(&mut self, version: u32) {
        self.doc_version = Some(version);
    }

    /// Sets `key` on the metadata of chunk `chunk_index`, replacing any previous value.
    pub fn set_metadata(
        &mut self,
        chunk_index: usize,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Result<()> {
        check_index(chunk_index, self.chunks.len())?;
        self.metadata[chunk_index].insert(key.into(), value.into());
        Ok(())
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn metadata(&self) -> &[MetadataMap] {
        &self.metadata
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn version(&self) -> Option<u32> {
        self.doc_version
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

//! ndb-text
//!
//! Tantivy-based chunk index implementing [`RetrievalEngine`]. Tuning is read
//! from the `[engine]` configuration section on open.
pub mod config;
pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use config::EngineConfig;
pub use index::TantivyEngine;

use std::path::Path;

use ndb_core::{Chunk, Constraints, MetadataMap, RetrievalEngine, Source};

impl RetrievalEngine for TantivyEngine {
	fn open(path: &Path) -> anyhow::Result<Self> {
		let config = EngineConfig::load()?;
		TantivyEngine::open_with_config(path, &config)
	}

	fn insert(&mut self, chunks: &[String], metadata: &[MetadataMap], document: &str, doc_id: &str, doc_version: Option<u32>) -> anyhow::Result<()> {
		self.insert_chunks(chunks, metadata, document, doc_id, doc_version)
	}

	fn query(&self, query: &str, k: usize, constraints: &Constraints) -> anyhow::Result<Vec<(Chunk, f32)>> {
		self.search(query, k, constraints)
	}

	fn delete(&mut self, doc_id: &str, keep_latest: bool) -> anyhow::Result<()> {
		self.delete_document(doc_id, keep_latest)
	}

	fn sources(&self) -> anyhow::Result<Vec<Source>> {
		Ok(self.list_sources())
	}

	fn save(&self, path: &Path) -> anyhow::Result<()> {
		self.save_to(path)
	}
}

//! Owning handle over one engine instance.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::traits::RetrievalEngine;
use crate::types::{Constraints, QueryResult, QueryResults, Source};

/// One engine instance bound to the path it was opened at.
///
/// Calls are synchronous and the handle does no locking of its own; sharing it
/// across threads needs external synchronization. Dropping the handle closes
/// the engine.
pub struct NeuralDb<E: RetrievalEngine> {
    engine: E,
    path: PathBuf,
}

impl<E: RetrievalEngine> NeuralDb<E> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let engine = E::open(&path).map_err(|e| Error::Construction(Error::describe(&e)))?;
        info!(path = %path.display(), "opened engine");
        Ok(Self { engine, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Hands every chunk of `doc` to the engine as one unit.
    pub fn insert(&mut self, doc: Document) -> Result<()> {
        debug!(doc_id = doc.doc_id(), chunks = doc.len(), version = ?doc.version(), "inserting document");
        self.engine
            .insert(doc.chunks(), doc.metadata(), doc.document(), doc.doc_id(), doc.version())
            .map_err(|e| Error::Insert(Error::describe(&e)))
    }

    pub fn query(&self, text: &str, top_k: usize) -> Result<QueryResults> {
        self.query_with_constraints(text, top_k, &Constraints::new())
    }

    /// Like [`NeuralDb::query`], keeping only chunks whose metadata satisfies every constraint.
    pub fn query_with_constraints(
        &self,
        text: &str,
        top_k: usize,
        constraints: &Constraints,
    ) -> Result<QueryResults> {
        if top_k == 0 {
            return Ok(QueryResults::default());
        }
        let hits = self
            .engine
            .query(text, top_k, constraints)
            .map_err(|e| Error::Query(Error::describe(&e)))?;

        if let Some((chunk, score)) = hits.iter().find(|(_, score)| !score.is_finite()) {
            return Err(Error::Query(format!("engine returned score {score} for chunk {}", chunk.id)));
        }
        let mut results: Vec<QueryResult> = hits
            .into_iter()
            .map(|(chunk, score)| QueryResult { chunk, score })
            .collect();
        // Stable, so the engine's order among equal scores survives.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!(query = text, top_k, hits = results.len(), "query answered");
        Ok(results.into())
    }

    pub fn delete(&mut self, doc_id: &str, keep_latest: bool) -> Result<()> {
        self.engine
            .delete(doc_id, keep_latest)
            .map_err(|e| Error::Delete(Error::describe(&e)))?;
        info!(doc_id, keep_latest, "deleted document");
        Ok(())
    }

    /// Stored document versions, sorted by document name, then doc id, then version.
    pub fn sources(&self) -> Result<Vec<Source>> {
        let mut sources = self.engine.sources().map_err(|e| Error::Sources(Error::describe(&e)))?;
        sources.sort();
        debug!(sources = sources.len(), "listed sources");
        Ok(sources)
    }

    /// Persists current state to `path`, which may differ from the open path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.engine
            .save(path)
            .map_err(|e| Error::Save(Error::describe(&e)))?;
        info!(path = %path.display(), "saved engine state");
        Ok(())
    }

    pub fn close(self) {
        info!(path = %self.path.display(), "closing engine");
    }
}

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::TantivyDocument;
use tracing::debug;

use ndb_core::types::satisfies;
use ndb_core::{Chunk, Constraints};

use crate::index::TantivyEngine;

impl TantivyEngine {
	/// BM25-ranked chunks for `query_text`, best first.
	///
	/// The query is parsed leniently, so operator syntax in caller text never
	/// fails a query. With constraints every live chunk is a candidate and the
	/// first `limit` that pass are kept.
	pub fn search(&self, query_text: &str, limit: usize, constraints: &Constraints) -> Result<Vec<(Chunk, f32)>> {
		self.refresh_reader()?;
		let searcher = self.reader.searcher();
		let live_docs = searcher.num_docs();
		if limit == 0 || live_docs == 0 {
			return Ok(Vec::new());
		}

		let query_parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
		let (query, parse_errors) = query_parser.parse_query_lenient(query_text);
		if !parse_errors.is_empty() {
			debug!(query = query_text, errors = parse_errors.len(), "ignored unparsable query fragments");
		}

		let candidates = if constraints.is_empty() { limit } else { usize::try_from(live_docs)? };
		let top_docs = searcher.search(&query, &TopDocs::with_limit(candidates))?;
		let mut hits = Vec::with_capacity(limit.min(top_docs.len()));
		for (score, doc_address) in top_docs {
			let doc: TantivyDocument = searcher.doc(doc_address)?;
			let chunk = self.fields.decode(&doc)?;
			if !satisfies(&chunk.metadata, constraints) {
				continue;
			}
			hits.push((chunk, score));
			if hits.len() == limit {
				break;
			}
		}
		Ok(hits)
	}
}

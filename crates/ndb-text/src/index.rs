use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tantivy::directory::MmapDirectory;
use tantivy::indexer::NoMergePolicy;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tracing::{debug, info, warn};

use ndb_core::{MetadataMap, Source};

use crate::config::EngineConfig;
use crate::tantivy_utils::{build_schema, doc_key, register_tokenizer, ChunkFields};

/// Engine bookkeeping, committed as the tantivy commit payload so it can never
/// disagree with the segments it describes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
	next_chunk_id: u64,
	/// doc id -> version -> display name
	versions: BTreeMap<String, BTreeMap<u32, String>>,
}

impl Manifest {
	fn load(index: &Index) -> Result<Self> {
		match index.load_metas()?.payload {
			Some(payload) => serde_json::from_str(&payload).context("index manifest is corrupt"),
			None => Ok(Self::default()),
		}
	}

	fn latest_version(&self, doc_id: &str) -> Option<u32> {
		self.versions.get(doc_id).and_then(|v| v.keys().next_back().copied())
	}

	fn resolve_version(&self, doc_id: &str, requested: Option<u32>) -> Result<u32> {
		match requested {
			Some(v) if self.versions.get(doc_id).is_some_and(|known| known.contains_key(&v)) => {
				bail!("document '{doc_id}' already has version {v}")
			}
			Some(v) => Ok(v),
			None => match self.latest_version(doc_id) {
				None => Ok(1),
				Some(latest) => latest.checked_add(1).with_context(|| format!("document '{doc_id}' has no versions left")),
			},
		}
	}

	fn sources(&self) -> Vec<Source> {
		self.versions
			.iter()
			.flat_map(|(doc_id, known)| {
				known.iter().map(move |(version, document)| Source { document: document.clone(), doc_id: doc_id.clone(), doc_version: *version })
			})
			.collect()
	}
}

/// On-disk chunk index backed by tantivy.
///
/// Every mutation is committed before it returns, so the directory always
/// holds the last successful insert or delete.
pub struct TantivyEngine {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	pub(crate) fields: ChunkFields,
	writer: IndexWriter,
	manifest: Manifest,
	path: PathBuf,
	/// Set when the reader could not be refreshed after a commit.
	reload_pending: AtomicBool,
}

impl TantivyEngine {
	pub fn open_with_config(path: &Path, config: &EngineConfig) -> Result<Self> {
		config.validate()?;
		fs::create_dir_all(path).with_context(|| format!("failed to create index directory {}", path.display()))?;
		let directory = MmapDirectory::open(path).with_context(|| format!("failed to open index directory {}", path.display()))?;
		let index = Index::open_or_create(directory, build_schema()).with_context(|| format!("failed to load index at {}", path.display()))?;
		register_tokenizer(&index, &config.stop_words);
		let fields = ChunkFields::resolve(&index.schema())?;
		let writer: IndexWriter = index.writer_with_num_threads(config.writer_threads, config.writer_memory_bytes).context("failed to acquire index writer")?;
		writer.set_merge_policy(Box::new(NoMergePolicy));
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().context("failed to open index reader")?;
		let manifest = Manifest::load(&index)?;
		info!(path = %path.display(), documents = manifest.versions.len(), next_chunk_id = manifest.next_chunk_id, "opened tantivy engine");
		Ok(Self { index, reader, fields, writer, manifest, path: path.to_path_buf(), reload_pending: AtomicBool::new(false) })
	}

	pub fn versions_of(&self, doc_id: &str) -> Vec<u32> {
		self.manifest.versions.get(doc_id).map(|v| v.keys().copied().collect()).unwrap_or_default()
	}

	pub(crate) fn list_sources(&self) -> Vec<Source> {
		self.manifest.sources()
	}

	/// Brings the reader up to the last commit if a refresh after it failed.
	pub(crate) fn refresh_reader(&self) -> Result<()> {
		if self.reload_pending.swap(false, Ordering::AcqRel) {
			if let Err(err) = self.reader.reload() {
				self.reload_pending.store(true, Ordering::Release);
				return Err(anyhow::Error::new(err).context("failed to refresh index reader"));
			}
		}
		Ok(())
	}

	pub(crate) fn insert_chunks(&mut self, chunks: &[String], metadata: &[MetadataMap], document: &str, doc_id: &str, doc_version: Option<u32>) -> Result<()> {
		if chunks.len() != metadata.len() {
			bail!("{} chunks but {} metadata maps", chunks.len(), metadata.len());
		}
		let version = self.manifest.resolve_version(doc_id, doc_version)?;

		let mut manifest = self.manifest.clone();
		let first_id = manifest.next_chunk_id;
		let staged = chunks.iter().zip(metadata).enumerate().try_for_each(|(i, (text, meta))| -> Result<()> {
			let doc = self.fields.encode(first_id + i as u64, text, meta, document, doc_id, version)?;
			self.writer.add_document(doc)?;
			Ok(())
		});
		manifest.next_chunk_id = first_id + chunks.len() as u64;
		manifest.versions.entry(doc_id.to_string()).or_default().insert(version, document.to_string());

		self.commit_or_rollback(staged, manifest)?;
		debug!(doc_id, version, chunks = chunks.len(), "committed document");
		Ok(())
	}

	pub(crate) fn delete_document(&mut self, doc_id: &str, keep_latest: bool) -> Result<()> {
		let Some(versions) = self.manifest.versions.get(doc_id) else {
			debug!(doc_id, "delete of unknown document is a no-op");
			return Ok(());
		};
		let mut doomed: Vec<u32> = versions.keys().copied().collect();
		if keep_latest {
			doomed.pop();
		}
		if doomed.is_empty() {
			return Ok(());
		}

		let mut manifest = self.manifest.clone();
		for version in &doomed {
			self.writer.delete_term(Term::from_field_text(self.fields.doc_key, &doc_key(doc_id, *version)));
			if let Some(known) = manifest.versions.get_mut(doc_id) {
				known.remove(version);
			}
		}
		if manifest.versions.get(doc_id).is_some_and(BTreeMap::is_empty) {
			manifest.versions.remove(doc_id);
		}

		self.commit_or_rollback(Ok(()), manifest)?;
		debug!(doc_id, versions = ?doomed, "deleted document versions");
		Ok(())
	}

	/// Copies the committed index to `target`. Saving onto the open path is a
	/// no-op since every mutation is already committed there.
	pub(crate) fn save_to(&self, target: &Path) -> Result<()> {
		fs::create_dir_all(target).with_context(|| format!("failed to create {}", target.display()))?;
		let source = self.path.canonicalize().with_context(|| format!("failed to resolve {}", self.path.display()))?;
		let target = target.canonicalize().with_context(|| format!("failed to resolve {}", target.display()))?;
		if source == target {
			return Ok(());
		}

		let metas = self.index.load_metas()?;
		for segment in &metas.segments {
			for file in segment.list_files() {
				let from = source.join(&file);
				// Not every component is materialized for every segment.
				if !from.exists() {
					continue;
				}
				fs::copy(&from, target.join(&file)).with_context(|| format!("failed to copy {}", from.display()))?;
			}
		}
		// Last, so the target only ever describes segments that are fully copied.
		fs::copy(source.join("meta.json"), target.join("meta.json")).context("failed to copy meta.json")?;
		info!(from = %source.display(), to = %target.display(), segments = metas.segments.len(), "copied index");
		Ok(())
	}

	fn commit_or_rollback(&mut self, staged: Result<()>, manifest: Manifest) -> Result<()> {
		let committed = staged.and_then(|()| {
			let payload = serde_json::to_string(&manifest)?;
			let mut prepared = self.writer.prepare_commit()?;
			prepared.set_payload(&payload);
			prepared.commit()?;
			Ok(())
		});
		if let Err(err) = committed {
			if let Err(rollback_err) = self.writer.rollback() {
				warn!(error = %rollback_err, "rollback after failed commit also failed");
			}
			// A rolled back writer starts over with the default merge policy.
			self.writer.set_merge_policy(Box::new(NoMergePolicy));
			return Err(err.context("changes were rolled back"));
		}
		// Committed from here on; a stale reader must not turn this into a failure.
		self.manifest = manifest;
		if let Err(err) = self.reader.reload() {
			warn!(error = %err, "reader refresh after commit failed, retrying on next query");
			self.reload_pending.store(true, Ordering::Release);
		}
		Ok(())
	}
}

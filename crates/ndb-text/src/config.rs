//! `[engine]` section of the ndb configuration.
use anyhow::ensure;
use serde::{Deserialize, Serialize};

use ndb_core::config::Config;

/// Tantivy refuses writer arenas smaller than this per indexing thread.
pub const MIN_MEMORY_PER_THREAD: usize = 15_000_000;

const DEFAULT_STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	pub writer_memory_bytes: usize,
	pub writer_threads: usize,
	pub stop_words: Vec<String>,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			writer_memory_bytes: 50_000_000,
			writer_threads: 1,
			stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
		}
	}
}

impl EngineConfig {
	pub fn load() -> ndb_core::Result<Self> {
		Config::load()?.get_or_default("engine")
	}

	pub fn validate(&self) -> anyhow::Result<()> {
		ensure!(self.writer_threads >= 1, "engine.writer_threads must be at least 1");
		ensure!(
			self.writer_memory_bytes / self.writer_threads >= MIN_MEMORY_PER_THREAD,
			"engine.writer_memory_bytes must allow {} bytes per writer thread, got {} for {} threads",
			MIN_MEMORY_PER_THREAD,
			self.writer_memory_bytes,
			self.writer_threads
		);
		Ok(())
	}
}

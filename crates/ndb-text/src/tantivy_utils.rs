use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST, INDEXED, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::{doc, Index, TantivyDocument};

use ndb_core::{Chunk, MetadataMap, MetadataValue};

pub const TEXT_TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _chunk_id_field = schema_builder.add_u64_field("chunk_id", INDEXED | STORED | FAST);
	let _doc_id_field = schema_builder.add_text_field("doc_id", STRING | STORED);
	let _doc_key_field = schema_builder.add_text_field("doc_key", STRING);
	let _document_field = schema_builder.add_text_field("document", STORED);
	let _doc_version_field = schema_builder.add_u64_field("doc_version", STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TEXT_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	let _text_field = schema_builder.add_text_field("text", text_options);
	let _metadata_field = schema_builder.add_text_field("metadata", STORED);
	schema_builder.build()
}

/// Tokenizers are not persisted with the index, so this runs on every open.
pub fn register_tokenizer(index: &Index, stop_words: &[String]) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.iter().cloned()))
		.build();
	index.tokenizers().register(TEXT_TOKENIZER, tokenizer);
}

/// Raw term identifying one version of one document, used for deletes.
pub fn doc_key(doc_id: &str, version: u32) -> String {
	format!("{doc_id}\u{1f}{version}")
}

/// Stored form of a metadata value. Floats are kept as their IEEE-754 bits
/// so NaN and the infinities survive the JSON column.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum StoredValue {
	Bool(bool),
	Int(i64),
	Float(u64),
	Str(String),
}

impl From<&MetadataValue> for StoredValue {
	fn from(value: &MetadataValue) -> Self {
		match value {
			MetadataValue::Bool(v) => StoredValue::Bool(*v),
			MetadataValue::Int(v) => StoredValue::Int(*v),
			MetadataValue::Float(v) => StoredValue::Float(v.to_bits()),
			MetadataValue::Str(v) => StoredValue::Str(v.clone()),
		}
	}
}

impl From<StoredValue> for MetadataValue {
	fn from(value: StoredValue) -> Self {
		match value {
			StoredValue::Bool(v) => MetadataValue::Bool(v),
			StoredValue::Int(v) => MetadataValue::Int(v),
			StoredValue::Float(bits) => MetadataValue::Float(f64::from_bits(bits)),
			StoredValue::Str(v) => MetadataValue::Str(v),
		}
	}
}

fn encode_metadata(metadata: &MetadataMap) -> anyhow::Result<String> {
	let stored: BTreeMap<&str, StoredValue> = metadata.iter().map(|(k, v)| (k.as_str(), StoredValue::from(v))).collect();
	Ok(serde_json::to_string(&stored)?)
}

fn decode_metadata(json: &str) -> anyhow::Result<MetadataMap> {
	let stored: BTreeMap<String, StoredValue> = serde_json::from_str(json)?;
	Ok(stored.into_iter().map(|(k, v)| (k, v.into())).collect())
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkFields {
	pub chunk_id: Field,
	pub doc_id: Field,
	pub doc_key: Field,
	pub document: Field,
	pub doc_version: Field,
	pub text: Field,
	pub metadata: Field,
}

impl ChunkFields {
	pub fn resolve(schema: &Schema) -> anyhow::Result<Self> {
		Ok(Self {
			chunk_id: schema.get_field("chunk_id")?,
			doc_id: schema.get_field("doc_id")?,
			doc_key: schema.get_field("doc_key")?,
			document: schema.get_field("document")?,
			doc_version: schema.get_field("doc_version")?,
			text: schema.get_field("text")?,
			metadata: schema.get_field("metadata")?,
		})
	}

	pub fn encode(&self, id: u64, text: &str, metadata: &MetadataMap, document: &str, doc_id: &str, version: u32) -> anyhow::Result<TantivyDocument> {
		let metadata_json = encode_metadata(metadata).context("failed to encode chunk metadata")?;
		Ok(doc!(
			self.chunk_id => id,
			self.doc_id => doc_id.to_string(),
			self.doc_key => doc_key(doc_id, version),
			self.document => document.to_string(),
			self.doc_version => u64::from(version),
			self.text => text.to_string(),
			self.metadata => metadata_json,
		))
	}

	pub fn decode(&self, doc: &TantivyDocument) -> anyhow::Result<Chunk> {
		let text_of = |field: Field, name: &str| {
			doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string).ok_or_else(|| anyhow!("stored chunk is missing '{name}'"))
		};
		let u64_of = |field: Field, name: &str| doc.get_first(field).and_then(|v| v.as_u64()).ok_or_else(|| anyhow!("stored chunk is missing '{name}'"));

		let id = u64_of(self.chunk_id, "chunk_id")?;
		let doc_version = u32::try_from(u64_of(self.doc_version, "doc_version")?).with_context(|| format!("chunk {id} has an out-of-range version"))?;
		let metadata = decode_metadata(&text_of(self.metadata, "metadata")?).with_context(|| format!("chunk {id} has unreadable metadata"))?;
		Ok(Chunk {
			id,
			text: text_of(self.text, "text")?,
			document: text_of(self.document, "document")?,
			doc_id: text_of(self.doc_id, "doc_id")?,
			doc_version,
			metadata,
		})
	}
}

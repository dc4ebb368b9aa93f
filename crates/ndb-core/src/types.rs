//! Domain types shared by the engine handle, the engines and the C boundary.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::{check_index, Error, Result};

/// Discriminant of a [`MetadataValue`]. The numeric values are part of the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataType {
    Bool = 0,
    Int = 1,
    Float = 2,
    Str = 3,
}

impl MetadataType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataType::Bool => "bool",
            MetadataType::Int => "int",
            MetadataType::Float => "float",
            MetadataType::Str => "str",
        }
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed metadata value attached to a chunk.
///
/// Reading a value through the accessor of another kind is an error, never a
/// reinterpretation of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetadataValue {
    pub fn kind(&self) -> MetadataType {
        match self {
            MetadataValue::Bool(_) => MetadataType::Bool,
            MetadataValue::Int(_) => MetadataType::Int,
            MetadataValue::Float(_) => MetadataType::Float,
            MetadataValue::Str(_) => MetadataType::Str,
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            MetadataValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch(MetadataType::Bool)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            MetadataValue::Int(v) => Ok(*v),
            other => Err(other.mismatch(MetadataType::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self {
            MetadataValue::Float(v) => Ok(*v),
            other => Err(other.mismatch(MetadataType::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            MetadataValue::Str(v) => Ok(v),
            other => Err(other.mismatch(MetadataType::Str)),
        }
    }

    /// Orders two values of the same kind. Values of different kinds are
    /// incomparable, as are floats involving NaN.
    pub fn compare(&self, other: &MetadataValue) -> Option<Ordering> {
        match (self, other) {
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => Some(a.cmp(b)),
            (MetadataValue::Int(a), MetadataValue::Int(b)) => Some(a.cmp(b)),
            (MetadataValue::Float(a), MetadataValue::Float(b)) => a.partial_cmp(b),
            (MetadataValue::Str(a), MetadataValue::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn mismatch(&self, expected: MetadataType) -> Error {
        Error::TypeMismatch { expected, found: self.kind() }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Str(v)
    }
}

/// Per-chunk metadata. Key order carries no meaning.
pub type MetadataMap = HashMap<String, MetadataValue>;

/// A chunk as stored and returned by the engine.
///
/// - `id`: engine-assigned identifier, unique within one engine instance
/// - `document`: display name of the owning document
/// - `doc_id`/`doc_version`: owning document identity and resolved version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: u64,
    pub text: String,
    pub document: String,
    pub doc_id: String,
    pub doc_version: u32,
    pub metadata: MetadataMap,
}

/// One stored version of a document, as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Source {
    pub document: String,
    pub doc_id: String,
    pub doc_version: u32,
}

/// A ranked hit. `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ranked results of one query, best first.
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    results: Vec<QueryResult>,
}

impl QueryResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&QueryResult> {
        check_index(index, self.results.len())?;
        Ok(&self.results[index])
    }

    /// Snapshot of the `index`-th chunk's metadata. Entry order is unspecified.
    pub fn metadata_of(&self, index: usize) -> Result<Vec<(String, MetadataValue)>> {
        let result = self.get(index)?;
        Ok(result
            .chunk
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.results.iter()
    }
}

impl From<Vec<QueryResult>> for QueryResults {
    fn from(results: Vec<QueryResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a QueryResult;
    type IntoIter = std::slice::Iter<'a, QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Comparison operator of a metadata constraint. Values are part of the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq = 0,
    Lt = 1,
    Gt = 2,
}

impl ConstraintOp {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ConstraintOp::Eq),
            1 => Some(ConstraintOp::Lt),
            2 => Some(ConstraintOp::Gt),
            _ => None,
        }
    }
}

/// A filter on one metadata key, applied to query candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub op: ConstraintOp,
    pub value: MetadataValue,
}

impl Constraint {
    pub fn equal_to(value: impl Into<MetadataValue>) -> Self {
        Self { op: ConstraintOp::Eq, value: value.into() }
    }

    pub fn less_than(value: impl Into<MetadataValue>) -> Self {
        Self { op: ConstraintOp::Lt, value: value.into() }
    }

    pub fn greater_than(value: impl Into<MetadataValue>) -> Self {
        Self { op: ConstraintOp::Gt, value: value.into() }
    }

    /// A missing key or a value of another kind never matches.
    pub fn matches(&self, candidate: Option<&MetadataValue>) -> bool {
        let Some(ordering) = candidate.and_then(|c| c.compare(&self.value)) else {
            return false;
        };
        match self.op {
            ConstraintOp::Eq => ordering == Ordering::Equal,
            ConstraintOp::Lt => ordering == Ordering::Less,
            ConstraintOp::Gt => ordering == Ordering::Greater,
        }
    }
}

/// Constraints keyed by metadata key; a chunk must satisfy all of them.
pub type Constraints = HashMap<String, Constraint>;

pub fn satisfies(metadata: &MetadataMap, constraints: &Constraints) -> bool {
    constraints
        .iter()
        .all(|(key, constraint)| constraint.matches(metadata.get(key)))
}

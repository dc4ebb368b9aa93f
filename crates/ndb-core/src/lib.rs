#![deny(unused_variables)]
#![deny(unused_imports)]

//! ndb-core
//!
//! Engine-independent pieces of the NeuralDB boundary: the metadata model, the
//! document builder, query results, the error kinds and the engine handle.

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod traits;
pub mod types;

pub use db::NeuralDb;
pub use document::Document;
pub use error::{Error, Result};
pub use traits::RetrievalEngine;
pub use types::{
    Chunk, Constraint, ConstraintOp, Constraints, MetadataMap, MetadataType, MetadataValue, QueryResult,
    QueryResults, Source,
};

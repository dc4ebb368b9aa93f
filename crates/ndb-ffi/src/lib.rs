//! ndb
//!
//! Flat C ABI over the NeuralDB engine handle.
//!
//! Every object crossing the boundary is an opaque pointer with an explicit
//! create/release pair:
//!
//! | object            | created by                      | released by                |
//! |-------------------|---------------------------------|----------------------------|
//! | `NdbHandle`       | `ndb_open`                      | `ndb_close`                |
//! | `NdbDocument`     | `ndb_document_new`              | `ndb_document_free`        |
//! | `NdbQueryResults` | `ndb_query*`                    | `ndb_query_results_free`   |
//! | `NdbMetadataList` | `ndb_query_results_metadata`    | `ndb_metadata_list_free`   |
//! | `NdbConstraints`  | `ndb_constraints_new`           | `ndb_constraints_free`     |
//! | `NdbSources`      | `ndb_sources`                   | `ndb_sources_free`         |
//! | error string      | any call taking `char **err`    | `ndb_string_free`          |
//!
//! Fallible calls report failures through their trailing `err` slot (see
//! [`error`]). Misused accessors (index past the end, wrong metadata type)
//! are reported the same way; they never read out of bounds.
//!
//! All calls are synchronous. Nothing here locks: one handle must not be used
//! from several threads at once, distinct handles are independent.
//!
//! The C declarations live in `include/ndb.h`.

pub mod constraints;
mod cstr;
pub mod db;
pub mod document;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod results;
pub mod sources;

pub use constraints::NdbConstraints;
pub use db::NdbHandle;
pub use document::NdbDocument;
pub use metadata::NdbMetadataList;
pub use results::NdbQueryResults;
pub use sources::NdbSources;

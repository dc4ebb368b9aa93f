//! Query result collections.
//!
//! Strings returned by the accessors are borrowed from the collection and stay
//! valid until [`ndb_query_results_free`].

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use ndb_core::{Error, QueryResult, QueryResults, Result};

use crate::cstr::{c_string, handle_ref, release};
use crate::error::guard;
use crate::metadata::NdbMetadataList;

struct ResultStrings {
    text: CString,
    document: CString,
    doc_id: CString,
}

pub struct NdbQueryResults {
    results: QueryResults,
    strings: Vec<ResultStrings>,
}

impl NdbQueryResults {
    pub(crate) fn new(results: QueryResults) -> Result<Self> {
        let strings = results
            .iter()
            .map(|r| {
                Ok(ResultStrings {
                    text: c_string(&r.chunk.text, "chunk text")?,
                    document: c_string(&r.chunk.document, "document name")?,
                    doc_id: c_string(&r.chunk.doc_id, "document id")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { results, strings })
    }
}

/// Looks up result `i` of a live collection, reporting failures through `err`.
unsafe fn with_result<T>(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
    sentinel: T,
    read: impl FnOnce(&QueryResult, &ResultStrings) -> T,
) -> T {
    guard(err, sentinel, Error::InvalidArgument, || {
        let collection = unsafe { handle_ref(results, "query results") }?;
        let result = collection.results.get(i)?;
        Ok(read(result, &collection.strings[i]))
    })
}

/// Number of results; 0 for a null collection.
///
/// # Safety
/// `results` must be null or a live collection.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_len(results: *const NdbQueryResults) -> usize {
    unsafe { results.as_ref() }.map_or(0, |r| r.results.len())
}

/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_id(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> u64 {
    unsafe { with_result(results, i, err, 0, |r, _| r.chunk.id) }
}

/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_text(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_result(results, i, err, ptr::null(), |_, s| s.text.as_ptr()) }
}

/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_document(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_result(results, i, err, ptr::null(), |_, s| s.document.as_ptr()) }
}

/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_doc_id(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_result(results, i, err, ptr::null(), |_, s| s.doc_id.as_ptr()) }
}

/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_doc_version(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> u32 {
    unsafe { with_result(results, i, err, 0, |r, _| r.chunk.doc_version) }
}

/// NaN on error.
///
/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_score(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> f32 {
    unsafe { with_result(results, i, err, f32::NAN, |r, _| r.score) }
}

/// Snapshot of result `i`'s metadata, owned by the caller and released with
/// `ndb_metadata_list_free`. Null on error.
///
/// # Safety
/// `results` must be null or a live collection; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_metadata(
    results: *const NdbQueryResults,
    i: usize,
    err: *mut *mut c_char,
) -> *mut NdbMetadataList {
    guard(err, ptr::null_mut(), Error::InvalidArgument, || {
        let collection = unsafe { handle_ref(results, "query results") }?;
        let list = NdbMetadataList::new(collection.results.metadata_of(i)?)?;
        Ok(Box::into_raw(Box::new(list)))
    })
}

/// # Safety
/// `results` must be null or a collection not released before.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_results_free(results: *mut NdbQueryResults) {
    unsafe { release(results) }
}

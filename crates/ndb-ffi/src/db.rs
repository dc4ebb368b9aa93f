//! Engine handle lifecycle and operations.

use std::os::raw::c_char;
use std::ptr;

use ndb_core::{Constraints, Error, NeuralDb};
use ndb_text::TantivyEngine;

use crate::constraints::NdbConstraints;
use crate::cstr::{handle_mut, handle_ref, str_arg};
use crate::document::NdbDocument;
use crate::error::guard;
use crate::results::NdbQueryResults;

/// An open engine. Calls on one handle are not serialized; callers sharing a
/// handle across threads must lock around it.
pub struct NdbHandle {
    pub(crate) db: NeuralDb<TantivyEngine>,
}

/// Opens the engine state at `path`, creating it if absent. Null on error.
///
/// # Safety
/// `path` must be null or NUL-terminated; `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_open(path: *const c_char, err: *mut *mut c_char) -> *mut NdbHandle {
    guard(err, ptr::null_mut(), Error::Construction, || {
        let path = unsafe { str_arg(path, "path") }?;
        let db = NeuralDb::open(path)?;
        Ok(Box::into_raw(Box::new(NdbHandle { db })))
    })
}

/// Closes the engine and releases the handle.
///
/// # Safety
/// `db` must be null or a handle not closed before.
#[no_mangle]
pub unsafe extern "C" fn ndb_close(db: *mut NdbHandle) {
    if !db.is_null() {
        let handle = unsafe { Box::from_raw(db) };
        handle.db.close();
    }
}

/// Inserts every chunk of `doc` as one unit. The document is consumed even
/// when the insert fails, and must still be released with `ndb_document_free`.
///
/// # Safety
/// `db` and `doc` must be null or live handles; `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_insert(db: *mut NdbHandle, doc: *mut NdbDocument, err: *mut *mut c_char) -> bool {
    guard(err, false, Error::Insert, || {
        let handle = unsafe { handle_mut(db, "engine") }?;
        let staged = unsafe { handle_mut(doc, "document") }?.take()?;
        handle.db.insert(staged)?;
        Ok(true)
    })
}

/// Up to `top_k` chunks ranked by relevance to `query`. Null on error; an
/// empty collection when nothing matches.
///
/// # Safety
/// `db` must be null or a live handle; `query` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_query(
    db: *const NdbHandle,
    query: *const c_char,
    top_k: usize,
    err: *mut *mut c_char,
) -> *mut NdbQueryResults {
    unsafe { ndb_query_with_constraints(db, query, top_k, ptr::null(), err) }
}

/// Like `ndb_query`, keeping only chunks whose metadata satisfies every
/// constraint. A null `constraints` means none.
///
/// # Safety
/// As `ndb_query`; `constraints` must be null or a live constraint set.
#[no_mangle]
pub unsafe extern "C" fn ndb_query_with_constraints(
    db: *const NdbHandle,
    query: *const c_char,
    top_k: usize,
    constraints: *const NdbConstraints,
    err: *mut *mut c_char,
) -> *mut NdbQueryResults {
    guard(err, ptr::null_mut(), Error::Query, || {
        let handle = unsafe { handle_ref(db, "engine") }?;
        let query = unsafe { str_arg(query, "query") }?;
        let empty = Constraints::new();
        let constraints = unsafe { constraints.as_ref() }.map_or(&empty, |c| &c.constraints);
        let results = handle.db.query_with_constraints(query, top_k, constraints)?;
        Ok(Box::into_raw(Box::new(NdbQueryResults::new(results)?)))
    })
}

/// Persists the engine state to `path`, which may differ from the open path.
///
/// # Safety
/// `db` must be null or a live handle; `path` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_save(db: *const NdbHandle, path: *const c_char, err: *mut *mut c_char) -> bool {
    guard(err, false, Error::Save, || {
        let handle = unsafe { handle_ref(db, "engine") }?;
        handle.db.save(unsafe { str_arg(path, "path") }?)?;
        Ok(true)
    })
}

/// Removes every chunk of `doc_id`, or with `keep_latest` all but its latest version.
///
/// # Safety
/// `db` must be null or a live handle; `doc_id` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_delete(
    db: *mut NdbHandle,
    doc_id: *const c_char,
    keep_latest: bool,
    err: *mut *mut c_char,
) -> bool {
    guard(err, false, Error::Delete, || {
        let handle = unsafe { handle_mut(db, "engine") }?;
        handle.db.delete(unsafe { str_arg(doc_id, "doc_id") }?, keep_latest)?;
        Ok(true)
    })
}

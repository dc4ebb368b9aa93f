//! Listing of stored document versions.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use ndb_core::error::check_index;
use ndb_core::{Error, Result, Source};

use crate::cstr::{c_string, handle_ref, release};
use crate::db::NdbHandle;
use crate::error::guard;

struct SourceEntry {
    document: CString,
    doc_id: CString,
    doc_version: u32,
}

/// Stored document versions, sorted by document name. Strings are borrowed
/// from the list and stay valid until [`ndb_sources_free`].
pub struct NdbSources {
    entries: Vec<SourceEntry>,
}

impl NdbSources {
    pub(crate) fn new(sources: Vec<Source>) -> Result<Self> {
        let entries = sources
            .into_iter()
            .map(|s| {
                Ok(SourceEntry {
                    document: c_string(&s.document, "document name")?,
                    doc_id: c_string(&s.doc_id, "document id")?,
                    doc_version: s.doc_version,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

unsafe fn with_source<T>(
    sources: *const NdbSources,
    i: usize,
    err: *mut *mut c_char,
    sentinel: T,
    read: impl FnOnce(&SourceEntry) -> T,
) -> T {
    guard(err, sentinel, Error::InvalidArgument, || {
        let list = unsafe { handle_ref(sources, "sources") }?;
        check_index(i, list.entries.len())?;
        Ok(read(&list.entries[i]))
    })
}

/// Every stored document version. Null on error.
///
/// # Safety
/// `db` must be null or a live handle; `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources(db: *const NdbHandle, err: *mut *mut c_char) -> *mut NdbSources {
    guard(err, ptr::null_mut(), Error::Sources, || {
        let handle = unsafe { handle_ref(db, "engine") }?;
        let sources = NdbSources::new(handle.db.sources()?)?;
        Ok(Box::into_raw(Box::new(sources)))
    })
}

/// # Safety
/// `sources` must be null or a live list.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources_len(sources: *const NdbSources) -> usize {
    unsafe { sources.as_ref() }.map_or(0, |s| s.entries.len())
}

/// # Safety
/// `sources` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources_document(
    sources: *const NdbSources,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_source(sources, i, err, ptr::null(), |e| e.document.as_ptr()) }
}

/// # Safety
/// `sources` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources_doc_id(
    sources: *const NdbSources,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_source(sources, i, err, ptr::null(), |e| e.doc_id.as_ptr()) }
}

/// 0 on error.
///
/// # Safety
/// `sources` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources_version(sources: *const NdbSources, i: usize, err: *mut *mut c_char) -> u32 {
    unsafe { with_source(sources, i, err, 0, |e| e.doc_version) }
}

/// # Safety
/// `sources` must be null or a list not released before.
#[no_mangle]
pub unsafe extern "C" fn ndb_sources_free(sources: *mut NdbSources) {
    unsafe { release(sources) }
}

//! Document builder handles.

use std::os::raw::c_char;
use std::ptr;

use ndb_core::{Document, Error, MetadataValue, Result};

use crate::cstr::{handle_mut, handle_ref, release, str_arg};
use crate::error::guard;

/// A staged document. Emptied by `ndb_insert`; any later use is an error.
pub struct NdbDocument {
    staged: Option<Document>,
}

impl NdbDocument {
    pub(crate) fn staged_mut(&mut self) -> Result<&mut Document> {
        self.staged
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("document was already inserted".to_string()))
    }

    pub(crate) fn take(&mut self) -> Result<Document> {
        self.staged
            .take()
            .ok_or_else(|| Error::InvalidArgument("document was already inserted".to_string()))
    }
}

/// Creates an empty document. Null on error.
///
/// # Safety
/// String arguments must be null or NUL-terminated; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_new(
    document: *const c_char,
    doc_id: *const c_char,
    err: *mut *mut c_char,
) -> *mut NdbDocument {
    guard(err, ptr::null_mut(), Error::InvalidArgument, || {
        let document = unsafe { str_arg(document, "document") }?;
        let doc_id = unsafe { str_arg(doc_id, "doc_id") }?;
        let staged = Document::new(document, doc_id);
        Ok(Box::into_raw(Box::new(NdbDocument { staged: Some(staged) })))
    })
}

/// Appends a chunk together with an empty metadata map.
///
/// # Safety
/// `doc` must be null or a live document; `text` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_add_chunk(
    doc: *mut NdbDocument,
    text: *const c_char,
    err: *mut *mut c_char,
) -> bool {
    guard(err, false, Error::InvalidArgument, || {
        let doc = unsafe { handle_mut(doc, "document") }?.staged_mut()?;
        doc.add_chunk(unsafe { str_arg(text, "chunk text") }?);
        Ok(true)
    })
}

/// # Safety
/// `doc` must be null or a live document; `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_set_version(
    doc: *mut NdbDocument,
    version: u32,
    err: *mut *mut c_char,
) -> bool {
    guard(err, false, Error::InvalidArgument, || {
        unsafe { handle_mut(doc, "document") }?.staged_mut()?.set_version(version);
        Ok(true)
    })
}

unsafe fn set_metadata(
    doc: *mut NdbDocument,
    chunk_index: usize,
    key: *const c_char,
    err: *mut *mut c_char,
    value: impl FnOnce() -> Result<MetadataValue>,
) -> bool {
    guard(err, false, Error::InvalidArgument, || {
        let doc = unsafe { handle_mut(doc, "document") }?.staged_mut()?;
        let key = unsafe { str_arg(key, "metadata key") }?;
        doc.set_metadata(chunk_index, key, value()?)?;
        Ok(true)
    })
}

/// Sets `key` on chunk `chunk_index`, replacing any previous value.
/// An index past the last chunk fails with an out-of-range error.
///
/// # Safety
/// `doc` must be null or a live document; `key` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_set_metadata_bool(
    doc: *mut NdbDocument,
    chunk_index: usize,
    key: *const c_char,
    value: bool,
    err: *mut *mut c_char,
) -> bool {
    unsafe { set_metadata(doc, chunk_index, key, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_document_set_metadata_bool`.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_set_metadata_int(
    doc: *mut NdbDocument,
    chunk_index: usize,
    key: *const c_char,
    value: i64,
    err: *mut *mut c_char,
) -> bool {
    unsafe { set_metadata(doc, chunk_index, key, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_document_set_metadata_bool`.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_set_metadata_float(
    doc: *mut NdbDocument,
    chunk_index: usize,
    key: *const c_char,
    value: f64,
    err: *mut *mut c_char,
) -> bool {
    unsafe { set_metadata(doc, chunk_index, key, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_document_set_metadata_bool`; `value` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_set_metadata_str(
    doc: *mut NdbDocument,
    chunk_index: usize,
    key: *const c_char,
    value: *const c_char,
    err: *mut *mut c_char,
) -> bool {
    unsafe {
        set_metadata(doc, chunk_index, key, err, || {
            Ok(str_arg(value, "metadata value")?.into())
        })
    }
}

/// Number of staged chunks; 0 for null or already inserted documents.
///
/// # Safety
/// `doc` must be null or a live document.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_len(doc: *const NdbDocument) -> usize {
    unsafe { handle_ref(doc, "document") }
        .ok()
        .and_then(|d| d.staged.as_ref())
        .map_or(0, Document::len)
}

/// Releases a document, inserted or not.
///
/// # Safety
/// `doc` must be null or a document not released before.
#[no_mangle]
pub unsafe extern "C" fn ndb_document_free(doc: *mut NdbDocument) {
    unsafe { release(doc) }
}

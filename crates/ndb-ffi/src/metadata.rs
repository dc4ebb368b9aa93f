//! Metadata snapshots handed out per query result.
//!
//! A snapshot is an independent copy: it owns its keys and string values and
//! must be released with [`ndb_metadata_list_free`]. Entry order is unspecified.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;

use ndb_core::error::check_index;
use ndb_core::{Error, MetadataValue, Result};

use crate::cstr::{c_string, handle_ref, release};
use crate::error::guard;

struct MetadataEntry {
    key: CString,
    value: MetadataValue,
    /// C copy of a string value, kept so `ndb_metadata_list_str` can lend it out.
    text: Option<CString>,
}

pub struct NdbMetadataList {
    entries: Vec<MetadataEntry>,
}

impl NdbMetadataList {
    pub(crate) fn new(entries: Vec<(String, MetadataValue)>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|(key, value)| {
                let text = match &value {
                    MetadataValue::Str(s) => Some(c_string(s, "metadata value")?),
                    _ => None,
                };
                Ok(MetadataEntry { key: c_string(&key, "metadata key")?, value, text })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    fn entry(&self, index: usize) -> Result<&MetadataEntry> {
        check_index(index, self.entries.len())?;
        Ok(&self.entries[index])
    }
}

/// Looks up entry `i` of a live list, reporting failures through `err`.
unsafe fn with_entry<T>(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
    sentinel: T,
    read: impl FnOnce(&MetadataEntry) -> Result<T>,
) -> T {
    guard(err, sentinel, Error::InvalidArgument, || {
        let list = unsafe { handle_ref(list, "metadata list") }?;
        read(list.entry(i)?)
    })
}

/// # Safety
/// `list` must be null or a live list.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_len(list: *const NdbMetadataList) -> usize {
    unsafe { list.as_ref() }.map_or(0, |l| l.entries.len())
}

/// Key of entry `i`, borrowed from the list. Null on error.
///
/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_key(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe { with_entry(list, i, err, ptr::null(), |e| Ok(e.key.as_ptr())) }
}

/// Type tag of entry `i` (see `NDB_TYPE_*`). -1 on error.
///
/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_type(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> c_int {
    unsafe { with_entry(list, i, err, -1, |e| Ok(e.value.kind() as c_int)) }
}

/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_bool(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> bool {
    unsafe { with_entry(list, i, err, false, |e| e.value.as_bool()) }
}

/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_int(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> i64 {
    unsafe { with_entry(list, i, err, 0, |e| e.value.as_int()) }
}

/// NaN on error.
///
/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_float(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> f64 {
    unsafe { with_entry(list, i, err, f64::NAN, |e| e.value.as_float()) }
}

/// String value of entry `i`, borrowed from the list. Null on error.
///
/// # Safety
/// `list` must be null or a live list; `err` must be null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_str(
    list: *const NdbMetadataList,
    i: usize,
    err: *mut *mut c_char,
) -> *const c_char {
    unsafe {
        with_entry(list, i, err, ptr::null(), |e| {
            e.value.as_str()?;
            Ok(e.text.as_ref().map_or(ptr::null(), |t| t.as_ptr()))
        })
    }
}

/// # Safety
/// `list` must be null or a list not released before.
#[no_mangle]
pub unsafe extern "C" fn ndb_metadata_list_free(list: *mut NdbMetadataList) {
    unsafe { release(list) }
}

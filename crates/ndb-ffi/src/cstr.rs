//! Argument conversion for raw pointers handed in by C callers.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ndb_core::{Error, Result};

/// Borrows a NUL-terminated UTF-8 argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::InvalidArgument(format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::InvalidArgument(format!("{name} is not valid UTF-8")))
}

/// # Safety
/// `ptr` must be null or point to a live `T` not mutably aliased for `'a`.
pub(crate) unsafe fn handle_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T> {
    unsafe { ptr.as_ref() }.ok_or_else(|| Error::InvalidArgument(format!("{name} handle is null")))
}

/// # Safety
/// `ptr` must be null or point to a live `T` not aliased for `'a`.
pub(crate) unsafe fn handle_mut<'a, T>(ptr: *mut T, name: &str) -> Result<&'a mut T> {
    unsafe { ptr.as_mut() }.ok_or_else(|| Error::InvalidArgument(format!("{name} handle is null")))
}

/// Copies engine text into an owned C string for the lifetime of a result set.
pub(crate) fn c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value).map_err(|_| Error::Query(format!("{what} contains a NUL byte")))
}

/// Releases a boxed handle; null is a no-op.
///
/// # Safety
/// `ptr` must be null or come from `Box::into_raw` and not have been released yet.
pub(crate) unsafe fn release<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(ptr) });
    }
}

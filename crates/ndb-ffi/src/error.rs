//! The error channel shared by every exported function.
//!
//! Fallible functions take a trailing `char **err`. The caller sets `*err` to
//! null before the call. On success it is left untouched; on failure it
//! receives a newly allocated, NUL-terminated description that the caller
//! owns and must release with [`ndb_string_free`], and the function returns
//! its "no result" value.

use std::any::Any;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use ndb_core::{Error, Result};
use tracing::warn;

/// Writes `error` into the caller's slot. A null slot only gets the log line.
pub(crate) fn set_error(err: *mut *mut c_char, error: &Error) {
    warn!(error = %error, "reporting failure across the C boundary");
    if err.is_null() {
        return;
    }
    // CString owns the terminator, so the allocation is always length + 1.
    let message = CString::new(error.to_string().replace('\0', "\\0")).unwrap_or_default();
    // SAFETY: the caller passes either null (handled above) or a writable slot.
    unsafe { *err = message.into_raw() };
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `body`, reporting an `Err` or a panic through `err` and returning
/// `sentinel` in that case. Panics are reported as `on_panic` errors.
pub(crate) fn guard<T>(
    err: *mut *mut c_char,
    sentinel: T,
    on_panic: fn(String) -> Error,
    body: impl FnOnce() -> Result<T>,
) -> T {
    let outcome = catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(on_panic(format!("panicked: {}", panic_message(payload.as_ref())))));
    match outcome {
        Ok(value) => value,
        Err(error) => {
            set_error(err, &error);
            sentinel
        }
    }
}

/// Releases an error description (or any string documented as caller-owned).
///
/// # Safety
/// `s` must be null or a pointer produced by this library that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn ndb_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

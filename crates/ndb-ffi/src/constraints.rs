//! Metadata constraints for `ndb_query_with_constraints`.

use std::os::raw::{c_char, c_int};

use ndb_core::{Constraint, ConstraintOp, Constraints, Error, MetadataValue, Result};

use crate::cstr::{handle_mut, release, str_arg};
use crate::error::guard;

#[derive(Default)]
pub struct NdbConstraints {
    pub(crate) constraints: Constraints,
}

/// Creates an empty constraint set. Never null.
#[no_mangle]
pub extern "C" fn ndb_constraints_new() -> *mut NdbConstraints {
    Box::into_raw(Box::default())
}

unsafe fn add(
    set: *mut NdbConstraints,
    key: *const c_char,
    op: c_int,
    err: *mut *mut c_char,
    value: impl FnOnce() -> Result<MetadataValue>,
) -> bool {
    guard(err, false, Error::InvalidArgument, || {
        let set = unsafe { handle_mut(set, "constraints") }?;
        let key = unsafe { str_arg(key, "constraint key") }?;
        let op = ConstraintOp::from_raw(op)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown constraint operator {op}")))?;
        set.constraints.insert(key.to_string(), Constraint { op, value: value()? });
        Ok(true)
    })
}

/// Requires metadata `key` to compare to `value` by `op` (`NDB_OP_*`). A later
/// constraint on the same key replaces the earlier one.
///
/// # Safety
/// `set` must be null or a live constraint set; `key` null or NUL-terminated;
/// `err` null or a writable slot.
#[no_mangle]
pub unsafe extern "C" fn ndb_constraints_add_bool(
    set: *mut NdbConstraints,
    key: *const c_char,
    op: c_int,
    value: bool,
    err: *mut *mut c_char,
) -> bool {
    unsafe { add(set, key, op, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_constraints_add_bool`.
#[no_mangle]
pub unsafe extern "C" fn ndb_constraints_add_int(
    set: *mut NdbConstraints,
    key: *const c_char,
    op: c_int,
    value: i64,
    err: *mut *mut c_char,
) -> bool {
    unsafe { add(set, key, op, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_constraints_add_bool`.
#[no_mangle]
pub unsafe extern "C" fn ndb_constraints_add_float(
    set: *mut NdbConstraints,
    key: *const c_char,
    op: c_int,
    value: f64,
    err: *mut *mut c_char,
) -> bool {
    unsafe { add(set, key, op, err, || Ok(value.into())) }
}

/// # Safety
/// See `ndb_constraints_add_bool`; `value` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn ndb_constraints_add_str(
    set: *mut NdbConstraints,
    key: *const c_char,
    op: c_int,
    value: *const c_char,
    err: *mut *mut c_char,
) -> bool {
    unsafe { add(set, key, op, err, || Ok(str_arg(value, "constraint value")?.into())) }
}

/// # Safety
/// `set` must be null or a constraint set not released before.
#[no_mangle]
pub unsafe extern "C" fn ndb_constraints_free(set: *mut NdbConstraints) {
    unsafe { release(set) }
}

//! C ABI
//!
//! Every object crosses the boundary as an opaque `u64` handle. Failures are
//! reported by sentinel (`0` handle, `false`, `0` size, `-1` tag) and logged;
//! nothing here panics across the boundary.
//!
//! Ownership: a column handed to `colfuse_registry_register` belongs to the
//! registry from then on and its handle is retired. Any later use of that
//! handle, destroy included, fails the generation check and is a logged no-op.

pub mod handles;

use std::ffi::{c_char, CStr};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::registry::Registry;
use crate::table::{wrap_i32, Column, Repr};
use handles::{HandleTable, Removed, NULL_HANDLE};

/// Bumped on any incompatible change to the exported signatures
pub const ABI_VERSION: u32 = 1;

static VERSION: &str = concat!("colfuse ", env!("CARGO_PKG_VERSION"), "\0");

static COLUMNS: Lazy<Mutex<HandleTable<Column>>> = Lazy::new(|| Mutex::new(HandleTable::new()));

static REGISTRIES: Lazy<Mutex<HandleTable<Arc<Mutex<Registry>>>>> =
    Lazy::new(|| Mutex::new(HandleTable::new()));

// ============================================================================
// Helpers
// ============================================================================

fn insert_column(column: Column) -> u64 {
    match COLUMNS.lock().insert(column) {
        Some(handle) => handle,
        None => {
            tracing::warn!("column handle space exhausted");
            NULL_HANDLE
        }
    }
}

fn with_column<R>(handle: u64, f: impl FnOnce(&Column) -> Result<R>) -> Result<R> {
    let columns = COLUMNS.lock();
    f(columns.get(handle)?)
}

fn registry(handle: u64) -> Result<Arc<Mutex<Registry>>> {
    REGISTRIES.lock().get(handle).cloned()
}

/// Borrow a NUL-terminated UTF-8 string
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the call.
unsafe fn name_arg<'s>(ptr: *const c_char) -> Option<&'s str> {
    if ptr.is_null() {
        tracing::warn!("null string argument");
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(error = %e, "string argument is not valid UTF-8");
            None
        }
    }
}

fn sentinel<T>(result: Result<T>, fallback: T, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "{what} failed");
        fallback
    })
}

// ============================================================================
// Version
// ============================================================================

/// Human-readable version, static storage
#[no_mangle]
pub extern "C" fn colfuse_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[no_mangle]
pub extern "C" fn colfuse_abi_version() -> u32 {
    ABI_VERSION
}

// ============================================================================
// Columns
// ============================================================================

/// New column of `size` elements set to `value` converted to `repr`
#[no_mangle]
pub extern "C" fn colfuse_column_create(repr: u32, size: usize, value: f64) -> u64 {
    match Column::create_tagged(repr, size, value) {
        Ok(column) => insert_column(column),
        Err(e) => {
            tracing::warn!(error = %e, repr, size, "column_create failed");
            NULL_HANDLE
        }
    }
}

#[no_mangle]
pub extern "C" fn colfuse_column_create_int32(size: usize, value: i32) -> u64 {
    colfuse_column_create(Repr::Int32.tag(), size, f64::from(value))
}

#[no_mangle]
pub extern "C" fn colfuse_column_create_float32(size: usize, value: f32) -> u64 {
    colfuse_column_create(Repr::Float32.tag(), size, f64::from(value))
}

/// Release a column handle. Stale handles are ignored.
#[no_mangle]
pub extern "C" fn colfuse_column_destroy(handle: u64) {
    if handle == NULL_HANDLE {
        return;
    }
    match COLUMNS.lock().remove(handle) {
        Ok(Removed::Value(_)) => {}
        Ok(Removed::Moved) => tracing::warn!(handle, "column_destroy released a moved handle"),
        Err(e) => tracing::warn!(error = %e, "column_destroy ignored (stale or registered handle)"),
    }
}

#[no_mangle]
pub extern "C" fn colfuse_column_size(handle: u64) -> usize {
    sentinel(with_column(handle, |c| Ok(c.len())), 0, "column_size")
}

/// Representation tag, or -1
#[no_mangle]
pub extern "C" fn colfuse_column_repr(handle: u64) -> i32 {
    sentinel(
        with_column(handle, |c| Ok(c.repr().tag() as i32)),
        -1,
        "column_repr",
    )
}

/// Element `index` widened to f64
///
/// # Safety
/// `out` must be null or valid for one f64 write.
#[no_mangle]
pub unsafe extern "C" fn colfuse_column_get(handle: u64, index: usize, out: *mut f64) -> bool {
    if out.is_null() {
        tracing::warn!("column_get: null output pointer");
        return false;
    }
    match with_column(handle, |c| c.get(index)) {
        Ok(value) => {
            *out = value;
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "column_get failed");
            false
        }
    }
}

/// Element `index` as int32 (0 on failure)
#[no_mangle]
pub extern "C" fn colfuse_column_get_int32(handle: u64, index: usize) -> i32 {
    sentinel(
        with_column(handle, |c| c.get(index).map(wrap_i32)),
        0,
        "column_get_int32",
    )
}

/// Element `index` as float32 (0.0 on failure)
#[no_mangle]
pub extern "C" fn colfuse_column_get_float32(handle: u64, index: usize) -> f32 {
    sentinel(
        with_column(handle, |c| c.get(index).map(|v| v as f32)),
        0.0,
        "column_get_float32",
    )
}

// ============================================================================
// Registries
// ============================================================================

fn insert_registry(default_repr: Repr) -> u64 {
    let registry = Registry::with_config(default_repr, EngineConfig::from_env());
    match REGISTRIES.lock().insert(Arc::new(Mutex::new(registry))) {
        Some(handle) => handle,
        None => {
            tracing::warn!("registry handle space exhausted");
            NULL_HANDLE
        }
    }
}

/// Registry whose untyped literals are int32
#[no_mangle]
pub extern "C" fn colfuse_registry_create() -> u64 {
    insert_registry(Repr::Int32)
}

#[no_mangle]
pub extern "C" fn colfuse_registry_create_with_repr(repr: u32) -> u64 {
    match Repr::try_from(repr) {
        Ok(repr) => insert_registry(repr),
        Err(e) => {
            tracing::warn!(error = %e, "registry_create_with_repr failed");
            NULL_HANDLE
        }
    }
}

/// Release a registry and every column it owns
#[no_mangle]
pub extern "C" fn colfuse_registry_destroy(handle: u64) {
    if handle == NULL_HANDLE {
        return;
    }
    if let Err(e) = REGISTRIES.lock().remove(handle) {
        tracing::warn!(error = %e, "registry_destroy ignored");
    }
}

/// Move `column` into the registry under `name`.
///
/// On success the column handle is retired and must not be used again. On
/// failure the column handle is untouched and still owned by the caller.
///
/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn colfuse_registry_register(registry_handle: u64, name: *const c_char, column: u64) -> bool {
    let Some(name) = name_arg(name) else {
        return false;
    };
    let result = registry(registry_handle).and_then(|registry| {
        let mut columns = COLUMNS.lock();
        let value = columns.take(column)?;
        let outcome = registry.lock().register(name, value);
        match outcome {
            Ok(()) => columns.release_moved(column),
            Err(rejected) => {
                let error = rejected.error.clone();
                columns.restore(column, rejected.into_column())?;
                Err(error)
            }
        }
    });
    sentinel(result.map(|()| true), false, "registry_register")
}

/// Drop the column registered under `name`
///
/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn colfuse_registry_unregister(registry_handle: u64, name: *const c_char) -> bool {
    let Some(name) = name_arg(name) else {
        return false;
    };
    let result = registry(registry_handle).map(|r| r.lock().unregister(name).is_some());
    sentinel(result, false, "registry_unregister")
}

/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn colfuse_registry_has(registry_handle: u64, name: *const c_char) -> bool {
    let Some(name) = name_arg(name) else {
        return false;
    };
    sentinel(
        registry(registry_handle).map(|r| r.lock().has(name)),
        false,
        "registry_has",
    )
}

#[no_mangle]
pub extern "C" fn colfuse_registry_count(registry_handle: u64) -> usize {
    sentinel(
        registry(registry_handle).map(|r| r.lock().count()),
        0,
        "registry_count",
    )
}

/// Evaluate `expression` into a new caller-owned column handle
///
/// # Safety
/// `expression` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn colfuse_eval(registry_handle: u64, expression: *const c_char) -> u64 {
    let Some(expression) = name_arg(expression) else {
        return NULL_HANDLE;
    };
    let result = registry(registry_handle).and_then(|r| r.lock().evaluate(expression));
    match result {
        Ok(column) => insert_column(column),
        Err(e) => {
            tracing::warn!(error = %e, expression, "eval failed");
            NULL_HANDLE
        }
    }
}

/// Column handles currently allocated
pub fn live_columns() -> usize {
    COLUMNS.lock().live()
}

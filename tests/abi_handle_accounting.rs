//! Column handle accounting across the C ABI
//!
//! The handle tables are process-global, so everything that compares
//! `live_columns()` snapshots runs inside one test in its own binary.

use std::ffi::CString;

use colfuse::ffi::*;

fn cstr(s: &str) -> CString {
    CString::new(s).unwrap()
}

#[test]
fn test_live_columns_balance() {
    let start = live_columns();

    // Registration hands the slot back; the registry owns the data
    for _ in 0..100 {
        let reg = colfuse_registry_create();
        let col = colfuse_column_create_int32(8, 1);
        assert_eq!(live_columns(), start + 1);
        unsafe {
            assert!(colfuse_registry_register(reg, cstr("a").as_ptr(), col));
        }
        assert_eq!(live_columns(), start);
        colfuse_registry_destroy(reg);
    }
    assert_eq!(live_columns(), start);

    // A retired handle never reaches the column that reuses its slot
    let reg = colfuse_registry_create();
    let retired = colfuse_column_create_int32(2, 5);
    unsafe {
        assert!(colfuse_registry_register(reg, cstr("a").as_ptr(), retired));
    }
    let fresh = colfuse_column_create_int32(2, 9);
    assert_ne!(fresh, retired);
    colfuse_column_destroy(retired);
    assert_eq!(colfuse_column_get_int32(fresh, 1), 9);
    assert_eq!(live_columns(), start + 1);
    colfuse_column_destroy(fresh);
    assert_eq!(live_columns(), start);

    // Failed evaluations allocate nothing
    unsafe {
        assert_eq!(colfuse_eval(reg, cstr("c").as_ptr()), 0);
        assert_eq!(live_columns(), start);
        assert_eq!(colfuse_eval(reg, cstr("a +").as_ptr()), 0);
        assert_eq!(live_columns(), start);

        let sum = colfuse_eval(reg, cstr("a + a").as_ptr());
        assert_eq!(colfuse_column_get_int32(sum, 0), 10);
        assert_eq!(live_columns(), start + 1);
        colfuse_column_destroy(sum);
    }
    assert_eq!(live_columns(), start);

    colfuse_registry_destroy(reg);
    assert_eq!(live_columns(), start);
}

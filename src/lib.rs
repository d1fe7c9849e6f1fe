//! colfuse: in-memory columnar expression engine
//!
//! Typed columns (int32, float32, bfloat16), elementwise kernels with a fused
//! multiply-add path, an expression evaluator that decides when fusion pays
//! off, a named column registry, and a C ABI over opaque handles.

pub mod table;
pub mod builtins;
pub mod pipeline;
pub mod registry;
pub mod config;
pub mod error;
pub mod ffi;

pub use table::{Bf16, Column, Repr, Scalar};
pub use builtins::{max, min, mul_add_fused, mul_add_naive, sum, BinaryOp};
pub use config::{EngineConfig, FusionPolicy};
pub use error::{Error, Rejected, Result};
pub use pipeline::{CacheTier, ExecutionStats, FusionEstimate};
pub use registry::Registry;

/// API Contract Self-Test
///
/// Local failsafe: the binding layer depends on these names and on the
/// numeric representation tags. If one goes away, this stops compiling.
///
/// **DO NOT REMOVE** - This is part of the public API stability contract.
#[cfg(test)]
mod api_contract_self_test {
    use super::*;

    /// Tags cross the C boundary and are append-only
    #[test]
    fn repr_tags_api_contract() {
        assert_eq!(Repr::Int32.tag(), 0);
        assert_eq!(Repr::Float32.tag(), 1);
        assert_eq!(Repr::BFloat16.tag(), 2);
        assert_eq!(Repr::try_from(3), Err(Error::InvalidRepresentation(3)));
    }

    #[test]
    fn column_api_contract() {
        let _i = Column::new_int32(vec![1]);
        let _f = Column::new_float32(vec![1.0]);
        let _b = Column::new_bf16(&[1.0]);
        let c = Column::create(Repr::Float32, 3, 1.5).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(2), Ok(1.5));
    }

    #[test]
    fn registry_api_contract() {
        let mut reg = Registry::with_repr(Repr::Int32);
        reg.register("a", Column::new_int32(vec![1, 2])).unwrap();
        let _: Result<Column> = reg.evaluate("a");
        let _: Option<Column> = reg.unregister("a");
    }

    #[test]
    fn abi_symbols_api_contract() {
        let _: extern "C" fn() -> u32 = ffi::colfuse_abi_version;
        let _: extern "C" fn(u32, usize, f64) -> u64 = ffi::colfuse_column_create;
        let _: extern "C" fn(u64) = ffi::colfuse_column_destroy;
        let _: extern "C" fn() -> u64 = ffi::colfuse_registry_create;
        let _: unsafe extern "C" fn(u64, *const std::ffi::c_char) -> u64 = ffi::colfuse_eval;
    }
}

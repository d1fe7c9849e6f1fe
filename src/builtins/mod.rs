//! Built-in operations

pub mod kernels;
pub mod kernels_fused;
pub mod ops;

pub use kernels::{Arith, BinaryOp};
pub use ops::{binary_column, binary_column_scalar, max, min, mul_add_fused, mul_add_naive, sum};

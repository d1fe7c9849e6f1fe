//! Typed, fixed-length, densely packed column
//!
//! One representation per column, no per-element tags, no nulls.

use super::{Bf16, Repr, Scalar};
use crate::error::{Error, Result};

/// A typed column of data
///
/// The variant is the representation: it is chosen at creation and never
/// changes. Kernels borrow the raw slice through the `as_*_slice` accessors.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// 32-bit integer column, wrapping arithmetic
    Int32(Vec<i32>),

    /// IEEE binary32 column
    Float32(Vec<f32>),

    /// bfloat16 column; arithmetic runs in f32 and rounds back per operator
    BFloat16(Vec<Bf16>),
}

impl Column {
    /// Allocate `size` elements and broadcast `fill` converted to `repr`.
    ///
    /// Uses a fallible reservation so an impossible size surfaces as
    /// `Error::Allocation` instead of aborting the process.
    pub fn create(repr: Repr, size: usize, fill: f64) -> Result<Self> {
        if size == 0 {
            return Err(Error::Allocation { repr, size });
        }
        let col = match Scalar::convert(repr, fill) {
            Scalar::Int32(v) => Column::Int32(filled_vec(repr, size, v)?),
            Scalar::Float32(v) => Column::Float32(filled_vec(repr, size, v)?),
            Scalar::BFloat16(v) => Column::BFloat16(filled_vec(repr, size, v)?),
        };
        tracing::trace!(%repr, size, fill, "column created");
        Ok(col)
    }

    /// Create from a raw tag (ABI path)
    pub fn create_tagged(tag: u32, size: usize, fill: f64) -> Result<Self> {
        Column::create(Repr::try_from(tag)?, size, fill)
    }

    pub fn new_int32(data: Vec<i32>) -> Self {
        Column::Int32(data)
    }

    pub fn new_float32(data: Vec<f32>) -> Self {
        Column::Float32(data)
    }

    /// Rounds every value to bfloat16
    pub fn new_bf16(data: &[f32]) -> Self {
        Column::BFloat16(data.iter().map(|&v| Bf16::from_f32(v)).collect())
    }

    pub fn repr(&self) -> Repr {
        match self {
            Column::Int32(_) => Repr::Int32,
            Column::Float32(_) => Repr::Float32,
            Column::BFloat16(_) => Repr::BFloat16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int32(data) => data.len(),
            Column::Float32(data) => data.len(),
            Column::BFloat16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by the buffer
    pub fn byte_size(&self) -> usize {
        self.len() * self.repr().width()
    }

    /// Element `index` widened to f64 (exact for every representation)
    pub fn get(&self, index: usize) -> Result<f64> {
        let len = self.len();
        let out_of_bounds = || Error::IndexOutOfBounds { index, len };
        match self {
            Column::Int32(data) => data.get(index).map(|&v| v as f64),
            Column::Float32(data) => data.get(index).map(|&v| v as f64),
            Column::BFloat16(data) => data.get(index).map(|v| v.to_f64()),
        }
        .ok_or_else(out_of_bounds)
    }

    /// Element `index` as a typed scalar
    pub fn scalar_at(&self, index: usize) -> Result<Scalar> {
        let len = self.len();
        match self {
            Column::Int32(data) => data.get(index).map(|&v| Scalar::Int32(v)),
            Column::Float32(data) => data.get(index).map(|&v| Scalar::Float32(v)),
            Column::BFloat16(data) => data.get(index).map(|&v| Scalar::BFloat16(v)),
        }
        .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// All values widened to f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Column::Int32(data) => data.iter().map(|&v| v as f64).collect(),
            Column::Float32(data) => data.iter().map(|&v| v as f64).collect(),
            Column::BFloat16(data) => data.iter().map(|v| v.to_f64()).collect(),
        }
    }

    /// Raw Int32 slice for monomorphic kernels
    #[inline(always)]
    pub fn as_int32_slice(&self) -> Option<&[i32]> {
        match self {
            Column::Int32(data) => Some(data),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_float32_slice(&self) -> Option<&[f32]> {
        match self {
            Column::Float32(data) => Some(data),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_bf16_slice(&self) -> Option<&[Bf16]> {
        match self {
            Column::BFloat16(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable access; representation and length stay fixed
    pub fn as_int32_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Column::Int32(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_float32_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Column::Float32(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_bf16_mut(&mut self) -> Option<&mut [Bf16]> {
        match self {
            Column::BFloat16(data) => Some(data),
            _ => None,
        }
    }

    /// Check that `other` can be combined elementwise with `self`
    pub fn check_compatible(&self, other: &Column) -> Result<()> {
        if self.repr() != other.repr() {
            return Err(Error::TypeMismatch {
                left: self.repr(),
                right: other.repr(),
            });
        }
        if self.len() != other.len() {
            return Err(Error::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(())
    }
}

/// Fallible `vec![value; size]`
fn filled_vec<T: Copy>(repr: Repr, size: usize, value: T) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| Error::Allocation { repr, size })?;
    data.resize(size, value);
    Ok(data)
}

/// Output buffer for a kernel of known length
pub(crate) fn output_vec<T: Copy + Default>(repr: Repr, size: usize) -> Result<Vec<T>> {
    filled_vec(repr, size, T::default())
}

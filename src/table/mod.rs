//! Core column types and numeric representations

pub mod bf16;
pub mod column;

pub use bf16::Bf16;
pub use column::Column;

use std::fmt;

use crate::error::Error;

/// Storage representation of a column.
///
/// Discriminants are ABI tags: append new variants, never renumber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Repr {
    /// 32-bit two's-complement integer
    Int32 = 0,
    /// IEEE-754 binary32
    Float32 = 1,
    /// bfloat16 (8-bit exponent, 7-bit mantissa)
    BFloat16 = 2,
}

impl Repr {
    pub const ALL: [Repr; 3] = [Repr::Int32, Repr::Float32, Repr::BFloat16];

    /// Bytes per element
    pub const fn width(self) -> usize {
        match self {
            Repr::Int32 => 4,
            Repr::Float32 => 4,
            Repr::BFloat16 => 2,
        }
    }

    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Literal suffix marker (`2_i32`, `2.5_f32`, `2.0_bf16`)
    pub const fn marker(self) -> &'static str {
        match self {
            Repr::Int32 => "i32",
            Repr::Float32 => "f32",
            Repr::BFloat16 => "bf16",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Repr> {
        Repr::ALL.into_iter().find(|r| r.marker() == marker)
    }
}

impl TryFrom<u32> for Repr {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Repr::Int32),
            1 => Ok(Repr::Float32),
            2 => Ok(Repr::BFloat16),
            other => Err(Error::InvalidRepresentation(other)),
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Repr::Int32 => "int32",
            Repr::Float32 => "float32",
            Repr::BFloat16 => "bfloat16",
        })
    }
}

/// Scalar of one representation (literal operands, reductions)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Int32(i32),
    Float32(f32),
    BFloat16(Bf16),
}

impl Scalar {
    /// Convert a representation-independent f64 into `repr`.
    ///
    /// Int32 truncates toward zero and wraps; NaN becomes 0.
    pub fn convert(repr: Repr, value: f64) -> Scalar {
        match repr {
            Repr::Int32 => Scalar::Int32(wrap_i32(value)),
            Repr::Float32 => Scalar::Float32(value as f32),
            Repr::BFloat16 => Scalar::BFloat16(Bf16::from_f32(value as f32)),
        }
    }

    pub fn repr(&self) -> Repr {
        match self {
            Scalar::Int32(_) => Repr::Int32,
            Scalar::Float32(_) => Repr::Float32,
            Scalar::BFloat16(_) => Repr::BFloat16,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::Int32(v) => *v as f64,
            Scalar::Float32(v) => *v as f64,
            Scalar::BFloat16(v) => v.to_f64(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.to_f64() == 0.0
    }

    pub fn is_one(&self) -> bool {
        self.to_f64() == 1.0
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int32(v) => write!(f, "{v}_i32"),
            Scalar::Float32(v) => write!(f, "{v}_f32"),
            Scalar::BFloat16(v) => write!(f, "{v}_bf16"),
        }
    }
}

/// f64 -> i32 with two's-complement wrap past the 32-bit range.
///
/// `as i64` saturates beyond 2^63; the 32-bit wrap happens below that.
#[inline]
pub fn wrap_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    (value.trunc() as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_tags_stable() {
        assert_eq!(Repr::Int32.tag(), 0);
        assert_eq!(Repr::Float32.tag(), 1);
        assert_eq!(Repr::BFloat16.tag(), 2);
        assert_eq!(Repr::try_from(2).unwrap(), Repr::BFloat16);
        assert_eq!(Repr::try_from(3), Err(Error::InvalidRepresentation(3)));
    }

    #[test]
    fn test_markers() {
        assert_eq!(Repr::from_marker("bf16"), Some(Repr::BFloat16));
        assert_eq!(Repr::from_marker("i64"), None);
    }

    #[test]
    fn test_wrap_i32() {
        assert_eq!(wrap_i32(10.9), 10);
        assert_eq!(wrap_i32(-10.9), -10);
        assert_eq!(wrap_i32(2_147_483_648.0), i32::MIN);
        assert_eq!(wrap_i32(4_294_967_297.0), 1);
        assert_eq!(wrap_i32(f64::NAN), 0);
    }
}

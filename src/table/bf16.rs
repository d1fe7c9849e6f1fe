//! Brain float 16: 1 sign bit, 8 exponent bits, 7 mantissa bits
//!
//! The top half of an IEEE binary32. Same exponent range as f32, so
//! conversion never overflows; only mantissa precision is lost.

use std::fmt;

/// Reduced-precision float stored as raw bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Bf16(u16);

impl Bf16 {
    pub const ZERO: Bf16 = Bf16(0);
    pub const ONE: Bf16 = Bf16(0x3F80);

    #[inline(always)]
    pub const fn from_bits(bits: u16) -> Self {
        Bf16(bits)
    }

    #[inline(always)]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Round-to-nearest, ties-to-even on the 7 mantissa bits.
    ///
    /// NaN keeps its sign and top payload bits with the quiet bit forced,
    /// so a payload living only in the low half can't collapse into Inf.
    #[inline(always)]
    pub fn from_f32(value: f32) -> Self {
        let bits = value.to_bits();
        if value.is_nan() {
            return Bf16(((bits >> 16) as u16) | 0x0040);
        }
        let lsb = (bits >> 16) & 1;
        let rounding_bias = 0x7FFF + lsb;
        Bf16((bits.wrapping_add(rounding_bias) >> 16) as u16)
    }

    /// Plain truncation (drops the low 16 bits).
    #[inline(always)]
    pub fn from_f32_truncate(value: f32) -> Self {
        Bf16((value.to_bits() >> 16) as u16)
    }

    #[inline(always)]
    pub fn to_f32(self) -> f32 {
        f32::from_bits((self.0 as u32) << 16)
    }

    #[inline(always)]
    pub fn to_f64(self) -> f64 {
        self.to_f32() as f64
    }

    pub fn is_nan(self) -> bool {
        self.to_f32().is_nan()
    }
}

impl From<f32> for Bf16 {
    fn from(value: f32) -> Self {
        Bf16::from_f32(value)
    }
}

impl From<Bf16> for f32 {
    fn from(value: Bf16) -> Self {
        value.to_f32()
    }
}

impl fmt::Debug for Bf16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_bf16", self.to_f32())
    }
}

impl fmt::Display for Bf16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}

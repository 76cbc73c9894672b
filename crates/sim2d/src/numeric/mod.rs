//! Scalar representations for the three numeric slots.
//!
//! Pressure, velocity, and flow each pick their own scalar type: a native
//! float (`f32`/`f64`) or a Q-format fixed-point ([`Fixed`]). Generic solver
//! code never mixes slots implicitly — every cross-slot value goes through
//! [`Scalar::from_scalar`], so precision changes are visible at the call
//! site.

mod fixed;

pub use fixed::{Fixed, Fixed16, Fixed32, Fixed64, Fixed8, Storage};

use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

use rand::Rng;

/// The arithmetic-and-conversion capability set shared by every scalar
/// representation.
pub trait Scalar:
    Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn from_int(v: i64) -> Self;
    fn from_f64(v: f64) -> Self;

    /// The represented value as a double. Exact for floats; for fixed-point
    /// this is `raw * 2^-K`.
    fn to_f64(self) -> f64;

    fn abs(self) -> Self;

    #[inline]
    fn zero() -> Self {
        Self::from_int(0)
    }

    #[inline]
    fn one() -> Self {
        Self::from_int(1)
    }

    /// Q-format view `(raw, frac_bits)` of this value, when there is one.
    /// Floats return `None`.
    #[inline]
    fn q_parts(self) -> Option<(i128, u32)> {
        None
    }

    /// Rebuild from a Q-format view, arithmetic-shifting across a differing
    /// fractional width. Floats return `None` and take the `f64` path in
    /// [`Scalar::from_scalar`] instead.
    #[inline]
    fn from_q_parts(raw: i128, frac_bits: u32) -> Option<Self> {
        let _ = (raw, frac_bits);
        None
    }

    /// Explicit conversion from any other scalar representation.
    ///
    /// Fixed-to-fixed goes raw-to-raw with a shift by the frac-bits
    /// difference, so no precision is lost beyond the destination's own.
    /// Every other pairing goes through `f64`.
    #[inline]
    fn from_scalar<S: Scalar>(v: S) -> Self {
        if let Some((raw, k)) = v.q_parts() {
            if let Some(out) = Self::from_q_parts(raw, k) {
                return out;
            }
        }
        Self::from_f64(v.to_f64())
    }

    /// Uniform draw in `[0, 1)`, consuming exactly one 64-bit value from the
    /// generator regardless of the scalar type. Keeping the consumption
    /// fixed lets runs that differ only in the numeric triple share a random
    /// stream until their trajectories diverge.
    fn rand01<R: Rng>(rng: &mut R) -> Self;

    #[inline]
    fn min(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }
}

impl Scalar for f32 {
    #[inline]
    fn from_int(v: i64) -> Self {
        v as f32
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }

    #[inline]
    fn rand01<R: Rng>(rng: &mut R) -> Self {
        // Top 24 bits of one u64 draw; strictly below 1.0 so a scaled draw
        // can never land past the last prefix-sum bucket.
        (rng.gen::<u64>() >> 40) as f32 * (1.0 / (1u64 << 24) as f32)
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_int(v: i64) -> Self {
        v as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline]
    fn rand01<R: Rng>(rng: &mut R) -> Self {
        (rng.gen::<u64>() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

//! Q-format fixed-point scalars.
//!
//! `Fixed<I, K>` is a signed two's-complement integer `I` whose low `K` bits
//! are fractional: the represented value is `raw * 2^-K`. Multiplication
//! widens to the next integer width before shifting back down by `K`;
//! division shifts the dividend up by `K` first. Overflow wraps.
//!
//! The storage width is picked by type (`Fixed32<16>` is `Fixed<i32, 16>`);
//! there is no separate "fast" variant — on this side of the fence a wider
//! storage integer *is* the fast representation.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Shl, Shr, Sub};

use rand::Rng;

use crate::numeric::Scalar;

/// Storage integer for a fixed-point scalar.
///
/// `Wide` is the next width up, so a product of two raws always fits before
/// the corrective shift. Implemented for `i8`/`i16`/`i32`/`i64`.
pub trait Storage:
    Copy + Clone + fmt::Debug + Default + Eq + Ord + std::hash::Hash
{
    type Wide: Copy
        + Mul<Output = Self::Wide>
        + Div<Output = Self::Wide>
        + Shl<u32, Output = Self::Wide>
        + Shr<u32, Output = Self::Wide>;

    const BITS: u32;
    const ZERO: Self;

    fn widen(self) -> Self::Wide;
    fn narrow(wide: Self::Wide) -> Self;
    fn to_i128(self) -> i128;
    fn truncate(v: i128) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
}

macro_rules! impl_storage {
    ($($int:ty => $wide:ty),* $(,)?) => {$(
        impl Storage for $int {
            type Wide = $wide;

            const BITS: u32 = <$int>::BITS;
            const ZERO: Self = 0;

            #[inline]
            fn widen(self) -> $wide {
                self as $wide
            }

            #[inline]
            fn narrow(wide: $wide) -> Self {
                wide as $int
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn truncate(v: i128) -> Self {
                v as $int
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$int>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$int>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn wrapping_neg(self) -> Self {
                <$int>::wrapping_neg(self)
            }
        }
    )*};
}

impl_storage!(i8 => i16, i16 => i32, i32 => i64, i64 => i128);

/// Signed Q-format number: `raw * 2^-K`. `K` must be below the storage
/// width.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Fixed<I: Storage, const K: u32> {
    raw: I,
}

pub type Fixed8<const K: u32> = Fixed<i8, K>;
pub type Fixed16<const K: u32> = Fixed<i16, K>;
pub type Fixed32<const K: u32> = Fixed<i32, K>;
pub type Fixed64<const K: u32> = Fixed<i64, K>;

impl<I: Storage, const K: u32> Fixed<I, K> {
    /// Fractional bits in the representation.
    pub const FRAC_BITS: u32 = K;

    /// Wrap a raw mantissa without scaling.
    #[inline]
    pub fn from_raw(raw: I) -> Self {
        Self { raw }
    }

    /// The raw mantissa.
    #[inline]
    pub fn raw(self) -> I {
        self.raw
    }
}

impl<I: Storage, const K: u32> Add for Fixed<I, K> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            raw: self.raw.wrapping_add(rhs.raw),
        }
    }
}

impl<I: Storage, const K: u32> Sub for Fixed<I, K> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            raw: self.raw.wrapping_sub(rhs.raw),
        }
    }
}

impl<I: Storage, const K: u32> Mul for Fixed<I, K> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            raw: I::narrow((self.raw.widen() * rhs.raw.widen()) >> K),
        }
    }
}

impl<I: Storage, const K: u32> Div for Fixed<I, K> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self {
            raw: I::narrow((self.raw.widen() << K) / rhs.raw.widen()),
        }
    }
}

impl<I: Storage, const K: u32> Neg for Fixed<I, K> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            raw: self.raw.wrapping_neg(),
        }
    }
}

impl<I: Storage, const K: u32> Scalar for Fixed<I, K> {
    #[inline]
    fn from_int(v: i64) -> Self {
        Self {
            raw: I::truncate((v as i128) << K),
        }
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        Self {
            raw: I::truncate((v * (1i128 << K) as f64) as i128),
        }
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self.raw.to_i128() as f64 / (1i128 << K) as f64
    }

    #[inline]
    fn abs(self) -> Self {
        if self.raw < I::ZERO {
            -self
        } else {
            self
        }
    }

    #[inline]
    fn q_parts(self) -> Option<(i128, u32)> {
        Some((self.raw.to_i128(), K))
    }

    #[inline]
    fn from_q_parts(raw: i128, frac_bits: u32) -> Option<Self> {
        let shifted = if frac_bits > K {
            raw >> (frac_bits - K)
        } else {
            raw << (K - frac_bits)
        };
        Some(Self {
            raw: I::truncate(shifted),
        })
    }

    /// The low `K` bits of one 64-bit draw, read as a pure fraction.
    #[inline]
    fn rand01<R: Rng>(rng: &mut R) -> Self {
        let mask = (1u64 << K).wrapping_sub(1);
        Self {
            raw: I::truncate((rng.gen::<u64>() & mask) as i128),
        }
    }
}

impl<I: Storage, const K: u32> fmt::Debug for Fixed<I, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed<{}, {}>({})", I::BITS, K, self.to_f64())
    }
}

impl<I: Storage, const K: u32> fmt::Display for Fixed<I, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

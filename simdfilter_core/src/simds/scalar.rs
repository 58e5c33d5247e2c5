//! Portable scalar emulation of a 256-bit register.
//!
//! Works on every target and is the reference the hardware extensions are
//! checked against. Lanes are plain arrays; loops are left to the
//! auto-vectorizer.

use super::primitives::{NativeSupport, Primitives};
use super::{BaseType, ExtensionKind, Simd, TargetExtension};

const LANES: usize = 4;

/// Four 64-bit lanes, aligned like a 256-bit register.
#[repr(C, align(32))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lanes(pub [i64; LANES]);

#[derive(Debug, Clone, Copy, Default)]
pub struct Scalar;

impl<B: BaseType> TargetExtension<B> for Scalar {
    const KIND: ExtensionKind = ExtensionKind::Scalar;
    const DEFAULT_SIZE_IN_BITS: usize = 256;

    type Register = Lanes;
    type Mask = Lanes;

    fn is_supported() -> bool {
        true
    }
}

#[inline(always)]
fn lane_flag(flag: bool) -> i64 {
    if flag { -1 } else { 0 }
}

impl Primitives for Simd<i64, Scalar> {
    const NATIVE: NativeSupport = NativeSupport {
        gather: false,
        ..NativeSupport::ALL
    };

    #[inline(always)]
    unsafe fn load(memory: *const i64) -> Lanes {
        unsafe { *(memory as *const Lanes) }
    }

    #[inline(always)]
    unsafe fn loadu(memory: *const i64) -> Lanes {
        unsafe { Lanes(core::ptr::read_unaligned(memory as *const [i64; LANES])) }
    }

    #[inline(always)]
    unsafe fn storeu(memory: *mut i64, vec: Lanes) {
        unsafe { core::ptr::write_unaligned(memory as *mut [i64; LANES], vec.0) }
    }

    #[inline(always)]
    unsafe fn set1(value: i64) -> Lanes {
        Lanes([value; LANES])
    }

    #[inline(always)]
    unsafe fn between_inclusive(data: Lanes, min: Lanes, max: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| {
            lane_flag(min.0[i] <= data.0[i] && data.0[i] <= max.0[i])
        }))
    }

    #[inline(always)]
    unsafe fn equal(a: Lanes, b: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| lane_flag(a.0[i] == b.0[i])))
    }

    #[inline(always)]
    unsafe fn gather(source: Lanes, memory: *const i64, index: Lanes, mask: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| {
            if mask.0[i] < 0 {
                unsafe { *memory.add(index.0[i] as usize) }
            } else {
                source.0[i]
            }
        }))
    }

    #[inline(always)]
    unsafe fn to_integral(mask: Lanes) -> u64 {
        unsafe { Self::get_msb(mask) }
    }

    #[inline(always)]
    unsafe fn from_integral(bits: u64) -> Lanes {
        Lanes(std::array::from_fn(|i| lane_flag(bits & (1 << i) != 0)))
    }

    #[inline(always)]
    unsafe fn to_vector(mask: Lanes) -> Lanes {
        mask
    }

    #[inline(always)]
    unsafe fn get_msb(vec: Lanes) -> u64 {
        vec.0
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, lane)| acc | (((*lane as u64) >> 63) << i))
    }

    #[inline(always)]
    unsafe fn add(a: Lanes, b: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| a.0[i].wrapping_add(b.0[i])))
    }

    #[inline(always)]
    unsafe fn mullo(a: Lanes, b: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| a.0[i].wrapping_mul(b.0[i])))
    }

    #[inline(always)]
    unsafe fn and(a: Lanes, b: Lanes) -> Lanes {
        Lanes(std::array::from_fn(|i| a.0[i] & b.0[i]))
    }
}

// NEON (aarch64, 128-bit) primitives.
//
// NEON has no movemask, no gather and no 64-bit multiply; those go
// through the lanes.

use std::arch::aarch64::*;

use super::primitives::{NativeSupport, Primitives};
use super::{BaseType, ExtensionKind, Simd, TargetExtension};

#[derive(Debug, Clone, Copy, Default)]
pub struct Neon;

impl<B: BaseType> TargetExtension<B> for Neon {
    const KIND: ExtensionKind = ExtensionKind::Neon;
    const DEFAULT_SIZE_IN_BITS: usize = 128;

    type Register = int64x2_t;
    type Mask = uint64x2_t;
}

impl Primitives for Simd<i64, Neon> {
    const NATIVE: NativeSupport = NativeSupport {
        gather: false,
        to_integral: false,
        from_integral: false,
        get_msb: false,
        mullo: false,
        ..NativeSupport::ALL
    };

    #[inline(always)]
    unsafe fn load(memory: *const i64) -> int64x2_t {
        unsafe { vld1q_s64(memory) }
    }

    #[inline(always)]
    unsafe fn loadu(memory: *const i64) -> int64x2_t {
        unsafe { vld1q_s64(memory) }
    }

    #[inline(always)]
    unsafe fn storeu(memory: *mut i64, vec: int64x2_t) {
        unsafe { vst1q_s64(memory, vec) }
    }

    #[inline(always)]
    unsafe fn set1(value: i64) -> int64x2_t {
        unsafe { vdupq_n_s64(value) }
    }

    #[inline(always)]
    unsafe fn between_inclusive(data: int64x2_t, min: int64x2_t, max: int64x2_t) -> uint64x2_t {
        unsafe { vandq_u64(vcgeq_s64(data, min), vcleq_s64(data, max)) }
    }

    #[inline(always)]
    unsafe fn equal(a: int64x2_t, b: int64x2_t) -> uint64x2_t {
        unsafe { vceqq_s64(a, b) }
    }

    #[inline(always)]
    unsafe fn gather(
        source: int64x2_t,
        memory: *const i64,
        index: int64x2_t,
        mask: uint64x2_t,
    ) -> int64x2_t {
        unsafe {
            let lane0 = if vgetq_lane_u64::<0>(mask) >> 63 != 0 {
                *memory.add(vgetq_lane_s64::<0>(index) as usize)
            } else {
                vgetq_lane_s64::<0>(source)
            };
            let lane1 = if vgetq_lane_u64::<1>(mask) >> 63 != 0 {
                *memory.add(vgetq_lane_s64::<1>(index) as usize)
            } else {
                vgetq_lane_s64::<1>(source)
            };
            let lanes = [lane0, lane1];
            vld1q_s64(lanes.as_ptr())
        }
    }

    #[inline(always)]
    unsafe fn to_integral(mask: uint64x2_t) -> u64 {
        unsafe { ((vgetq_lane_u64::<1>(mask) >> 62) & 0b10) | (vgetq_lane_u64::<0>(mask) >> 63) }
    }

    #[inline(always)]
    unsafe fn from_integral(bits: u64) -> uint64x2_t {
        let lanes = [0u64.wrapping_sub(bits & 1), 0u64.wrapping_sub((bits >> 1) & 1)];
        unsafe { vld1q_u64(lanes.as_ptr()) }
    }

    #[inline(always)]
    unsafe fn to_vector(mask: uint64x2_t) -> int64x2_t {
        unsafe { vreinterpretq_s64_u64(mask) }
    }

    #[inline(always)]
    unsafe fn get_msb(vec: int64x2_t) -> u64 {
        unsafe { Self::to_integral(vreinterpretq_u64_s64(vec)) }
    }

    #[inline(always)]
    unsafe fn add(a: int64x2_t, b: int64x2_t) -> int64x2_t {
        unsafe { vaddq_s64(a, b) }
    }

    #[inline(always)]
    unsafe fn mullo(a: int64x2_t, b: int64x2_t) -> int64x2_t {
        unsafe {
            let lanes = [
                vgetq_lane_s64::<0>(a).wrapping_mul(vgetq_lane_s64::<0>(b)),
                vgetq_lane_s64::<1>(a).wrapping_mul(vgetq_lane_s64::<1>(b)),
            ];
            vld1q_s64(lanes.as_ptr())
        }
    }

    #[inline(always)]
    unsafe fn and(a: int64x2_t, b: int64x2_t) -> int64x2_t {
        unsafe { vandq_s64(a, b) }
    }
}

// SSE4.2 (128-bit) primitives.
//
// 64-bit signed compares need SSE4.2 (`pcmpgtq`) and SSE4.1 (`pcmpeqq`).
// There is no gather and no 64-bit low multiply; both are emulated.

use std::arch::x86_64::*;

use super::primitives::{NativeSupport, Primitives};
use super::{BaseType, ExtensionKind, Simd, TargetExtension};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sse;

impl<B: BaseType> TargetExtension<B> for Sse {
    const KIND: ExtensionKind = ExtensionKind::Sse;
    const DEFAULT_SIZE_IN_BITS: usize = 128;

    type Register = __m128i;
    type Mask = __m128i;
}

impl Primitives for Simd<i64, Sse> {
    const NATIVE: NativeSupport = NativeSupport {
        gather: false,
        from_integral: false,
        mullo: false,
        ..NativeSupport::ALL
    };

    #[inline(always)]
    unsafe fn load(memory: *const i64) -> __m128i {
        unsafe { _mm_load_si128(memory as *const __m128i) }
    }

    #[inline(always)]
    unsafe fn loadu(memory: *const i64) -> __m128i {
        unsafe { _mm_loadu_si128(memory as *const __m128i) }
    }

    #[inline(always)]
    unsafe fn storeu(memory: *mut i64, vec: __m128i) {
        unsafe { _mm_storeu_si128(memory as *mut __m128i, vec) }
    }

    #[inline(always)]
    unsafe fn set1(value: i64) -> __m128i {
        unsafe { _mm_set1_epi64x(value) }
    }

    #[inline(always)]
    unsafe fn between_inclusive(data: __m128i, min: __m128i, max: __m128i) -> __m128i {
        unsafe {
            _mm_andnot_si128(
                _mm_cmpgt_epi64(min, data),
                _mm_andnot_si128(_mm_cmpgt_epi64(data, max), _mm_set1_epi64x(-1)),
            )
        }
    }

    #[inline(always)]
    unsafe fn equal(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_cmpeq_epi64(a, b) }
    }

    #[inline(always)]
    unsafe fn gather(source: __m128i, memory: *const i64, index: __m128i, mask: __m128i) -> __m128i {
        unsafe {
            let selected = Self::to_integral(mask);
            let lane0 = if selected & 0b01 != 0 {
                *memory.add(_mm_cvtsi128_si64(index) as usize)
            } else {
                _mm_cvtsi128_si64(source)
            };
            let lane1 = if selected & 0b10 != 0 {
                *memory.add(_mm_extract_epi64::<1>(index) as usize)
            } else {
                _mm_extract_epi64::<1>(source)
            };
            _mm_set_epi64x(lane1, lane0)
        }
    }

    #[inline(always)]
    unsafe fn to_integral(mask: __m128i) -> u64 {
        unsafe { _mm_movemask_pd(_mm_castsi128_pd(mask)) as u64 }
    }

    #[inline(always)]
    unsafe fn from_integral(bits: u64) -> __m128i {
        let lane = |bit: u64| -(((bits >> bit) & 1) as i64);
        unsafe { _mm_set_epi64x(lane(1), lane(0)) }
    }

    #[inline(always)]
    unsafe fn to_vector(mask: __m128i) -> __m128i {
        mask
    }

    #[inline(always)]
    unsafe fn get_msb(vec: __m128i) -> u64 {
        unsafe { _mm_movemask_pd(_mm_castsi128_pd(vec)) as u64 }
    }

    #[inline(always)]
    unsafe fn add(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_add_epi64(a, b) }
    }

    #[inline(always)]
    unsafe fn mullo(a: __m128i, b: __m128i) -> __m128i {
        // lo(a)*lo(b) + ((hi(a)*lo(b) + lo(a)*hi(b)) << 32)
        unsafe {
            let a_hi = _mm_srli_epi64::<32>(a);
            let b_hi = _mm_srli_epi64::<32>(b);
            let lo_lo = _mm_mul_epu32(a, b);
            let cross = _mm_add_epi64(_mm_mul_epu32(a_hi, b), _mm_mul_epu32(a, b_hi));
            _mm_add_epi64(lo_lo, _mm_slli_epi64::<32>(cross))
        }
    }

    #[inline(always)]
    unsafe fn and(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_and_si128(a, b) }
    }
}

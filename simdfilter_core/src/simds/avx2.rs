// AVX2 (256-bit) primitives.
//
// Masks are vector shaped. The masked gather is native; the 64-bit low
// multiply (AVX-512DQ only) and integer-to-mask expansion are emulated.

use std::arch::x86_64::*;

use super::primitives::{NativeSupport, Primitives};
use super::{BaseType, ExtensionKind, Simd, TargetExtension};

#[derive(Debug, Clone, Copy, Default)]
pub struct Avx2;

impl<B: BaseType> TargetExtension<B> for Avx2 {
    const KIND: ExtensionKind = ExtensionKind::Avx2;
    const DEFAULT_SIZE_IN_BITS: usize = 256;

    type Register = __m256i;
    type Mask = __m256i;
}

impl Primitives for Simd<i64, Avx2> {
    const NATIVE: NativeSupport = NativeSupport {
        from_integral: false,
        mullo: false,
        ..NativeSupport::ALL
    };

    #[inline(always)]
    unsafe fn load(memory: *const i64) -> __m256i {
        unsafe { _mm256_load_si256(memory as *const __m256i) }
    }

    #[inline(always)]
    unsafe fn loadu(memory: *const i64) -> __m256i {
        unsafe { _mm256_loadu_si256(memory as *const __m256i) }
    }

    #[inline(always)]
    unsafe fn storeu(memory: *mut i64, vec: __m256i) {
        unsafe { _mm256_storeu_si256(memory as *mut __m256i, vec) }
    }

    #[inline(always)]
    unsafe fn set1(value: i64) -> __m256i {
        unsafe { _mm256_set1_epi64x(value) }
    }

    #[inline(always)]
    unsafe fn between_inclusive(data: __m256i, min: __m256i, max: __m256i) -> __m256i {
        unsafe {
            _mm256_andnot_si256(
                _mm256_cmpgt_epi64(min, data),
                _mm256_andnot_si256(_mm256_cmpgt_epi64(data, max), _mm256_set1_epi64x(-1)),
            )
        }
    }

    #[inline(always)]
    unsafe fn equal(a: __m256i, b: __m256i) -> __m256i {
        unsafe { _mm256_cmpeq_epi64(a, b) }
    }

    #[inline(always)]
    unsafe fn gather(source: __m256i, memory: *const i64, index: __m256i, mask: __m256i) -> __m256i {
        unsafe { _mm256_mask_i64gather_epi64::<8>(source, memory, index, mask) }
    }

    #[inline(always)]
    unsafe fn to_integral(mask: __m256i) -> u64 {
        unsafe { _mm256_movemask_pd(_mm256_castsi256_pd(mask)) as u64 }
    }

    #[inline(always)]
    unsafe fn from_integral(bits: u64) -> __m256i {
        unsafe {
            let lane_bits = _mm256_setr_epi64x(1, 2, 4, 8);
            let spread = _mm256_and_si256(_mm256_set1_epi64x(bits as i64), lane_bits);
            _mm256_cmpeq_epi64(spread, lane_bits)
        }
    }

    #[inline(always)]
    unsafe fn to_vector(mask: __m256i) -> __m256i {
        mask
    }

    #[inline(always)]
    unsafe fn get_msb(vec: __m256i) -> u64 {
        unsafe { _mm256_movemask_pd(_mm256_castsi256_pd(vec)) as u64 }
    }

    #[inline(always)]
    unsafe fn add(a: __m256i, b: __m256i) -> __m256i {
        unsafe { _mm256_add_epi64(a, b) }
    }

    #[inline(always)]
    unsafe fn mullo(a: __m256i, b: __m256i) -> __m256i {
        unsafe {
            let a_hi = _mm256_srli_epi64::<32>(a);
            let b_hi = _mm256_srli_epi64::<32>(b);
            let lo_lo = _mm256_mul_epu32(a, b);
            let cross = _mm256_add_epi64(_mm256_mul_epu32(a_hi, b), _mm256_mul_epu32(a, b_hi));
            _mm256_add_epi64(lo_lo, _mm256_slli_epi64::<32>(cross))
        }
    }

    #[inline(always)]
    unsafe fn and(a: __m256i, b: __m256i) -> __m256i {
        unsafe { _mm256_and_si256(a, b) }
    }
}

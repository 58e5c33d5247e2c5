// AVX-512F (512-bit) primitives.
//
// Masks are `__mmask8` registers, one bit per lane, so the mask/integer
// conversions are plain casts. MSB extraction (`vpmovq2m`) and the 64-bit
// low multiply (`vpmullq`) belong to AVX-512DQ and are emulated here.

use std::arch::x86_64::*;

use super::primitives::{NativeSupport, Primitives};
use super::{BaseType, ExtensionKind, Simd, TargetExtension};

#[derive(Debug, Clone, Copy, Default)]
pub struct Avx512;

impl<B: BaseType> TargetExtension<B> for Avx512 {
    const KIND: ExtensionKind = ExtensionKind::Avx512;
    const DEFAULT_SIZE_IN_BITS: usize = 512;

    type Register = __m512i;
    type Mask = __mmask8;
}

impl Primitives for Simd<i64, Avx512> {
    const NATIVE: NativeSupport = NativeSupport {
        get_msb: false,
        mullo: false,
        ..NativeSupport::ALL
    };

    #[inline(always)]
    unsafe fn load(memory: *const i64) -> __m512i {
        unsafe { _mm512_load_si512(memory as *const _) }
    }

    #[inline(always)]
    unsafe fn loadu(memory: *const i64) -> __m512i {
        unsafe { _mm512_loadu_si512(memory as *const _) }
    }

    #[inline(always)]
    unsafe fn storeu(memory: *mut i64, vec: __m512i) {
        unsafe { _mm512_storeu_si512(memory as *mut _, vec) }
    }

    #[inline(always)]
    unsafe fn set1(value: i64) -> __m512i {
        unsafe { _mm512_set1_epi64(value) }
    }

    #[inline(always)]
    unsafe fn between_inclusive(data: __m512i, min: __m512i, max: __m512i) -> __mmask8 {
        unsafe { _mm512_mask_cmple_epi64_mask(_mm512_cmple_epi64_mask(min, data), data, max) }
    }

    #[inline(always)]
    unsafe fn equal(a: __m512i, b: __m512i) -> __mmask8 {
        unsafe { _mm512_cmpeq_epi64_mask(a, b) }
    }

    #[inline(always)]
    unsafe fn gather(source: __m512i, memory: *const i64, index: __m512i, mask: __mmask8) -> __m512i {
        unsafe { _mm512_mask_i64gather_epi64::<8>(source, mask, index, memory as *const _) }
    }

    #[inline(always)]
    unsafe fn to_integral(mask: __mmask8) -> u64 {
        mask as u64
    }

    #[inline(always)]
    unsafe fn from_integral(bits: u64) -> __mmask8 {
        bits as __mmask8
    }

    #[inline(always)]
    unsafe fn to_vector(mask: __mmask8) -> __m512i {
        unsafe { _mm512_maskz_set1_epi64(mask, -1) }
    }

    #[inline(always)]
    unsafe fn get_msb(vec: __m512i) -> u64 {
        unsafe { _mm512_cmplt_epi64_mask(vec, _mm512_setzero_si512()) as u64 }
    }

    #[inline(always)]
    unsafe fn add(a: __m512i, b: __m512i) -> __m512i {
        unsafe { _mm512_add_epi64(a, b) }
    }

    #[inline(always)]
    unsafe fn mullo(a: __m512i, b: __m512i) -> __m512i {
        unsafe {
            let a_hi = _mm512_srli_epi64::<32>(a);
            let b_hi = _mm512_srli_epi64::<32>(b);
            let lo_lo = _mm512_mul_epu32(a, b);
            let cross = _mm512_add_epi64(_mm512_mul_epu32(a_hi, b), _mm512_mul_epu32(a, b_hi));
            _mm512_add_epi64(lo_lo, _mm512_slli_epi64::<32>(cross))
        }
    }

    #[inline(always)]
    unsafe fn and(a: __m512i, b: __m512i) -> __m512i {
        unsafe { _mm512_and_si512(a, b) }
    }
}

#[cfg(test)]
mod tests {
    use std::arch::x86_64::__m512i;

    use crate::simds::primitives::{self as ops, Native, Workaround, conformance};
    use crate::simds::{Avx512I64, VectorDescriptor};

    fn lanes(vec: __m512i) -> [i64; 8] {
        let mut out = [0i64; 8];
        unsafe { ops::storeu::<Avx512I64, Native>(out.as_mut_ptr(), vec) };
        out
    }

    #[test]
    fn avx512_primitives_conform() {
        conformance::check_all::<Avx512I64>();
    }

    #[test]
    fn native_primitives_match_workarounds() {
        if !Avx512I64::is_supported() {
            return;
        }
        let table: Vec<i64> = (0..64).map(|i| i * 13 + 1).collect();
        let data = [-40i64, 5, 600, -50, 0, 10, 11, i64::MIN];
        let index = [3i64, 63, 0, 17, 40, 1, 2, 5];
        unsafe {
            let x = ops::loadu::<Avx512I64, Native>(data.as_ptr());
            assert_eq!(lanes(x), lanes(ops::loadu::<Avx512I64, Workaround>(data.as_ptr())));
            assert_eq!(lanes(x), data);

            let low = ops::set1::<Avx512I64, Native>(-45);
            let high = ops::set1::<Avx512I64, Native>(10);
            let range = ops::between_inclusive::<Avx512I64, Native>(x, low, high);
            let range_bits = ops::to_integral::<Avx512I64, Native>(range);
            assert_eq!(
                range_bits,
                ops::to_integral::<Avx512I64, Workaround>(ops::between_inclusive::<Avx512I64, Workaround>(
                    x, low, high
                ))
            );
            assert_eq!(range_bits, 0b0011_0011);

            let zero = ops::set1::<Avx512I64, Native>(0);
            let eq_bits = ops::to_integral::<Avx512I64, Native>(ops::equal::<Avx512I64, Native>(x, zero));
            assert_eq!(
                eq_bits,
                ops::to_integral::<Avx512I64, Workaround>(ops::equal::<Avx512I64, Workaround>(x, zero))
            );
            assert_eq!(eq_bits, 0b0001_0000);

            let indices = ops::loadu::<Avx512I64, Native>(index.as_ptr());
            let fallback = ops::set1::<Avx512I64, Native>(-1);
            let mask = ops::from_integral::<Avx512I64, Native>(range_bits);
            let native = ops::gather::<Avx512I64, Native>(fallback, table.as_ptr(), indices, mask);
            let workaround = ops::gather::<Avx512I64, Workaround>(fallback, table.as_ptr(), indices, range);
            assert_eq!(lanes(native), lanes(workaround));
            assert_eq!(
                lanes(native),
                [table[3], table[63], -1, -1, table[40], table[1], -1, -1]
            );
        }
    }
}

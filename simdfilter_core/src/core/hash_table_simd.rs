// target_feature entry points for the hash table filter.
//
// Each function only enables an extension and calls the filter's
// `#[inline(always)]` kernels, which lets the primitive intrinsics inline as
// single instructions. Selection happens in `hash_table.rs` on the
// descriptor's extension.

use crate::core::hash_table::BigintValuesUsingHashTable;
use crate::simds::{ImplementationDegreeOfFreedom, Primitives};

#[target_feature(enable = "sse4.2")]
pub(super) unsafe fn test_register_sse42<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    x: V::Register,
) -> V::Register {
    unsafe { filter.register_kernel(x) }
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn test_register_avx2<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    x: V::Register,
) -> V::Register {
    unsafe { filter.register_kernel(x) }
}

#[target_feature(enable = "avx512f")]
pub(super) unsafe fn test_register_avx512<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    x: V::Register,
) -> V::Register {
    unsafe { filter.register_kernel(x) }
}

#[target_feature(enable = "sse4.2")]
pub(super) unsafe fn count_matches_sse42<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    data: &[i64],
) -> u64 {
    unsafe { filter.count_kernel(data) }
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn count_matches_avx2<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    data: &[i64],
) -> u64 {
    unsafe { filter.count_kernel(data) }
}

#[target_feature(enable = "avx512f")]
pub(super) unsafe fn count_matches_avx512<V: Primitives, I: ImplementationDegreeOfFreedom>(
    filter: &BigintValuesUsingHashTable<V, I>,
    data: &[i64],
) -> u64 {
    unsafe { filter.count_kernel(data) }
}

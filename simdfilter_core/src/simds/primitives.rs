//! The primitive operation set.
//!
//! Every descriptor implements [`Primitives`]. Each operation is either a
//! single instruction of the extension (native) or a short sequence that
//! reproduces the same bit-level result (workaround); [`NativeSupport`]
//! records which. The free functions at the bottom of this module are the
//! entry points generic code should use: they take an
//! [`ImplementationDegreeOfFreedom`] parameter, and instantiating one with
//! [`Native`] on an operation that has no native form fails the build.
//!
//! Lane conventions shared by all extensions:
//! - a vector-shaped mask lane is all ones (`-1`) for true and `0` for false;
//! - an integer mask has bit `i` set when lane `i` is true.

use std::fmt;

use super::VectorDescriptor;

/// Which operations map to a single instruction on an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSupport {
    pub load: bool,
    pub loadu: bool,
    pub storeu: bool,
    pub set1: bool,
    pub between_inclusive: bool,
    pub equal: bool,
    pub gather: bool,
    pub to_integral: bool,
    pub from_integral: bool,
    pub to_vector: bool,
    pub mask_reduce: bool,
    pub get_msb: bool,
    pub add: bool,
    pub mullo: bool,
    pub and: bool,
}

impl NativeSupport {
    pub const ALL: NativeSupport = NativeSupport {
        load: true,
        loadu: true,
        storeu: true,
        set1: true,
        between_inclusive: true,
        equal: true,
        gather: true,
        to_integral: true,
        from_integral: true,
        to_vector: true,
        mask_reduce: true,
        get_msb: true,
        add: true,
        mullo: true,
        and: true,
    };
}

/// Compile-time choice between native-only and workaround-allowed primitives.
pub trait ImplementationDegreeOfFreedom:
    Copy + Default + fmt::Debug + Send + Sync + 'static
{
    const NATIVE_ONLY: bool;
}

/// Only single-instruction primitives may be instantiated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

/// Workarounds are allowed where the extension has no native instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Workaround;

impl ImplementationDegreeOfFreedom for Native {
    const NATIVE_ONLY: bool = true;
}

impl ImplementationDegreeOfFreedom for Workaround {
    const NATIVE_ONLY: bool = false;
}

/// Operations over one descriptor with 64-bit signed lanes.
///
/// # Safety
/// All functions require the descriptor's extension to be supported by the
/// running CPU (see [`VectorDescriptor::is_supported`]). Memory operations
/// additionally require `memory` to be valid for `ELEMENT_COUNT` lanes, and
/// `load` requires `ALIGNMENT`-aligned memory.
pub trait Primitives: VectorDescriptor<Base = i64> {
    const NATIVE: NativeSupport;

    unsafe fn load(memory: *const i64) -> Self::Register;

    unsafe fn loadu(memory: *const i64) -> Self::Register;

    unsafe fn storeu(memory: *mut i64, vec: Self::Register);

    unsafe fn set1(value: i64) -> Self::Register;

    /// Lanes where `min[i] <= data[i] <= max[i]`.
    unsafe fn between_inclusive(
        data: Self::Register,
        min: Self::Register,
        max: Self::Register,
    ) -> Self::Mask;

    unsafe fn equal(a: Self::Register, b: Self::Register) -> Self::Mask;

    /// Reads `memory[index[i]]` for every lane set in `mask`; other lanes
    /// take `source[i]` and never touch memory. Every selected index must
    /// be in bounds.
    unsafe fn gather(
        source: Self::Register,
        memory: *const i64,
        index: Self::Register,
        mask: Self::Mask,
    ) -> Self::Register;

    unsafe fn to_integral(mask: Self::Mask) -> u64;

    unsafe fn from_integral(bits: u64) -> Self::Mask;

    unsafe fn to_vector(mask: Self::Mask) -> Self::Register;

    /// Clears every bit that does not correspond to a lane.
    #[inline(always)]
    fn mask_reduce(bits: u64) -> u64 {
        bits & Self::lane_bits()
    }

    unsafe fn get_msb(vec: Self::Register) -> u64;

    unsafe fn add(a: Self::Register, b: Self::Register) -> Self::Register;

    /// Low 64 bits of the lane-wise product (wrapping).
    unsafe fn mullo(a: Self::Register, b: Self::Register) -> Self::Register;

    unsafe fn and(a: Self::Register, b: Self::Register) -> Self::Register;
}

macro_rules! require_native {
    ($v:ty, $i:ty, $op:ident) => {
        const {
            assert!(
                !<$i as ImplementationDegreeOfFreedom>::NATIVE_ONLY
                    || <$v as Primitives>::NATIVE.$op,
                concat!(
                    "The primitive ",
                    stringify!($op),
                    " is not supported natively by this extension"
                )
            )
        }
    };
}

#[inline(always)]
pub unsafe fn load<V: Primitives, I: ImplementationDegreeOfFreedom>(
    memory: *const i64,
) -> V::Register {
    require_native!(V, I, load);
    unsafe { V::load(memory) }
}

#[inline(always)]
pub unsafe fn loadu<V: Primitives, I: ImplementationDegreeOfFreedom>(
    memory: *const i64,
) -> V::Register {
    require_native!(V, I, loadu);
    unsafe { V::loadu(memory) }
}

#[inline(always)]
pub unsafe fn storeu<V: Primitives, I: ImplementationDegreeOfFreedom>(
    memory: *mut i64,
    vec: V::Register,
) {
    require_native!(V, I, storeu);
    unsafe { V::storeu(memory, vec) }
}

#[inline(always)]
pub unsafe fn set1<V: Primitives, I: ImplementationDegreeOfFreedom>(value: i64) -> V::Register {
    require_native!(V, I, set1);
    unsafe { V::set1(value) }
}

#[inline(always)]
pub unsafe fn between_inclusive<V: Primitives, I: ImplementationDegreeOfFreedom>(
    data: V::Register,
    min: V::Register,
    max: V::Register,
) -> V::Mask {
    require_native!(V, I, between_inclusive);
    unsafe { V::between_inclusive(data, min, max) }
}

#[inline(always)]
pub unsafe fn equal<V: Primitives, I: ImplementationDegreeOfFreedom>(
    a: V::Register,
    b: V::Register,
) -> V::Mask {
    require_native!(V, I, equal);
    unsafe { V::equal(a, b) }
}

#[inline(always)]
pub unsafe fn gather<V: Primitives, I: ImplementationDegreeOfFreedom>(
    source: V::Register,
    memory: *const i64,
    index: V::Register,
    mask: V::Mask,
) -> V::Register {
    require_native!(V, I, gather);
    unsafe { V::gather(source, memory, index, mask) }
}

#[inline(always)]
pub unsafe fn to_integral<V: Primitives, I: ImplementationDegreeOfFreedom>(mask: V::Mask) -> u64 {
    require_native!(V, I, to_integral);
    unsafe { V::to_integral(mask) }
}

#[inline(always)]
pub unsafe fn from_integral<V: Primitives, I: ImplementationDegreeOfFreedom>(bits: u64) -> V::Mask {
    require_native!(V, I, from_integral);
    unsafe { V::from_integral(bits) }
}

#[inline(always)]
pub unsafe fn to_vector<V: Primitives, I: ImplementationDegreeOfFreedom>(
    mask: V::Mask,
) -> V::Register {
    require_native!(V, I, to_vector);
    unsafe { V::to_vector(mask) }
}

#[inline(always)]
pub fn mask_reduce<V: Primitives, I: ImplementationDegreeOfFreedom>(bits: u64) -> u64 {
    require_native!(V, I, mask_reduce);
    V::mask_reduce(bits)
}

#[inline(always)]
pub unsafe fn get_msb<V: Primitives, I: ImplementationDegreeOfFreedom>(vec: V::Register) -> u64 {
    require_native!(V, I, get_msb);
    unsafe { V::get_msb(vec) }
}

#[inline(always)]
pub unsafe fn add<V: Primitives, I: ImplementationDegreeOfFreedom>(
    a: V::Register,
    b: V::Register,
) -> V::Register {
    require_native!(V, I, add);
    unsafe { V::add(a, b) }
}

/// No x86 extension multiplies 64-bit lanes in one instruction, so asking
/// for the native form there does not build:
///
/// ```compile_fail
/// use simdfilter_core::simds::{Avx2I64, Native, primitives};
///
/// let x = unsafe { primitives::set1::<Avx2I64, Native>(3) };
/// let _ = unsafe { primitives::mullo::<Avx2I64, Native>(x, x) };
/// ```
///
/// The workaround form is always available:
///
/// ```no_run
/// # #[cfg(target_arch = "x86_64")]
/// # {
/// use simdfilter_core::simds::{Avx2I64, Workaround, primitives};
///
/// let x = unsafe { primitives::set1::<Avx2I64, Workaround>(3) };
/// let _ = unsafe { primitives::mullo::<Avx2I64, Workaround>(x, x) };
/// # }
/// ```
#[inline(always)]
pub unsafe fn mullo<V: Primitives, I: ImplementationDegreeOfFreedom>(
    a: V::Register,
    b: V::Register,
) -> V::Register {
    require_native!(V, I, mullo);
    unsafe { V::mullo(a, b) }
}

#[inline(always)]
pub unsafe fn and<V: Primitives, I: ImplementationDegreeOfFreedom>(
    a: V::Register,
    b: V::Register,
) -> V::Register {
    require_native!(V, I, and);
    unsafe { V::and(a, b) }
}

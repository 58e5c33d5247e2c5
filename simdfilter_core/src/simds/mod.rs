//! Vector descriptors.
//!
//! A descriptor binds a scalar base type and a target extension to the
//! concrete register and mask types of that extension. Everything here is
//! type-level metadata; the operations live in [`primitives`] and in the
//! per-extension modules.
//!
//! One descriptor is selected per build through [`DefaultSimd`]. The other
//! descriptors stay available so that callers (and tests) can instantiate
//! them explicitly after checking [`VectorDescriptor::is_supported`].

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use once_cell::sync::Lazy;

pub mod primitives;
pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod avx512;
#[cfg(target_arch = "x86_64")]
pub mod sse;

#[cfg(target_arch = "aarch64")]
pub mod neon;

pub use primitives::{ImplementationDegreeOfFreedom, Native, NativeSupport, Primitives, Workaround};
pub use scalar::{Lanes, Scalar};

/// Widest register supported, in 64-bit lanes (AVX-512).
pub const MAX_ELEMENT_COUNT: usize = 8;

/// Closed set of target extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionKind {
    Scalar,
    Sse,
    Avx2,
    Avx512,
    Neon,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionKind::Scalar => "scalar",
            ExtensionKind::Sse => "sse4.2",
            ExtensionKind::Avx2 => "avx2",
            ExtensionKind::Avx512 => "avx512f",
            ExtensionKind::Neon => "neon",
        };
        f.pad(name)
    }
}

impl ExtensionKind {
    /// Whether the running CPU can execute this extension.
    pub fn is_supported(self) -> bool {
        match self {
            ExtensionKind::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            ExtensionKind::Sse => std::is_x86_feature_detected!("sse4.2"),
            #[cfg(target_arch = "x86_64")]
            ExtensionKind::Avx2 => std::is_x86_feature_detected!("avx2"),
            #[cfg(target_arch = "x86_64")]
            ExtensionKind::Avx512 => std::is_x86_feature_detected!("avx512f"),
            #[cfg(target_arch = "aarch64")]
            ExtensionKind::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }
}

/// Scalar element types a descriptor can be built over.
pub trait BaseType: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl BaseType for i64 {}
impl BaseType for u64 {}

/// A hardware extension, seen from one base type.
pub trait TargetExtension<B: BaseType>:
    Copy + Default + fmt::Debug + Send + Sync + 'static
{
    const KIND: ExtensionKind;
    const DEFAULT_SIZE_IN_BITS: usize;

    type Register: Copy;
    type Mask: Copy;

    fn is_supported() -> bool {
        Self::KIND.is_supported()
    }
}

/// Compile-time binding of a base type to a target extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simd<B, E>(PhantomData<(B, E)>);

pub trait VectorDescriptor: Copy + Default + fmt::Debug + Send + Sync + 'static {
    type Base: BaseType;
    type Register: Copy;
    type Mask: Copy;

    const EXTENSION: ExtensionKind;
    const VECTOR_SIZE_BITS: usize;
    const VECTOR_SIZE_BYTES: usize;
    const ELEMENT_COUNT: usize;
    const ALIGNMENT: usize;
    const MASK_RATIO: usize;

    /// Fails the build when the descriptor is malformed. Reference it with
    /// `let () = V::VALID;` wherever a descriptor gets instantiated.
    const VALID: ();

    fn is_supported() -> bool;

    /// Integer mask with one bit per lane.
    fn lane_bits() -> u64 {
        if Self::ELEMENT_COUNT >= 64 {
            u64::MAX
        } else {
            (1u64 << Self::ELEMENT_COUNT) - 1
        }
    }
}

impl<B: BaseType, E: TargetExtension<B>> VectorDescriptor for Simd<B, E> {
    type Base = B;
    type Register = E::Register;
    type Mask = E::Mask;

    const EXTENSION: ExtensionKind = E::KIND;
    const VECTOR_SIZE_BITS: usize = E::DEFAULT_SIZE_IN_BITS;
    const VECTOR_SIZE_BYTES: usize = size_of::<E::Register>();
    const ELEMENT_COUNT: usize = size_of::<E::Register>() / size_of::<B>();
    const ALIGNMENT: usize = if Self::VECTOR_SIZE_BYTES > 32 {
        64
    } else {
        Self::VECTOR_SIZE_BYTES
    };
    const MASK_RATIO: usize = (size_of::<E::Mask>() * 8) / Self::ELEMENT_COUNT;

    const VALID: () = {
        assert!(Self::ELEMENT_COUNT > 0, "descriptor has no lanes");
        assert!(Self::ELEMENT_COUNT <= MAX_ELEMENT_COUNT, "register wider than MAX_ELEMENT_COUNT");
        assert!(Self::ALIGNMENT > 0, "descriptor alignment must be positive");
        assert!(Self::MASK_RATIO > 0, "mask narrower than one bit per lane");
        assert!(Self::VECTOR_SIZE_BYTES * 8 == Self::VECTOR_SIZE_BITS, "register size mismatch");
    };

    fn is_supported() -> bool {
        E::is_supported()
    }
}

pub type ScalarI64 = Simd<i64, Scalar>;

#[cfg(target_arch = "x86_64")]
pub type SseI64 = Simd<i64, sse::Sse>;
#[cfg(target_arch = "x86_64")]
pub type Avx2I64 = Simd<i64, avx2::Avx2>;
#[cfg(target_arch = "x86_64")]
pub type Avx512I64 = Simd<i64, avx512::Avx512>;

#[cfg(target_arch = "aarch64")]
pub type NeonI64 = Simd<i64, neon::Neon>;

// Build-time selection. Compile with `-C target-cpu=native` (or explicit
// target features) to pick up the widest extension of the build machine.
#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub type DefaultSimd = Avx512I64;

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    not(target_feature = "avx512f")
))]
pub type DefaultSimd = Avx2I64;

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "sse4.2",
    not(target_feature = "avx2"),
    not(target_feature = "avx512f")
))]
pub type DefaultSimd = SseI64;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub type DefaultSimd = NeonI64;

#[cfg(not(any(
    all(target_arch = "x86_64", target_feature = "sse4.2"),
    all(target_arch = "aarch64", target_feature = "neon")
)))]
pub type DefaultSimd = ScalarI64;

static DETECTED: Lazy<ExtensionKind> = Lazy::new(|| {
    [
        ExtensionKind::Avx512,
        ExtensionKind::Avx2,
        ExtensionKind::Sse,
        ExtensionKind::Neon,
    ]
    .into_iter()
    .find(|kind| kind.is_supported())
    .unwrap_or(ExtensionKind::Scalar)
});

/// Widest extension the running CPU supports. Detected once.
pub fn detect_extension() -> ExtensionKind {
    *DETECTED
}

/// Every extension the running CPU can execute, narrowest first.
pub fn supported_extensions() -> Vec<ExtensionKind> {
    [
        ExtensionKind::Scalar,
        ExtensionKind::Sse,
        ExtensionKind::Avx2,
        ExtensionKind::Avx512,
        ExtensionKind::Neon,
    ]
    .into_iter()
    .filter(|kind| kind.is_supported())
    .collect()
}

/// Stack buffer for spilling one register into scalar lanes.
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignedLanes(pub [i64; MAX_ELEMENT_COUNT]);

impl AlignedLanes {
    #[inline(always)]
    pub fn as_ptr(&self) -> *const i64 {
        self.0.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut i64 {
        self.0.as_mut_ptr()
    }

    /// Spills `vec` into a fresh buffer.
    ///
    /// # Safety
    /// `V` must be supported by the running CPU.
    #[inline(always)]
    pub unsafe fn spill<V: Primitives>(vec: V::Register) -> Self {
        let mut lanes = AlignedLanes::default();
        unsafe { V::storeu(lanes.as_mut_ptr(), vec) };
        lanes
    }

    /// Reloads the first `V::ELEMENT_COUNT` lanes as a register.
    ///
    /// # Safety
    /// `V` must be supported by the running CPU.
    #[inline(always)]
    pub unsafe fn reload<V: Primitives>(&self) -> V::Register {
        // 64-byte alignment satisfies every descriptor's ALIGNMENT.
        unsafe { V::load(self.as_ptr()) }
    }
}

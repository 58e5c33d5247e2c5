//! Filter capability contract.
//!
//! A filter is a pushed-down predicate evaluated while values are extracted
//! from a column. Every filter kind implements [`Filter`]; operations a kind
//! does not support return [`FilterError::Unsupported`].

use std::any::Any;
use std::fmt;

use crate::core::scan::count_by_register;
use crate::error::{FilterError, Result};
use crate::simds::{AlignedLanes, Primitives};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    AlwaysFalse,
    AlwaysTrue,
    IsNull,
    IsNotNull,
    BoolValue,
    BigintRange,
    BigintValuesUsingHashTable,
    BigintValuesUsingBitmask,
    DoubleRange,
    FloatRange,
    BytesRange,
    BytesValues,
    BigintMultiRange,
    MultiRange,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::AlwaysFalse => "AlwaysFalse",
            FilterKind::AlwaysTrue => "AlwaysTrue",
            FilterKind::IsNull => "IsNull",
            FilterKind::IsNotNull => "IsNotNull",
            FilterKind::BoolValue => "BoolValue",
            FilterKind::BigintRange => "BigintRange",
            FilterKind::BigintValuesUsingHashTable => "BigintValuesUsingHashTable",
            FilterKind::BigintValuesUsingBitmask => "BigintValuesUsingBitmask",
            FilterKind::DoubleRange => "DoubleRange",
            FilterKind::FloatRange => "FloatRange",
            FilterKind::BytesRange => "BytesRange",
            FilterKind::BytesValues => "BytesValues",
            FilterKind::BigintMultiRange => "BigintMultiRange",
            FilterKind::MultiRange => "MultiRange",
        };
        f.write_str(name)
    }
}

/// `Filter(<kind>, deterministic, null allowed)`
pub fn describe_filter(kind: FilterKind, deterministic: bool, null_allowed: bool) -> String {
    format!(
        "Filter({}, {}, {})",
        kind,
        if deterministic { "deterministic" } else { "nondeterministic" },
        if null_allowed { "null allowed" } else { "null not allowed" }
    )
}

/// A predicate over values of one column, vectorized over descriptor `V`.
pub trait Filter<V: Primitives>: fmt::Debug + Send + Sync + Any {
    fn kind(&self) -> FilterKind;

    fn null_allowed(&self) -> bool;

    /// A filter over a nested column only sees some positions and is
    /// therefore not deterministic.
    fn is_deterministic(&self) -> bool {
        true
    }

    /// Positions of the current top-level row before this one that must
    /// fail when this position fails.
    fn preceding_positions_to_fail(&self) -> usize {
        0
    }

    fn succeeding_positions_to_fail(&self) -> usize {
        0
    }

    fn test_null(&self) -> bool {
        self.null_allowed()
    }

    /// Whether a non-null value of unknown content can pass.
    fn test_non_null(&self) -> Result<bool> {
        Err(unsupported(self.kind(), "test_non_null"))
    }

    fn test_int64(&self, _value: i64) -> Result<bool> {
        Err(unsupported(self.kind(), "test_int64"))
    }

    /// Tests one register of values. Lane `i` of the result is all ones
    /// when `test_int64(x[i])` passes and zero otherwise.
    ///
    /// The default spills the register and tests lane by lane.
    fn test(&self, x: V::Register) -> Result<V::Register> {
        test_lanes::<V, _>(x, |value| self.test_int64(value))
    }

    /// Number of values in `data` that pass. The default tests one
    /// register at a time through [`Filter::test`].
    ///
    /// Callers must have checked that `V` runs on this CPU; see
    /// [`crate::core::scan::count_matches`].
    fn count_passing(&self, data: &[i64]) -> Result<u64> {
        count_by_register::<V, Self>(self, data)
    }

    fn test_double(&self, _value: f64) -> Result<bool> {
        Err(unsupported(self.kind(), "test_double"))
    }

    fn test_float(&self, _value: f32) -> Result<bool> {
        Err(unsupported(self.kind(), "test_float"))
    }

    fn test_bool(&self, _value: bool) -> Result<bool> {
        Err(unsupported(self.kind(), "test_bool"))
    }

    fn test_bytes(&self, _value: &[u8]) -> Result<bool> {
        Err(unsupported(self.kind(), "test_bytes"))
    }

    /// True when [`Filter::test_length`] can fail values before looking at
    /// their content.
    fn has_test_length(&self) -> bool {
        false
    }

    fn test_length(&self, _length: usize) -> Result<bool> {
        Err(unsupported(self.kind(), "test_length"))
    }

    /// Whether any value in `[min, max]`, or null when `has_null`, can pass.
    fn test_int64_range(&self, _min: i64, _max: i64, _has_null: bool) -> Result<bool> {
        Err(unsupported(self.kind(), "test_int64_range"))
    }

    fn test_double_range(&self, _min: f64, _max: f64, _has_null: bool) -> Result<bool> {
        Err(unsupported(self.kind(), "test_double_range"))
    }

    fn test_bytes_range(
        &self,
        _min: Option<&[u8]>,
        _max: Option<&[u8]>,
        _has_null: bool,
    ) -> Result<bool> {
        Err(unsupported(self.kind(), "test_bytes_range"))
    }

    /// Copy of this filter; `Some(flag)` replaces the null policy.
    fn clone_filter(&self, null_allowed: Option<bool>) -> Box<dyn Filter<V>>;

    /// Combines this filter with `other` using AND.
    fn merge_with(&self, other: &dyn Filter<V>) -> Result<Box<dyn Filter<V>>> {
        Err(FilterError::MergeIncompatible {
            this: self.kind(),
            other: other.kind(),
        })
    }

    fn as_any(&self) -> &dyn Any;

    fn describe(&self) -> String {
        describe_filter(self.kind(), self.is_deterministic(), self.null_allowed())
    }
}

impl<V: Primitives> fmt::Display for dyn Filter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

pub(crate) fn unsupported(kind: FilterKind, operation: &'static str) -> FilterError {
    FilterError::Unsupported { kind, operation }
}

/// Lane-by-lane evaluation of `test` over one register.
pub(crate) fn map_lanes<V, F>(x: V::Register, mut test: F) -> V::Register
where
    V: Primitives,
    F: FnMut(i64) -> bool,
{
    // SAFETY: a register of `V` only exists when `V` runs on this CPU.
    unsafe {
        let mut lanes = AlignedLanes::spill::<V>(x);
        for lane in lanes.0.iter_mut().take(V::ELEMENT_COUNT) {
            *lane = if test(*lane) { -1 } else { 0 };
        }
        lanes.reload::<V>()
    }
}

/// Like [`map_lanes`], stopping at the first failing lane test.
pub(crate) fn test_lanes<V, F>(x: V::Register, mut test: F) -> Result<V::Register>
where
    V: Primitives,
    F: FnMut(i64) -> Result<bool>,
{
    let mut error = None;
    let result = map_lanes::<V, _>(x, |value| {
        if error.is_some() {
            return false;
        }
        match test(value) {
            Ok(pass) => pass,
            Err(err) => {
                error = Some(err);
                false
            }
        }
    });
    match error {
        Some(err) => Err(err),
        None => Ok(result),
    }
}

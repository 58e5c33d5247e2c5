//! IN-list filter for 64-bit integers backed by an open-addressing hash
//! table. Good for a large number of values that do not fit a small range.
//!
//! The table is sized at 5x the value count rounded up to a power of two:
//! the filter is expected to fail most of the time, and a sparse table makes
//! the home slot land on an empty slot. A register of values is tested with
//! one masked gather; only lanes whose first slot holds some other value fall
//! back to walking the collision chain.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use itertools::Itertools;
use log::{debug, trace};

use crate::core::filter::{describe_filter, map_lanes, Filter, FilterKind};
#[cfg(target_arch = "x86_64")]
use crate::core::hash_table_simd;
use crate::core::padded_table::PaddedTable;
use crate::error::{FilterError, Result};
use crate::simds::primitives::{self as ops, ImplementationDegreeOfFreedom, Primitives, Workaround};
use crate::simds::{AlignedLanes, ExtensionKind};

/// Marks an empty slot. A literal equal to it is tracked out of band.
pub const EMPTY_MARKER: i64 = 0xdead_beef_bade_feed_u64 as i64;

/// Murmur multiplier.
pub const HASH_MULTIPLIER: u64 = 0xc6a4_a793_5bd1_e995;

const MIN_PADDING: usize = 4;

#[inline(always)]
fn home_slot(value: i64, mask: usize) -> usize {
    ((value as u64).wrapping_mul(HASH_MULTIPLIER) as usize) & mask
}

#[derive(Debug, Clone)]
pub struct BigintValuesUsingHashTable<V: Primitives, I: ImplementationDegreeOfFreedom = Workaround> {
    min: i64,
    max: i64,
    table: PaddedTable,
    contains_sentinel: bool,
    values: Vec<i64>,
    null_allowed: bool,
    _simd: PhantomData<(V, I)>,
}

impl<V: Primitives, I: ImplementationDegreeOfFreedom> BigintValuesUsingHashTable<V, I> {
    /// Builds the filter over `values`, all of which must lie in
    /// `[min, max]`. Duplicates are ignored; at least two distinct values are
    /// required.
    pub fn new(min: i64, max: i64, values: &[i64], null_allowed: bool) -> Result<Self> {
        let () = V::VALID;

        if !V::is_supported() {
            return Err(FilterError::UnsupportedExtension(V::EXTENSION));
        }
        let values: Vec<i64> = values.iter().copied().sorted_unstable().dedup().collect();
        if values.len() < 2 {
            return Err(FilterError::TooFewValues(values.len()));
        }
        if min >= max {
            return Err(FilterError::InvalidBounds { min, max });
        }

        let size = (values.len() * 5).next_power_of_two();
        let padding = MIN_PADDING.max(V::ELEMENT_COUNT);
        let mut table = PaddedTable::new(size, padding, EMPTY_MARKER);
        let mut contains_sentinel = false;

        for &value in &values {
            if value == EMPTY_MARKER {
                contains_sentinel = true;
            } else {
                let inserted = table.insert(home_slot(value, table.mask()), value);
                debug_assert!(inserted, "hash table full while inserting {}", value);
            }
        }
        table.seal();

        debug!(
            "Built hash table filter over {} values: [{}, {}], {} slots + {} padding ({})",
            values.len(),
            min,
            max,
            size,
            padding,
            V::EXTENSION
        );

        Ok(Self {
            min,
            max,
            table,
            contains_sentinel,
            values,
            null_allowed,
            _simd: PhantomData,
        })
    }

    /// Computes the bounds of `values` and builds the filter.
    pub fn from_values(values: &[i64], null_allowed: bool) -> Result<Self> {
        match values.iter().copied().minmax().into_option() {
            Some((min, max)) => Self::new(min, max, values, null_allowed),
            None => Err(FilterError::TooFewValues(0)),
        }
    }

    /// Same values and table with a different null policy.
    pub fn with_null_allowed(&self, null_allowed: bool) -> Self {
        Self {
            null_allowed,
            ..self.clone()
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Distinct values, ascending.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn contains_sentinel(&self) -> bool {
        self.contains_sentinel
    }

    pub fn table(&self) -> &PaddedTable {
        &self.table
    }

    /// Logical slot count, a power of two.
    pub fn table_len(&self) -> usize {
        self.table.logical_len()
    }

    pub fn test_int64(&self, value: i64) -> bool {
        if self.contains_sentinel && value == EMPTY_MARKER {
            return true;
        }
        if value < self.min || value > self.max {
            return false;
        }
        let mask = self.table.mask();
        let start = home_slot(value, mask);
        for i in start..=start + mask {
            let slot = self.table.slot(i);
            if slot == EMPTY_MARKER {
                return false;
            }
            if slot == value {
                return true;
            }
        }
        false
    }

    /// Tests one register. Lane `i` of the result is all ones when `x[i]`
    /// passes and zero otherwise.
    pub fn test_register(&self, x: V::Register) -> V::Register {
        // SAFETY: construction checked that V runs on this CPU.
        unsafe {
            match V::EXTENSION {
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Sse => hash_table_simd::test_register_sse42(self, x),
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Avx2 => hash_table_simd::test_register_avx2(self, x),
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Avx512 => hash_table_simd::test_register_avx512(self, x),
                // Scalar needs no extension and NEON is part of the aarch64 baseline.
                _ => self.register_kernel(x),
            }
        }
    }

    /// Number of values in `data` that pass.
    pub fn count_matches(&self, data: &[i64]) -> u64 {
        // SAFETY: construction checked that V runs on this CPU.
        unsafe {
            match V::EXTENSION {
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Sse => hash_table_simd::count_matches_sse42(self, data),
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Avx2 => hash_table_simd::count_matches_avx2(self, data),
                #[cfg(target_arch = "x86_64")]
                ExtensionKind::Avx512 => hash_table_simd::count_matches_avx512(self, data),
                _ => self.count_kernel(data),
            }
        }
    }

    /// Scan loop behind [`Self::count_matches`]. Inlined into each
    /// extension's `#[target_feature]` entry point.
    ///
    /// # Safety
    /// `V` must run on this CPU.
    #[inline(always)]
    pub(super) unsafe fn count_kernel(&self, data: &[i64]) -> u64 {
        let mut chunks = data.chunks_exact(V::ELEMENT_COUNT);
        let mut hits = 0u64;
        for chunk in &mut chunks {
            unsafe {
                let passed = self.register_kernel(ops::loadu::<V, I>(chunk.as_ptr()));
                hits += ops::get_msb::<V, I>(passed).count_ones() as u64;
            }
        }
        for &value in chunks.remainder() {
            if self.test_int64(value) {
                hits += 1;
            }
        }
        hits
    }

    /// Register test body. Inlined into each extension's
    /// `#[target_feature]` entry point so the primitives compile to single
    /// instructions.
    ///
    /// # Safety
    /// `V` must run on this CPU.
    #[inline(always)]
    pub(super) unsafe fn register_kernel(&self, x: V::Register) -> V::Register {
        // Every gathered index is masked into the logical table.
        unsafe {
            let range_mask = ops::between_inclusive::<V, I>(
                x,
                ops::set1::<V, I>(self.min),
                ops::set1::<V, I>(self.max),
            );
            let in_range = ops::mask_reduce::<V, I>(ops::to_integral::<V, I>(range_mask));
            if in_range == 0 {
                return ops::set1::<V, I>(0);
            }
            if self.contains_sentinel {
                return self.test_lane_by_lane(x);
            }

            let empty = ops::set1::<V, I>(EMPTY_MARKER);

            // A lane holding the marker itself would compare equal to an
            // empty slot. It cannot pass, so drop it from the gather.
            let marker_lanes = ops::to_integral::<V, I>(ops::equal::<V, I>(x, empty));
            let lookup = in_range & !marker_lanes;
            if lookup == 0 {
                return ops::set1::<V, I>(0);
            }

            let indices = ops::and::<V, I>(
                ops::mullo::<V, I>(x, ops::set1::<V, I>(HASH_MULTIPLIER as i64)),
                ops::set1::<V, I>(self.table.mask() as i64),
            );
            let data = ops::gather::<V, I>(
                empty,
                self.table.as_ptr(),
                indices,
                ops::from_integral::<V, I>(lookup),
            );

            // Lanes that gathered the marker missed, lanes equal to x hit and
            // the rest must continue down their collision chain.
            let missed = ops::to_integral::<V, I>(ops::equal::<V, I>(data, empty));
            let hit = ops::to_integral::<V, I>(ops::equal::<V, I>(x, data)) & !missed;
            let mut unresolved = ops::mask_reduce::<V, I>(!hit & !missed);

            if unresolved == 0 {
                return ops::to_vector::<V, I>(ops::from_integral::<V, I>(hit));
            }

            trace!("{} lanes collided at their home slot", unresolved.count_ones());

            let index_lanes = AlignedLanes::spill::<V>(indices);
            let value_lanes = AlignedLanes::spill::<V>(x);
            let mut result_lanes = AlignedLanes::spill::<V>(ops::to_vector::<V, I>(
                ops::from_integral::<V, I>(hit),
            ));

            while unresolved != 0 {
                let lane = 63 - unresolved.leading_zeros() as usize;
                unresolved &= !(1u64 << lane);

                let found = self.walk_chain(
                    index_lanes.0[lane] as usize + 1,
                    value_lanes.0[lane],
                );
                result_lanes.0[lane] = if found { -1 } else { 0 };
            }

            result_lanes.reload::<V>()
        }
    }

    /// Reads the table a register line at a time from `index` until a line
    /// holds `value` or an empty slot. Terminates because the table always
    /// has empty slots.
    ///
    /// # Safety
    /// `V` must run on this CPU; `index` must be at most `mask + 1`.
    #[inline(always)]
    unsafe fn walk_chain(&self, mut index: usize, value: i64) -> bool {
        let width = V::ELEMENT_COUNT;
        let mask = self.table.mask();
        unsafe {
            let all_value = ops::set1::<V, I>(value);
            let all_empty = ops::set1::<V, I>(EMPTY_MARKER);
            loop {
                let line = ops::loadu::<V, I>(self.table.line(index, width).as_ptr());
                if ops::to_integral::<V, I>(ops::equal::<V, I>(line, all_value)) != 0 {
                    return true;
                }
                if ops::to_integral::<V, I>(ops::equal::<V, I>(line, all_empty)) != 0 {
                    return false;
                }
                index += width;
                if index > mask {
                    index = 0;
                }
            }
        }
    }

    fn test_lane_by_lane(&self, x: V::Register) -> V::Register {
        map_lanes::<V, _>(x, |value| self.test_int64(value))
    }

    pub fn test_int64_range(&self, min: i64, max: i64, has_null: bool) -> bool {
        if has_null && self.null_allowed {
            return true;
        }
        if min == max {
            return self.test_int64(min);
        }
        if min > self.max || max < self.min {
            return false;
        }
        let first = self.values.partition_point(|&value| value < min);
        match self.values.get(first) {
            Some(&value) => value <= max,
            None => false,
        }
    }

    /// AND with another hash table filter. The surviving values are rebuilt
    /// into a fresh filter.
    pub fn intersect<J: ImplementationDegreeOfFreedom>(
        &self,
        other: &BigintValuesUsingHashTable<V, J>,
    ) -> Result<Self> {
        let min = self.min.max(other.min());
        let max = self.max.min(other.max());
        self.merge_values(min, max, other.null_allowed, |value| Ok(other.test_int64(value)))
    }

    fn merge_values<F>(&self, min: i64, max: i64, other_null: bool, other_test: F) -> Result<Self>
    where
        F: Fn(i64) -> Result<bool>,
    {
        let both_null_allowed = self.null_allowed && other_null;

        let mut values_to_keep = Vec::with_capacity(self.values.len());
        if self.contains_sentinel && other_test(EMPTY_MARKER)? {
            values_to_keep.push(EMPTY_MARKER);
        }
        for &value in self.table.logical_slots() {
            if value != EMPTY_MARKER && value >= min && value <= max && other_test(value)? {
                values_to_keep.push(value);
            }
        }

        debug!(
            "Merged hash table filters over [{}, {}]: {} of {} values kept",
            min,
            max,
            values_to_keep.len(),
            self.values.len()
        );

        Self::from_values(&values_to_keep, both_null_allowed)
    }
}

impl<V: Primitives, I: ImplementationDegreeOfFreedom> fmt::Display for BigintValuesUsingHashTable<V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BigintValuesUsingHashTable: [{}, {}] {}",
            self.min,
            self.max,
            if self.null_allowed { "with nulls" } else { "no nulls" }
        )
    }
}

impl<V: Primitives, I: ImplementationDegreeOfFreedom> Filter<V> for BigintValuesUsingHashTable<V, I> {
    fn kind(&self) -> FilterKind {
        FilterKind::BigintValuesUsingHashTable
    }

    fn null_allowed(&self) -> bool {
        self.null_allowed
    }

    fn test_int64(&self, value: i64) -> Result<bool> {
        Ok(BigintValuesUsingHashTable::test_int64(self, value))
    }

    fn test(&self, x: V::Register) -> Result<V::Register> {
        Ok(self.test_register(x))
    }

    fn count_passing(&self, data: &[i64]) -> Result<u64> {
        Ok(BigintValuesUsingHashTable::count_matches(self, data))
    }

    fn test_int64_range(&self, min: i64, max: i64, has_null: bool) -> Result<bool> {
        Ok(BigintValuesUsingHashTable::test_int64_range(self, min, max, has_null))
    }

    fn clone_filter(&self, null_allowed: Option<bool>) -> Box<dyn Filter<V>> {
        match null_allowed {
            Some(null_allowed) => Box::new(self.with_null_allowed(null_allowed)),
            None => Box::new(self.clone()),
        }
    }

    fn merge_with(&self, other: &dyn Filter<V>) -> Result<Box<dyn Filter<V>>> {
        match other.kind() {
            FilterKind::IsNotNull => Ok(Box::new(self.with_null_allowed(false))),
            FilterKind::BigintValuesUsingHashTable => {
                let merged = match other.as_any().downcast_ref::<Self>() {
                    Some(other) => self.intersect(other)?,
                    // Same kind under another degree of freedom: only the
                    // contract is reachable, so clip to our own bounds.
                    None => self.merge_values(self.min, self.max, other.test_null(), |value| {
                        other.test_int64(value)
                    })?,
                };
                Ok(Box::new(merged))
            }
            other_kind => Err(FilterError::MergeIncompatible {
                this: self.kind(),
                other: other_kind,
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!(
            "{} {}",
            describe_filter(self.kind(), self.is_deterministic(), self.null_allowed),
            self
        )
    }
}

/// Builds a hash-table IN filter over `values`, computing its bounds.
pub fn create_bigint_values<V: Primitives>(
    values: &[i64],
    null_allowed: bool,
) -> Result<Box<dyn Filter<V>>> {
    Ok(Box::new(BigintValuesUsingHashTable::<V>::from_values(
        values,
        null_allowed,
    )?))
}

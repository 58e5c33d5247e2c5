//! Column scan driven by a filter's vectorized test.

use log::trace;

use crate::core::filter::Filter;
use crate::error::{FilterError, Result};
use crate::simds::primitives::{self as ops, Workaround};
use crate::simds::Primitives;

/// Counts values of `data` passing `filter` through [`Filter::count_passing`].
pub fn count_matches<V: Primitives>(filter: &dyn Filter<V>, data: &[i64]) -> Result<u64> {
    if !V::is_supported() {
        return Err(FilterError::UnsupportedExtension(V::EXTENSION));
    }

    let hits = filter.count_passing(data)?;

    trace!(
        "Scanned {} values with {} ({}): {} hits",
        data.len(),
        filter.kind(),
        V::EXTENSION,
        hits
    );

    Ok(hits)
}

/// Full registers go through [`Filter::test`], the tail through
/// [`Filter::test_int64`]. `V` must be supported by the running CPU.
pub(crate) fn count_by_register<V, F>(filter: &F, data: &[i64]) -> Result<u64>
where
    V: Primitives,
    F: Filter<V> + ?Sized,
{
    let mut chunks = data.chunks_exact(V::ELEMENT_COUNT);
    let mut hits = 0u64;

    for chunk in &mut chunks {
        // SAFETY: the caller checked the extension; the chunk holds a full register.
        let passed = unsafe {
            let values = ops::loadu::<V, Workaround>(chunk.as_ptr());
            ops::get_msb::<V, Workaround>(filter.test(values)?)
        };
        hits += passed.count_ones() as u64;
    }

    for &value in chunks.remainder() {
        if filter.test_int64(value)? {
            hits += 1;
        }
    }

    Ok(hits)
}

/// Pass flag for every value of `data`, in order.
pub fn collect_matches<V: Primitives>(filter: &dyn Filter<V>, data: &[i64]) -> Result<Vec<bool>> {
    if !V::is_supported() {
        return Err(FilterError::UnsupportedExtension(V::EXTENSION));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut chunks = data.chunks_exact(V::ELEMENT_COUNT);

    for chunk in &mut chunks {
        // SAFETY: the extension is supported and the chunk holds a full register.
        let passed = unsafe {
            let values = ops::loadu::<V, Workaround>(chunk.as_ptr());
            ops::get_msb::<V, Workaround>(filter.test(values)?)
        };
        out.extend((0..V::ELEMENT_COUNT).map(|lane| passed & (1 << lane) != 0));
    }

    for &value in chunks.remainder() {
        out.push(filter.test_int64(value)?);
    }

    Ok(out)
}

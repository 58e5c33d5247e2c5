use std::hint::black_box;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use simdfilter_core::core::{
    BigintValuesUsingHashTable, EMPTY_MARKER, Filter, FilterKind, IsNotNull, collect_matches,
    count_matches, create_bigint_values,
};
use simdfilter_core::error::FilterError;
use simdfilter_core::simds::{Primitives, ScalarI64, VectorDescriptor, supported_extensions};
use simdfilter_core::workload::{dense_values, filter_literals, sparse_values};

/// Register results must match the scalar test on every lane.
fn agrees<V: Primitives>(values: &[i64], samples: &[i64]) -> Result<(), TestCaseError> {
    if !V::is_supported() {
        return Ok(());
    }
    let filter = match BigintValuesUsingHashTable::<V>::from_values(values, false) {
        Ok(filter) => filter,
        Err(FilterError::TooFewValues(_)) => return Ok(()),
        Err(err) => return Err(TestCaseError::fail(err.to_string())),
    };

    let expected: Vec<bool> = samples.iter().map(|&v| filter.test_int64(v)).collect();
    let actual = collect_matches::<V>(&filter, samples).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&actual, &expected, "extension {}", V::EXTENSION);

    for &value in values {
        prop_assert!(filter.test_int64(value), "{} lost on {}", value, V::EXTENSION);
    }
    Ok(())
}

fn agrees_everywhere(values: &[i64], samples: &[i64]) -> Result<(), TestCaseError> {
    agrees::<ScalarI64>(values, samples)?;
    #[cfg(target_arch = "x86_64")]
    {
        use simdfilter_core::simds::{Avx2I64, Avx512I64, SseI64};
        agrees::<SseI64>(values, samples)?;
        agrees::<Avx2I64>(values, samples)?;
        agrees::<Avx512I64>(values, samples)?;
    }
    #[cfg(target_arch = "aarch64")]
    {
        use simdfilter_core::simds::NeonI64;
        agrees::<NeonI64>(values, samples)?;
    }
    Ok(())
}

/// Samples around the literals plus arbitrary values and the sentinel.
fn samples_for(values: &[i64], extra: &[i64]) -> Vec<i64> {
    let mut samples = Vec::with_capacity(values.len() * 3 + extra.len() + 2);
    for &value in values {
        samples.push(value);
        samples.push(value.wrapping_add(1));
        samples.push(value.wrapping_sub(1));
    }
    samples.extend_from_slice(extra);
    samples.push(EMPTY_MARKER);
    samples.push(EMPTY_MARKER);
    samples
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn vector_test_matches_scalar_test(
        values in prop::collection::vec(any::<i64>(), 2..300),
        extra in prop::collection::vec(any::<i64>(), 0..64),
    ) {
        let samples = samples_for(&values, &extra);
        agrees_everywhere(&values, &samples)?;
    }

    #[test]
    fn vector_test_matches_scalar_test_on_crowded_range(
        values in prop::collection::vec(-2000i64..2000, 2..1500),
        extra in prop::collection::vec(-2100i64..2100, 0..256),
    ) {
        let samples = samples_for(&values, &extra);
        agrees_everywhere(&values, &samples)?;
    }

    #[test]
    fn sentinel_literal_agrees(
        mut values in prop::collection::vec(any::<i64>(), 1..100),
        extra in prop::collection::vec(any::<i64>(), 0..32),
    ) {
        values.push(EMPTY_MARKER);
        let samples = samples_for(&values, &extra);
        agrees_everywhere(&values, &samples)?;
    }

    #[test]
    fn membership_is_exact(
        values in prop::collection::vec(-500i64..500, 2..200),
        sample in -600i64..600,
    ) {
        if let Ok(filter) = BigintValuesUsingHashTable::<ScalarI64>::from_values(&values, false) {
            prop_assert_eq!(filter.test_int64(sample), values.contains(&sample));
        }
    }

    #[test]
    fn range_overlap_is_sound(
        values in prop::collection::vec(-10_000i64..10_000, 2..100),
        lo in -11_000i64..11_000,
        len in 0i64..3000,
    ) {
        let hi = lo + len;
        if let Ok(filter) = BigintValuesUsingHashTable::<ScalarI64>::from_values(&values, false) {
            let any_inside = values.iter().any(|&v| lo <= v && v <= hi);
            prop_assert_eq!(filter.test_int64_range(lo, hi, false), any_inside);
        }
    }

    #[test]
    fn merge_is_intersection(
        left in prop::collection::vec(-300i64..300, 2..120),
        right in prop::collection::vec(-300i64..300, 2..120),
        left_nulls in any::<bool>(),
        right_nulls in any::<bool>(),
    ) {
        let (Ok(a), Ok(b)) = (
            BigintValuesUsingHashTable::<ScalarI64>::from_values(&left, left_nulls),
            BigintValuesUsingHashTable::<ScalarI64>::from_values(&right, right_nulls),
        ) else {
            return Ok(());
        };

        match Filter::<ScalarI64>::merge_with(&a, &b) {
            Ok(merged) => {
                prop_assert_eq!(merged.null_allowed(), left_nulls && right_nulls);
                for value in -310i64..310 {
                    let both = a.test_int64(value) && b.test_int64(value);
                    prop_assert_eq!(merged.test_int64(value), Ok(both));
                }
            }
            Err(FilterError::TooFewValues(kept)) => {
                let common = a.values().iter().filter(|&&v| b.test_int64(v)).count();
                prop_assert!(kept < 2);
                prop_assert_eq!(kept, common);
            }
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        }
    }

    #[test]
    fn clone_is_idempotent(
        values in prop::collection::vec(any::<i64>(), 2..100),
        nulls in any::<bool>(),
        samples in prop::collection::vec(any::<i64>(), 0..64),
    ) {
        if let Ok(filter) = BigintValuesUsingHashTable::<ScalarI64>::from_values(&values, nulls) {
            let copy = Filter::<ScalarI64>::clone_filter(&filter, None);
            let flipped = Filter::<ScalarI64>::clone_filter(&filter, Some(!nulls));
            prop_assert_eq!(copy.null_allowed(), nulls);
            prop_assert_eq!(flipped.null_allowed(), !nulls);
            for &sample in samples.iter().chain(values.iter()) {
                let expected = Ok(filter.test_int64(sample));
                prop_assert_eq!(copy.test_int64(sample), expected.clone());
                prop_assert_eq!(flipped.test_int64(sample), expected);
            }
        }
    }
}

#[test]
fn thousands_scenario_on_every_supported_extension() {
    let _ = env_logger::builder().is_test(true).try_init();

    let literals = filter_literals(1000);
    let batch = [500_000, 500_500, -5, 1_000_000];
    agrees_everywhere(&literals, &batch).unwrap();

    let filter = create_bigint_values::<ScalarI64>(&literals, false).unwrap();
    assert_eq!(
        collect_matches::<ScalarI64>(filter.as_ref(), &batch).unwrap(),
        vec![true, false, false, false]
    );
}

#[test]
fn dense_and_sparse_workloads_count_the_same_everywhere() {
    let _ = env_logger::builder().is_test(true).try_init();

    let literals = filter_literals(1000);
    let dense = dense_values(20_003, 11);
    let sparse = sparse_values(20_003, 12);

    let scalar = create_bigint_values::<ScalarI64>(&literals, false).unwrap();
    let expected_dense = dense.iter().filter(|v| **v < 1_000_000).count() as u64;
    let expected_sparse = sparse.iter().filter(|v| **v < 1_000_000).count() as u64;
    assert_eq!(count_matches::<ScalarI64>(scalar.as_ref(), &dense).unwrap(), expected_dense);
    assert_eq!(count_matches::<ScalarI64>(scalar.as_ref(), &sparse).unwrap(), expected_sparse);

    agrees_everywhere(&literals, &dense).unwrap();
    agrees_everywhere(&literals, &sparse).unwrap();
}

#[test]
fn unsupported_extension_is_refused() {
    #[cfg(target_arch = "x86_64")]
    {
        use simdfilter_core::simds::Avx512I64;
        let result = BigintValuesUsingHashTable::<Avx512I64>::from_values(&[1, 2], false);
        if Avx512I64::is_supported() {
            assert!(result.is_ok());
        } else {
            assert_eq!(
                result.unwrap_err(),
                FilterError::UnsupportedExtension(Avx512I64::EXTENSION)
            );
        }
    }
    assert!(supported_extensions().contains(&ScalarI64::EXTENSION));
}

#[test]
fn merge_rules() {
    let _ = env_logger::builder().is_test(true).try_init();

    let filter = create_bigint_values::<ScalarI64>(&[1, 2, 3], true).unwrap();

    let not_null = filter.merge_with(&IsNotNull).unwrap();
    assert_eq!(not_null.kind(), FilterKind::BigintValuesUsingHashTable);
    assert!(!not_null.test_null());

    let reversed = Filter::<ScalarI64>::merge_with(&IsNotNull, filter.as_ref());
    assert!(reversed.is_err());
}

/// The dispatched scan must count exactly what the lane tests accept.
fn counts_agree<V: Primitives>(literals: &[i64], data: &[i64]) {
    if !V::is_supported() {
        return;
    }
    let filter = BigintValuesUsingHashTable::<V>::from_values(literals, false).unwrap();
    let expected = data.iter().filter(|&&v| filter.test_int64(v)).count() as u64;
    let by_register = collect_matches::<V>(&filter, data)
        .unwrap()
        .into_iter()
        .filter(|&passed| passed)
        .count() as u64;

    assert_eq!(filter.count_matches(data), expected, "extension {}", V::EXTENSION);
    assert_eq!(count_matches::<V>(&filter, data).unwrap(), expected, "extension {}", V::EXTENSION);
    assert_eq!(by_register, expected, "extension {}", V::EXTENSION);
}

#[test]
fn feature_enabled_scan_counts_like_lane_tests() {
    let _ = env_logger::builder().is_test(true).try_init();

    let literals = filter_literals(1000);
    // Odd lengths leave a tail after the last full register.
    for data in [dense_values(40_001, 21), sparse_values(40_003, 22)] {
        counts_agree::<ScalarI64>(&literals, &data);
        #[cfg(target_arch = "x86_64")]
        {
            use simdfilter_core::simds::{Avx2I64, Avx512I64, SseI64};
            counts_agree::<SseI64>(&literals, &data);
            counts_agree::<Avx2I64>(&literals, &data);
            counts_agree::<Avx512I64>(&literals, &data);
        }
        #[cfg(target_arch = "aarch64")]
        {
            use simdfilter_core::simds::NeonI64;
            counts_agree::<NeonI64>(&literals, &data);
        }
    }
}

/// Fastest of `passes` runs of `scan`.
fn best_of<F: FnMut() -> u64>(passes: usize, mut scan: F) -> (Duration, u64) {
    let mut best = Duration::MAX;
    let mut hits = 0;
    for _ in 0..passes {
        let started = Instant::now();
        hits = black_box(scan());
        best = best.min(started.elapsed());
    }
    (best, hits)
}

/// Widest vector scan against a plain `test_int64` loop. `slack` bounds how
/// much slower the vector scan may be.
fn keeps_up_with_scalar_loop<V: Primitives>(name: &str, data: &[i64], slack: f64) {
    if !V::is_supported() {
        return;
    }
    let literals = filter_literals(1000);
    let scalar = BigintValuesUsingHashTable::<ScalarI64>::from_values(&literals, false).unwrap();
    let vector = BigintValuesUsingHashTable::<V>::from_values(&literals, false).unwrap();

    let (scalar_time, scalar_hits) = best_of(10, || {
        black_box(data).iter().filter(|&&v| scalar.test_int64(v)).count() as u64
    });
    let (vector_time, vector_hits) = best_of(10, || vector.count_matches(black_box(data)));

    log::info!(
        "{} {}: scalar loop {:?}, vector {:?}",
        V::EXTENSION,
        name,
        scalar_time,
        vector_time
    );
    assert_eq!(vector_hits, scalar_hits);
    assert!(
        vector_time.as_secs_f64() <= scalar_time.as_secs_f64() * slack,
        "{} {} scan took {:?}, scalar loop {:?}",
        V::EXTENSION,
        name,
        vector_time,
        scalar_time
    );
}

#[test]
#[cfg_attr(debug_assertions, ignore = "timing is only meaningful in release builds")]
fn vector_scan_keeps_up_with_scalar_loop() {
    let _ = env_logger::builder().is_test(true).try_init();

    let sparse = sparse_values(2_000_000, 31);
    let dense = dense_values(2_000_000, 32);

    #[cfg(target_arch = "x86_64")]
    {
        use simdfilter_core::simds::{Avx2I64, Avx512I64};
        keeps_up_with_scalar_loop::<Avx2I64>("sparse", &sparse, 1.25);
        keeps_up_with_scalar_loop::<Avx2I64>("dense", &dense, 2.0);
        keeps_up_with_scalar_loop::<Avx512I64>("sparse", &sparse, 1.25);
        keeps_up_with_scalar_loop::<Avx512I64>("dense", &dense, 2.0);
    }
    #[cfg(target_arch = "aarch64")]
    {
        use simdfilter_core::simds::NeonI64;
        keeps_up_with_scalar_loop::<NeonI64>("sparse", &sparse, 1.25);
        keeps_up_with_scalar_loop::<NeonI64>("dense", &dense, 2.0);
    }
    let _ = (&sparse, &dense);
}

use clap::Parser;
use log::{LevelFilter, info, warn};
use stopwatch::Stopwatch;

use simdfilter_core::Result;
use simdfilter_core::configuration::Configuration;
use simdfilter_core::core::{BigintValuesUsingHashTable, count_matches};
use simdfilter_core::simds::{DefaultSimd, Primitives, ScalarI64, VectorDescriptor, detect_extension, supported_extensions};
use simdfilter_core::workload::{dense_values, filter_literals, sparse_values};

#[derive(Parser, Debug)]
#[command(name = "simdfilter_bench", version, about = "Hash table IN filter throughput")]
struct Args {
    /// Values per workload (default: 1_000_000)
    #[arg(long = "values", value_name = "N")]
    values: Option<usize>,

    /// Number of filter literals (default: 1000)
    #[arg(long = "filter-values", alias = "filter_values", value_name = "N")]
    filter_values: Option<usize>,

    /// Timed passes over each workload (default: 10)
    #[arg(long, value_name = "N")]
    iterations: Option<usize>,

    /// Workload generator seed
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Logging level off, error, warn, info, debug, trace (default: info)
    #[arg(long = "log-level", alias = "log_level", value_name = "LEVEL")]
    log_level: Option<LevelFilter>,
}

struct Workload {
    name: &'static str,
    values: Vec<i64>,
}

fn run<V: Primitives>(config: &Configuration, literals: &[i64], workloads: &[Workload]) -> Result<()> {
    if !V::is_supported() {
        info!("{}: not supported by this CPU, skipped", V::EXTENSION);
        return Ok(());
    }

    let filter = BigintValuesUsingHashTable::<V>::from_values(literals, false)?;
    let iterations = config.iterations();

    for workload in workloads {
        let mut hits = 0;
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        for _ in 0..iterations {
            hits = count_matches::<V>(&filter, &workload.values)?;
        }
        stopwatch.stop();

        let per_iteration = stopwatch.elapsed() / iterations as u32;
        info!(
            "{:>7} {:<6}: {:.2?} per pass, {} hits of {} ({:.1}%)",
            V::EXTENSION,
            workload.name,
            per_iteration,
            hits,
            workload.values.len(),
            hits as f64 * 100.0 / workload.values.len().max(1) as f64
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level.unwrap_or(LevelFilter::Info))
        .init();

    let config = Configuration {
        value_count: args.values,
        filter_value_count: args.filter_values,
        iterations: args.iterations,
        seed: args.seed,
    };

    let detected = detect_extension();
    info!(
        "Detected {}, built for {}, supported: {:?}",
        detected,
        DefaultSimd::EXTENSION,
        supported_extensions()
    );
    if detected != DefaultSimd::EXTENSION {
        warn!(
            "Default descriptor is {} but the CPU supports {}; rebuild with a matching target-cpu",
            DefaultSimd::EXTENSION,
            detected
        );
    }

    let literals = filter_literals(config.filter_value_count());
    let workloads = [
        Workload {
            name: "dense",
            values: dense_values(config.value_count(), config.seed()),
        },
        Workload {
            name: "sparse",
            values: sparse_values(config.value_count(), config.seed().wrapping_add(1)),
        },
    ];

    run::<ScalarI64>(&config, &literals, &workloads)?;

    #[cfg(target_arch = "x86_64")]
    {
        use simdfilter_core::simds::{Avx2I64, Avx512I64, SseI64};
        run::<SseI64>(&config, &literals, &workloads)?;
        run::<Avx2I64>(&config, &literals, &workloads)?;
        run::<Avx512I64>(&config, &literals, &workloads)?;
    }

    #[cfg(target_arch = "aarch64")]
    {
        use simdfilter_core::simds::NeonI64;
        run::<NeonI64>(&config, &literals, &workloads)?;
    }

    Ok(())
}

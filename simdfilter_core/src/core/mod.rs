pub mod filter;
pub mod hash_table;
#[cfg(target_arch = "x86_64")]
mod hash_table_simd;
pub mod is_not_null;
pub mod padded_table;
pub mod scan;

pub use filter::{Filter, FilterKind};
pub use hash_table::{create_bigint_values, BigintValuesUsingHashTable, EMPTY_MARKER, HASH_MULTIPLIER};
pub use is_not_null::IsNotNull;
pub use padded_table::PaddedTable;
pub use scan::{collect_matches, count_matches};

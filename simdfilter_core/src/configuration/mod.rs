pub const DEFAULT_VALUE_COUNT: usize = 1_000_000;
pub const DEFAULT_FILTER_VALUE_COUNT: usize = 1000;
pub const DEFAULT_ITERATIONS: usize = 10;
pub const DEFAULT_SEED: u64 = 0x5eed;

#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub value_count: Option<usize>,
    pub filter_value_count: Option<usize>,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
}

impl Configuration {
    pub fn value_count(&self) -> usize {
        self.value_count.unwrap_or(DEFAULT_VALUE_COUNT)
    }

    pub fn filter_value_count(&self) -> usize {
        self.filter_value_count.unwrap_or(DEFAULT_FILTER_VALUE_COUNT)
    }

    pub fn iterations(&self) -> usize {
        self.iterations.unwrap_or(DEFAULT_ITERATIONS).max(1)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

pub mod core;

pub mod configuration;
pub mod error;
pub mod simds;
pub mod workload;

pub use error::{FilterError, Result};

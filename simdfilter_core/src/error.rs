use thiserror::Error;

use crate::core::filter::FilterKind;
use crate::simds::ExtensionKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("min must be less than max (min: {min}, max: {max})")]
    InvalidBounds { min: i64, max: i64 },

    #[error("values must contain at least 2 distinct entries, got {0}")]
    TooFewValues(usize),

    #[error("{kind}: {operation}() is not supported")]
    Unsupported {
        kind: FilterKind,
        operation: &'static str,
    },

    #[error("cannot merge {this} with {other}")]
    MergeIncompatible { this: FilterKind, other: FilterKind },

    #[error("target extension {0} is not supported by this CPU")]
    UnsupportedExtension(ExtensionKind),
}

pub type Result<T> = std::result::Result<T, FilterError>;

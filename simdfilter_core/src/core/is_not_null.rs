use std::any::Any;

use crate::core::filter::{unsupported, Filter, FilterKind};
use crate::error::Result;
use crate::simds::Primitives;

/// Passes every non-null value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsNotNull;

impl IsNotNull {
    pub fn new() -> Self {
        Self
    }
}

impl<V: Primitives> Filter<V> for IsNotNull {
    fn kind(&self) -> FilterKind {
        FilterKind::IsNotNull
    }

    fn null_allowed(&self) -> bool {
        false
    }

    fn test_non_null(&self) -> Result<bool> {
        Ok(true)
    }

    fn test_int64(&self, _value: i64) -> Result<bool> {
        Ok(true)
    }

    fn test_int64_range(&self, _min: i64, _max: i64, _has_null: bool) -> Result<bool> {
        Ok(true)
    }

    // The null policy is the filter itself, so an override is ignored.
    fn clone_filter(&self, _null_allowed: Option<bool>) -> Box<dyn Filter<V>> {
        Box::new(*self)
    }

    fn merge_with(&self, _other: &dyn Filter<V>) -> Result<Box<dyn Filter<V>>> {
        Err(unsupported(FilterKind::IsNotNull, "merge_with"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! Attribute storage for R values.
//!
//! An ordered name -> RValue map. `names`, `dim`, `dimnames` and `class`
//! carry comparator semantics; everything else is opaque payload.

use thiserror::Error;

use super::RValue;

/// Attribute invariant violations, raised at construction time. A value
/// that fails these checks is never handed to the comparator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("'names' attribute [{actual}] must be the same length as the vector [{expected}]")]
    NamesLength { expected: usize, actual: usize },

    #[error("'names' attribute must be a character vector")]
    NamesType,

    #[error("dims [product {product}] do not match the length of object [{len}]")]
    DimProduct { product: usize, len: usize },

    #[error("negative or missing entry in 'dim' attribute")]
    DimEntry,

    #[error("'dim' attribute must be an integer vector")]
    DimType,

    #[error("'dimnames' must be a list")]
    DimnamesType,
}

/// Ordered attribute map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    entries: Vec<(String, RValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&RValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Insert or replace, preserving first-insertion order.
    pub fn set(&mut self, name: impl Into<String>, value: RValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<RValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names_sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        names
    }
}

//! User-chosen filter values.
//!
//! A [`SingleSelection`] holds one token (a year, a category, a country) and is
//! replaced unconditionally. A [`MultiSelection`] holds an ordered set of entity
//! names and refuses updates that would leave fewer than `minimum` members; the
//! rejected update leaves the previous value untouched and the error doubles as
//! the notice shown to the user.

use crate::errors::{ClimvizError, ClimvizResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Minimum size of the entity set on comparison charts
pub const COMPARISON_MINIMUM: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSelection {
    value: String,
}

impl SingleSelection {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, returning whether it changed
    pub fn set(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if value == self.value {
            return false;
        }
        self.value = value;
        true
    }
}

/// An ordered, de-duplicated set of entity names with a minimum cardinality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSelection {
    values: Vec<String>,
    minimum: usize,
}

impl MultiSelection {
    /// Create a selection with its mount-time default.
    ///
    /// The default is accepted as given, even below `minimum`: a dataset may
    /// simply have fewer entities than the comparison asks for.
    pub fn new<I, S>(initial: I, minimum: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: dedup(initial),
            minimum,
        }
    }

    pub fn empty(minimum: usize) -> Self {
        Self {
            values: Vec::new(),
            minimum,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn minimum(&self) -> usize {
        self.minimum
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace the selection if the new set is large enough.
    ///
    /// Returns whether the selection changed. When the de-duplicated set has
    /// fewer than `minimum` members the selection is left as it was and
    /// [`ClimvizError::SelectionTooSmall`] is returned.
    pub fn set<I, S>(&mut self, values: I) -> ClimvizResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = dedup(values);
        if values.len() < self.minimum {
            warn!(
                minimum = self.minimum,
                attempted = values.len(),
                "Rejected selection below minimum size"
            );
            return Err(ClimvizError::SelectionTooSmall {
                minimum: self.minimum,
                attempted: values.len(),
            });
        }
        if values == self.values {
            return Ok(false);
        }
        self.values = values;
        Ok(true)
    }
}

fn dedup<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

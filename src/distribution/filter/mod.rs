//! Drill-down selection over the location hierarchy.

use std::collections::BTreeSet;

use crate::distribution::error::{ItnError, Result};
use crate::distribution::model::{EnrichedRecord, LocationField};

/// A set of exact-match selections, at most one per hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationFilter {
    selections: Vec<(LocationField, String)>,
}

impl LocationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `value` at `level`, replacing any earlier selection there.
    pub fn select(mut self, level: LocationField, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.selections.iter_mut().find(|(field, _)| *field == level) {
            Some(slot) => slot.1 = value,
            None => self.selections.push((level, value)),
        }
        self.selections.sort_by_key(|(field, _)| *field);
        self
    }

    /// Builds a filter from optional per-level values, rejecting blank ones.
    pub fn from_levels<I>(levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (LocationField, Option<String>)>,
    {
        let mut filter = Self::new();
        for (level, value) in levels {
            let Some(value) = value else {
                continue;
            };
            if value.trim().is_empty() {
                return Err(ItnError::InvalidFilter(format!(
                    "empty value for {level}"
                )));
            }
            filter = filter.select(level, value);
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn selections(&self) -> &[(LocationField, String)] {
        &self.selections
    }

    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        self.selections
            .iter()
            .all(|(field, value)| record.location.get(*field) == Some(value.as_str()))
    }

    /// Keeps the records that satisfy every selection, in input order.
    pub fn apply<'a>(&self, records: &'a [EnrichedRecord]) -> Vec<&'a EnrichedRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    /// Owned variant of [`apply`](Self::apply).
    pub fn apply_owned(&self, records: Vec<EnrichedRecord>) -> Vec<EnrichedRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }

    /// Restricts the filter to the levels on `level`'s path above it.
    fn ancestors_of(&self, level: LocationField) -> Self {
        let ancestors = level.path().split_last().map_or(&[][..], |(_, above)| above);
        Self {
            selections: self
                .selections
                .iter()
                .filter(|(field, _)| ancestors.contains(field))
                .cloned()
                .collect(),
        }
    }
}

/// Sorted distinct values available at `level` once the selections made for
/// the levels above it are applied.
pub fn options(
    records: &[EnrichedRecord],
    level: LocationField,
    filter: &LocationFilter,
) -> Vec<String> {
    let scope = filter.ancestors_of(level);
    records
        .iter()
        .filter(|record| scope.matches(record))
        .filter_map(|record| record.location.get(level))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

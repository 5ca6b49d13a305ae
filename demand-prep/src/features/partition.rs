//! Category partitioning with recorded row positions.
//!
//! A grouped computation never reorders the frame. Each group keeps the
//! original positions of its rows; values are gathered per group, computed,
//! and written back to exactly those positions.

use std::collections::HashMap;

use polars::prelude::*;
use rayon::prelude::*;

use super::{require_column, FeatureResult};

/// How rows are grouped for per-category features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping<'a> {
    /// One group per distinct value of this column.
    Column(&'a str),
    /// The whole frame is a single ordered series.
    Single,
}

/// Rows belonging to one category, in frame order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    /// Category value, `None` for null keys and for [`Grouping::Single`].
    pub key: Option<String>,
    /// Original row positions, ascending.
    pub positions: Vec<usize>,
}

/// Arena of per-category row positions for one frame.
#[derive(Debug, Clone)]
pub struct CategoryPartition {
    groups: Vec<CategoryGroup>,
    len: usize,
}

impl CategoryPartition {
    /// Partition a frame according to `grouping`.
    ///
    /// Groups are ordered by first appearance of their key.
    pub fn from_frame(df: &DataFrame, grouping: Grouping<'_>) -> FeatureResult<Self> {
        match grouping {
            Grouping::Single => Ok(Self::single(df.height())),
            Grouping::Column(name) => {
                let keys = require_column(df, name)?.cast(&DataType::String)?;
                Ok(Self::from_keys(keys.str()?.into_iter()))
            }
        }
    }

    /// A single group spanning `len` rows.
    pub fn single(len: usize) -> Self {
        let groups = if len == 0 {
            Vec::new()
        } else {
            vec![CategoryGroup {
                key: None,
                positions: (0..len).collect(),
            }]
        };
        Self { groups, len }
    }

    /// Partition from an iterator of row keys.
    pub fn from_keys<'k, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Option<&'k str>>,
    {
        let mut index: HashMap<Option<&'k str>, usize> = HashMap::new();
        let mut groups: Vec<CategoryGroup> = Vec::new();
        let mut len = 0;

        for (position, key) in keys.into_iter().enumerate() {
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(CategoryGroup {
                    key: key.map(str::to_string),
                    positions: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].positions.push(position);
            len = position + 1;
        }

        Self { groups, len }
    }

    /// Groups in first-appearance order.
    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// Total number of rows covered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Apply `f` to each group's values and return the results in frame order.
    ///
    /// `f` receives the group's values in row order and must return one
    /// value per input. Groups are processed in parallel.
    pub fn map_groups<F>(&self, values: &[Option<f64>], f: F) -> Vec<Option<f64>>
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>> + Sync,
    {
        debug_assert_eq!(values.len(), self.len, "values do not cover the partition");

        let per_group: Vec<Vec<Option<f64>>> = self
            .groups
            .par_iter()
            .map(|group| {
                let slice: Vec<Option<f64>> =
                    group.positions.iter().map(|&pos| values[pos]).collect();
                f(&slice)
            })
            .collect();

        let mut out = vec![None; self.len];
        let mut written = 0;
        for (group, results) in self.groups.iter().zip(per_group) {
            debug_assert_eq!(group.positions.len(), results.len());
            for (&pos, value) in group.positions.iter().zip(results) {
                out[pos] = value;
                written += 1;
            }
        }
        debug_assert_eq!(written, self.len, "realignment lost rows");

        out
    }
}

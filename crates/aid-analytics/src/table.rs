//! Table stages shared by every view: filter, group-and-sum,
//! rank-and-truncate and long-format reshape.
//!
//! Stages borrow rows from the loaded record sets and never mutate them.

use aid_domain::{Key, Record, Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// FILTER
// =============================================================================

/// Conjunction of equality constraints over one record type's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<F> {
    constraints: Vec<(F, Key)>,
}

impl<F> Default for Filter<F> {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }
}

impl<F: Copy + Eq + std::fmt::Debug> Filter<F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint. `Selection::All` adds nothing.
    #[must_use]
    pub fn with<K: Into<Key> + Clone>(mut self, field: F, selection: &Selection<K>) -> Self {
        if let Some(value) = selection.as_option() {
            self.constraints.push((field, value.clone().into()));
        }
        self
    }

    /// True when no constraint is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches<R: Record<Field = F>>(&self, row: &R) -> bool {
        self.constraints
            .iter()
            .all(|(field, key)| row.value(*field).matches(key))
    }

    /// Rows matching every constraint, in input order.
    pub fn apply<'a, R>(&self, rows: impl IntoIterator<Item = &'a R>) -> Vec<&'a R>
    where
        R: Record<Field = F> + 'a,
    {
        rows.into_iter().filter(|row| self.matches(*row)).collect()
    }
}

// =============================================================================
// GROUP AND SUM
// =============================================================================

/// One output row of [`group_sum`]: the grouping key values and the sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRow {
    pub keys: Vec<Key>,
    pub value: f64,
}

impl GroupedRow {
    /// Key value at `index`, if present.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    /// Text of the key at `index`, rendering integer keys as digits.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.key(index).map(ToString::to_string).unwrap_or_default()
    }
}

/// Sum `measure` per distinct combination of `by`. Output is ordered by key.
///
/// Rows with a missing value in any grouping field form no group, so they
/// do not contribute to any sum.
pub fn group_sum<'a, R>(
    rows: impl IntoIterator<Item = &'a R>,
    by: &[R::Field],
    measure: R::Field,
) -> Vec<GroupedRow>
where
    R: Record + 'a,
{
    let mut groups: BTreeMap<Vec<Key>, f64> = BTreeMap::new();
    for row in rows {
        let keys: Option<Vec<Key>> = by.iter().map(|field| row.value(*field).to_key()).collect();
        if let Some(keys) = keys {
            *groups.entry(keys).or_insert(0.0) += row.value(measure).as_f64();
        }
    }

    groups
        .into_iter()
        .map(|(keys, value)| GroupedRow { keys, value })
        .collect()
}

/// Column total. An empty input sums to zero.
pub fn sum<'a, R>(rows: impl IntoIterator<Item = &'a R>, measure: R::Field) -> f64
where
    R: Record + 'a,
{
    rows.into_iter().map(|row| row.value(measure).as_f64()).sum()
}

// =============================================================================
// RANK AND TRUNCATE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Stable sort by value; equal values keep their grouped order.
#[must_use]
pub fn sort_by_value(mut rows: Vec<GroupedRow>, order: SortOrder) -> Vec<GroupedRow> {
    match order {
        SortOrder::Ascending => rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
        SortOrder::Descending => rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
    rows
}

/// First `n` rows after [`sort_by_value`].
#[must_use]
pub fn rank_top_n(rows: Vec<GroupedRow>, order: SortOrder, n: usize) -> Vec<GroupedRow> {
    let mut sorted = sort_by_value(rows, order);
    sorted.truncate(n);
    sorted
}

// =============================================================================
// LONG FORMAT
// =============================================================================

/// One `(key, group, value)` triple of a long-format table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow<K> {
    pub key: K,
    pub group: String,
    pub value: f64,
}

/// Reshape wide rows into long format.
///
/// Output holds every row for the first column, then every row for the
/// second, and so on; its length is `rows.len() * columns.len()`.
pub fn melt<R, K>(
    rows: &[R],
    key: impl Fn(&R) -> K,
    columns: &[R::Field],
    label: impl Fn(R::Field) -> &'static str,
) -> Vec<LongRow<K>>
where
    R: Record,
{
    columns
        .iter()
        .flat_map(|&column| {
            let group = label(column);
            rows.iter().map(move |row| (row, group, column))
        })
        .map(|(row, group, column)| LongRow {
            key: key(row),
            group: group.to_string(),
            value: row.value(column).as_f64(),
        })
        .collect()
}

//! Hierarchical query engine: equality filters over origin and destination
//! levels, summed over the surviving cells.

use crate::{
    error::{BagError, BagResult},
    matrix::HierarchicalMatrix,
    schema::{ColLevel, RowLevel},
    types::nan_sum,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exact-match constraints on any subset of levels. A level that is not
/// listed is unset and excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixFilter {
    pub origin: Vec<(RowLevel, String)>,
    pub destination: Vec<(ColLevel, String)>,
}

impl MatrixFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values are trimmed, matching how matrix labels are stored.
    pub fn origin(mut self, level: RowLevel, value: impl AsRef<str>) -> Self {
        self.origin.push((level, value.as_ref().trim().to_string()));
        self
    }

    pub fn destination(mut self, level: ColLevel, value: impl AsRef<str>) -> Self {
        self.destination.push((level, value.as_ref().trim().to_string()));
        self
    }

    /// Build from optional selections; `None` and blank strings are unset.
    pub fn from_optional<'a>(
        origin: impl IntoIterator<Item = (RowLevel, Option<&'a str>)>,
        destination: impl IntoIterator<Item = (ColLevel, Option<&'a str>)>,
    ) -> Self {
        let keep = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Self {
            origin: origin
                .into_iter()
                .filter_map(|(level, v)| keep(v).map(|v| (level, v)))
                .collect(),
            destination: destination
                .into_iter()
                .filter_map(|(level, v)| keep(v).map(|v| (level, v)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.origin.is_empty() && self.destination.is_empty()
    }

    fn check_levels(&self, matrix: &HierarchicalMatrix) -> BagResult<()> {
        let schema = matrix.schema();
        if let Some((level, _)) = self.origin.iter().find(|(l, _)| !schema.has_row_level(*l)) {
            return Err(BagError::UnknownLevel {
                level: level.to_string(),
                schema: schema.name.clone(),
            });
        }
        if let Some((level, _)) = self.destination.iter().find(|(l, _)| !schema.has_col_level(*l)) {
            return Err(BagError::UnknownLevel {
                level: level.to_string(),
                schema: schema.name.clone(),
            });
        }
        Ok(())
    }

    fn row_matches(&self, matrix: &HierarchicalMatrix, row: usize) -> bool {
        self.origin
            .iter()
            .all(|(level, value)| matrix.row_label(row, *level) == Some(value.as_str()))
    }

    fn col_matches(&self, matrix: &HierarchicalMatrix, col: usize) -> bool {
        self.destination
            .iter()
            .all(|(level, value)| matrix.col_label(col, *level) == Some(value.as_str()))
    }
}

/// Sum of every cell whose row satisfies all origin constraints and whose
/// column satisfies all destination constraints. NaN cells contribute
/// nothing; an empty selection sums to 0.
pub fn filter_and_sum(filter: &MatrixFilter, matrix: &HierarchicalMatrix) -> BagResult<f64> {
    filter.check_levels(matrix)?;

    let rows: Vec<usize> = (0..matrix.row_count())
        .filter(|&r| filter.row_matches(matrix, r))
        .collect();
    let cols: Vec<usize> = (0..matrix.col_count())
        .filter(|&c| filter.col_matches(matrix, c))
        .collect();

    log::debug!(
        "query: {} of {} rows, {} of {} columns selected in {}",
        rows.len(),
        matrix.row_count(),
        cols.len(),
        matrix.col_count(),
        matrix.source_name()
    );

    Ok(nan_sum(
        rows.iter()
            .flat_map(|&r| cols.iter().map(move |&c| matrix.value(r, c))),
    ))
}

/// Either side of the hierarchy, for cascading option lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Origin(RowLevel),
    Destination(ColLevel),
}

/// Sorted distinct non-empty values of `level` among the rows (or columns)
/// that satisfy the filter's constraints on the same side.
pub fn level_values(
    matrix: &HierarchicalMatrix,
    level: Level,
    filter: &MatrixFilter,
) -> BagResult<Vec<String>> {
    filter.check_levels(matrix)?;
    let schema = matrix.schema();

    let values: BTreeSet<&str> = match level {
        Level::Origin(l) => {
            if !schema.has_row_level(l) {
                return Err(BagError::UnknownLevel {
                    level: l.to_string(),
                    schema: schema.name.clone(),
                });
            }
            (0..matrix.row_count())
                .filter(|&r| filter.row_matches(matrix, r))
                .filter_map(|r| matrix.row_label(r, l))
                .filter(|v| !v.is_empty())
                .collect()
        }
        Level::Destination(l) => {
            if !schema.has_col_level(l) {
                return Err(BagError::UnknownLevel {
                    level: l.to_string(),
                    schema: schema.name.clone(),
                });
            }
            (0..matrix.col_count())
                .filter(|&c| filter.col_matches(matrix, c))
                .filter_map(|c| matrix.col_label(c, l))
                .filter(|v| !v.is_empty())
                .collect()
        }
    };

    Ok(values.into_iter().map(String::from).collect())
}

/// Distinct `(code, name)` pairs for origin or destination branches under a
/// filter, sorted by code. Schemas without a branch-name level yield the
/// code as the name.
pub fn branch_options(
    matrix: &HierarchicalMatrix,
    origin_side: bool,
    filter: &MatrixFilter,
) -> BagResult<Vec<(String, String)>> {
    filter.check_levels(matrix)?;

    let pairs: BTreeSet<(&str, &str)> = if origin_side {
        (0..matrix.row_count())
            .filter(|&r| filter.row_matches(matrix, r))
            .filter_map(|r| {
                let code = matrix.row_label(r, RowLevel::OrgBranch)?;
                let name = matrix.row_label(r, RowLevel::OrgBranchName).unwrap_or(code);
                Some((code, name))
            })
            .filter(|(code, _)| !code.is_empty())
            .collect()
    } else {
        (0..matrix.col_count())
            .filter(|&c| filter.col_matches(matrix, c))
            .filter_map(|c| {
                let code = matrix.col_label(c, ColLevel::DesBranch)?;
                let name = matrix.col_label(c, ColLevel::DesBranchName).unwrap_or(code);
                Some((code, name))
            })
            .filter(|(code, _)| !code.is_empty())
            .collect()
    };

    Ok(pairs
        .into_iter()
        .map(|(c, n)| (c.to_string(), n.to_string()))
        .collect())
}

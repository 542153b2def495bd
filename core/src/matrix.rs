//! Dense origin × destination matrix with hierarchical row and column keys.
//!
//! Built from a raw positional grid (every cell as text) and a
//! `MatrixSchema`. The builder refuses any grid whose shape does not fit the
//! schema offsets: headers are positional, so a shifted block would silently
//! pair labels with the wrong numbers.

use crate::{
    error::{BagError, BagResult},
    schema::{ColLevel, MatrixSchema, RowLevel},
    types::{coerce_numeric, nan_sum},
};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct HierarchicalMatrix {
    source_name: String,
    schema: MatrixSchema,
    /// One entry per data row: the header-column cells, trimmed.
    row_keys: Vec<Vec<String>>,
    /// Derived mode per data row, present only when the schema derives it.
    row_modes: Option<Vec<String>>,
    /// One entry per data column: the header-row cells, trimmed.
    col_keys: Vec<Vec<String>>,
    /// Row-major numeric block; non-numeric cells are NaN.
    values: Vec<f64>,
}

impl HierarchicalMatrix {
    pub fn from_grid(
        source_name: impl Into<String>,
        grid: Vec<Vec<String>>,
        schema: MatrixSchema,
    ) -> BagResult<Self> {
        let source_name = source_name.into();
        schema.validate()?;

        let min_rows = schema.skip_rows + schema.header_rows + 1;
        if grid.len() < min_rows {
            return Err(BagError::structure(
                &source_name,
                "row count",
                format!(
                    "at least {min_rows} ({} skipped + {} header + 1 data)",
                    schema.skip_rows, schema.header_rows
                ),
                grid.len(),
            ));
        }

        let body = &grid[schema.skip_rows..];
        let width = body[0].len();
        if width <= schema.header_cols {
            return Err(BagError::structure(
                &source_name,
                "column count",
                format!("more than {} ({} header columns + data)", schema.header_cols, schema.header_cols),
                width,
            ));
        }

        for (i, row) in body.iter().enumerate() {
            if row.len() != width {
                let file_row = i + schema.skip_rows;
                let kind = if i < schema.header_rows { "header" } else { "data" };
                return Err(BagError::structure(
                    &source_name,
                    format!("width of {kind} row {file_row}"),
                    width,
                    row.len(),
                ));
            }
        }

        let (header, data) = body.split_at(schema.header_rows);

        let col_keys: Vec<Vec<String>> = (schema.header_cols..width)
            .map(|c| header.iter().map(|row| row[c].trim().to_string()).collect())
            .collect();

        let mut row_keys = Vec::with_capacity(data.len());
        let mut values = Vec::with_capacity(data.len() * col_keys.len());
        for row in data {
            row_keys.push(
                row[..schema.header_cols]
                    .iter()
                    .map(|cell| cell.trim().to_string())
                    .collect::<Vec<_>>(),
            );
            values.extend(row[schema.header_cols..].iter().map(|cell| coerce_numeric(cell)));
        }

        let row_modes = schema.derived_mode.as_ref().and_then(|modes| {
            schema.row_position(RowLevel::OrgProduct).map(|p| {
                row_keys
                    .iter()
                    .map(|key| modes.mode_for(&key[p]).to_string())
                    .collect()
            })
        });

        check_unique(&source_name, "row", &row_keys, |i| schema.row_levels[i].is_some())?;
        check_unique(&source_name, "column", &col_keys, |i| schema.col_levels[i].is_some())?;

        log::debug!(
            "matrix: loaded {source_name} as {} ({} rows x {} columns)",
            schema.name,
            row_keys.len(),
            col_keys.len()
        );

        Ok(Self {
            source_name,
            schema,
            row_keys,
            row_modes,
            col_keys,
            values,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn schema(&self) -> &MatrixSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_keys.len()
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.col_count() + col]
    }

    /// Label of a data row at one origin level, stored or derived.
    pub fn row_label(&self, row: usize, level: RowLevel) -> Option<&str> {
        if level == RowLevel::Mode {
            if let Some(modes) = &self.row_modes {
                return Some(modes[row].as_str());
            }
        }
        self.schema
            .row_position(level)
            .map(|p| self.row_keys[row][p].as_str())
    }

    /// Label of a data column at one destination level.
    pub fn col_label(&self, col: usize, level: ColLevel) -> Option<&str> {
        self.schema
            .col_position(level)
            .map(|p| self.col_keys[col][p].as_str())
    }

    /// NaN-skipping sum of the whole data block.
    pub fn total(&self) -> f64 {
        nan_sum(self.values.iter().copied())
    }
}

fn check_unique(
    source_name: &str,
    axis: &'static str,
    keys: &[Vec<String>],
    kept: impl Fn(usize) -> bool,
) -> BagResult<()> {
    let mut seen: HashSet<Vec<&str>> = HashSet::with_capacity(keys.len());
    for key in keys {
        let projected: Vec<&str> = key
            .iter()
            .enumerate()
            .filter(|(i, _)| kept(*i))
            .map(|(_, v)| v.as_str())
            .collect();
        if !seen.insert(projected.clone()) {
            return Err(BagError::DuplicateKey {
                source_name: source_name.to_string(),
                axis,
                key: projected.join(" | "),
            });
        }
    }
    Ok(())
}

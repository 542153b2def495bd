//! Flow table loader: wide absolute/percentage tables to merged long form.
//!
//! The wide tables carry one row per (Region, Type, Service_Type) and one
//! column per destination branch. Long form has one record per
//! (group, branch) cell, carrying both the absolute value and the branch's
//! percentage contribution within its group.

use crate::{
    error::{BagError, BagResult},
    types::{BranchCode, GroupKey, RegionName},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub key: GroupKey,
    pub total: f64,
    /// One value per branch column, in column order. NaN when missing.
    pub values: Vec<f64>,
}

/// Wide absolute-value table: [Region, Type, Service_Type, Total, branches...].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub branch_columns: Vec<BranchCode>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentRow {
    pub key: GroupKey,
    pub values: Vec<f64>,
}

/// Wide percentage table: [Region, Type, Service_Type, branches...].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentTable {
    pub branch_columns: Vec<BranchCode>,
    pub rows: Vec<PercentRow>,
}

fn check_columns(source: &str, branch_columns: &[BranchCode]) -> BagResult<()> {
    let mut seen = HashSet::with_capacity(branch_columns.len());
    for column in branch_columns {
        if !seen.insert(column.as_str()) {
            return Err(BagError::DuplicateKey {
                source_name: source.to_string(),
                axis: "column",
                key: column.clone(),
            });
        }
    }
    Ok(())
}

fn check_width(source: &str, key: &GroupKey, expected: usize, actual: usize) -> BagResult<()> {
    if expected != actual {
        return Err(BagError::structure(
            source,
            format!("branch values of row {key}"),
            expected,
            actual,
        ));
    }
    Ok(())
}

impl WideTable {
    pub fn new(branch_columns: Vec<BranchCode>, rows: Vec<WideRow>) -> BagResult<Self> {
        check_columns("absolute table", &branch_columns)?;
        for row in &rows {
            check_width("absolute table", &row.key, branch_columns.len(), row.values.len())?;
        }
        Ok(Self {
            branch_columns,
            rows,
        })
    }

    /// Distinct regions in order of first appearance.
    pub fn regions(&self) -> Vec<RegionName> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.key.region.as_str()))
            .map(|r| r.key.region.clone())
            .collect()
    }

    pub fn row(&self, key: &GroupKey) -> Option<&WideRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Value of one branch column for a group, if both exist.
    pub fn value(&self, key: &GroupKey, branch: &str) -> Option<f64> {
        let column = self.branch_columns.iter().position(|b| b == branch)?;
        self.row(key).map(|r| r.values[column])
    }
}

impl PercentTable {
    pub fn new(branch_columns: Vec<BranchCode>, rows: Vec<PercentRow>) -> BagResult<Self> {
        check_columns("percentage table", &branch_columns)?;
        for row in &rows {
            check_width("percentage table", &row.key, branch_columns.len(), row.values.len())?;
        }
        Ok(Self {
            branch_columns,
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongValue {
    pub key: GroupKey,
    pub branch: BranchCode,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongPercentage {
    pub key: GroupKey,
    pub branch: BranchCode,
    pub percentage: f64,
}

/// One (group, branch) cell with its absolute value and percentage share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub key: GroupKey,
    pub branch: BranchCode,
    pub value: f64,
    pub percentage: f64,
}

/// Wide → long, column-major: every row of the first branch, then the next.
pub fn melt_values(table: &WideTable) -> Vec<LongValue> {
    table
        .branch_columns
        .iter()
        .enumerate()
        .flat_map(|(c, branch)| {
            table.rows.iter().map(move |row| LongValue {
                key: row.key.clone(),
                branch: branch.clone(),
                value: row.values[c],
            })
        })
        .collect()
}

pub fn melt_percentages(table: &PercentTable) -> Vec<LongPercentage> {
    table
        .branch_columns
        .iter()
        .enumerate()
        .flat_map(|(c, branch)| {
            table.rows.iter().map(move |row| LongPercentage {
                key: row.key.clone(),
                branch: branch.clone(),
                percentage: row.values[c],
            })
        })
        .collect()
}

/// Inner join on (Region, Type, Service_Type, Branch), preserving the order
/// of the value side.
pub fn merge_flow_records(values: &[LongValue], percentages: &[LongPercentage]) -> Vec<FlowRecord> {
    let mut index: HashMap<(&GroupKey, &str), Vec<f64>> = HashMap::with_capacity(percentages.len());
    for p in percentages {
        index
            .entry((&p.key, p.branch.as_str()))
            .or_default()
            .push(p.percentage);
    }

    let mut records = Vec::with_capacity(values.len());
    for v in values {
        if let Some(matches) = index.get(&(&v.key, v.branch.as_str())) {
            records.extend(matches.iter().map(|&percentage| FlowRecord {
                key: v.key.clone(),
                branch: v.branch.clone(),
                value: v.value,
                percentage,
            }));
        }
    }
    records
}

/// Immutable snapshot of the loaded flow tables. Every analysis run reads
/// from one of these and never mutates it.
#[derive(Debug, Clone)]
pub struct FlowDataset {
    pub absolute: WideTable,
    pub percentage: PercentTable,
    pub records: Vec<FlowRecord>,
}

impl FlowDataset {
    pub fn new(absolute: WideTable, percentage: PercentTable) -> Self {
        let values = melt_values(&absolute);
        let percentages = melt_percentages(&percentage);
        let records = merge_flow_records(&values, &percentages);

        if records.len() < values.len() {
            log::debug!(
                "flow_table: {} of {} value cells had no matching percentage and were dropped",
                values.len() - records.len(),
                values.len()
            );
        }
        log::info!(
            "flow_table: {} groups, {} branches, {} merged records",
            absolute.rows.len(),
            absolute.branch_columns.len(),
            records.len()
        );

        Self {
            absolute,
            percentage,
            records,
        }
    }
}

//! Unit coverage: how much of each region's processed volume passes through
//! its threshold and optimal branch sets.

use crate::{
    bagging::{group_records, passing, Thresholds},
    error::{BagError, BagResult},
    flow_table::{FlowRecord, WideTable},
    selector::OptimalSet,
    sorting::SortingRequirement,
    types::{nan_sum, percent_of, round_to, GroupKey, RegionName},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub total_units: f64,
    pub optimal_units: f64,
    pub optimal_pct: f64,
    pub non_optimal_units: f64,
    pub non_optimal_pct: f64,
}

impl CoverageSummary {
    fn new(total_units: f64, optimal_units: f64) -> Self {
        let optimal_pct = percent_of(optimal_units, total_units);
        Self {
            total_units,
            optimal_units,
            optimal_pct,
            non_optimal_units: total_units - optimal_units,
            non_optimal_pct: 100.0 - optimal_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCoverage {
    #[serde(flatten)]
    pub requirement: SortingRequirement,
    #[serde(flatten)]
    pub coverage: CoverageSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeSummary {
    pub key: GroupKey,
    pub total_units: f64,
    pub threshold_branches: usize,
    pub pct_through_threshold: f64,
    pub units_through_threshold: f64,
    pub optimal_branches: usize,
    pub pct_through_optimal: f64,
    pub units_through_optimal: f64,
}

fn group_total(absolute: &WideTable, key: &GroupKey) -> BagResult<f64> {
    let row = absolute.row(key).ok_or_else(|| BagError::MissingGroup {
        region: key.region.clone(),
        service_type: key.service_type.clone(),
        type_: key.type_.clone(),
    })?;
    Ok(if row.total.is_nan() { 0.0 } else { row.total })
}

/// Σ over the optimal sets of `type_`: group Total × optimal share.
pub fn optimal_units_by_region(
    absolute: &WideTable,
    optimal_sets: &[OptimalSet],
    type_: &str,
) -> BagResult<BTreeMap<RegionName, f64>> {
    let mut units: BTreeMap<RegionName, f64> = BTreeMap::new();
    for set in optimal_sets.iter().filter(|s| s.key.type_ == type_) {
        let total = group_total(absolute, &set.key)?;
        *units.entry(set.key.region.clone()).or_default() +=
            total * set.optimal_cumulative_percentage / 100.0;
    }
    Ok(units)
}

fn total_units(absolute: &WideTable, type_: &str, region: Option<&str>) -> f64 {
    nan_sum(
        absolute
            .rows
            .iter()
            .filter(|r| r.key.type_ == type_)
            .filter(|r| region.map_or(true, |reg| r.key.region == reg))
            .map(|r| r.total),
    )
}

/// Network-wide units of `type_` and the share routed through optimal sets.
pub fn all_india_summary(
    absolute: &WideTable,
    optimal_sets: &[OptimalSet],
    type_: &str,
) -> BagResult<CoverageSummary> {
    let total = total_units(absolute, type_, None);
    let optimal: f64 = optimal_units_by_region(absolute, optimal_sets, type_)?
        .values()
        .sum();
    Ok(CoverageSummary::new(total, optimal))
}

/// The sorting requirement rows of `type_`, each joined with its region's
/// unit coverage.
pub fn region_coverage(
    absolute: &WideTable,
    optimal_sets: &[OptimalSet],
    sorting: &[SortingRequirement],
    type_: &str,
) -> BagResult<Vec<RegionCoverage>> {
    let optimal_units = optimal_units_by_region(absolute, optimal_sets, type_)?;
    Ok(sorting
        .iter()
        .filter(|s| s.type_ == type_)
        .map(|s| RegionCoverage {
            requirement: s.clone(),
            coverage: CoverageSummary::new(
                total_units(absolute, type_, Some(s.region.as_str())),
                optimal_units.get(&s.region).copied().unwrap_or(0.0),
            ),
        })
        .collect())
}

/// Per-group threshold and optimal coverage for one type, optionally
/// restricted to a region. Percentages round to 2 decimals, units to whole
/// numbers.
pub fn service_type_summary(
    records: &[FlowRecord],
    optimal_sets: &[OptimalSet],
    thresholds: &Thresholds,
    type_: &str,
    region: Option<&str>,
) -> Vec<ServiceTypeSummary> {
    let optimal: HashMap<&GroupKey, &OptimalSet> =
        optimal_sets.iter().map(|s| (&s.key, s)).collect();

    group_records(records)
        .into_iter()
        .filter(|(key, _)| key.type_ == type_)
        .filter(|(key, _)| region.map_or(true, |r| key.region == r))
        .map(|(key, group)| {
            let total_units = nan_sum(group.iter().map(|r| r.value));
            let selected = passing(&group, thresholds.for_type(&key.type_));
            let (optimal_branches, optimal_pct) = optimal
                .get(key)
                .map(|s| (s.optimal_num_branches, s.optimal_cumulative_percentage))
                .unwrap_or((0, 0.0));

            ServiceTypeSummary {
                key: key.clone(),
                total_units,
                threshold_branches: selected.len(),
                pct_through_threshold: round_to(nan_sum(selected.iter().map(|r| r.percentage)), 2),
                units_through_threshold: round_to(nan_sum(selected.iter().map(|r| r.value)), 0),
                optimal_branches,
                pct_through_optimal: round_to(optimal_pct, 2),
                units_through_optimal: round_to(total_units * optimal_pct / 100.0, 0),
            }
        })
        .collect()
}

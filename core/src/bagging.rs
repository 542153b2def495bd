//! Threshold bagging: which branches of each group carry at least the
//! configured per-type volume.

use crate::{
    flow_table::FlowRecord,
    types::{nan_sum, BranchCode, GroupKey},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-type minimum branch value. Types without an entry use 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(HashMap<String, f64>);

impl Thresholds {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn for_type(&self, type_: &str) -> f64 {
        match self.0.get(type_) {
            Some(t) => *t,
            None => {
                log::debug!("bagging: no threshold for type '{type_}', using 0");
                0.0
            }
        }
    }

    pub fn set(&mut self, type_: impl Into<String>, threshold: f64) {
        self.0.insert(type_.into(), threshold);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagSummary {
    pub key: GroupKey,
    pub num_branches: usize,
    pub cumulative_percentage: f64,
    /// Branches that passed, in branch column order.
    pub branches: Vec<BranchCode>,
}

/// Group records by (Region, Service_Type, Type) in ascending key order,
/// keeping record order inside each group.
pub fn group_records(records: &[FlowRecord]) -> BTreeMap<&GroupKey, Vec<&FlowRecord>> {
    let mut groups: BTreeMap<&GroupKey, Vec<&FlowRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(&record.key).or_default().push(record);
    }
    groups
}

/// Branches passing the threshold (inclusive) within one group.
pub fn passing<'a>(group: &[&'a FlowRecord], threshold: f64) -> Vec<&'a FlowRecord> {
    group
        .iter()
        .copied()
        .filter(|r| r.value >= threshold)
        .collect()
}

/// One summary row per group, including groups where nothing passes.
///
/// `cumulative_percentage` sums the supplied percentages of the passing
/// branches as given; it is not recomputed from the values.
pub fn build_bag_summary(records: &[FlowRecord], thresholds: &Thresholds) -> Vec<BagSummary> {
    let summaries: Vec<BagSummary> = group_records(records)
        .into_iter()
        .map(|(key, group)| {
            let threshold = thresholds.for_type(&key.type_);
            let selected = passing(&group, threshold);
            BagSummary {
                key: key.clone(),
                num_branches: selected.len(),
                cumulative_percentage: nan_sum(selected.iter().map(|r| r.percentage)),
                branches: selected.iter().map(|r| r.branch.clone()).collect(),
            }
        })
        .collect();

    log::info!(
        "bagging: {} groups, {} with no branch above threshold",
        summaries.len(),
        summaries.iter().filter(|s| s.num_branches == 0).count()
    );
    summaries
}

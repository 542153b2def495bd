//! Optimal branch selection: the elbow prefix of each group's
//! threshold-surviving branches, ranked by percentage contribution.

use crate::{
    bagging::BagSummary,
    elbow::ElbowCurve,
    flow_table::FlowRecord,
    types::{BranchCode, GroupKey},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalSet {
    pub key: GroupKey,
    pub optimal_num_branches: usize,
    pub optimal_cumulative_percentage: f64,
    /// Top branches by descending percentage, `optimal_num_branches` long.
    pub branches: Vec<BranchCode>,
}

/// Descending by percentage. NaN sorts last; equal values compare equal so
/// a stable sort keeps branch column order.
fn by_percentage_desc(a: &FlowRecord, b: &FlowRecord) -> Ordering {
    match (a.percentage.is_nan(), b.percentage.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal),
    }
}

/// The bag's branches, ranked by descending percentage, with their
/// cumulative curve and elbow. `group` holds the records of the bag's
/// group in branch column order. `None` when no listed branch is found.
pub fn ranked_curve<'a>(
    bag: &BagSummary,
    group: &[&'a FlowRecord],
) -> Option<(Vec<&'a FlowRecord>, ElbowCurve)> {
    let listed: HashSet<&str> = bag.branches.iter().map(String::as_str).collect();
    let mut ranked: Vec<&FlowRecord> = group
        .iter()
        .copied()
        .filter(|r| r.key == bag.key && listed.contains(r.branch.as_str()))
        .collect();
    if ranked.is_empty() {
        return None;
    }

    ranked.sort_by(|a, b| by_percentage_desc(a, b));
    let percentages: Vec<f64> = ranked.iter().map(|r| r.percentage).collect();
    let curve = ElbowCurve::from_contributions(&percentages);
    Some((ranked, curve))
}

/// One optimal set per bag with a non-empty branch list.
///
/// Bags with no branches, or whose branches match no record, are left out
/// of the result rather than zero-filled.
pub fn build_optimal_branches(bags: &[BagSummary], records: &[FlowRecord]) -> Vec<OptimalSet> {
    let mut groups: HashMap<&GroupKey, Vec<&FlowRecord>> = HashMap::new();
    for record in records {
        groups.entry(&record.key).or_default().push(record);
    }

    let mut omitted = 0usize;
    let mut result = Vec::with_capacity(bags.len());
    for bag in bags {
        if bag.branches.is_empty() {
            omitted += 1;
            continue;
        }
        let group = groups.get(&bag.key).map(Vec::as_slice).unwrap_or(&[]);
        let Some((ranked, curve)) = ranked_curve(bag, group) else {
            log::debug!("selector: {} lists branches but none matched a record", bag.key);
            omitted += 1;
            continue;
        };

        let take = curve.optimal_rank();
        log::debug!(
            "selector: {} elbow at rank {take} of {} ({:.2}%)",
            bag.key,
            curve.len(),
            curve.optimal_cumulative()
        );
        result.push(OptimalSet {
            key: bag.key.clone(),
            optimal_num_branches: take,
            optimal_cumulative_percentage: curve.optimal_cumulative(),
            branches: ranked.iter().take(take).map(|r| r.branch.clone()).collect(),
        });
    }

    log::info!(
        "selector: {} optimal sets, {} groups omitted",
        result.len(),
        omitted
    );
    result
}

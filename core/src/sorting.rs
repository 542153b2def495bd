//! Sorting location requirement per (Region, Type).
//!
//! needed = Σ optimal branches + base + multiplier × self branches

use crate::{directory::BranchDirectory, selector::OptimalSet, types::RegionName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortingConfig {
    /// Fixed hub locations every region needs.
    pub base_locations: usize,
    /// Locations per branch inside the region itself.
    pub self_branch_multiplier: usize,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            base_locations: 60,
            self_branch_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingRequirement {
    pub region: RegionName,
    #[serde(rename = "type")]
    pub type_: String,
    pub sorting_locations_for_optimal: usize,
    /// `None` when the region is absent from the directory.
    pub self_branches: Option<usize>,
    pub sorting_location_needed: Option<usize>,
}

pub fn build_sorting_requirement(
    optimal_sets: &[OptimalSet],
    directory: &BranchDirectory,
    config: &SortingConfig,
) -> Vec<SortingRequirement> {
    let mut sums: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for set in optimal_sets {
        *sums
            .entry((set.key.region.as_str(), set.key.type_.as_str()))
            .or_default() += set.optimal_num_branches;
    }

    sums.into_iter()
        .map(|((region, type_), optimal_sum)| {
            let self_branches = directory.self_branches(region);
            if self_branches.is_none() {
                log::warn!("sorting: region {region} has no branches in the directory");
            }
            SortingRequirement {
                region: region.to_string(),
                type_: type_.to_string(),
                sorting_locations_for_optimal: optimal_sum,
                self_branches,
                sorting_location_needed: self_branches.map(|s| {
                    optimal_sum + config.base_locations + config.self_branch_multiplier * s
                }),
            }
        })
        .collect()
}

//! Flow decomposition: region × region flow split into the part that lands
//! on optimal branches and the part that does not.

use crate::{
    flow_table::WideTable,
    selector::OptimalSet,
    types::{percent_of, round_to, GroupKey, RegionName},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Leading branch-code character → destination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchRegionMap(BTreeMap<char, RegionName>);

impl BranchRegionMap {
    pub fn new<I, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (char, R)>,
        R: Into<RegionName>,
    {
        Self(entries.into_iter().map(|(c, r)| (c, r.into())).collect())
    }

    /// The 19-region network table.
    pub fn standard() -> Self {
        Self::new([
            ('A', "AMD"),
            ('B', "BLR"),
            ('C', "CHE"),
            ('E', "CJB"),
            ('H', "HYD"),
            ('I', "IDR"),
            ('J', "HHPT"),
            ('K', "CCU"),
            ('M', "MUM"),
            ('N', "DDL"),
            ('O', "COK"),
            ('P', "PNQ"),
            ('Q', "JAI"),
            ('R', "NGP"),
            ('T', "PAT"),
            ('U', "UPT"),
            ('V', "VJA"),
            ('W', "BBI"),
            ('X', "GAU"),
        ])
    }

    pub fn region_for(&self, branch: &str) -> Option<&str> {
        branch
            .chars()
            .next()
            .and_then(|c| self.0.get(&c))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&char, &RegionName)> {
        self.0.iter()
    }
}

impl Default for BranchRegionMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// Square matrix indexed by region position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMatrix {
    pub regions: Vec<RegionName>,
    /// Row-major: `cells[origin * n + dest]`.
    pub cells: Vec<f64>,
}

impl RegionMatrix {
    pub fn zeros(regions: &[RegionName]) -> Self {
        Self {
            regions: regions.to_vec(),
            cells: vec![0.0; regions.len() * regions.len()],
        }
    }

    fn index_of(&self, region: &str) -> Option<usize> {
        self.regions.iter().position(|r| r == region)
    }

    pub fn at(&self, origin: usize, dest: usize) -> f64 {
        self.cells[origin * self.regions.len() + dest]
    }

    fn add(&mut self, origin: usize, dest: usize, value: f64) {
        let n = self.regions.len();
        self.cells[origin * n + dest] += value;
    }

    /// Cell by region names; 0 when either region is unknown.
    pub fn get(&self, origin: &str, dest: &str) -> f64 {
        match (self.index_of(origin), self.index_of(dest)) {
            (Some(o), Some(d)) => self.at(o, d),
            _ => 0.0,
        }
    }

    /// Per-destination totals (reduction over origins).
    pub fn column_sums(&self) -> Vec<f64> {
        let n = self.regions.len();
        (0..n).map(|d| (0..n).map(|o| self.at(o, d)).sum()).collect()
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    fn plus(&self, other: &RegionMatrix) -> RegionMatrix {
        RegionMatrix {
            regions: self.regions.clone(),
            cells: self.cells.iter().zip(&other.cells).map(|(a, b)| a + b).collect(),
        }
    }

    /// Cell-wise `self / denominator * 100`, rounded to 2 decimals, 0 where
    /// the denominator is 0.
    fn share_of(&self, denominator: &RegionMatrix) -> RegionMatrix {
        RegionMatrix {
            regions: self.regions.clone(),
            cells: self
                .cells
                .iter()
                .zip(&denominator.cells)
                .map(|(&part, &whole)| round_to(percent_of(part, whole), 2))
                .collect(),
        }
    }
}

/// Sending side: origin region × destination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMatrices {
    pub total: RegionMatrix,
    pub optimal: RegionMatrix,
    pub non_optimal: RegionMatrix,
    pub optimal_pct: RegionMatrix,
    pub non_optimal_pct: RegionMatrix,
}

/// Receiving side: per destination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionVectors {
    pub regions: Vec<RegionName>,
    pub total: Vec<f64>,
    pub optimal: Vec<f64>,
    pub non_optimal: Vec<f64>,
    pub optimal_pct: Vec<f64>,
    pub non_optimal_pct: Vec<f64>,
}

impl RegionVectors {
    pub fn get(&self, region: &str) -> Option<(f64, f64, f64)> {
        let i = self.regions.iter().position(|r| r == region)?;
        Some((self.total[i], self.optimal[i], self.non_optimal[i]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub total: f64,
    pub optimal: f64,
    pub non_optimal: f64,
    pub optimal_pct: f64,
    pub non_optimal_pct: f64,
}

impl FlowTotals {
    fn new(total: f64, optimal: f64, non_optimal: f64) -> Self {
        Self {
            total,
            optimal,
            non_optimal,
            optimal_pct: percent_of(optimal, total),
            non_optimal_pct: percent_of(non_optimal, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDecomposition {
    pub selected_type: String,
    pub regions: Vec<RegionName>,
    pub sending: RegionMatrices,
    pub receiving: RegionVectors,
    pub all_india: FlowTotals,
}

/// Split every branch-level flow of `selected_type` into optimal and
/// non-optimal, bucketed by (origin region, destination region).
///
/// Zero and NaN cells are skipped, as are branches whose leading character
/// has no region or maps to a region absent from the table.
pub fn decompose_flow(
    absolute: &WideTable,
    optimal_sets: &[OptimalSet],
    selected_type: &str,
    region_map: &BranchRegionMap,
) -> FlowDecomposition {
    let regions = absolute.regions();

    let optimal_lookup: HashMap<&GroupKey, HashSet<&str>> = optimal_sets
        .iter()
        .map(|set| (&set.key, set.branches.iter().map(String::as_str).collect()))
        .collect();
    let empty = HashSet::new();

    // Destination region index per branch column, resolved once.
    let dest_index: Vec<Option<usize>> = absolute
        .branch_columns
        .iter()
        .map(|branch| {
            let region = region_map.region_for(branch);
            let index = region.and_then(|r| regions.iter().position(|known| known == r));
            if index.is_none() {
                log::debug!(
                    "decomposition: branch {branch} has no known destination region ({}), excluded",
                    region.unwrap_or("unmapped")
                );
            }
            index
        })
        .collect();

    let mut optimal = RegionMatrix::zeros(&regions);
    let mut non_optimal = RegionMatrix::zeros(&regions);

    for row in absolute.rows.iter().filter(|r| r.key.type_ == selected_type) {
        let Some(origin) = regions.iter().position(|r| *r == row.key.region) else {
            continue;
        };
        let optimal_branches = optimal_lookup.get(&row.key).unwrap_or(&empty);

        for ((branch, &value), dest) in absolute
            .branch_columns
            .iter()
            .zip(&row.values)
            .zip(&dest_index)
        {
            if value.is_nan() || value == 0.0 {
                continue;
            }
            let Some(dest) = *dest else { continue };

            if optimal_branches.contains(branch.as_str()) {
                optimal.add(origin, dest, value);
            } else {
                non_optimal.add(origin, dest, value);
            }
        }
    }

    // Each cell's total is derived from its two parts so the split is exact.
    let total = optimal.plus(&non_optimal);

    let receiving = {
        let total_in = total.column_sums();
        let optimal_in = optimal.column_sums();
        let non_optimal_in = non_optimal.column_sums();
        let pct = |part: &[f64]| -> Vec<f64> {
            part.iter()
                .zip(&total_in)
                .map(|(&p, &t)| round_to(percent_of(p, t), 2))
                .collect()
        };
        RegionVectors {
            regions: regions.clone(),
            optimal_pct: pct(&optimal_in),
            non_optimal_pct: pct(&non_optimal_in),
            total: total_in.clone(),
            optimal: optimal_in,
            non_optimal: non_optimal_in,
        }
    };

    let (optimal_sum, non_optimal_sum) = (optimal.total(), non_optimal.total());
    let all_india = FlowTotals::new(optimal_sum + non_optimal_sum, optimal_sum, non_optimal_sum);
    log::info!(
        "decomposition: type={selected_type} total={:.2} optimal={:.2}%",
        all_india.total,
        all_india.optimal_pct
    );

    let sending = RegionMatrices {
        optimal_pct: optimal.share_of(&total),
        non_optimal_pct: non_optimal.share_of(&total),
        total,
        optimal,
        non_optimal,
    };

    FlowDecomposition {
        selected_type: selected_type.to_string(),
        regions,
        sending,
        receiving,
        all_india,
    }
}

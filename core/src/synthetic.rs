//! Deterministic synthetic flow tables.
//!
//! RULE: the same seed and spec always produce the same dataset. All
//! randomness comes from one Pcg64Mcg seeded from the caller's seed.

use crate::{
    config::{BILLED_WEIGHT_TYPE, VOLUME_TYPE},
    decomposition::BranchRegionMap,
    directory::{BranchDirectory, BranchEntry},
    error::BagResult,
    flow_table::{FlowDataset, PercentRow, PercentTable, WideRow, WideTable},
    types::GroupKey,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    /// Taken from the front of the standard region table.
    pub regions: usize,
    pub branches_per_region: usize,
    pub service_types: Vec<String>,
    pub types: Vec<String>,
    /// Probability that a branch receives nothing from a group.
    pub zero_rate: f64,
    /// Pareto minimum and shape for branch values.
    pub value_min: f64,
    pub value_alpha: f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            regions: 4,
            branches_per_region: 6,
            service_types: vec!["Express".into(), "Standard".into()],
            types: vec![VOLUME_TYPE.into(), BILLED_WEIGHT_TYPE.into()],
            zero_rate: 0.15,
            value_min: 5.0,
            value_alpha: 1.2,
        }
    }
}

pub struct SyntheticData {
    pub dataset: FlowDataset,
    pub directory: BranchDirectory,
    pub region_map: BranchRegionMap,
}

pub fn generate_dataset(seed: u64, spec: &SyntheticSpec) -> BagResult<SyntheticData> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let standard = BranchRegionMap::standard();
    let picked: Vec<(char, String)> = standard
        .iter()
        .take(spec.regions)
        .map(|(c, r)| (*c, r.clone()))
        .collect();

    let mut entries = Vec::new();
    let mut branch_columns = Vec::new();
    for (zone_no, (code, region)) in picked.iter().enumerate() {
        for i in 1..=spec.branches_per_region {
            let branch = format!("{code}{i:02}");
            entries.push(BranchEntry {
                zone: format!("Zone-{}", zone_no / 2 + 1),
                region: region.clone(),
                city: format!("{region} City"),
                code: branch.clone(),
                name: format!("{region} Branch {i}"),
            });
            branch_columns.push(branch);
        }
    }

    let mut abs_rows = Vec::new();
    let mut pct_rows = Vec::new();
    for (_, region) in &picked {
        for type_ in &spec.types {
            for service_type in &spec.service_types {
                let values: Vec<f64> = branch_columns
                    .iter()
                    .map(|_| {
                        if rng.gen_bool(spec.zero_rate) {
                            0.0
                        } else {
                            let u: f64 = rng.gen::<f64>().max(1e-10);
                            (spec.value_min * u.powf(-1.0 / spec.value_alpha)).round()
                        }
                    })
                    .collect();
                let total: f64 = values.iter().sum();
                let percentages = values
                    .iter()
                    .map(|v| if total > 0.0 { v / total * 100.0 } else { 0.0 })
                    .collect();

                let key = GroupKey::new(region.clone(), service_type.clone(), type_.clone());
                abs_rows.push(WideRow {
                    key: key.clone(),
                    total,
                    values,
                });
                pct_rows.push(PercentRow {
                    key,
                    values: percentages,
                });
            }
        }
    }

    log::debug!(
        "synthetic: seed={seed} {} groups x {} branches",
        abs_rows.len(),
        branch_columns.len()
    );

    let absolute = WideTable::new(branch_columns.clone(), abs_rows)?;
    let percentage = PercentTable::new(branch_columns, pct_rows)?;
    Ok(SyntheticData {
        dataset: FlowDataset::new(absolute, percentage),
        directory: BranchDirectory::new(entries),
        region_map: standard,
    })
}

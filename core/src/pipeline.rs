//! End-to-end analysis run.
//!
//! STAGE ORDER (fixed):
//!   1. Threshold bagging      (per group)
//!   2. Optimal branch selection (per group, elbow on ranked curve)
//!   3. Flow decomposition     (selected type, region × region)
//!   4. Sorting requirement    (per region × type)
//!   5. Coverage summaries     (selected type)
//!
//! RULES:
//!   - Every call recomputes every stage from the dataset snapshot.
//!   - The dataset is read-only; each run owns its whole result.

use crate::{
    bagging::{build_bag_summary, BagSummary, Thresholds},
    config::AnalysisConfig,
    coverage::{
        all_india_summary, region_coverage, service_type_summary, CoverageSummary, RegionCoverage,
        ServiceTypeSummary,
    },
    decomposition::{decompose_flow, BranchRegionMap, FlowDecomposition},
    directory::BranchDirectory,
    error::BagResult,
    flow_table::FlowDataset,
    selector::{build_optimal_branches, OptimalSet},
    sorting::{build_sorting_requirement, SortingConfig, SortingRequirement},
};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub thresholds: Thresholds,
    pub selected_type: String,
    /// Restricts the service-type summary; `None` means the whole network.
    pub region: Option<String>,
    pub region_map: BranchRegionMap,
    pub sorting: SortingConfig,
}

impl AnalysisParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            selected_type: config.selected_type.clone(),
            region: None,
            region_map: config.region_map.clone(),
            sorting: config.sorting,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub selected_type: String,
    pub region: Option<String>,
    pub bag_summary: Vec<BagSummary>,
    pub optimal_sets: Vec<OptimalSet>,
    pub decomposition: FlowDecomposition,
    pub sorting: Vec<SortingRequirement>,
    pub all_india: CoverageSummary,
    pub region_coverage: Vec<RegionCoverage>,
    pub service_types: Vec<ServiceTypeSummary>,
}

pub fn run_analysis(
    dataset: &FlowDataset,
    directory: &BranchDirectory,
    params: &AnalysisParams,
) -> BagResult<AnalysisReport> {
    let type_ = params.selected_type.as_str();
    log::info!(
        "pipeline: run type={type_} region={}",
        params.region.as_deref().unwrap_or("All India")
    );

    let bag_summary = build_bag_summary(&dataset.records, &params.thresholds);
    let optimal_sets = build_optimal_branches(&bag_summary, &dataset.records);
    let decomposition = decompose_flow(&dataset.absolute, &optimal_sets, type_, &params.region_map);
    let sorting = build_sorting_requirement(&optimal_sets, directory, &params.sorting);

    let all_india = all_india_summary(&dataset.absolute, &optimal_sets, type_)?;
    let region_coverage = region_coverage(&dataset.absolute, &optimal_sets, &sorting, type_)?;
    let service_types = service_type_summary(
        &dataset.records,
        &optimal_sets,
        &params.thresholds,
        type_,
        params.region.as_deref(),
    );

    log::info!(
        "pipeline: {} bags, {} optimal sets, {:.2}% of {type_} through optimal",
        bag_summary.len(),
        optimal_sets.len(),
        all_india.optimal_pct
    );

    Ok(AnalysisReport {
        selected_type: type_.to_string(),
        region: params.region.clone(),
        bag_summary,
        optimal_sets,
        decomposition,
        sorting,
        all_india,
        region_coverage,
        service_types,
    })
}

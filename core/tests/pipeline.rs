use bagging_core::{
    bagging::Thresholds,
    config::AnalysisConfig,
    directory::BranchDirectory,
    flow_table::{FlowDataset, PercentRow, PercentTable, WideRow, WideTable},
    pipeline::{run_analysis, AnalysisParams},
    synthetic::{generate_dataset, SyntheticSpec},
    types::GroupKey,
};

const DIRECTORY: &str = r#"{
    "South": {
        "AMD": { "Ahmedabad": { "A01": "Naroda" } },
        "BLR": { "Bengaluru": { "B01": "Peenya", "B02": "Hebbal" } },
        "CHE": { "Chennai": { "C01": "Guindy" } }
    }
}"#;

fn dataset() -> FlowDataset {
    let columns: Vec<String> = ["A01", "B01", "C01", "B02"].iter().map(|b| b.to_string()).collect();
    let key = GroupKey::new("BLR", "Express", "Volume");
    let abs = WideTable::new(
        columns.clone(),
        vec![WideRow {
            key: key.clone(),
            total: 1000.0,
            values: vec![400.0, 300.0, 200.0, 100.0],
        }],
    )
    .unwrap();
    let pct = PercentTable::new(
        columns,
        vec![PercentRow {
            key,
            values: vec![40.0, 30.0, 20.0, 10.0],
        }],
    )
    .unwrap();
    FlowDataset::new(abs, pct)
}

fn params() -> AnalysisParams {
    let mut params = AnalysisParams::from_config(&AnalysisConfig::default());
    params.thresholds = Thresholds::new([("Volume", 50.0)]);
    params
}

#[test]
fn single_group_runs_end_to_end() {
    let directory = BranchDirectory::from_json(DIRECTORY).unwrap();
    let report = run_analysis(&dataset(), &directory, &params()).unwrap();

    assert_eq!(report.bag_summary.len(), 1);
    assert_eq!(report.optimal_sets.len(), 1);
    assert_eq!(report.optimal_sets[0].branches, vec!["A01", "B01"]);

    // Only BLR sends, so only BLR is a region of the decomposition.
    assert_eq!(report.decomposition.regions, vec!["BLR"]);
    assert_eq!(report.decomposition.all_india.total, 400.0);
    assert_eq!(report.decomposition.all_india.optimal, 300.0);
    assert_eq!(report.decomposition.all_india.optimal_pct, 75.0);

    assert_eq!(report.sorting.len(), 1);
    assert_eq!(report.sorting[0].sorting_location_needed, Some(2 + 60 + 2 * 2));

    assert_eq!(report.all_india.total_units, 1000.0);
    assert_eq!(report.all_india.optimal_units, 700.0);
    assert_eq!(report.region_coverage.len(), 1);
    assert_eq!(report.service_types.len(), 1);
    assert_eq!(report.service_types[0].units_through_optimal, 700.0);
}

#[test]
fn region_restricts_only_the_service_type_summary() {
    let data = generate_dataset(11, &SyntheticSpec::default()).unwrap();
    let mut params = AnalysisParams::from_config(&AnalysisConfig::default_test());
    params.region_map = data.region_map.clone();

    let all = run_analysis(&data.dataset, &data.directory, &params).unwrap();
    let blr = run_analysis(
        &data.dataset,
        &data.directory,
        &params.clone().with_region(Some("BLR".into())),
    )
    .unwrap();

    assert_eq!(blr.region.as_deref(), Some("BLR"));
    assert!(blr.service_types.iter().all(|s| s.key.region == "BLR"));
    assert!(blr.service_types.len() < all.service_types.len());
    assert_eq!(blr.optimal_sets, all.optimal_sets);
    assert_eq!(blr.all_india, all.all_india);
}

#[test]
fn selected_type_drives_coverage_and_decomposition() {
    let data = generate_dataset(3, &SyntheticSpec::default()).unwrap();
    let mut params = AnalysisParams::from_config(&AnalysisConfig::default_test());
    params.region_map = data.region_map.clone();
    params.selected_type = "Billed Wt".into();

    let report = run_analysis(&data.dataset, &data.directory, &params).unwrap();
    assert_eq!(report.decomposition.selected_type, "Billed Wt");
    assert!(report.region_coverage.iter().all(|r| r.requirement.type_ == "Billed Wt"));
    assert!(report.service_types.iter().all(|s| s.key.type_ == "Billed Wt"));
    assert!(report.all_india.optimal_units <= report.all_india.total_units + 1e-6);
}

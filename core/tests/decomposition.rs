use bagging_core::{
    decomposition::{decompose_flow, BranchRegionMap},
    flow_table::{WideRow, WideTable},
    selector::OptimalSet,
    types::GroupKey,
};

// B* -> BLR, C* -> CHE, H* -> HYD (not an origin region here), Z* unmapped.
fn table() -> WideTable {
    let row = |region: &str, type_: &str, values: Vec<f64>| WideRow {
        key: GroupKey::new(region, "Express", type_),
        total: values.iter().filter(|v| !v.is_nan()).sum(),
        values,
    };
    WideTable::new(
        vec!["B01".into(), "B02".into(), "C01".into(), "Z01".into(), "H01".into()],
        vec![
            row("BLR", "Volume", vec![50.0, 30.0, 20.0, 5.0, 7.0]),
            row("CHE", "Volume", vec![10.0, 0.0, 40.0, f64::NAN, 3.0]),
            row("BLR", "Billed Wt", vec![999.0, 999.0, 999.0, 0.0, 0.0]),
        ],
    )
    .unwrap()
}

fn optimal(region: &str, branches: &[&str]) -> OptimalSet {
    OptimalSet {
        key: GroupKey::new(region, "Express", "Volume"),
        optimal_num_branches: branches.len(),
        optimal_cumulative_percentage: 0.0,
        branches: branches.iter().map(|b| b.to_string()).collect(),
    }
}

#[test]
fn sending_matrices_split_by_optimal_membership() {
    let sets = vec![optimal("BLR", &["B01"]), optimal("CHE", &["C01"])];
    let flow = decompose_flow(&table(), &sets, "Volume", &BranchRegionMap::standard());

    assert_eq!(flow.regions, vec!["BLR", "CHE"]);
    let s = &flow.sending;
    assert_eq!(s.total.get("BLR", "BLR"), 80.0);
    assert_eq!(s.total.get("BLR", "CHE"), 20.0);
    assert_eq!(s.total.get("CHE", "BLR"), 10.0);
    assert_eq!(s.total.get("CHE", "CHE"), 40.0);

    assert_eq!(s.optimal.get("BLR", "BLR"), 50.0);
    assert_eq!(s.optimal.get("BLR", "CHE"), 0.0);
    assert_eq!(s.optimal.get("CHE", "CHE"), 40.0);
    assert_eq!(s.non_optimal.get("BLR", "BLR"), 30.0);
    assert_eq!(s.non_optimal.get("CHE", "BLR"), 10.0);

    assert_eq!(s.optimal_pct.get("BLR", "BLR"), 62.5);
    assert_eq!(s.non_optimal_pct.get("BLR", "BLR"), 37.5);
    assert_eq!(s.optimal_pct.get("BLR", "CHE"), 0.0);
    assert_eq!(s.non_optimal_pct.get("BLR", "CHE"), 100.0);
}

#[test]
fn optimal_and_non_optimal_partition_the_total() {
    let sets = vec![optimal("BLR", &["B01", "C01"]), optimal("CHE", &["B02"])];
    let flow = decompose_flow(&table(), &sets, "Volume", &BranchRegionMap::standard());
    let s = &flow.sending;

    for (i, ((t, o), n)) in s
        .total
        .cells
        .iter()
        .zip(&s.optimal.cells)
        .zip(&s.non_optimal.cells)
        .enumerate()
    {
        assert_eq!(o + n, *t, "cell {i}: {o} + {n} != {t}");
    }
    assert_eq!(
        flow.all_india.optimal + flow.all_india.non_optimal,
        flow.all_india.total
    );
}

#[test]
fn partition_is_exact_for_inexact_decimals() {
    let columns: Vec<String> = (1..=6).map(|i| format!("B{i:02}")).collect();
    let table = WideTable::new(
        columns,
        vec![WideRow {
            key: GroupKey::new("BLR", "Express", "Volume"),
            total: 31.18,
            values: vec![8.57, 1.38, 4.7, 7.26, 3.7, 5.57],
        }],
    )
    .unwrap();
    let sets = vec![optimal("BLR", &["B01", "B03", "B04", "B05", "B06"])];
    let flow = decompose_flow(&table, &sets, "Volume", &BranchRegionMap::standard());

    let s = &flow.sending;
    let (o, n, t) = (
        s.optimal.get("BLR", "BLR"),
        s.non_optimal.get("BLR", "BLR"),
        s.total.get("BLR", "BLR"),
    );
    assert_eq!(n, 1.38);
    assert_eq!(o + n, t, "optimal {o} + non-optimal {n} must equal total {t}");
    assert_eq!(
        flow.all_india.optimal + flow.all_india.non_optimal,
        flow.all_india.total
    );
    let (rt, ro, rn) = flow.receiving.get("BLR").unwrap();
    assert_eq!(ro + rn, rt);
}

#[test]
fn receiving_side_is_the_column_sum() {
    let sets = vec![optimal("BLR", &["B01"]), optimal("CHE", &["C01"])];
    let flow = decompose_flow(&table(), &sets, "Volume", &BranchRegionMap::standard());
    let r = &flow.receiving;

    assert_eq!(r.total, flow.sending.total.column_sums());
    assert_eq!(r.get("BLR"), Some((90.0, 50.0, 40.0)));
    assert_eq!(r.get("CHE"), Some((60.0, 40.0, 20.0)));
    assert_eq!(r.get("HYD"), None);
    assert_eq!(r.optimal_pct, vec![55.56, 66.67]);
    assert_eq!(r.non_optimal_pct, vec![44.44, 33.33]);
}

#[test]
fn unmapped_and_unknown_destinations_are_excluded() {
    let flow = decompose_flow(&table(), &[], "Volume", &BranchRegionMap::standard());

    // Z01 has no region; H01 maps to HYD, which sends nothing.
    assert_eq!(flow.all_india.total, 150.0);
    assert_eq!(flow.all_india.optimal, 0.0);
    assert_eq!(flow.all_india.non_optimal_pct, 100.0);
}

#[test]
fn all_india_percentages_are_shares_of_the_total() {
    let sets = vec![optimal("BLR", &["B01"]), optimal("CHE", &["C01"])];
    let flow = decompose_flow(&table(), &sets, "Volume", &BranchRegionMap::standard());

    assert_eq!(flow.all_india.total, 150.0);
    assert_eq!(flow.all_india.optimal, 90.0);
    assert!((flow.all_india.optimal_pct - 60.0).abs() < 1e-9);
    assert!((flow.all_india.non_optimal_pct - 40.0).abs() < 1e-9);
}

#[test]
fn all_india_percentages_are_not_rounded() {
    let table = WideTable::new(
        vec!["B01".into(), "B02".into(), "B03".into()],
        vec![WideRow {
            key: GroupKey::new("BLR", "Express", "Volume"),
            total: 3.0,
            values: vec![1.0, 1.0, 1.0],
        }],
    )
    .unwrap();
    let sets = vec![optimal("BLR", &["B01"])];
    let flow = decompose_flow(&table, &sets, "Volume", &BranchRegionMap::standard());

    assert_eq!(flow.all_india.optimal_pct, 1.0 / 3.0 * 100.0);
    assert_ne!(flow.all_india.optimal_pct, 33.33);
    assert_eq!(flow.receiving.optimal_pct, vec![33.33], "per-region shares stay rounded");
}

#[test]
fn other_types_do_not_leak_in() {
    let flow = decompose_flow(&table(), &[], "Billed Wt", &BranchRegionMap::standard());
    assert_eq!(flow.selected_type, "Billed Wt");
    assert_eq!(flow.all_india.total, 2997.0);
    assert_eq!(flow.sending.total.get("CHE", "BLR"), 0.0);
}

#[test]
fn custom_region_map_reroutes_destinations() {
    let map = BranchRegionMap::new([('B', "BLR"), ('C', "BLR")]);
    let flow = decompose_flow(&table(), &[], "Volume", &map);
    assert_eq!(flow.sending.total.get("BLR", "BLR"), 100.0);
    assert_eq!(flow.sending.total.get("BLR", "CHE"), 0.0);
}

use bagging_core::{
    error::BagError,
    matrix::HierarchicalMatrix,
    query::{branch_options, filter_and_sum, level_values, Level, MatrixFilter},
    schema::{ColLevel, MatrixSchema, ProductModeTable, RowLevel},
};

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// Two origin branches (BLR, CHE) by two destination branches (BLR, CHE):
/// [[10, 20], [30, 40]].
fn five_level_grid(cells: [[&str; 2]; 2]) -> Vec<Vec<String>> {
    grid(&[
        &["", "", "", "", "", "x", "x"],
        &["", "", "", "", "", "Volume", "Volume"],
        &["", "", "", "", "", "South", "South"],
        &["", "", "", "", "", "BLR", "CHE"],
        &["", "", "", "", "", "Bengaluru", "Chennai"],
        &["", "", "", "", "", "B01", "C01"],
        &["South", "BLR", "Bengaluru", "B01", "SFC", cells[0][0], cells[0][1]],
        &["South", "CHE", "Chennai", "C01", "AIR-EXP", cells[1][0], cells[1][1]],
    ])
}

fn five_level() -> HierarchicalMatrix {
    HierarchicalMatrix::from_grid(
        "five.csv",
        five_level_grid([["10", "20"], ["30", "40"]]),
        MatrixSchema::five_level(),
    )
    .unwrap()
}

#[test]
fn two_by_two_sums() {
    let m = five_level();
    assert_eq!(filter_and_sum(&MatrixFilter::new(), &m).unwrap(), 100.0);
    assert_eq!(m.total(), 100.0);

    let origin_blr = MatrixFilter::new().origin(RowLevel::OrgRegion, "BLR");
    assert_eq!(filter_and_sum(&origin_blr, &m).unwrap(), 30.0);

    let dest_che = MatrixFilter::new().destination(ColLevel::DesRegion, "CHE");
    assert_eq!(filter_and_sum(&dest_che, &m).unwrap(), 60.0);
}

#[test]
fn fully_specified_filter_selects_one_cell() {
    let m = five_level();
    let filter = MatrixFilter::new()
        .origin(RowLevel::OrgBranch, "C01")
        .origin(RowLevel::OrgProduct, "AIR-EXP")
        .destination(ColLevel::Type, "Volume")
        .destination(ColLevel::DesBranch, "B01");
    assert_eq!(filter_and_sum(&filter, &m).unwrap(), 30.0);
}

#[test]
fn builder_values_are_trimmed_like_labels() {
    let m = five_level();
    let padded = MatrixFilter::new()
        .origin(RowLevel::OrgRegion, "BLR ")
        .destination(ColLevel::DesRegion, "  CHE");
    assert_eq!(padded.origin[0].1, "BLR");
    assert_eq!(filter_and_sum(&padded, &m).unwrap(), 20.0);
}

#[test]
fn unmatched_value_sums_to_zero() {
    let m = five_level();
    let filter = MatrixFilter::new().origin(RowLevel::OrgRegion, "MUM");
    assert_eq!(filter_and_sum(&filter, &m).unwrap(), 0.0);
}

#[test]
fn non_numeric_cells_contribute_nothing() {
    let m = HierarchicalMatrix::from_grid(
        "five.csv",
        five_level_grid([["10", "n/a"], ["", "40"]]),
        MatrixSchema::five_level(),
    )
    .unwrap();
    assert!(m.value(0, 1).is_nan());
    assert_eq!(filter_and_sum(&MatrixFilter::new(), &m).unwrap(), 50.0);
}

#[test]
fn blank_selections_are_unset() {
    let m = five_level();
    let filter = MatrixFilter::from_optional(
        [(RowLevel::OrgRegion, Some("  ")), (RowLevel::OrgZone, None)],
        [(ColLevel::DesRegion, Some("BLR"))],
    );
    assert_eq!(filter.origin.len(), 0);
    assert_eq!(filter_and_sum(&filter, &m).unwrap(), 40.0);
}

#[test]
fn level_missing_from_schema_is_an_error() {
    let m = five_level();
    let filter = MatrixFilter::new().origin(RowLevel::OrgBranchName, "Peenya");
    let err = filter_and_sum(&filter, &m).unwrap_err();
    assert!(
        matches!(err, BagError::UnknownLevel { ref level, .. } if level == "org_branch_name"),
        "unexpected error: {err}"
    );

    let mode = MatrixFilter::new().origin(RowLevel::Mode, "Air");
    assert!(matches!(
        filter_and_sum(&mode, &m),
        Err(BagError::UnknownLevel { .. })
    ));
}

#[test]
fn ragged_grid_is_rejected() {
    let mut g = five_level_grid([["10", "20"], ["30", "40"]]);
    g[7].pop();
    let err = HierarchicalMatrix::from_grid("ragged.csv", g, MatrixSchema::five_level()).unwrap_err();
    assert!(matches!(err, BagError::Structure { .. }), "unexpected error: {err}");
    assert!(err.to_string().contains("data row 7"), "{err}");
}

#[test]
fn too_few_rows_is_rejected() {
    let mut g = five_level_grid([["10", "20"], ["30", "40"]]);
    g.truncate(6);
    let err = HierarchicalMatrix::from_grid("short.csv", g, MatrixSchema::five_level()).unwrap_err();
    assert!(matches!(err, BagError::Structure { .. }), "unexpected error: {err}");
}

#[test]
fn grid_without_data_columns_is_rejected() {
    let g: Vec<Vec<String>> = five_level_grid([["10", "20"], ["30", "40"]])
        .into_iter()
        .map(|row| row[..5].to_vec())
        .collect();
    let err = HierarchicalMatrix::from_grid("narrow.csv", g, MatrixSchema::five_level()).unwrap_err();
    assert!(matches!(err, BagError::Structure { .. }), "unexpected error: {err}");
}

#[test]
fn duplicate_keys_are_rejected() {
    let mut rows = five_level_grid([["10", "20"], ["30", "40"]]);
    rows[7] = rows[6].clone();
    let err = HierarchicalMatrix::from_grid("dup.csv", rows, MatrixSchema::five_level()).unwrap_err();
    assert!(
        matches!(err, BagError::DuplicateKey { axis: "row", .. }),
        "unexpected error: {err}"
    );

    // Column keys ignore the unlabeled first header row.
    let mut cols = five_level_grid([["10", "20"], ["30", "40"]]);
    for row in cols.iter_mut().take(6).skip(1) {
        row[6] = row[5].clone();
    }
    cols[0][6] = "different".into();
    let err = HierarchicalMatrix::from_grid("dup.csv", cols, MatrixSchema::five_level()).unwrap_err();
    assert!(
        matches!(err, BagError::DuplicateKey { axis: "column", .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn product_mode_schema_derives_mode() {
    let modes = ProductModeTable::new([("SFC", "Ground")]);
    let m = HierarchicalMatrix::from_grid(
        "modes.csv",
        five_level_grid([["10", "20"], ["30", "40"]]),
        MatrixSchema::product_mode(modes),
    )
    .unwrap();

    assert_eq!(m.row_label(0, RowLevel::Mode), Some("Ground"));
    assert_eq!(m.row_label(1, RowLevel::Mode), Some("Unknown"));

    let ground = MatrixFilter::new().origin(RowLevel::Mode, "Ground");
    assert_eq!(filter_and_sum(&ground, &m).unwrap(), 30.0);

    let values = level_values(&m, Level::Origin(RowLevel::Mode), &MatrixFilter::new()).unwrap();
    assert_eq!(values, vec!["Ground", "Unknown"]);
}

fn seven_level() -> HierarchicalMatrix {
    let g = grid(&[
        &["Report generated 2024-01-01"],
        &["", "", "", "", "", "", "", "Volume", "Volume", "Billed Wt"],
        &["", "", "", "", "", "", "", "South", "West", "South"],
        &["", "", "", "", "", "", "", "BLR", "MUM", "BLR"],
        &["", "", "", "", "", "", "", "Bengaluru", "Mumbai", "Bengaluru"],
        &["", "", "", "", "", "", "", "B01", "M01", "B01"],
        &["", "", "", "", "", "", "", "Peenya", "Andheri", "Peenya"],
        &["South", "BLR", "Bengaluru", "B02", "Hebbal", "Ground", "SFC", "5", "7", "50"],
        &["South", "BLR", "Bengaluru", "B02", "Hebbal", "Air", "AIR-EXP", "1", "2", "10"],
        &["West", "MUM", "Mumbai", "M02", "Thane", "Ground", "SFC", "3", "4", "30"],
    ]);
    HierarchicalMatrix::from_grid("seven.csv", g, MatrixSchema::seven_level()).unwrap()
}

#[test]
fn seven_level_skips_the_banner_row() {
    let m = seven_level();
    assert_eq!(m.row_count(), 3);
    assert_eq!(m.col_count(), 3);

    let volume = MatrixFilter::new().destination(ColLevel::Type, "Volume");
    assert_eq!(filter_and_sum(&volume, &m).unwrap(), 22.0);

    let hebbal_air = MatrixFilter::new()
        .origin(RowLevel::OrgBranchName, "Hebbal")
        .origin(RowLevel::Mode, "Air")
        .destination(ColLevel::DesBranchName, "Peenya");
    assert_eq!(filter_and_sum(&hebbal_air, &m).unwrap(), 11.0);
}

#[test]
fn level_values_cascade_under_the_filter() {
    let m = seven_level();
    let volume = MatrixFilter::new().destination(ColLevel::Type, "Volume");
    let regions = level_values(&m, Level::Destination(ColLevel::DesRegion), &volume).unwrap();
    assert_eq!(regions, vec!["BLR", "MUM"]);

    let billed = MatrixFilter::new().destination(ColLevel::Type, "Billed Wt");
    let regions = level_values(&m, Level::Destination(ColLevel::DesRegion), &billed).unwrap();
    assert_eq!(regions, vec!["BLR"]);

    let west = MatrixFilter::new().origin(RowLevel::OrgZone, "West");
    let modes = level_values(&m, Level::Origin(RowLevel::Mode), &west).unwrap();
    assert_eq!(modes, vec!["Ground"]);
}

#[test]
fn branch_options_pair_code_and_name() {
    let m = seven_level();
    let origins = branch_options(&m, true, &MatrixFilter::new()).unwrap();
    assert_eq!(
        origins,
        vec![
            ("B02".to_string(), "Hebbal".to_string()),
            ("M02".to_string(), "Thane".to_string()),
        ]
    );

    let five = five_level();
    let dests = branch_options(&five, false, &MatrixFilter::new()).unwrap();
    assert_eq!(dests[0], ("B01".to_string(), "B01".to_string()));
}

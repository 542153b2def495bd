//! Flat-file readers: wide flow tables, the positional matrix grid and the
//! destination directory.

use crate::{
    directory::BranchDirectory,
    error::{BagError, BagResult},
    flow_table::{FlowDataset, PercentRow, PercentTable, WideRow, WideTable},
    matrix::HierarchicalMatrix,
    schema::MatrixSchema,
    types::{
        coerce_numeric, GroupKey, REGION_COLUMN, SERVICE_TYPE_COLUMN, TOTAL_COLUMN, TYPE_COLUMN,
    },
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column positions of the metadata fields in a wide table header.
struct WideHeader {
    region: usize,
    type_: usize,
    service_type: usize,
    total: Option<usize>,
    branches: Vec<(usize, String)>,
}

impl WideHeader {
    fn parse(source: &str, headers: &StringRecord, require_total: bool) -> BagResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                BagError::structure(source, "metadata columns", format!("a '{name}' column"), "none")
            })
        };

        let region = require(REGION_COLUMN)?;
        let type_ = require(TYPE_COLUMN)?;
        let service_type = require(SERVICE_TYPE_COLUMN)?;
        let total = if require_total {
            Some(require(TOTAL_COLUMN)?)
        } else {
            find(TOTAL_COLUMN)
        };

        let branches: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![region, type_, service_type].contains(i) && Some(*i) != total)
            .map(|(i, h)| (i, h.to_string()))
            .collect();
        if branches.is_empty() {
            return Err(BagError::structure(source, "branch columns", "at least 1", 0));
        }

        Ok(Self {
            region,
            type_,
            service_type,
            total,
            branches,
        })
    }

    fn key(&self, record: &StringRecord) -> GroupKey {
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        GroupKey::new(field(self.region), field(self.service_type), field(self.type_))
    }

    fn values(&self, record: &StringRecord) -> Vec<f64> {
        self.branches
            .iter()
            .map(|(i, _)| coerce_numeric(record.get(*i).unwrap_or("")))
            .collect()
    }

    fn branch_columns(&self) -> Vec<String> {
        self.branches.iter().map(|(_, b)| b.clone()).collect()
    }
}

fn wide_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader)
}

/// Wide absolute table: [Region, Type, Service_Type, Total, branches...].
pub fn read_wide_table<R: Read>(source_name: &str, reader: R) -> BagResult<WideTable> {
    let mut rdr = wide_reader(reader);
    let header = WideHeader::parse(source_name, rdr.headers()?, true)?;
    let total_col = header.total.unwrap_or_default();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(WideRow {
            key: header.key(&record),
            total: coerce_numeric(record.get(total_col).unwrap_or("")),
            values: header.values(&record),
        });
    }
    log::debug!("ingest: {source_name} has {} rows", rows.len());
    WideTable::new(header.branch_columns(), rows)
}

/// Wide percentage table: [Region, Type, Service_Type, branches...]. A
/// stray Total column is not treated as a branch.
pub fn read_percent_table<R: Read>(source_name: &str, reader: R) -> BagResult<PercentTable> {
    let mut rdr = wide_reader(reader);
    let header = WideHeader::parse(source_name, rdr.headers()?, false)?;
    if header.total.is_some() {
        log::debug!("ingest: ignoring {TOTAL_COLUMN} column in {source_name}");
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(PercentRow {
            key: header.key(&record),
            values: header.values(&record),
        });
    }
    log::debug!("ingest: {source_name} has {} rows", rows.len());
    PercentTable::new(header.branch_columns(), rows)
}

/// Every cell of a headerless CSV as text. Rows may differ in width; the
/// matrix builder decides whether that is acceptable.
pub fn read_grid<R: Read>(reader: R) -> BagResult<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut grid = Vec::new();
    for record in rdr.records() {
        grid.push(record?.iter().map(String::from).collect());
    }
    Ok(grid)
}

fn open(path: &Path) -> BagResult<File> {
    File::open(path).map_err(|e| {
        BagError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open {}: {e}", path.display()),
        ))
    })
}

pub fn load_flow_dataset(absolute: &Path, percentage: &Path) -> BagResult<FlowDataset> {
    let abs = read_wide_table(&absolute.display().to_string(), open(absolute)?)?;
    let pct = read_percent_table(&percentage.display().to_string(), open(percentage)?)?;
    Ok(FlowDataset::new(abs, pct))
}

pub fn load_matrix(path: &Path, schema: MatrixSchema) -> BagResult<HierarchicalMatrix> {
    let grid = read_grid(open(path)?)?;
    HierarchicalMatrix::from_grid(path.display().to_string(), grid, schema)
}

pub fn load_directory(path: &Path) -> BagResult<BranchDirectory> {
    let mut content = String::new();
    open(path)?.read_to_string(&mut content)?;
    BranchDirectory::from_json(&content)
}

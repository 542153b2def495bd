//! Schema descriptors for the positional hierarchical matrix.
//!
//! The matrix file carries no self-describing header: the column hierarchy
//! sits in a fixed block of leading rows and the row hierarchy in a fixed
//! block of leading columns. A `MatrixSchema` names those offsets and what
//! each header row/column means, so every observed file layout is data
//! rather than a separate code path.

use crate::error::{BagError, BagResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Mode assigned to product codes missing from the lookup table.
pub const UNKNOWN_MODE: &str = "Unknown";

/// Origin-side hierarchy levels (row labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLevel {
    OrgZone,
    OrgRegion,
    OrgCity,
    OrgBranch,
    OrgBranchName,
    Mode,
    OrgProduct,
}

impl RowLevel {
    pub const ALL: [RowLevel; 7] = [
        Self::OrgZone,
        Self::OrgRegion,
        Self::OrgCity,
        Self::OrgBranch,
        Self::OrgBranchName,
        Self::Mode,
        Self::OrgProduct,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::OrgZone => "org_zone",
            Self::OrgRegion => "org_region",
            Self::OrgCity => "org_city",
            Self::OrgBranch => "org_branch",
            Self::OrgBranchName => "org_branch_name",
            Self::Mode => "mode",
            Self::OrgProduct => "org_product",
        }
    }
}

impl fmt::Display for RowLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination-side hierarchy levels (column labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColLevel {
    Type,
    DesZone,
    DesRegion,
    DesCity,
    DesBranch,
    DesBranchName,
}

impl ColLevel {
    pub const ALL: [ColLevel; 6] = [
        Self::Type,
        Self::DesZone,
        Self::DesRegion,
        Self::DesCity,
        Self::DesBranch,
        Self::DesBranchName,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::DesZone => "des_zone",
            Self::DesRegion => "des_region",
            Self::DesCity => "des_city",
            Self::DesBranch => "des_branch",
            Self::DesBranchName => "des_branch_name",
        }
    }
}

impl fmt::Display for ColLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Product code → mode lookup used to derive the synthetic `Mode` level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductModeTable {
    modes: BTreeMap<String, String>,
}

impl ProductModeTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            modes: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Mode for a product code; unmapped codes classify as "Unknown".
    pub fn mode_for(&self, product: &str) -> &str {
        self.modes
            .get(product.trim())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_MODE)
    }
}

/// Named layout presets, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    #[default]
    FiveLevel,
    SevenLevel,
    ProductMode,
}

impl SchemaVariant {
    pub fn build(&self, modes: &ProductModeTable) -> MatrixSchema {
        match self {
            Self::FiveLevel => MatrixSchema::five_level(),
            Self::SevenLevel => MatrixSchema::seven_level(),
            Self::ProductMode => MatrixSchema::product_mode(modes.clone()),
        }
    }
}

impl std::str::FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "five_level" | "five-level" | "5" => Ok(Self::FiveLevel),
            "seven_level" | "seven-level" | "7" => Ok(Self::SevenLevel),
            "product_mode" | "product-mode" => Ok(Self::ProductMode),
            other => Err(format!("unknown schema variant '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSchema {
    pub name: String,
    /// Leading rows discarded before the header block.
    pub skip_rows: usize,
    /// Rows holding the destination (column) hierarchy.
    pub header_rows: usize,
    /// Columns holding the origin (row) hierarchy.
    pub header_cols: usize,
    /// Meaning of each header column; `None` columns are ignored.
    pub row_levels: Vec<Option<RowLevel>>,
    /// Meaning of each header row; `None` rows are ignored.
    pub col_levels: Vec<Option<ColLevel>>,
    /// When set, `Mode` is derived from `OrgProduct` through this table.
    pub derived_mode: Option<ProductModeTable>,
}

impl MatrixSchema {
    /// 5 origin columns (zone, region, city, branch, product) and 6 header
    /// rows whose first row carries no level.
    pub fn five_level() -> Self {
        Self {
            name: "five_level".into(),
            skip_rows: 0,
            header_rows: 6,
            header_cols: 5,
            row_levels: vec![
                Some(RowLevel::OrgZone),
                Some(RowLevel::OrgRegion),
                Some(RowLevel::OrgCity),
                Some(RowLevel::OrgBranch),
                Some(RowLevel::OrgProduct),
            ],
            col_levels: vec![
                None,
                Some(ColLevel::Type),
                Some(ColLevel::DesZone),
                Some(ColLevel::DesRegion),
                Some(ColLevel::DesCity),
                Some(ColLevel::DesBranch),
            ],
            derived_mode: None,
        }
    }

    /// One banner row, then 6 header rows (type, zone, region, city, branch
    /// code, branch name) over 7 origin columns (zone, region, city, branch
    /// code, branch name, mode, product).
    pub fn seven_level() -> Self {
        Self {
            name: "seven_level".into(),
            skip_rows: 1,
            header_rows: 6,
            header_cols: 7,
            row_levels: vec![
                Some(RowLevel::OrgZone),
                Some(RowLevel::OrgRegion),
                Some(RowLevel::OrgCity),
                Some(RowLevel::OrgBranch),
                Some(RowLevel::OrgBranchName),
                Some(RowLevel::Mode),
                Some(RowLevel::OrgProduct),
            ],
            col_levels: vec![
                Some(ColLevel::Type),
                Some(ColLevel::DesZone),
                Some(ColLevel::DesRegion),
                Some(ColLevel::DesCity),
                Some(ColLevel::DesBranch),
                Some(ColLevel::DesBranchName),
            ],
            derived_mode: None,
        }
    }

    /// The five-level layout with `Mode` derived from the product code.
    pub fn product_mode(modes: ProductModeTable) -> Self {
        Self {
            name: "product_mode".into(),
            derived_mode: Some(modes),
            ..Self::five_level()
        }
    }

    /// Position of a stored origin level among the header columns.
    pub fn row_position(&self, level: RowLevel) -> Option<usize> {
        self.row_levels.iter().position(|l| *l == Some(level))
    }

    /// Position of a stored destination level among the header rows.
    pub fn col_position(&self, level: ColLevel) -> Option<usize> {
        self.col_levels.iter().position(|l| *l == Some(level))
    }

    /// True when the level is stored or derived.
    pub fn has_row_level(&self, level: RowLevel) -> bool {
        self.row_position(level).is_some()
            || (level == RowLevel::Mode && self.derived_mode.is_some())
    }

    pub fn has_col_level(&self, level: ColLevel) -> bool {
        self.col_position(level).is_some()
    }

    /// Reject descriptors whose level lists disagree with their offsets.
    pub fn validate(&self) -> BagResult<()> {
        let invalid = |reason: String| BagError::InvalidSchema {
            schema: self.name.clone(),
            reason,
        };

        if self.header_rows == 0 || self.header_cols == 0 {
            return Err(invalid("header block must have at least one row and one column".into()));
        }
        if self.row_levels.len() != self.header_cols {
            return Err(invalid(format!(
                "{} row levels declared for {} header columns",
                self.row_levels.len(),
                self.header_cols
            )));
        }
        if self.col_levels.len() != self.header_rows {
            return Err(invalid(format!(
                "{} column levels declared for {} header rows",
                self.col_levels.len(),
                self.header_rows
            )));
        }

        let mut seen_rows = HashSet::new();
        for level in self.row_levels.iter().flatten() {
            if !seen_rows.insert(*level) {
                return Err(invalid(format!("row level {level} declared twice")));
            }
        }
        let mut seen_cols = HashSet::new();
        for level in self.col_levels.iter().flatten() {
            if !seen_cols.insert(*level) {
                return Err(invalid(format!("column level {level} declared twice")));
            }
        }

        if self.derived_mode.is_some() {
            if seen_rows.contains(&RowLevel::Mode) {
                return Err(invalid("mode is both stored and derived".into()));
            }
            if !seen_rows.contains(&RowLevel::OrgProduct) {
                return Err(invalid("derived mode needs a stored org_product level".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        MatrixSchema::five_level().validate().unwrap();
        MatrixSchema::seven_level().validate().unwrap();
        MatrixSchema::product_mode(ProductModeTable::default())
            .validate()
            .unwrap();
    }

    #[test]
    fn mismatched_offsets_are_rejected() {
        let mut schema = MatrixSchema::five_level();
        schema.header_cols = 6;
        assert!(matches!(
            schema.validate(),
            Err(BagError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn derived_mode_requires_product() {
        let mut schema = MatrixSchema::product_mode(ProductModeTable::default());
        schema.row_levels[4] = None;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn unmapped_products_are_unknown() {
        let table = ProductModeTable::new([("P1", "Air")]);
        assert_eq!(table.mode_for("P1"), "Air");
        assert_eq!(table.mode_for("P9"), UNKNOWN_MODE);
    }
}

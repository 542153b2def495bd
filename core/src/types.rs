//! Shared primitive types used across the entire analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A short alphanumeric branch code, e.g. "B12".
pub type BranchCode = String;

/// A region name, e.g. "BLR".
pub type RegionName = String;

/// Metadata column names of the wide flow tables.
pub const REGION_COLUMN: &str = "Region";
pub const TYPE_COLUMN: &str = "Type";
pub const SERVICE_TYPE_COLUMN: &str = "Service_Type";
pub const TOTAL_COLUMN: &str = "Total";

/// The (Region, Service_Type, Type) triple every grouped table is keyed by.
///
/// Field order defines the ordering: groups sort by region, then service
/// type, then type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub region: RegionName,
    pub service_type: String,
    #[serde(rename = "type")]
    pub type_: String,
}

impl GroupKey {
    pub fn new(
        region: impl Into<String>,
        service_type: impl Into<String>,
        type_: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            service_type: service_type.into(),
            type_: type_.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.service_type, self.type_)
    }
}

/// Coerce a raw cell to a number. Empty or unparsable text becomes NaN.
pub fn coerce_numeric(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Sum that skips NaN entries. An empty input sums to 0.
pub fn nan_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().filter(|v| !v.is_nan()).sum()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

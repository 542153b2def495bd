use crate::{
    bagging::Thresholds,
    decomposition::BranchRegionMap,
    schema::{MatrixSchema, ProductModeTable, SchemaVariant},
    sorting::SortingConfig,
};
use serde::{Deserialize, Serialize};

pub const VOLUME_TYPE: &str = "Volume";
pub const BILLED_WEIGHT_TYPE: &str = "Billed Wt";

fn default_thresholds() -> Thresholds {
    Thresholds::new([(VOLUME_TYPE, 25.0), (BILLED_WEIGHT_TYPE, 35.0)])
}

fn default_selected_type() -> String {
    VOLUME_TYPE.into()
}

// ── Matrix query settings ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixConfig {
    #[serde(default)]
    pub schema: SchemaVariant,
    /// Product code → mode, used by the `product_mode` schema.
    #[serde(default)]
    pub product_modes: ProductModeTable,
}

impl MatrixConfig {
    pub fn schema(&self) -> MatrixSchema {
        self.schema.build(&self.product_modes)
    }
}

// ── File layout ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFiles {
    pub absolute: String,
    pub percentage: String,
    pub destinations: String,
    pub matrix: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            absolute: "all_data.csv".into(),
            percentage: "all_data_percentage.csv".into(),
            destinations: "des_mappings.json".into(),
            matrix: "data.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_thresholds")]
    pub thresholds: Thresholds,
    #[serde(default = "default_selected_type")]
    pub selected_type: String,
    #[serde(default)]
    pub region_map: BranchRegionMap,
    #[serde(default)]
    pub sorting: SortingConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub files: InputFiles,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            selected_type: default_selected_type(),
            region_map: BranchRegionMap::standard(),
            sorting: SortingConfig::default(),
            matrix: MatrixConfig::default(),
            files: InputFiles::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from the data/ directory.
    /// In tests, use AnalysisConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config/analysis.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!(
            "config: loaded {path} (type={}, {} thresholds, schema={:?})",
            config.selected_type,
            config.thresholds.iter().count(),
            config.matrix.schema
        );
        Ok(config)
    }

    /// Like `load`, but falls back to defaults when the file is absent.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config/analysis.json");
        if std::path::Path::new(&path).exists() {
            Self::load(data_dir)
        } else {
            log::info!("config: {path} not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve a file name from `files` against the data directory.
    pub fn path(&self, data_dir: &str, file: &str) -> String {
        format!("{data_dir}/{file}")
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            thresholds: Thresholds::new([(VOLUME_TYPE, 10.0), (BILLED_WEIGHT_TYPE, 20.0)]),
            matrix: MatrixConfig {
                schema: SchemaVariant::ProductMode,
                product_modes: ProductModeTable::new([
                    ("AIR-EXP", "Air"),
                    ("AIR-STD", "Air"),
                    ("SFC", "Ground"),
                    ("GND", "Ground"),
                ]),
            },
            ..Self::default()
        }
    }
}

//! Destination branch directory: zone → region → city → branch code → name.

use crate::{error::BagResult, types::BranchCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Nested layout of the destination mapping file.
pub type NestedDirectory = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEntry {
    pub zone: String,
    pub region: String,
    pub city: String,
    pub code: BranchCode,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct BranchDirectory {
    entries: Vec<BranchEntry>,
    names: HashMap<BranchCode, String>,
}

impl BranchDirectory {
    pub fn new(entries: Vec<BranchEntry>) -> Self {
        let names = entries
            .iter()
            .map(|e| (e.code.clone(), e.name.clone()))
            .collect();
        Self { entries, names }
    }

    pub fn from_nested(nested: NestedDirectory) -> Self {
        let mut entries = Vec::new();
        for (zone, regions) in nested {
            for (region, cities) in regions {
                for (city, branches) in cities {
                    for (code, name) in branches {
                        entries.push(BranchEntry {
                            zone: zone.clone(),
                            region: region.clone(),
                            city: city.clone(),
                            code,
                            name,
                        });
                    }
                }
            }
        }
        Self::new(entries)
    }

    pub fn from_json(content: &str) -> BagResult<Self> {
        let nested: NestedDirectory = serde_json::from_str(content)?;
        Ok(Self::from_nested(nested))
    }

    pub fn entries(&self) -> &[BranchEntry] {
        &self.entries
    }

    /// Number of directory branches located in `region`.
    pub fn self_branches(&self, region: &str) -> Option<usize> {
        let count = self.entries.iter().filter(|e| e.region == region).count();
        (count > 0).then_some(count)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// "code - name", or the bare code when the directory has no name.
    pub fn label(&self, code: &str) -> String {
        match self.name(code) {
            Some(name) => format!("{code} - {name}"),
            None => code.to_string(),
        }
    }

    pub fn labels<S: AsRef<str>>(&self, codes: &[S]) -> String {
        codes
            .iter()
            .map(|c| self.label(c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_json_flattens_and_labels() {
        let json = r#"{
            "South": {
                "BLR": { "Bengaluru": { "B01": "Peenya", "B02": "Hebbal" } },
                "CHE": { "Chennai": { "C01": "Guindy" } }
            }
        }"#;
        let dir = BranchDirectory::from_json(json).unwrap();
        assert_eq!(dir.entries().len(), 3);
        assert_eq!(dir.self_branches("BLR"), Some(2));
        assert_eq!(dir.self_branches("MUM"), None);
        assert_eq!(dir.label("B02"), "B02 - Hebbal");
        assert_eq!(dir.label("Z99"), "Z99");
        assert_eq!(dir.labels(&["C01", "Z99"]), "C01 - Guindy, Z99");
    }
}

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult, KeyKind};

/// Manifest bundled with the crate, used as the offline fallback source.
pub const EMBEDDED_MANIFEST: &str = include_str!("../data/manifest.json");

const DEFAULT_BASE_URL: &str = "assets";

/// Key → label table that keeps the order in which the manifest declared its
/// entries. Order drives default selection and menu rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: Vec<(String, String)>,
}

impl LabelTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        let mut table = Self::default();
        for (key, label) in entries {
            // first declaration wins
            if !table.contains(&key) {
                table.entries.push((key, label));
            }
        }
        table
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, l)| l.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed, read-only description of a forecast dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    base_url: String,
    latest_cycle: Option<String>,
    cycles: Vec<String>,
    variables: LabelTable,
    regions: LabelTable,
    availability: HashMap<String, Vec<String>>,
    hours: Vec<u32>,
}

// Wire shape. Variables and regions come either as `{key: label}` objects or
// as arrays of `{key|id, name|label}` records.
#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    latest_cycle: Option<String>,
    #[serde(default)]
    available_cycles: Vec<String>,
    variables: LabelsDocument,
    regions: LabelsDocument,
    #[serde(default)]
    availability: HashMap<String, Vec<String>>,
    times_hours: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelsDocument {
    Map(Map<String, Value>),
    Records(Vec<LabelRecord>),
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    #[serde(alias = "id")]
    key: String,
    #[serde(default, alias = "label")]
    name: Option<String>,
}

impl LabelsDocument {
    fn into_table(self) -> LabelTable {
        let entries = match self {
            LabelsDocument::Map(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let label = match value {
                        Value::String(s) => s,
                        Value::Null => key.clone(),
                        other => other.to_string(),
                    };
                    (key, label)
                })
                .collect(),
            LabelsDocument::Records(records) => records
                .into_iter()
                .map(|r| {
                    let label = r.name.unwrap_or_else(|| r.key.clone());
                    (r.key, label)
                })
                .collect(),
        };
        LabelTable::new(entries)
    }
}

impl Manifest {
    /// Parse a manifest document. Only the hour sequence is checked
    /// structurally: it must be non-empty and strictly increasing.
    pub fn from_json(text: &str) -> CatalogResult<Self> {
        let doc: ManifestDocument = serde_json::from_str(text)?;
        Self::from_document(doc)
    }

    /// The manifest compiled into the crate.
    pub fn embedded() -> CatalogResult<Self> {
        Self::from_json(EMBEDDED_MANIFEST)
    }

    fn from_document(doc: ManifestDocument) -> CatalogResult<Self> {
        if doc.times_hours.is_empty() {
            return Err(CatalogError::invalid("times_hours is empty"));
        }
        if let Some(pair) = doc.times_hours.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CatalogError::invalid(format!(
                "times_hours is not strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }

        let mut cycles = doc.available_cycles;
        let latest_cycle = doc.latest_cycle.filter(|c| !c.is_empty());
        if cycles.is_empty() {
            if let Some(latest) = &latest_cycle {
                cycles.push(latest.clone());
            }
        }

        let base_url = doc
            .base_url
            .map(|b| b.trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url,
            latest_cycle,
            cycles,
            variables: doc.variables.into_table(),
            regions: doc.regions.into_table(),
            availability: doc.availability,
            hours: doc.times_hours,
        })
    }

    /// Root of every frame locator, without trailing slashes.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cycles(&self) -> &[String] {
        &self.cycles
    }

    pub fn has_cycle(&self, cycle: &str) -> bool {
        self.cycles.iter().any(|c| c == cycle)
    }

    /// `latest_cycle` when it names a listed cycle, else the last listed one.
    pub fn default_cycle(&self) -> Option<&str> {
        self.latest_cycle
            .as_deref()
            .filter(|latest| self.has_cycle(latest))
            .or_else(|| self.cycles.last().map(String::as_str))
    }

    pub fn variables(&self) -> &LabelTable {
        &self.variables
    }

    pub fn regions(&self) -> &LabelTable {
        &self.regions
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn hour_at(&self, index: usize) -> Option<u32> {
        self.hours.get(index).copied()
    }

    pub fn last_hour_index(&self) -> usize {
        self.hours.len().saturating_sub(1)
    }

    pub fn variable_label(&self, key: &str) -> CatalogResult<&str> {
        self.variables
            .label(key)
            .ok_or_else(|| CatalogError::unknown_key(KeyKind::Variable, key))
    }

    pub fn region_label(&self, key: &str) -> CatalogResult<&str> {
        self.regions
            .label(key)
            .ok_or_else(|| CatalogError::unknown_key(KeyKind::Region, key))
    }

    pub(crate) fn declared_availability(&self, variable: &str) -> &[String] {
        self.availability
            .get(variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

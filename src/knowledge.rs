//! Knowledge store for outlet records and the city directory
//!
//! Read-only after startup. Populated from a JSON dataset produced by the
//! (out-of-scope) document ingestion step; a built-in seed dataset covers
//! local runs and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    /// The in-memory store never fails a lookup; external backings surface
    /// their faults through this.
    #[allow(dead_code)]
    #[error("knowledge store unavailable: {0}")]
    Unavailable(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

// ============================================================================
// Records
// ============================================================================

/// Per-outlet record as produced by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletRecord {
    /// Canonical identifier, `"<Chain> - <City>"`.
    pub name: String,
    pub city: String,
    pub address: String,
    pub contact: String,
    pub hours: String,
    #[serde(default)]
    pub menu: Vec<String>,
    #[serde(default)]
    pub faqs: Vec<String>,
}

/// One city and its outlet display names, in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityOutlets {
    pub name: String,
    pub outlets: Vec<String>,
}

/// On-disk dataset shape.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeData {
    /// Chain display name, also the prefix of every canonical outlet id.
    pub chain: String,
    pub cities: Vec<CityOutlets>,
    #[serde(default)]
    pub records: Vec<OutletRecord>,
}

impl KnowledgeData {
    /// Load a dataset from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KnowledgeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Built-in seed dataset.
    pub fn builtin() -> KnowledgeResult<Self> {
        Ok(serde_json::from_str(include_str!("../data/knowledge.json"))?)
    }
}

/// One outlet's matches for a free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub outlet: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub menu: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<String>,
}

// ============================================================================
// Store Contract
// ============================================================================

/// Read-only lookups the dialogue engine and the API draw from.
///
/// Lookups are case-sensitive on canonical identifiers: lower-cased city
/// names for the directory, `"<Chain> - <City>"` for outlet records.
/// Canonicalization is the caller's responsibility, not the store's.
pub trait KnowledgeStore: Send + Sync {
    /// City names in configured order.
    fn list_cities(&self) -> KnowledgeResult<Vec<String>>;

    /// Outlet display names for a city; empty when the city is unknown.
    fn list_outlets(&self, city: &str) -> KnowledgeResult<Vec<String>>;

    /// Menu lines for an outlet; empty when absent.
    fn menu(&self, outlet: &str) -> KnowledgeResult<Vec<String>>;

    /// FAQ entries for an outlet; empty when absent.
    fn faqs(&self, outlet: &str) -> KnowledgeResult<Vec<String>>;

    /// Full record for an outlet.
    fn outlet(&self, outlet: &str) -> KnowledgeResult<Option<OutletRecord>>;

    /// All canonical outlet identifiers, in dataset order.
    fn outlet_names(&self) -> KnowledgeResult<Vec<String>>;

    /// Case-insensitive substring search across every outlet's menu lines
    /// and FAQ entries.
    fn search(&self, query: &str) -> KnowledgeResult<Vec<SearchHit>>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// The production store: everything held in memory, immutable after load.
pub struct InMemoryKnowledge {
    directory: Vec<CityOutlets>,
    records: HashMap<String, OutletRecord>,
    // Dataset order, so listings and search results are stable.
    order: Vec<String>,
}

impl InMemoryKnowledge {
    pub fn from_data(data: &KnowledgeData) -> Self {
        let directory = data
            .cities
            .iter()
            .map(|city| CityOutlets {
                name: city.name.trim().to_lowercase(),
                outlets: city.outlets.clone(),
            })
            .collect();
        let order = data.records.iter().map(|record| record.name.clone()).collect();
        let records = data
            .records
            .iter()
            .map(|record| (record.name.clone(), record.clone()))
            .collect();
        Self {
            directory,
            records,
            order,
        }
    }
}

impl KnowledgeStore for InMemoryKnowledge {
    fn list_cities(&self) -> KnowledgeResult<Vec<String>> {
        Ok(self.directory.iter().map(|city| city.name.clone()).collect())
    }

    fn list_outlets(&self, city: &str) -> KnowledgeResult<Vec<String>> {
        Ok(self
            .directory
            .iter()
            .find(|entry| entry.name == city)
            .map(|entry| entry.outlets.clone())
            .unwrap_or_default())
    }

    fn menu(&self, outlet: &str) -> KnowledgeResult<Vec<String>> {
        Ok(self
            .records
            .get(outlet)
            .map(|record| record.menu.clone())
            .unwrap_or_default())
    }

    fn faqs(&self, outlet: &str) -> KnowledgeResult<Vec<String>> {
        Ok(self
            .records
            .get(outlet)
            .map(|record| record.faqs.clone())
            .unwrap_or_default())
    }

    fn outlet(&self, outlet: &str) -> KnowledgeResult<Option<OutletRecord>> {
        Ok(self.records.get(outlet).cloned())
    }

    fn outlet_names(&self) -> KnowledgeResult<Vec<String>> {
        Ok(self.order.clone())
    }

    fn search(&self, query: &str) -> KnowledgeResult<Vec<SearchHit>> {
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        for name in &self.order {
            let Some(record) = self.records.get(name) else {
                continue;
            };
            let menu: Vec<String> = record
                .menu
                .iter()
                .filter(|line| line.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            let faqs: Vec<String> = record
                .faqs
                .iter()
                .filter(|entry| entry.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            if !menu.is_empty() || !faqs.is_empty() {
                hits.push(SearchHit {
                    outlet: name.clone(),
                    menu,
                    faqs,
                });
            }
        }
        Ok(hits)
    }
}

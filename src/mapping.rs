//! Static gene-function reference mappings and ontology detection.
//!
//! Two fixed reference tables associate functional gene identifiers with a
//! pathway hierarchy: NCycDB for nitrogen cycling and PCycDB for phosphorus
//! cycling. They ship compiled into the binary and are never constructed
//! dynamically; detection picks the one whose key space intersects the
//! observed feature identifiers.

use crate::error::ConvertError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static NCYC_RAW: &str = include_str!("../data/ncyc_map.tsv");
static PCYC_RAW: &str = include_str!("../data/pcyc_map.tsv");

static NCYC: OnceLock<MappingTable> = OnceLock::new();
static PCYC: OnceLock<MappingTable> = OnceLock::new();

/// Hierarchy levels of the mapping tables, outermost first.
pub const HIERARCHY_LEVELS: [&str; 2] = ["Pathway", "Gene"];

/// The gene-function ontology a table of features belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycDatabase {
    NCyc,
    PCyc,
}

impl CycDatabase {
    /// Returns a string representation of the ontology.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycDatabase::NCyc => "NCyc",
            CycDatabase::PCyc => "PCyc",
        }
    }
}

/// One gene's pathway classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayAnnotation {
    pub pathway: String,
    pub gene: String,
}

/// A reference table keyed by gene identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingTable {
    pub database: CycDatabase,
    pub rows: IndexMap<String, PathwayAnnotation>,
}

impl MappingTable {
    /// Parses one of the embedded TSV reference files (gene, pathway per
    /// line, single header row). Malformed lines cannot occur in the shipped
    /// data; the unit tests assert the expected shape.
    fn parse(database: CycDatabase, raw: &str) -> Self {
        let rows = raw
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once('\t'))
            .map(|(gene, pathway)| {
                (
                    gene.to_string(),
                    PathwayAnnotation {
                        pathway: pathway.to_string(),
                        gene: gene.to_string(),
                    },
                )
            })
            .collect();
        MappingTable { database, rows }
    }

    /// Whether any of the given feature identifiers is a key of this table.
    pub fn matches_any(&self, features: &[String]) -> bool {
        features.iter().any(|f| self.rows.contains_key(f))
    }

    /// Annotation for a single gene identifier.
    pub fn annotation(&self, gene: &str) -> Option<&PathwayAnnotation> {
        self.rows.get(gene)
    }

    /// Restricts the table to the given features, preserving their order.
    /// Features absent from the reference (e.g. the residual row) are simply
    /// not carried over.
    pub fn restrict_to(&self, features: &[String]) -> MappingTable {
        let rows = features
            .iter()
            .filter_map(|f| self.rows.get(f).map(|a| (f.clone(), a.clone())))
            .collect();
        MappingTable {
            database: self.database,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The built-in nitrogen-cycling reference table.
pub fn ncyc() -> &'static MappingTable {
    NCYC.get_or_init(|| MappingTable::parse(CycDatabase::NCyc, NCYC_RAW))
}

/// The built-in phosphorus-cycling reference table.
pub fn pcyc() -> &'static MappingTable {
    PCYC.get_or_init(|| MappingTable::parse(CycDatabase::PCyc, PCYC_RAW))
}

/// Detects which ontology the observed feature identifiers belong to.
///
/// Candidates are tried in fixed order (NCyc, then PCyc); the first whose key
/// set intersects `features` wins. The two built-in key spaces are disjoint,
/// so the order carries no semantic weight.
///
/// # Returns
///
/// * `Result<&'static MappingTable, ConvertError>` -
///   `UnrecognizedFeatureSet` when neither ontology matches.
pub fn detect(features: &[String]) -> Result<&'static MappingTable, ConvertError> {
    let candidates: [&'static MappingTable; 2] = [ncyc(), pcyc()];
    candidates
        .into_iter()
        .find(|table| table.matches_any(features))
        .ok_or(ConvertError::UnrecognizedFeatureSet)
}

//! The assembled output object and its configuration.

use crate::count_table::AbundanceTable;
use crate::error::ConvertError;
use crate::mapping::{CycDatabase, MappingTable};
use crate::metadata::SampleMetadata;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Options forwarded to dataset assembly.
///
/// This is a closed set: anything the downstream consumer would not
/// recognize simply cannot be expressed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Label for the appended residual feature row.
    pub unclassified_label: String,
    /// Drop metadata rows for samples absent from the abundance table.
    pub auto_tidy: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            unclassified_label: "unclassified".to_string(),
            auto_tidy: false,
        }
    }
}

/// The combined dataset handed to downstream ecological-statistics tooling:
/// abundance matrix (with residual row), the detected mapping table
/// restricted to observed features, and optional sample metadata.
///
/// Immutable from this crate's perspective once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub abundance: AbundanceTable,
    pub mapping: MappingTable,
    pub metadata: Option<SampleMetadata>,
}

impl Dataset {
    /// Which gene-function ontology the features were matched against.
    pub fn database(&self) -> CycDatabase {
        self.mapping.database
    }

    /// Serializes the dataset as JSON for external tooling.
    pub fn to_json_file(&self, path: &Path) -> Result<(), ConvertError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| ConvertError::MalformedTable(format!("cannot serialize dataset: {}", e)))?;
        Ok(())
    }
}

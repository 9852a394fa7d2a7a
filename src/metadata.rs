//! Sample metadata handling.
//!
//! Metadata tables carry per-sample experimental attributes (site, depth,
//! treatment, ...) keyed by canonical sample identifier. They arrive either
//! as delimited files or as tables the caller already built, and must share
//! at least one sample identifier with the abundance matrix they accompany.

use crate::count_table::delimiter_for;
use crate::error::ConvertError;
use indexmap::IndexMap;
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A metadata source: a file on disk or a table built in memory.
///
/// This is the "path or already-loaded tabular form" polymorphism of the
/// conversion surface; both resolve to a [`SampleMetadata`].
#[derive(Debug, Clone)]
pub enum TableSource {
    Path(PathBuf),
    Table(SampleMetadata),
}

impl TableSource {
    /// Resolves the source to a loaded metadata table.
    pub fn into_metadata(self) -> Result<SampleMetadata, ConvertError> {
        match self {
            TableSource::Path(path) => SampleMetadata::from_path(&path),
            TableSource::Table(table) => Ok(table),
        }
    }
}

/// Row-keyed sample attribute table.
///
/// Rows are sample identifiers; columns are free-form attributes. Column
/// and row order follow the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Attribute column names, in file order (sample-id column excluded).
    pub attributes: Vec<String>,
    /// Sample id -> attribute values, aligned with `attributes`.
    pub samples: IndexMap<String, Vec<String>>,
}

impl SampleMetadata {
    /// Loads metadata from a delimited file.
    ///
    /// The first header column names the sample-id field and is skipped; the
    /// remaining header cells become attribute names. Each data row is keyed
    /// by its first cell.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the metadata file; delimiter inferred from the
    ///   extension (`.csv` comma, otherwise tab).
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_for(path))
            .has_headers(true)
            .from_path(path)
            .map_err(|e| ConvertError::MalformedTable(format!("metadata: {}", e)))?;
        let headers = reader
            .headers()
            .map_err(|e| ConvertError::MalformedTable(format!("metadata: {}", e)))?
            .clone();
        if headers.is_empty() {
            return Err(ConvertError::MalformedTable(
                "metadata file has an empty header row".to_string(),
            ));
        }
        let attributes: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();

        let mut samples = IndexMap::new();
        for result in reader.records() {
            let record = result.map_err(|e| ConvertError::MalformedTable(format!("metadata: {}", e)))?;
            let sample_id = record.get(0).unwrap_or("").trim().to_string();
            if sample_id.is_empty() {
                warn!("skipping metadata row with empty sample identifier");
                continue;
            }
            let values: Vec<String> = record.iter().skip(1).map(|v| v.trim().to_string()).collect();
            if samples.insert(sample_id.clone(), values).is_some() {
                return Err(ConvertError::MalformedTable(format!(
                    "metadata: duplicate sample identifier '{}'",
                    sample_id
                )));
            }
        }
        if samples.is_empty() {
            return Err(ConvertError::MalformedTable(format!(
                "metadata file '{}' contains no sample rows",
                path.display()
            )));
        }
        Ok(SampleMetadata {
            attributes,
            samples,
        })
    }

    /// Checks that metadata rows overlap the abundance sample columns.
    ///
    /// Zero overlap is fatal (`SampleMismatch`); partial overlap is tolerated
    /// with warnings, since the downstream consumer filters to the shared set.
    pub fn validate_overlap(&self, sample_names: &[String]) -> Result<(), ConvertError> {
        let overlap = sample_names
            .iter()
            .filter(|n| self.samples.contains_key(*n))
            .count();
        if overlap == 0 {
            return Err(ConvertError::SampleMismatch(format!(
                "metadata rows [{}] share no identifier with abundance columns [{}]",
                self.samples.keys().take(5).join(", "),
                sample_names.iter().take(5).join(", ")
            )));
        }
        for name in sample_names {
            if !self.samples.contains_key(name) {
                warn!("abundance column '{}' has no metadata row", name);
            }
        }
        if overlap < self.samples.len() {
            warn!(
                "{} metadata rows do not correspond to any abundance column",
                self.samples.len() - overlap
            );
        }
        Ok(())
    }

    /// Drops rows for samples not in `keep` (the `auto_tidy` option).
    pub fn retain_samples(&mut self, keep: &[String]) {
        self.samples.retain(|id, _| keep.contains(id));
    }

    /// Looks up one attribute value for one sample.
    pub fn attribute(&self, sample_id: &str, attribute: &str) -> Option<&str> {
        let idx = self.attributes.iter().position(|a| a == attribute)?;
        self.samples
            .get(sample_id)
            .and_then(|values| values.get(idx))
            .map(String::as_str)
    }

    /// Number of sample rows.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_metadata(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_from_path_csv() {
        let dir = tempdir().unwrap();
        let path = write_metadata(
            &dir,
            "meta.csv",
            "SampleID,Site,Depth\nSoilA,Forest,10\nSoilB,Meadow,20\n",
        );
        let metadata = SampleMetadata::from_path(&path).unwrap();
        assert_eq!(metadata.sample_count(), 2);
        assert_eq!(metadata.attributes, ["Site", "Depth"]);
        assert_eq!(metadata.attribute("SoilA", "Site"), Some("Forest"));
        assert_eq!(metadata.attribute("SoilB", "Depth"), Some("20"));
        assert_eq!(metadata.attribute("SoilB", "pH"), None);
    }

    #[test]
    fn test_from_path_rejects_duplicate_rows() {
        let dir = tempdir().unwrap();
        let path = write_metadata(&dir, "dup.csv", "SampleID,Site\nSoilA,Forest\nSoilA,Meadow\n");
        assert!(matches!(
            SampleMetadata::from_path(&path).unwrap_err(),
            ConvertError::MalformedTable(_)
        ));
    }

    #[test]
    fn test_validate_overlap() {
        let dir = tempdir().unwrap();
        let path = write_metadata(&dir, "meta.csv", "SampleID,Site\nSoilA,Forest\nSoilC,Bog\n");
        let metadata = SampleMetadata::from_path(&path).unwrap();

        // partial overlap is fine
        metadata
            .validate_overlap(&["SoilA".to_string(), "SoilB".to_string()])
            .unwrap();

        // zero overlap is fatal
        let err = metadata
            .validate_overlap(&["X1".to_string(), "X2".to_string()])
            .unwrap_err();
        assert!(matches!(err, ConvertError::SampleMismatch(_)));
    }

    #[test]
    fn test_retain_samples() {
        let dir = tempdir().unwrap();
        let path = write_metadata(&dir, "meta.csv", "SampleID,Site\nSoilA,Forest\nSoilC,Bog\n");
        let mut metadata = SampleMetadata::from_path(&path).unwrap();
        metadata.retain_samples(&["SoilA".to_string()]);
        assert_eq!(metadata.sample_count(), 1);
        assert!(metadata.samples.contains_key("SoilA"));
    }

    #[test]
    fn test_table_source_in_memory() {
        let mut samples = IndexMap::new();
        samples.insert("SoilA".to_string(), vec!["Forest".to_string()]);
        let table = SampleMetadata {
            attributes: vec!["Site".to_string()],
            samples,
        };
        let resolved = TableSource::Table(table).into_metadata().unwrap();
        assert_eq!(resolved.attribute("SoilA", "Site"), Some("Forest"));
    }
}

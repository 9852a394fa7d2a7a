//! Sample rename (match) tables.
//!
//! The annotation pipelines label sample columns with raw run identifiers
//! that rarely agree with the identifiers used in external metadata. A match
//! table is a two-column, headerless file pairing each raw identifier with
//! its canonical one.

use crate::count_table::delimiter_for;
use crate::error::ConvertError;
use indexmap::IndexMap;
use std::path::Path;

/// Ordered (raw id, canonical id) pairs used to relabel abundance columns.
#[derive(Debug, Clone)]
pub struct MatchTable {
    pairs: IndexMap<String, String>,
}

impl MatchTable {
    /// Loads a match table from a headerless two-column delimited file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file; delimiter inferred from the extension.
    ///
    /// # Returns
    ///
    /// * `Result<MatchTable, ConvertError>` - Fails with `MatchTableFormat`
    ///   if any record does not have exactly two columns or an identifier
    ///   repeats.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_for(path))
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ConvertError::MatchTableFormat(e.to_string()))?;
        let mut pairs = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ConvertError::MatchTableFormat(e.to_string()))?;
            if record.len() != 2 {
                return Err(ConvertError::MatchTableFormat(format!(
                    "row {} has {} columns, expected exactly 2 (raw id, canonical id)",
                    row + 1,
                    record.len()
                )));
            }
            pairs.push((record[0].trim().to_string(), record[1].trim().to_string()));
        }
        Self::from_pairs(pairs)
    }

    /// Builds a match table from already-parsed pairs, validating uniqueness
    /// on both sides so the induced renaming stays a bijection.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ConvertError> {
        let mut map = IndexMap::with_capacity(pairs.len());
        let mut canonical_seen = IndexMap::new();
        for (raw, canonical) in pairs {
            if raw.is_empty() || canonical.is_empty() {
                return Err(ConvertError::MatchTableFormat(
                    "empty identifier in match table".to_string(),
                ));
            }
            if let Some(prev) = canonical_seen.insert(canonical.clone(), raw.clone()) {
                return Err(ConvertError::MatchTableFormat(format!(
                    "canonical id '{}' paired with both '{}' and '{}'",
                    canonical, prev, raw
                )));
            }
            if map.insert(raw.clone(), canonical).is_some() {
                return Err(ConvertError::MatchTableFormat(format!(
                    "raw id '{}' appears more than once",
                    raw
                )));
            }
        }
        Ok(MatchTable { pairs: map })
    }

    /// Looks up the canonical identifier for a raw one.
    pub fn canonical(&self, raw: &str) -> Option<&str> {
        self.pairs.get(raw).map(String::as_str)
    }

    /// Iterates the raw identifiers in table order.
    pub fn raw_ids(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    /// Number of rename pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_path_two_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("match.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "run01\tSoilA\nrun02\tSoilB\n").unwrap();

        let table = MatchTable::from_path(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.canonical("run01"), Some("SoilA"));
        assert_eq!(table.canonical("SoilA"), None);
    }

    #[test]
    fn test_from_path_rejects_wrong_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "run01\tSoilA\textra\n").unwrap();

        assert!(matches!(
            MatchTable::from_path(&path).unwrap_err(),
            ConvertError::MatchTableFormat(_)
        ));
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let dup_raw = vec![
            ("run01".to_string(), "SoilA".to_string()),
            ("run01".to_string(), "SoilB".to_string()),
        ];
        assert!(MatchTable::from_pairs(dup_raw).is_err());

        let dup_canonical = vec![
            ("run01".to_string(), "SoilA".to_string()),
            ("run02".to_string(), "SoilA".to_string()),
        ];
        assert!(MatchTable::from_pairs(dup_canonical).is_err());
    }
}

//! Loading and manipulation of feature-by-sample abundance tables.
//!
//! An abundance table is the primary output of the NCycDB/PCycDB annotation
//! pipelines: rows are functional gene identifiers, columns are samples,
//! cells are non-negative read counts. The first line of the file is a
//! free-text comment that embeds the total number of sequenced reads, which
//! this module extracts for the unclassified-residual computation.

use crate::error::ConvertError;
use crate::match_table::MatchTable;
use itertools::Itertools;
use log::{info, warn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Picks a field delimiter from a file extension: comma for `.csv`,
/// tab for everything else (the annotation pipelines emit TSV).
pub(crate) fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Extracts the total read count from the abundance file's first line.
///
/// The pipelines embed the count as free text (e.g. `# total reads: 150000`),
/// so extraction anchors on the LAST run of ASCII digits in the line rather
/// than any structured field.
///
/// # Arguments
///
/// * `line` - The raw first line of the abundance file.
///
/// # Returns
///
/// * `Result<f64, ConvertError>` - The count, or `HeaderFormat` if the line
///   contains no digits.
pub fn extract_read_count(line: &str) -> Result<f64, ConvertError> {
    let mut last_run: Option<(usize, usize)> = None;
    let mut start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        if c.is_ascii_digit() {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            last_run = Some((s, i));
        }
    }
    if let Some(s) = start {
        last_run = Some((s, line.len()));
    }
    let (s, e) = last_run.ok_or_else(|| ConvertError::HeaderFormat(line.to_string()))?;
    line[s..e]
        .parse::<f64>()
        .map_err(|_| ConvertError::HeaderFormat(line.to_string()))
}

/// A feature-by-sample abundance matrix.
///
/// Stores counts as `f64` along with mappings for feature names and sample
/// names, mirroring the table layout of the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbundanceTable {
    /// The core count data matrix (features x samples).
    pub counts: Array2<f64>,

    /// Mapping from feature index (row) to feature name (gene ID).
    pub feature_names: Vec<String>,
    pub feature_map: HashMap<String, usize>,

    /// Mapping from sample index (column) to sample name.
    pub sample_names: Vec<String>,
    pub sample_map: HashMap<String, usize>,
}

/// Reads an abundance file and extracts its header read count in one pass.
///
/// # Arguments
///
/// * `path` - Path to the delimiter-separated abundance table.
///
/// # Returns
///
/// * `Result<(AbundanceTable, f64), ConvertError>` - The parsed table and the
///   total read count from the first line.
pub fn load(path: &Path) -> Result<(AbundanceTable, f64), ConvertError> {
    let raw = fs::read_to_string(path)?;
    let first_line = raw
        .lines()
        .next()
        .ok_or_else(|| ConvertError::MalformedTable(format!("{}: empty file", path.display())))?;
    let total_reads = extract_read_count(first_line)?;
    let table = AbundanceTable::from_delimited(&raw, delimiter_for(path))?;
    Ok((table, total_reads))
}

impl AbundanceTable {
    /// Parses delimited text into an abundance table.
    ///
    /// Lines starting with `#` are skipped; the first remaining line is the
    /// header row naming the samples; the first column of each data row is
    /// the feature identifier, which must be unique.
    pub fn from_delimited(raw: &str, delimiter: u8) -> Result<Self, ConvertError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .has_headers(true)
            .from_reader(raw.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ConvertError::MalformedTable(e.to_string()))?
            .clone();
        if headers.len() < 2 {
            return Err(ConvertError::MalformedTable(
                "header row needs a feature-id column plus at least one sample column".to_string(),
            ));
        }
        let sample_names: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|s| s.trim().to_string())
            .collect();
        let dup_samples: Vec<&String> = sample_names.iter().duplicates().collect();
        if !dup_samples.is_empty() {
            return Err(ConvertError::MalformedTable(format!(
                "duplicate sample identifiers: {}",
                dup_samples.iter().join(", ")
            )));
        }

        let mut feature_names = Vec::new();
        let mut feature_map = HashMap::new();
        let mut values = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ConvertError::MalformedTable(e.to_string()))?;
            let feature = record.get(0).unwrap_or("").trim().to_string();
            if feature.is_empty() {
                return Err(ConvertError::MalformedTable(format!(
                    "row {} has an empty feature identifier",
                    feature_names.len() + 1
                )));
            }
            if feature_map
                .insert(feature.clone(), feature_names.len())
                .is_some()
            {
                return Err(ConvertError::MalformedTable(format!(
                    "duplicate feature identifier '{}'",
                    feature
                )));
            }
            for (col, cell) in record.iter().skip(1).enumerate() {
                let value: f64 = cell.trim().parse().map_err(|_| {
                    ConvertError::MalformedTable(format!(
                        "non-numeric abundance {:?} for feature '{}', sample '{}'",
                        cell, feature, sample_names[col]
                    ))
                })?;
                values.push(value);
            }
            feature_names.push(feature);
        }

        let counts = Array2::from_shape_vec((feature_names.len(), sample_names.len()), values)
            .map_err(|e| ConvertError::MalformedTable(e.to_string()))?;
        let sample_map = sample_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Ok(AbundanceTable {
            counts,
            feature_names,
            feature_map,
            sample_names,
            sample_map,
        })
    }

    /// Sums each sample column of the matrix.
    pub fn column_sums(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(0))
    }

    /// Appends the unclassified-residual row.
    ///
    /// For every sample column the residual is `total_reads - sum(column)`.
    /// A negative residual means the pipeline classified more reads than the
    /// header declares; it is logged and passed through as a data value, not
    /// clamped or rejected.
    pub fn append_unclassified(
        &mut self,
        total_reads: f64,
        label: &str,
    ) -> Result<(), ConvertError> {
        if self.feature_map.contains_key(label) {
            return Err(ConvertError::MalformedTable(format!(
                "feature '{}' already present; cannot append residual row",
                label
            )));
        }
        let sums = self.column_sums();
        let residuals = sums.mapv(|s| total_reads - s);
        for (i, residual) in residuals.iter().enumerate() {
            if *residual < 0.0 {
                warn!(
                    "sample '{}': classified abundance {} exceeds declared total reads {}; keeping residual {}",
                    self.sample_names[i], sums[i], total_reads, residual
                );
            }
        }
        self.counts
            .push(Axis(0), residuals.view())
            .map_err(|e| {
                ConvertError::MalformedTable(format!("cannot append residual row: {}", e))
            })?;
        self.feature_map
            .insert(label.to_string(), self.feature_names.len());
        self.feature_names.push(label.to_string());
        Ok(())
    }

    /// Relabels sample columns from raw pipeline identifiers to canonical ones.
    ///
    /// Columns without a match-table entry are kept under their raw
    /// identifier with a warning, and match-table rows that hit no column are
    /// warned about as well; the column count never changes.
    pub fn rename_samples(&mut self, match_table: &MatchTable) -> Result<(), ConvertError> {
        for raw in match_table.raw_ids() {
            if !self.sample_map.contains_key(raw) {
                warn!("match-table raw id '{}' matches no abundance column", raw);
            }
        }
        let mut matched = 0usize;
        for name in self.sample_names.iter_mut() {
            if let Some(canonical) = match_table.canonical(name) {
                *name = canonical.to_string();
                matched += 1;
            } else {
                warn!(
                    "sample column '{}' has no match-table entry; keeping raw identifier",
                    name
                );
            }
        }
        let mut sample_map = HashMap::with_capacity(self.sample_names.len());
        for (i, name) in self.sample_names.iter().enumerate() {
            if sample_map.insert(name.clone(), i).is_some() {
                return Err(ConvertError::MatchTableFormat(format!(
                    "renaming produced duplicate sample identifier '{}'",
                    name
                )));
            }
        }
        self.sample_map = sample_map;
        info!(
            "renamed {}/{} sample columns",
            matched,
            self.sample_names.len()
        );
        Ok(())
    }

    /// Returns the dimensions of the table (features, samples).
    pub fn dimensions(&self) -> (usize, usize) {
        self.counts.dim()
    }

    /// Retrieves the counts for a specific feature.
    pub fn feature_counts(&self, feature_name: &str) -> Option<ndarray::ArrayView1<f64>> {
        self.feature_map
            .get(feature_name)
            .map(|&idx| self.counts.row(idx))
    }

    /// Retrieves the counts for a specific sample.
    pub fn sample_counts(&self, sample_name: &str) -> Option<ndarray::ArrayView1<f64>> {
        self.sample_map
            .get(sample_name)
            .map(|&idx| self.counts.column(idx))
    }

    /// Returns the list of feature names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Returns the list of sample names.
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::tempdir;

    const BASIC: &str = "\
# total reads processed: 1000
gene\tS1\tS2
nifH\t500\t600
amoA\t300\t350
";

    #[test]
    fn test_extract_read_count_trailing() {
        assert_eq!(extract_read_count("# total reads: 1000").unwrap(), 1000.0);
        assert_eq!(extract_read_count("1000").unwrap(), 1000.0);
    }

    #[test]
    fn test_extract_read_count_anchors_on_last_run() {
        // earlier digit runs must not win
        assert_eq!(
            extract_read_count("# run 7 of 2024: 150000").unwrap(),
            150000.0
        );
        assert_eq!(extract_read_count("# 42 then trailing text 7").unwrap(), 7.0);
    }

    #[test]
    fn test_extract_read_count_no_digits() {
        let err = extract_read_count("# no numbers here").unwrap_err();
        assert!(matches!(err, ConvertError::HeaderFormat(_)));
    }

    #[test]
    fn test_from_delimited_basic() {
        let table = AbundanceTable::from_delimited(BASIC, b'\t').unwrap();
        assert_eq!(table.dimensions(), (2, 2));
        assert_eq!(table.feature_names(), ["nifH", "amoA"]);
        assert_eq!(table.sample_names(), ["S1", "S2"]);
        assert_eq!(table.counts[[0, 1]], 600.0);
        assert_eq!(table.feature_counts("amoA").unwrap()[0], 300.0);
    }

    #[test]
    fn test_from_delimited_rejects_duplicates_and_garbage() {
        let dup = "gene\tS1\nnifH\t1\nnifH\t2\n";
        assert!(matches!(
            AbundanceTable::from_delimited(dup, b'\t').unwrap_err(),
            ConvertError::MalformedTable(_)
        ));
        let non_numeric = "gene\tS1\nnifH\tlots\n";
        assert!(matches!(
            AbundanceTable::from_delimited(non_numeric, b'\t').unwrap_err(),
            ConvertError::MalformedTable(_)
        ));
    }

    #[test]
    fn test_load_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abund.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", BASIC).unwrap();

        let (table, total) = load(&path).unwrap();
        assert_eq!(total, 1000.0);
        assert_eq!(table.dimensions(), (2, 2));
    }

    #[test]
    fn test_append_unclassified_residuals() {
        let mut table = AbundanceTable::from_delimited(BASIC, b'\t').unwrap();
        table.append_unclassified(1000.0, "unclassified").unwrap();

        assert_eq!(table.dimensions(), (3, 2));
        let residuals = table.feature_counts("unclassified").unwrap();
        assert_relative_eq!(residuals[0], 200.0, epsilon = 1e-9);
        assert_relative_eq!(residuals[1], 50.0, epsilon = 1e-9);
        // post-append, every column sums to the declared total
        for &sum in table.column_sums().iter() {
            assert_relative_eq!(sum, 1000.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_append_unclassified_negative_residual_passes_through() {
        let mut table = AbundanceTable::from_delimited(BASIC, b'\t').unwrap();
        table.append_unclassified(700.0, "unclassified").unwrap();
        let residuals = table.feature_counts("unclassified").unwrap();
        assert_relative_eq!(residuals[0], -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rename_keeps_unmatched_columns() {
        let mut table = AbundanceTable::from_delimited(BASIC, b'\t').unwrap();
        let match_table =
            MatchTable::from_pairs(vec![("S1".to_string(), "SoilA".to_string())]).unwrap();
        table.rename_samples(&match_table).unwrap();

        assert_eq!(table.sample_names(), ["SoilA", "S2"]);
        assert_eq!(table.sample_counts("SoilA").unwrap()[0], 500.0);
        assert!(table.sample_counts("S1").is_none());
    }
}

//! cyc2eco converts functional-gene abundance tables produced by the NCycDB
//! and PCycDB annotation pipelines into a combined dataset object (abundance
//! matrix + gene-to-pathway annotation + optional sample metadata) for
//! downstream ecological-statistics tooling.
//!
//! The conversion is a one-shot batch transform:
//! 1. load the delimited abundance table (features x samples),
//! 2. extract the total read count from the first comment line,
//! 3. append an `unclassified` residual row per sample,
//! 4. optionally relabel sample columns through a match table,
//! 5. optionally load and validate sample metadata,
//! 6. auto-detect whether the NCyc or PCyc reference mapping applies,
//! 7. assemble everything into a [`Dataset`].

pub mod count_table;
pub mod dataset;
pub mod error;
pub mod mapping;
pub mod match_table;
pub mod metadata;

pub use count_table::AbundanceTable;
pub use dataset::{ConvertOptions, Dataset};
pub use error::ConvertError;
pub use mapping::{CycDatabase, MappingTable};
pub use match_table::MatchTable;
pub use metadata::{SampleMetadata, TableSource};

use log::info;
use std::path::Path;

/// Converts an abundance file into a [`Dataset`].
///
/// # Arguments
///
/// * `abundance_path` - Delimited abundance table; first line is a comment
///   whose trailing digit run is the total read count.
/// * `metadata` - Optional sample metadata, as a path or pre-built table.
/// * `match_table_path` - Optional headerless two-column rename table
///   (raw sample id, canonical sample id).
/// * `options` - Enumerated passthrough options for assembly.
///
/// # Returns
///
/// * `Result<Dataset, ConvertError>` - The assembled dataset, or the first
///   structural error encountered; there is no partial-success mode.
pub fn convert(
    abundance_path: &Path,
    metadata: Option<TableSource>,
    match_table_path: Option<&Path>,
    options: &ConvertOptions,
) -> Result<Dataset, ConvertError> {
    info!("loading abundance table {}", abundance_path.display());
    let (mut abundance, total_reads) = count_table::load(abundance_path)?;
    info!(
        "loaded {} features x {} samples, {} total reads declared",
        abundance.dimensions().0,
        abundance.dimensions().1,
        total_reads
    );
    abundance.append_unclassified(total_reads, &options.unclassified_label)?;

    if let Some(path) = match_table_path {
        let match_table = MatchTable::from_path(path)?;
        abundance.rename_samples(&match_table)?;
    }

    let metadata = match metadata {
        Some(source) => {
            let mut table = source.into_metadata()?;
            table.validate_overlap(abundance.sample_names())?;
            if options.auto_tidy {
                table.retain_samples(abundance.sample_names());
            }
            Some(table)
        }
        None => None,
    };

    let mapping = mapping::detect(abundance.feature_names())?
        .restrict_to(abundance.feature_names());
    info!(
        "detected {} ontology ({} of {} features annotated)",
        mapping.database.as_str(),
        mapping.len(),
        abundance.dimensions().0
    );

    Ok(Dataset {
        abundance,
        mapping,
        metadata,
    })
}

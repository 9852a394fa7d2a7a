//! Error taxonomy for the conversion pipeline.
//!
//! Every structural problem aborts the single conversion call; there is no
//! retry or partial-success mode. Each variant names the stage that failed.

use thiserror::Error;

/// Errors raised while converting an abundance table into a [`crate::Dataset`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The abundance or metadata table could not be parsed into a
    /// row-keyed numeric/attribute matrix.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// The first line of the abundance file carries no extractable
    /// total read count.
    #[error("header format: no digit run found in header line {0:?}")]
    HeaderFormat(String),

    /// The sample rename table does not have the expected two-column shape.
    #[error("match table format: {0}")]
    MatchTableFormat(String),

    /// Metadata row identifiers share no overlap with abundance columns.
    #[error("sample mismatch: {0}")]
    SampleMismatch(String),

    /// Feature identifiers intersect neither reference ontology.
    #[error("feature identifiers match neither the NCyc nor the PCyc gene-function ontology")]
    UnrecognizedFeatureSet,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

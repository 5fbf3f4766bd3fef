use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating a taxonomy document.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed taxonomy document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate taxon id: {0}")]
    DuplicateId(String),
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;

/// Classification attributes attached to every taxon.
///
/// Missing keys deserialize to their defaults so partially-annotated
/// documents still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaxonAttr {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub morphology_code: String,
    #[serde(default)]
    pub topography_code: String,
    /// Non-small-cell lung cancer affiliation flag.
    #[serde(rename = "NSCLC", default)]
    pub nsclc: bool,
}

/// One raw record of the nested JSON document.
///
/// `children` is absent for leaves; order is preserved as authored.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attr: TaxonAttr,
    #[serde(default)]
    pub children: Vec<TaxonRecord>,
}

impl TaxonRecord {
    /// Total number of records in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TaxonRecord::count).sum::<usize>()
    }
}

/// Parse a taxonomy document from JSON text.
pub fn parse(text: &str) -> Result<TaxonRecord> {
    let record: TaxonRecord = serde_json::from_str(text)?;
    Ok(record)
}

/// Load a taxonomy document from a file.
pub fn load(path: &Path) -> Result<TaxonRecord> {
    let text = fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let record = parse(&text)?;
    log::debug!(
        "loaded taxonomy from {}: {} records",
        path.display(),
        record.count()
    );
    Ok(record)
}

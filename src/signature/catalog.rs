//! Signature catalog persistence.
//!
//! A catalog is a JSON document `{"data": [Signature...], "metadata": {...}}`.
//! Catalogs written by other tools may carry free-form metadata, so metadata
//! is kept as an untyped value on load.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Compound, Reaction, Signature, SignatureError};

/// Provenance written alongside generated signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Name of the producing tool
    pub generator: String,
    /// Version of the producing tool
    pub version: String,
    /// Reaction depth used for generation
    pub reaction_depth: usize,
    /// Number of input compounds
    pub compounds: usize,
    /// Number of input reactions
    pub reactions: usize,
    /// Number of signatures in the catalog
    pub signatures: usize,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl CatalogMetadata {
    /// Metadata for a freshly generated catalog.
    pub fn new(reaction_depth: usize, compounds: usize, reactions: usize, signatures: usize) -> Self {
        Self {
            generator: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            reaction_depth,
            compounds,
            reactions,
            signatures,
            created: Utc::now(),
        }
    }
}

/// A set of signatures with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureCatalog {
    /// Signature records
    pub data: Vec<Signature>,
    /// Free-form metadata
    pub metadata: Value,
}

#[derive(Deserialize)]
struct RawCatalog {
    data: Vec<Value>,
    #[serde(default)]
    metadata: Value,
}

impl SignatureCatalog {
    /// Build a catalog with generated metadata.
    pub fn new(data: Vec<Signature>, metadata: &CatalogMetadata) -> Result<Self, SignatureError> {
        Ok(Self {
            data,
            metadata: serde_json::to_value(metadata)?,
        })
    }

    /// Parse a catalog from a JSON value. Malformed records are skipped.
    pub fn from_value(value: Value) -> Result<Self, SignatureError> {
        let raw: RawCatalog = match value {
            // a bare list of signatures is accepted as well
            Value::Array(data) => RawCatalog {
                data,
                metadata: Value::Null,
            },
            other => serde_json::from_value(other)?,
        };
        let total = raw.data.len();
        let data: Vec<Signature> = raw
            .data
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Signature>(record) {
                Ok(signature) => Some(signature),
                Err(e) => {
                    warn!("Skipping malformed signature record: {}", e);
                    None
                }
            })
            .collect();
        if data.len() < total {
            warn!("{} of {} signature records were skipped", total - data.len(), total);
        }
        Ok(Self {
            data,
            metadata: raw.metadata,
        })
    }

    /// Load a catalog from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SignatureError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let value: Value = serde_json::from_reader(reader)?;
        let catalog = Self::from_value(value)?;
        info!("Loaded {} signatures from {}", catalog.data.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SignatureError> {
        let path = path.as_ref();
        info!("Saving {} signatures to {}", self.data.len(), path.display());
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Pull the record list out of a document that is either a bare array or an
/// object holding the array under `key`.
fn records(value: Value, key: &str) -> Result<Vec<Value>, SignatureError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SignatureError::MalformedRecord(format!(
                "expected a list or an object with a '{}' list",
                key
            ))),
        },
        other => Err(SignatureError::MalformedRecord(other.to_string())),
    }
}

/// Load compounds from a JSON file (`[...]` or `{"compounds": [...]}`).
pub fn load_compounds<P: AsRef<Path>>(path: P) -> Result<Vec<Compound>, SignatureError> {
    let path = path.as_ref();
    let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    info!("Reading compounds from {}", path.display());
    Ok(super::SignatureGenerator::ingest_compounds(records(value, "compounds")?))
}

/// Load reactions from a JSON file (`[...]` or `{"reactions": [...]}`).
///
/// Malformed reaction records are skipped with a warning.
pub fn load_reactions<P: AsRef<Path>>(path: P) -> Result<Vec<Reaction>, SignatureError> {
    let path = path.as_ref();
    let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let reactions: Vec<Reaction> = records(value, "reactions")?
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Reaction>(record) {
            Ok(reaction) => Some(reaction),
            Err(e) => {
                warn!("Skipping malformed reaction record: {}", e);
                None
            }
        })
        .collect();
    info!("Read {} reactions from {}", reactions.len(), path.display());
    Ok(reactions)
}

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use common::error::AppError;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::unit::{kind_of, SeedUnit};

pub const MANIFEST_FILE: &str = "bundle.json";

/// `bundle.json`: which files to seed, into what, and in which order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    #[serde(default)]
    pub seed_version: Option<String>,
    pub entries: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BundleEntry {
    /// A file holding a top-level array of records.
    Collection { file: PathBuf, collection: String },
    /// A file holding one singleton document.
    #[serde(rename_all = "camelCase")]
    Document {
        file: PathBuf,
        collection: String,
        document_id: String,
        #[serde(default)]
        label: Option<String>,
    },
    /// A file whose top-level keys name sub-collections (arrays) or
    /// singleton documents (objects).
    #[serde(rename_all = "camelCase")]
    Keyed {
        file: PathBuf,
        #[serde(default)]
        collections: BTreeMap<String, String>,
        #[serde(default)]
        documents_collection: Option<String>,
    },
}

impl BundleEntry {
    pub fn file(&self) -> &Path {
        match self {
            Self::Collection { file, .. }
            | Self::Document { file, .. }
            | Self::Keyed { file, .. } => file,
        }
    }

    /// Collections the entry writes into, as far as the manifest tells.
    /// Empty for keyed entries: unmapped keys name their own collection, so
    /// the targets are only known once the file is read.
    pub fn target_collections(&self) -> Vec<String> {
        match self {
            Self::Collection { collection, .. } | Self::Document { collection, .. } => {
                vec![collection.clone()]
            }
            Self::Keyed { .. } => Vec::new(),
        }
    }
}

/// A content file that could not be turned into units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Empty when the targets are unknown.
    pub collections: Vec<String>,
    pub message: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Units ready to seed, in manifest order, plus the files that failed to load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedBundle {
    pub seed_version: Option<String>,
    pub units: Vec<SeedUnit>,
    pub load_errors: Vec<LoadError>,
}

impl SeedBundle {
    pub fn from_units(units: Vec<SeedUnit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }
}

pub struct SourceLoader {
    root: PathBuf,
}

impl SourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads `bundle.json` from the content directory and every file it names.
    /// Only an unreadable manifest fails the call; bad content files are
    /// reported per file in `load_errors`.
    pub fn load_bundle(&self) -> Result<SeedBundle, AppError> {
        let manifest_path = self.root.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&manifest_path).map_err(|err| AppError::SourceLoad {
            path: manifest_path.display().to_string(),
            message: err.to_string(),
        })?;
        let manifest: BundleManifest =
            serde_json::from_str(&raw).map_err(|err| AppError::SourceLoad {
                path: manifest_path.display().to_string(),
                message: format!("invalid bundle manifest: {err}"),
            })?;

        Ok(self.load_manifest(&manifest))
    }

    pub fn load_manifest(&self, manifest: &BundleManifest) -> SeedBundle {
        let mut bundle = SeedBundle {
            seed_version: manifest.seed_version.clone(),
            ..SeedBundle::default()
        };

        for entry in &manifest.entries {
            match self.load_entry(entry) {
                Ok(units) => {
                    debug!(
                        file = %entry.file().display(),
                        units = units.len(),
                        "loaded content file"
                    );
                    bundle.units.extend(units);
                }
                Err(err) => {
                    warn!(file = %entry.file().display(), error = %err, "skipping content file");
                    bundle.load_errors.push(LoadError {
                        collections: entry.target_collections(),
                        message: err.to_string(),
                    });
                }
            }
        }

        bundle
    }

    pub fn load_entry(&self, entry: &BundleEntry) -> Result<Vec<SeedUnit>, AppError> {
        let path = self.root.join(entry.file());
        let value = read_json(&path)?;
        units_from_value(entry, value).map_err(|message| AppError::SourceLoad {
            path: path.display().to_string(),
            message,
        })
    }
}

fn read_json(path: &Path) -> Result<Value, AppError> {
    let raw = fs::read_to_string(path).map_err(|err| AppError::SourceLoad {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|err| AppError::SourceLoad {
        path: path.display().to_string(),
        message: format!("invalid JSON: {err}"),
    })
}

/// Normalizes one parsed content file into seed units.
pub fn units_from_value(entry: &BundleEntry, value: Value) -> Result<Vec<SeedUnit>, String> {
    match entry {
        BundleEntry::Collection { collection, .. } => match value {
            Value::Array(records) => Ok(vec![SeedUnit::collection(collection, records)]),
            other => Err(format!(
                "expected a top-level array of records, found {}",
                kind_of(&other)
            )),
        },
        BundleEntry::Document {
            collection,
            document_id,
            label,
            ..
        } => match value {
            Value::Object(_) => {
                let unit = SeedUnit::document(collection, document_id, value);
                Ok(vec![match label {
                    Some(label) => unit.with_label(label),
                    None => unit,
                }])
            }
            other => Err(format!(
                "expected a top-level document object, found {}",
                kind_of(&other)
            )),
        },
        BundleEntry::Keyed {
            collections,
            documents_collection,
            ..
        } => {
            let keyed = match value {
                Value::Object(keyed) => keyed,
                other => {
                    return Err(format!(
                        "expected an object keyed by sub-collection, found {}",
                        kind_of(&other)
                    ))
                }
            };
            if keyed.is_empty() {
                return Err("keyed content file has no sub-collections".to_string());
            }

            let mut units = Vec::with_capacity(keyed.len());
            for (key, value) in keyed {
                match value {
                    Value::Array(records) => {
                        let name = collections.get(&key).cloned().unwrap_or(key);
                        units.push(SeedUnit::collection(name, records));
                    }
                    Value::Object(_) => {
                        let Some(collection) = documents_collection else {
                            return Err(format!(
                                "key '{key}' holds a document but no documentsCollection is set"
                            ));
                        };
                        units.push(SeedUnit::document(collection, key, value));
                    }
                    other => {
                        return Err(format!(
                            "key '{key}' holds {}, expected an array or an object",
                            kind_of(&other)
                        ))
                    }
                }
            }
            Ok(units)
        }
    }
}

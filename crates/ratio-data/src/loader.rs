//! Data file plumbing: format detection, file discovery, deserialization,
//! and name-reference helpers used by [`crate::dataset`].
//!
//! Every data file may be written in RON, TOML, or JSON. The format is taken
//! from the extension, and a directory may hold at most one format per base
//! name.

use ratio_core::building::BuildingError;
use ratio_core::graph::GraphError;
use ratio_core::validation::ConfigProblem;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error, or a value the schema accepts but the
    /// planner does not.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// Modded buildings whose bases only lead back to each other.
    #[error("modded building '{building}' in {file} has cyclic base '{base}'")]
    CyclicBase {
        file: PathBuf,
        building: String,
        base: String,
    },

    /// A modded building could not be derived.
    #[error(transparent)]
    Building(#[from] BuildingError),

    /// A cross-reference problem found by graph validation.
    #[error(transparent)]
    Config(#[from] ConfigProblem),

    /// Everything wrong with a dataset, in the order it was found.
    #[error("dataset has {} problems", .0.len())]
    Invalid(Vec<DataLoadError>),

    /// The loaded data does not form a consistent production graph.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataLoadError {
    /// `None` for no problems, the problem itself for one, `Invalid` for more.
    pub fn from_problems(mut problems: Vec<DataLoadError>) -> Option<Self> {
        match problems.len() {
            0 => None,
            1 => problems.pop(),
            _ => Some(DataLoadError::Invalid(problems)),
        }
    }

    /// The individual problems: the contents of `Invalid`, or just `self`.
    pub fn problems(&self) -> &[DataLoadError] {
        match self {
            DataLoadError::Invalid(problems) => problems,
            other => std::slice::from_ref(other),
        }
    }

    fn parse(file: &Path, detail: impl ToString) -> Self {
        DataLoadError::Parse {
            file: file.to_path_buf(),
            detail: detail.to_string(),
        }
    }
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const EXTENSIONS: [&'static str; 3] = ["ron", "toml", "json"];
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look in `dir` for `{base_name}.ron`, `{base_name}.toml`, or
/// `{base_name}.json`.
///
/// Returns `Ok(None)` if there is none, and `ConflictingFormats` if more than
/// one exists.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in Format::EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::parse(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::parse(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::parse(path, e)),
    }
}

/// Deserialize a list from a file.
///
/// TOML has no top-level arrays, so TOML files keep the list under
/// `toml_key` (`raws = [...]`, `[[recipes]]`). RON and JSON files are the
/// list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table =
        toml::from_str(&content).map_err(|e| DataLoadError::parse(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| DataLoadError::parse(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| DataLoadError::parse(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// A collection of declared names.
pub trait DeclaredNames {
    fn is_declared(&self, name: &str) -> bool;
}

impl<V> DeclaredNames for HashMap<String, V> {
    fn is_declared(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl DeclaredNames for HashSet<String> {
    fn is_declared(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// `UnresolvedRef` unless `name` was declared.
pub fn resolve_name(
    names: &impl DeclaredNames,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<(), DataLoadError> {
    if names.is_declared(name) {
        Ok(())
    } else {
        Err(DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        })
    }
}

/// `DuplicateName` if `name` was already declared.
pub fn check_duplicate(
    names: &impl DeclaredNames,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if names.is_declared(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

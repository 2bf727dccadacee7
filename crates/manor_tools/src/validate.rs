//! Data validation utilities.

use std::path::{Path, PathBuf};

use manor_core::data::CatalogData;
use manor_core::error::ManorError;
use manor_server::{ServerConfig, ServerError};
use thiserror::Error;

/// Why a file failed validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog did not parse.
    #[error(transparent)]
    Catalog(#[from] ManorError),

    /// The server config did not parse or was rejected.
    #[error(transparent)]
    Config(#[from] ServerError),

    /// The file parsed but its contents are inconsistent.
    #[error("{}: {} problem(s) found", .path.display(), .problems.len())]
    Problems {
        /// File being validated.
        path: PathBuf,
        /// Every problem found.
        problems: Vec<String>,
    },
}

fn read(path: &Path) -> Result<String, ValidateError> {
    std::fs::read_to_string(path).map_err(|source| ValidateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate a RON catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the catalog
/// has duplicate ids or seeds growing unknown crops.
pub fn validate_catalog(path: &Path) -> Result<CatalogData, ValidateError> {
    let catalog = CatalogData::from_ron_str(&read(path)?, &path.display().to_string())?;
    let problems = catalog.validate();
    if problems.is_empty() {
        Ok(catalog)
    } else {
        Err(ValidateError::Problems {
            path: path.to_path_buf(),
            problems,
        })
    }
}

/// Validate a RON server config file against the catalog it names.
///
/// Relative catalog paths are resolved against the current directory, as the
/// server does.
///
/// # Errors
///
/// Returns an error if the config or its catalog is invalid, or if a castle
/// is listed twice.
pub fn validate_server_config(path: &Path) -> Result<ServerConfig, ValidateError> {
    let config = ServerConfig::from_ron_str(&read(path)?, path)?;
    validate_catalog(&config.catalog_path)?;

    let mut problems = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for castle in &config.castles {
        if !seen.insert(castle.id) {
            problems.push(format!("Duplicate castle ID: {}", castle.id));
        }
    }
    if config.castles.is_empty() {
        problems.push("No castles configured".to_string());
    }

    if problems.is_empty() {
        Ok(config)
    } else {
        Err(ValidateError::Problems {
            path: path.to_path_buf(),
            problems,
        })
    }
}

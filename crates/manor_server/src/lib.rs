//! # Manor Server
//!
//! Composition root for the castle manor engine.
//!
//! Loads the server configuration and the item catalog, wires the file store
//! and the treasury into a [`ManorManager`], and runs the manor service until
//! shutdown, saving one last time on the way out.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use manor_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Config path used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config/server.ron";

/// Errors from the server entry point.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading a file failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The server config did not parse.
    #[error("Failed to parse config {}: {message}", .path.display())]
    Config {
        /// Config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The manor engine failed.
    #[error(transparent)]
    Manor(#[from] ManorError),
}

/// Result alias for the server.
pub type Result<T> = std::result::Result<T, ServerError>;

/// A castle that runs a manor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleConfig {
    /// Castle identifier.
    pub id: CastleId,
    /// Display name, used in logs.
    pub name: String,
    /// Treasury balance at startup.
    #[serde(default)]
    pub treasury: u64,
}

/// Server configuration.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     manor: (save_interval_secs: 3600),
///     catalog_path: "assets/data/manor_catalog.ron",
///     data_dir: "data/manor",
///     castles: [
///         CastleConfig(id: 1, name: "Gludio", treasury: 500000),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Manor engine settings.
    #[serde(default)]
    pub manor: ManorConfig,
    /// RON catalog of seeds and crops.
    pub catalog_path: PathBuf,
    /// Directory for manor snapshots.
    pub data_dir: PathBuf,
    /// Castles running a manor.
    #[serde(default)]
    pub castles: Vec<CastleConfig>,
}

impl ServerConfig {
    /// Parse a config from RON text.
    pub fn from_ron_str(text: &str, origin: &Path) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| ServerError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.manor.validate()?;
        Ok(config)
    }

    /// Treasury seeded with every configured castle's starting balance.
    #[must_use]
    pub fn treasury(&self) -> MemoryTreasury {
        MemoryTreasury::new(self.castles.iter().map(|c| (c.id, c.treasury)))
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ServerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and parse the server config.
pub async fn load_config(path: &Path) -> Result<ServerConfig> {
    let text = read_file(path).await?;
    ServerConfig::from_ron_str(&text, path)
}

/// Read and parse the catalog, logging every validation problem.
pub async fn load_catalog(path: &Path) -> Result<CatalogData> {
    let text = read_file(path).await?;
    let catalog = CatalogData::from_ron_str(&text, &path.display().to_string())?;
    for problem in catalog.validate() {
        warn!(path = %path.display(), "Catalog problem: {problem}");
    }
    Ok(catalog)
}

/// Build and initialize the manager described by `config`.
pub async fn build_manager(
    config: &ServerConfig,
) -> Result<Arc<ManorManager<FileManorStore>>> {
    let catalog = load_catalog(&config.catalog_path).await?;
    let treasury = Arc::new(config.treasury());
    let store = FileManorStore::new(&config.data_dir);

    for castle in &config.castles {
        info!(
            castle = %castle.id,
            name = %castle.name,
            treasury = castle.treasury,
            "Castle registered"
        );
    }

    let manager = ManorManager::new(store, treasury, Arc::new(catalog), config.manor.clone());
    manager.init().await?;
    Ok(Arc::new(manager))
}

/// Run the manor service until `shutdown` completes, then stop it.
pub async fn run_until<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let manager = build_manager(&config).await?;
    info!(
        mode = %manager.mode(),
        next_change = ?manager.next_mode_change(),
        data_dir = %config.data_dir.display(),
        "Manor ready"
    );

    let service = ManorService::start(manager);
    shutdown.await;
    info!("Shutdown requested");

    service.stop().await?;
    Ok(())
}

/// Run the manor service until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<()> {
    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
        CatalogData(
            seeds: [SeedData(id: 5016, crop_id: 5073, castle_id: 1, reference_price: 100)],
            crops: [CropData(id: 5073, rewards: (5026, 5027))],
        )
    ";

    fn config_for(dir: &Path) -> ServerConfig {
        ServerConfig {
            manor: ManorConfig::default(),
            catalog_path: dir.join("catalog.ron"),
            data_dir: dir.join("manor"),
            castles: vec![CastleConfig {
                id: CastleId::new(1),
                name: "Gludio".to_string(),
                treasury: 1_000,
            }],
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = ServerConfig::from_ron_str(
            r#"(catalog_path: "c.ron", data_dir: "d", castles: [(id: 3, name: "Dion")])"#,
            Path::new("inline"),
        )
        .unwrap();

        assert_eq!(config.manor, ManorConfig::default());
        assert_eq!(config.castles[0].id, CastleId::new(3));
        assert_eq!(config.castles[0].treasury, 0);
    }

    #[test]
    fn test_invalid_schedule_is_rejected() {
        let err = ServerConfig::from_ron_str(
            r#"(manor: (schedule: (approve_hour: 5)), catalog_path: "c", data_dir: "d")"#,
            Path::new("inline"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ServerError::Manor(ManorError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_bad_ron_names_file() {
        let err = ServerConfig::from_ron_str("(", Path::new("broken.ron")).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[tokio::test]
    async fn test_missing_catalog_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_manager(&config_for(dir.path())).await.err().unwrap();

        assert!(matches!(err, ServerError::Io { .. }));
    }

    #[tokio::test]
    async fn test_run_saves_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("catalog.ron"), CATALOG)
            .await
            .unwrap();
        let config = config_for(dir.path());

        run_until(config.clone(), async {}).await.unwrap();

        assert!(config.data_dir.join("castle_1.manor").exists());
    }
}

//! Background task lifecycle for a [`ManorManager`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{ManorError, Result};
use crate::manager::ManorManager;
use crate::store::ManorStore;

/// Running mode loop and save loop of one manager.
///
/// Both loops share a shutdown channel. [`ManorService::stop`] signals it
/// and joins both tasks, so the final save has finished when it returns.
pub struct ManorService<S: ManorStore> {
    manager: Arc<ManorManager<S>>,
    shutdown: watch::Sender<bool>,
    mode_task: JoinHandle<()>,
    save_task: JoinHandle<Result<()>>,
}

impl<S: ManorStore> ManorService<S> {
    /// Spawn both loops for an initialized manager.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(manager: Arc<ManorManager<S>>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mode_task = {
            let manager = Arc::clone(&manager);
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move { manager.run_mode_loop(shutdown_rx).await })
        };

        let save_task = {
            let manager = Arc::clone(&manager);
            let interval = manager.config().save_interval();
            tokio::spawn(async move { manager.run_save_loop(interval, shutdown_rx).await })
        };

        info!(
            mode = %manager.mode(),
            save_interval_secs = manager.config().save_interval().as_secs(),
            "Manor service started"
        );

        Self {
            manager,
            shutdown,
            mode_task,
            save_task,
        }
    }

    /// Manager driven by this service.
    #[must_use]
    pub fn manager(&self) -> &Arc<ManorManager<S>> {
        &self.manager
    }

    /// Stop both loops and wait for the final save.
    ///
    /// Returns the final save's error, if it failed.
    pub async fn stop(self) -> Result<()> {
        // Both loops may already have exited, leaving no receiver.
        let _ = self.shutdown.send(true);

        if let Err(e) = self.mode_task.await {
            warn!(error = %e, "Manor mode task ended abnormally");
        }

        let outcome = match self.save_task.await {
            Ok(Ok(())) | Ok(Err(ManorError::Cancelled)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(e) => {
                warn!(error = %e, "Manor save task ended abnormally");
                Ok(())
            }
        };

        info!("Manor service stopped");
        outcome
    }
}

//! Admin engine
//!
//! Owns the process-wide change registry and connection manager. Build one
//! at startup and hand out the shared instances through [`AdminEngine::registry`]
//! and [`AdminEngine::connections`].

use std::path::Path;
use std::sync::Arc;

use meshcfg_connection::{ConnectionManager, ConnectionStatus};
use meshcfg_pki::{AdminErrorCode, ErrorClass};
use meshcfg_registry::{ChangeRegistry, TransactionId};

use crate::bootstrap::{register_connections, PublisherFactory};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Application object for the change transaction engine
#[derive(Debug)]
pub struct AdminEngine {
    config: EngineConfig,
    registry: Arc<ChangeRegistry>,
    connections: Arc<ConnectionManager>,
}

impl Default for AdminEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AdminEngine {
    /// Create engine with empty registry and no connections
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ChangeRegistry::new()),
            connections: Arc::new(ConnectionManager::new()),
        }
    }

    /// Create engine from a TOML or YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        EngineConfig::from_file(path).map(Self::new)
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared change registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ChangeRegistry> {
        &self.registry
    }

    /// Shared connection manager
    #[inline]
    #[must_use]
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Register the configured connections
    ///
    /// Returns the number registered; unusable definitions are skipped.
    pub fn initialize_connections(&self, factory: &dyn PublisherFactory) -> usize {
        register_connections(&self.connections, &self.config.connections, factory)
    }

    /// Remove ended transactions older than the configured max age
    pub fn run_maintenance(&self) -> usize {
        self.registry
            .cleanup_old_transactions(self.config.transaction_max_age_secs)
    }

    /// Connection status snapshot
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connections.get_status()
    }

    /// React to an error code from a node's admin acknowledgment
    ///
    /// Key configuration errors fail the first pending change for
    /// `config_key`, since no retry can succeed until an operator installs
    /// the right keys. Other classes leave the change pending for the
    /// caller's retry policy.
    pub fn handle_admin_error(
        &self,
        tx_id: &TransactionId,
        config_key: &str,
        code: &str,
    ) -> ErrorClass {
        let code = AdminErrorCode::from(code);
        let class = code.class();

        match class {
            ErrorClass::RequiresKeyConfiguration => {
                let message =
                    format!("{code}: node does not trust this admin key, configure admin keys on the node");
                let marked = self.registry.mark_change_failed(tx_id, config_key, &message);
                tracing::warn!(
                    transaction_id = %tx_id,
                    config_key,
                    %code,
                    marked,
                    "admin key not authorized, halting retries"
                );
            }
            ErrorClass::RecoverableSession => {
                tracing::info!(
                    transaction_id = %tx_id,
                    config_key,
                    %code,
                    "admin session rejected, retry after a new session"
                );
            }
            ErrorClass::Unrelated => {
                tracing::debug!(transaction_id = %tx_id, config_key, %code, "non-PKI admin error");
            }
        }

        class
    }
}

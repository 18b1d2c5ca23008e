//! Engine configuration
//!
//! Loaded from TOML or YAML. Every field has a default, so an empty file
//! is a valid configuration.

use std::collections::HashSet;
use std::path::Path;

use meshcfg_connection::{ConnectionError, ConnectionRole, ConnectionType};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default age after which ended transactions are cleaned up
pub const DEFAULT_TRANSACTION_MAX_AGE_SECS: u64 = 3600;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Age in seconds after which ended transactions are removed
    pub transaction_max_age_secs: u64,
    /// Transport connections to register at startup
    pub connections: Vec<ConnectionDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
            transaction_max_age_secs: DEFAULT_TRANSACTION_MAX_AGE_SECS,
            connections: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML for this structure
    pub fn from_toml(text: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse YAML
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid YAML for this structure
    pub fn from_yaml(text: &str) -> Result<Self, EngineError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a file; `.yaml`/`.yml` is YAML, anything else TOML
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_toml(&text)
        }
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    /// With transaction max age
    #[inline]
    #[must_use]
    pub fn with_transaction_max_age_secs(mut self, secs: u64) -> Self {
        self.transaction_max_age_secs = secs;
        self
    }

    /// With an additional connection
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionDefinition) -> Self {
        self.connections.push(connection);
        self
    }

    /// Strict check of the connection list
    ///
    /// Startup registration is lenient and skips bad entries; this reports
    /// the first one instead.
    ///
    /// # Errors
    ///
    /// Returns error on a missing or duplicate id, an unknown transport
    /// type, or an unknown role
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for connection in &self.connections {
            let invalid = |reason: String| EngineError::InvalidConnection {
                id: connection.id.clone(),
                reason,
            };

            if connection.id.is_empty() {
                return Err(invalid("missing id".to_string()));
            }
            if !seen.insert(connection.id.as_str()) {
                return Err(invalid("duplicate id".to_string()));
            }
            connection.connection_type().map_err(|e| invalid(e.to_string()))?;
            connection
                .role
                .parse::<ConnectionRole>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        Ok(())
    }
}

fn default_role() -> String {
    ConnectionRole::Client.as_str().to_string()
}

fn default_auto_connect() -> bool {
    true
}

/// One transport connection to register at startup
///
/// Type and role stay strings so that one bad entry does not reject the
/// whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    /// Unique id
    #[serde(default)]
    pub id: String,
    /// `tcp`, `serial` or `mqtt`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `admin` or `client`
    #[serde(default = "default_role")]
    pub role: String,
    /// Connect during bulk connects
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
    /// Description
    #[serde(default)]
    pub description: String,
    /// TCP host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// TCP port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Serial device path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_port: Option<String>,
}

impl ConnectionDefinition {
    /// Create a client definition with auto-connect on
    #[must_use]
    pub fn new(id: impl Into<String>, connection_type: ConnectionType) -> Self {
        Self {
            id: id.into(),
            kind: connection_type.as_str().to_string(),
            role: default_role(),
            auto_connect: true,
            description: String::new(),
            host: None,
            port: None,
            serial_port: None,
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: ConnectionRole) -> Self {
        self.role = role.as_str().to_string();
        self
    }

    /// With TCP endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// With serial device path
    #[inline]
    #[must_use]
    pub fn with_serial_port(mut self, path: impl Into<String>) -> Self {
        self.serial_port = Some(path.into());
        self
    }

    /// With auto-connect flag
    #[inline]
    #[must_use]
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parsed transport type
    ///
    /// # Errors
    ///
    /// Returns error if the type is not `tcp`, `serial` or `mqtt`
    pub fn connection_type(&self) -> Result<ConnectionType, ConnectionError> {
        self.kind.parse()
    }

    /// Parsed role, falling back to client for unknown values
    #[must_use]
    pub fn resolved_role(&self) -> ConnectionRole {
        self.role.parse().unwrap_or_else(|err| {
            tracing::warn!(connection_id = %self.id, %err, "defaulting to client role");
            ConnectionRole::Client
        })
    }
}

//! Connection roles and transport kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

/// Role designation of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    /// Privileged configuration traffic
    Admin,
    /// Ordinary mesh traffic
    #[default]
    Client,
}

impl ConnectionRole {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionRole {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            _ => Err(ConnectionError::UnknownRole(s.to_string())),
        }
    }
}

/// Transport kind of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// TCP to a network-attached node
    Tcp,
    /// USB/serial attached node
    Serial,
    /// MQTT broker
    Mqtt,
}

impl ConnectionType {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Serial => "serial",
            Self::Mqtt => "mqtt",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "serial" => Ok(Self::Serial),
            "mqtt" => Ok(Self::Mqtt),
            _ => Err(ConnectionError::UnknownType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_values() {
        assert_eq!(ConnectionRole::Admin.to_string(), "admin");
        assert_eq!(ConnectionRole::Client.to_string(), "client");
        assert_eq!("ADMIN".parse::<ConnectionRole>(), Ok(ConnectionRole::Admin));
        assert_eq!(
            "root".parse::<ConnectionRole>(),
            Err(ConnectionError::UnknownRole("root".to_string()))
        );
    }

    #[test]
    fn type_values() {
        assert_eq!("serial".parse::<ConnectionType>(), Ok(ConnectionType::Serial));
        assert_eq!(ConnectionType::Mqtt.to_string(), "mqtt");
        assert!("ble".parse::<ConnectionType>().is_err());
    }
}

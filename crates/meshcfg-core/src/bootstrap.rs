//! Connection registration from configuration

use std::sync::Arc;

use meshcfg_connection::{ConnectionInfo, ConnectionManager, ConnectionType, Publisher};

use crate::config::ConnectionDefinition;

/// Creates transport publishers for connection definitions
///
/// Returning `None` skips the definition.
pub trait PublisherFactory {
    /// Publisher for `definition`, already resolved to `connection_type`
    fn create(
        &self,
        definition: &ConnectionDefinition,
        connection_type: ConnectionType,
    ) -> Option<Arc<dyn Publisher>>;
}

impl<F> PublisherFactory for F
where
    F: Fn(&ConnectionDefinition, ConnectionType) -> Option<Arc<dyn Publisher>>,
{
    fn create(
        &self,
        definition: &ConnectionDefinition,
        connection_type: ConnectionType,
    ) -> Option<Arc<dyn Publisher>> {
        self(definition, connection_type)
    }
}

/// Build a connection from its definition
///
/// Missing ids, unknown types and factory refusals yield `None`. Unknown
/// roles fall back to client.
#[must_use]
pub fn connection_from_definition(
    definition: &ConnectionDefinition,
    factory: &dyn PublisherFactory,
) -> Option<ConnectionInfo> {
    if definition.id.is_empty() {
        tracing::warn!("connection definition missing id, skipping");
        return None;
    }

    let connection_type = match definition.connection_type() {
        Ok(connection_type) => connection_type,
        Err(err) => {
            tracing::warn!(connection_id = %definition.id, %err, "skipping connection");
            return None;
        }
    };

    let Some(publisher) = factory.create(definition, connection_type) else {
        tracing::warn!(connection_id = %definition.id, %connection_type, "no publisher for connection, skipping");
        return None;
    };

    Some(
        ConnectionInfo::new(
            definition.id.clone(),
            connection_type,
            definition.resolved_role(),
            publisher,
        )
        .with_description(definition.description.clone())
        .with_auto_connect(definition.auto_connect),
    )
}

/// Register every usable definition with `manager`
///
/// Returns the number registered.
pub fn register_connections(
    manager: &ConnectionManager,
    definitions: &[ConnectionDefinition],
    factory: &dyn PublisherFactory,
) -> usize {
    tracing::info!(count = definitions.len(), "initializing connections from config");

    let mut registered = 0;
    for info in definitions
        .iter()
        .filter_map(|definition| connection_from_definition(definition, factory))
    {
        manager.add_connection(info);
        registered += 1;
    }
    registered
}

//! Connection factory bound to one configuration

use std::sync::Arc;
use tracing::debug;

use crate::client::ClientFactory;
use crate::config::Config;
use crate::connection::BigQueryConnection;
use crate::context::Context;
use crate::error::Result;

/// Opens connections for a fixed [`Config`]
#[derive(Clone)]
pub struct Connector {
    config: Config,
    factory: Arc<dyn ClientFactory>,
}

impl Connector {
    /// Connector for `config`, building clients with `factory`
    pub fn new(config: Config, factory: Arc<dyn ClientFactory>) -> Self {
        Self { config, factory }
    }

    /// Parse `dsn` and build a connector from it. Fails before any client
    /// is created when the connection string is malformed.
    pub fn from_dsn(dsn: &str, factory: Arc<dyn ClientFactory>) -> Result<Self> {
        Ok(Self::new(Config::from_dsn(dsn)?, factory))
    }

    /// Configuration handed to every connection
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a new connection. `ctx` bounds connection establishment only;
    /// the client outlives it.
    pub async fn connect(&self, ctx: &Context) -> Result<BigQueryConnection> {
        let client = ctx.run(self.factory.connect(&self.config)).await?;
        debug!(project = %self.config.project_id, "Opened connection");
        Ok(BigQueryConnection::new(client, self.config.clone()))
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//! MongoDB testcontainer utilities.

use defstore_store::error::{StoreError, StoreResult};
use defstore_store::MongoCollection;
use std::sync::Arc;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mongo::Mongo;

/// Stable prefix for Docker/container startup failures in Mongo test setup.
/// Tests use this marker to decide whether to skip due to unavailable Docker.
pub const MONGO_CONTAINER_START_ERR_PREFIX: &str = "mongo-container-start:";

/// A MongoDB server running in a testcontainer.
#[allow(dead_code)]
pub struct MongoTestServer {
    connection_string: String,
    _container: ContainerAsync<Mongo>,
}

#[allow(dead_code)]
impl MongoTestServer {
    pub async fn start() -> StoreResult<Self> {
        let container = Mongo::default().start().await.map_err(|e| {
            StoreError::Backend(format!(
                "{MONGO_CONTAINER_START_ERR_PREFIX} Failed to start MongoDB container: {e}"
            ))
        })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get port");

        Ok(Self {
            connection_string: format!("mongodb://{host}:{port}"),
            _container: container,
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// A fresh collection handle on this server.
    pub async fn collection(&self, name: &str) -> StoreResult<Arc<MongoCollection>> {
        let collection =
            MongoCollection::new(&self.connection_string, "defstore-tests", name, None).await?;
        Ok(Arc::new(collection))
    }
}

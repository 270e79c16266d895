mod in_memory;
mod rdf4j;

use async_trait::async_trait;
pub use in_memory::{InMemoryGraphBackend, LOCAL_REPOSITORY_ID};
pub use rdf4j::RemoteRepositoryBackend;

use crate::{
    config::{BackendConfig, BackendKind},
    error::Result,
    types::{
        AskResult, ConstructResult, NamespaceBinding, RepositoryInfo, SelectResult,
        StatisticsSnapshot,
    },
};

/// Query and introspection primitives every engine adapter provides.
///
/// All operations fail with [`crate::BackendError::NotConnected`] outside the
/// `connect`/`close` window. A `repository_id` argument overrides the
/// session default for that call only.
///
/// Derived exploration operations live on [`crate::Explore`], which every
/// `Backend` gets for free.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logging and metrics
    fn name(&self) -> &'static str;

    /// Acquire the engine handle. A no-op when already connected.
    async fn connect(&self) -> Result<()>;

    /// Release the engine handle. Safe to call repeatedly.
    async fn close(&self) -> Result<()>;

    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>>;

    /// Set the session's default repository
    async fn select_repository(&self, repository_id: &str) -> Result<()>;

    async fn current_repository(&self) -> Result<Option<String>>;

    /// Execute a SELECT query
    async fn sparql_select(&self, query: &str, repository_id: Option<&str>)
    -> Result<SelectResult>;

    /// Execute a CONSTRUCT or DESCRIBE query, rendered as Turtle
    async fn sparql_construct(
        &self,
        query: &str,
        repository_id: Option<&str>,
    ) -> Result<ConstructResult>;

    /// Execute an ASK query
    async fn sparql_ask(&self, query: &str, repository_id: Option<&str>) -> Result<AskResult>;

    /// Prefix bindings, in the order the engine reports them
    async fn namespaces(&self, repository_id: Option<&str>) -> Result<Vec<NamespaceBinding>>;

    /// Fresh store counts. Never cached.
    async fn statistics(&self, repository_id: Option<&str>) -> Result<StatisticsSnapshot>;
}

/// Construct the adapter selected by `config.kind`. Nothing is opened until `connect`.
pub fn build_backend(config: &BackendConfig) -> Box<dyn Backend> {
    match config.kind {
        BackendKind::Local => Box::new(InMemoryGraphBackend::new(config.local.clone())),
        BackendKind::Remote => Box::new(RemoteRepositoryBackend::new(config.remote.clone())),
    }
}

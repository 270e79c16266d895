//! Uniform SPARQL query and exploration contract over two engines: an
//! in-process Oxigraph graph and an RDF4J-compatible repository server.

mod backend;
mod config;
pub mod error;
mod explore;
mod metrics;
mod query;
mod rdf;
mod sparql;
pub mod types;

pub use backend::{
    Backend, InMemoryGraphBackend, LOCAL_REPOSITORY_ID, RemoteRepositoryBackend, build_backend,
};
pub use config::{BackendConfig, BackendKind, LocalStoreConfig, RemoteServerConfig, StoreFormat};
pub use error::{BackendError, Result};
pub use explore::{ClassSearch, Explore, PropertySearch, SchemaSummary};
pub use query::vocab;
pub use rdf::render_turtle;

#[cfg(test)]
mod tests;

mod defaults;
mod error;
mod loader;
mod raw;

pub use error::ConfigError;
pub(crate) use loader::{
    BackendOverrides, ConfigOverrides, LocalOverrides, RemoteOverrides, load_configuration,
};
pub(crate) use raw::{Config, ConfigRaw, QueryConfig};

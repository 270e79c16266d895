use std::{fmt, path::Path, path::PathBuf, str::FromStr, time::Duration};

use oxigraph::io::RdfFormat;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Which engine adapter to construct
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process graph engine, optionally seeded from a file
    #[default]
    Local,
    /// RDF4J-compatible repository server reached over HTTP
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// Backend configuration passed to [`crate::build_backend`].
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default)]
    pub local: LocalStoreConfig,

    #[serde(default)]
    pub remote: RemoteServerConfig,
}

/// In-process engine options.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LocalStoreConfig {
    /// RDF file parsed into the graph on connect
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Serialization of `store_path`
    #[serde(default)]
    pub store_format: StoreFormat,
}

/// Networked engine options.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteServerConfig {
    /// Base URL of the server, e.g. `http://localhost:8080/rdf4j-server`
    pub server_url: String,

    /// Repository resolved eagerly at connect time
    #[serde(default)]
    pub default_repository: Option<String>,

    pub connect_timeout_ms: u64,

    /// Transport-level bound on a single HTTP exchange
    pub request_timeout_ms: u64,
}

impl Default for RemoteServerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/rdf4j-server".to_string(),
            default_repository: None,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl RemoteServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// RDF serialization identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StoreFormat {
    #[default]
    Turtle,
    RdfXml,
    NTriples,
    NQuads,
    TriG,
    JsonLd,
    N3,
    /// Detect from the file extension
    Auto,
}

impl StoreFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreFormat::Turtle => "turtle",
            StoreFormat::RdfXml => "xml",
            StoreFormat::NTriples => "ntriples",
            StoreFormat::NQuads => "nquads",
            StoreFormat::TriG => "trig",
            StoreFormat::JsonLd => "jsonld",
            StoreFormat::N3 => "n3",
            StoreFormat::Auto => "auto",
        }
    }

    /// Resolves to a parser format. `Auto` needs a path with a known extension.
    pub fn rdf_format(self, path: Option<&Path>) -> Result<RdfFormat> {
        let from_extension = |extension: &str| {
            RdfFormat::from_extension(extension).ok_or_else(|| BackendError::Load {
                reason: format!("Unsupported RDF file extension: {extension}"),
            })
        };

        match self {
            StoreFormat::Turtle => Ok(RdfFormat::Turtle),
            StoreFormat::RdfXml => Ok(RdfFormat::RdfXml),
            StoreFormat::NTriples => Ok(RdfFormat::NTriples),
            StoreFormat::NQuads => Ok(RdfFormat::NQuads),
            StoreFormat::TriG => Ok(RdfFormat::TriG),
            StoreFormat::N3 => Ok(RdfFormat::N3),
            StoreFormat::JsonLd => from_extension("jsonld"),
            StoreFormat::Auto => {
                let extension = path
                    .and_then(|path| path.extension())
                    .and_then(|extension| extension.to_str())
                    .ok_or_else(|| BackendError::Load {
                        reason: "Format 'auto' requires a file path with an extension"
                            .to_string(),
                    })?;
                from_extension(&extension.to_ascii_lowercase())
            }
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(StoreFormat::Turtle),
            "xml" | "rdfxml" | "rdf/xml" => Ok(StoreFormat::RdfXml),
            "ntriples" | "nt" | "n-triples" => Ok(StoreFormat::NTriples),
            "nquads" | "nq" | "n-quads" => Ok(StoreFormat::NQuads),
            "trig" => Ok(StoreFormat::TriG),
            "jsonld" | "json-ld" => Ok(StoreFormat::JsonLd),
            "n3" => Ok(StoreFormat::N3),
            "auto" => Ok(StoreFormat::Auto),
            other => Err(format!("unknown RDF format '{other}'")),
        }
    }
}

impl TryFrom<String> for StoreFormat {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoreFormat> for String {
    fn from(format: StoreFormat) -> Self {
        format.as_str().to_string()
    }
}

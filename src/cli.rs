use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kg_backend::{BackendKind, StoreFormat};

use crate::config::{BackendOverrides, ConfigOverrides, LocalOverrides, RemoteOverrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BackendArg {
    Local,
    Remote,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => BackendKind::Local,
            BackendArg::Remote => BackendKind::Remote,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "kg-bridge", version)]
#[command(about = "Query and explore knowledge graphs in an in-process store or an RDF4J server")]
pub(crate) struct Cli {
    /// Custom TOML config file, layered over ./config.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine to use
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// RDF file loaded into the in-process store on connect
    #[arg(long, global = true, value_name = "PATH")]
    pub store_path: Option<PathBuf>,

    /// Format of --store-path (turtle, xml, ntriples, nquads, trig, jsonld, n3, auto)
    #[arg(long, global = true, value_name = "ID")]
    pub format: Option<StoreFormat>,

    /// Base URL of the RDF4J server
    #[arg(long, global = true, value_name = "URL")]
    pub server_url: Option<String>,

    /// Repository selected on connect
    #[arg(long, global = true, value_name = "ID")]
    pub repository: Option<String>,

    /// Force debug-level logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flags that override every other configuration layer.
    pub(crate) fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: BackendOverrides {
                kind: self.backend.map(BackendKind::from),
                local: LocalOverrides {
                    store_path: self.store_path.clone(),
                    store_format: self.format,
                },
                remote: RemoteOverrides {
                    server_url: self.server_url.clone(),
                    default_repository: self.repository.clone(),
                },
            },
        }
    }
}

/// Per-call repository override. Never changes the session default.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct RepositoryArg {
    #[arg(long = "repository-id", value_name = "ID")]
    pub repository_id: Option<String>,
}

impl RepositoryArg {
    pub(crate) fn as_deref(&self) -> Option<&str> {
        self.repository_id.as_deref()
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the repositories the engine exposes
    Repositories,
    /// Check that a repository exists and make it the session default
    SelectRepository {
        #[arg(value_name = "ID")]
        repository_id: String,
    },
    /// Show the session's current repository
    CurrentRepository,
    /// Run a SELECT query ("-" reads the query from stdin)
    Select {
        query: String,
        /// Row limit appended when the query has no LIMIT
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Run a CONSTRUCT or DESCRIBE query and print Turtle
    Construct {
        query: String,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Run an ASK query
    Ask {
        query: String,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// List prefix bindings
    Namespaces {
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Show statement, class, property, subject and object counts
    Stats {
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Print every statement about a resource
    Describe {
        iri: String,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Search declared and used classes
    Classes {
        /// Case-insensitive regex over the class IRI
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Search declared and used properties
    Properties {
        /// Case-insensitive regex over the property IRI
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long, value_name = "IRI")]
        domain: Option<String>,
        #[arg(long, value_name = "IRI")]
        range: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// List instances of a class
    Instances {
        class: String,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        repository: RepositoryArg,
    },
    /// Classes, properties, statistics and namespaces in one document
    Summary {
        #[command(flatten)]
        repository: RepositoryArg,
    },
}

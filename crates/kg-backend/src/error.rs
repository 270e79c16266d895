use thiserror::Error;

/// Backend contract errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Operation attempted before `connect` or after `close`
    #[error("Backend not connected; call connect() first")]
    NotConnected,

    /// Repository id does not name the in-process engine's repository
    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    /// Remote server rejected the repository id
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// No per-call repository id and no session default
    #[error("No repository specified and no default repository selected")]
    NoRepositorySelected,

    /// Engine rejected the SPARQL text
    #[error("Invalid SPARQL query: {reason}")]
    QuerySyntax { reason: String },

    /// Data source failed to load
    #[error("Failed to load RDF data: {reason}")]
    Load { reason: String },

    /// Store or server unreachable
    #[error("Engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// Engine failed while evaluating or storing
    #[error("Engine error: {reason}")]
    Engine { reason: String },

    /// Remote server answered with an unexpected status
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Engine response could not be decoded
    #[error("Failed to parse response: {reason}")]
    ParseError { reason: String },

    /// Configured server URL is not usable as a base URL
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl BackendError {
    /// Stable label for metrics and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NotConnected => "not_connected",
            BackendError::UnknownRepository(_) => "unknown_repository",
            BackendError::RepositoryNotFound(_) => "repository_not_found",
            BackendError::NoRepositorySelected => "no_repository_selected",
            BackendError::QuerySyntax { .. } => "query_syntax",
            BackendError::Load { .. } => "load",
            BackendError::EngineUnavailable { .. } => "engine_unavailable",
            BackendError::Engine { .. } => "engine",
            BackendError::Server { status, .. } if *status >= 500 => "server_5xx",
            BackendError::Server { .. } => "server_other",
            BackendError::ParseError { .. } => "parse_error",
            BackendError::InvalidServerUrl { .. } => "invalid_server_url",
        }
    }

    pub(crate) fn engine(reason: impl std::fmt::Display) -> Self {
        BackendError::Engine {
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            BackendError::ParseError {
                reason: error.to_string(),
            }
        } else {
            BackendError::EngineUnavailable {
                reason: error.to_string(),
            }
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_bucketed_by_status() {
        let server = BackendError::Server {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(server.kind(), "server_5xx");

        let teapot = BackendError::Server {
            status: 418,
            message: "teapot".to_string(),
        };
        assert_eq!(teapot.kind(), "server_other");
    }

    #[test]
    fn messages_carry_underlying_detail() {
        let error = BackendError::QuerySyntax {
            reason: "unexpected token at 1:8".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid SPARQL query: unexpected token at 1:8"
        );
        assert_eq!(
            BackendError::RepositoryNotFound("nope".to_string()).to_string(),
            "Repository not found: nope"
        );
    }
}

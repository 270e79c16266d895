use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url, header};
use tokio::sync::RwLock;

use super::Backend;
use crate::{
    config::RemoteServerConfig,
    error::{BackendError, Result},
    metrics, query,
    rdf::{parse_ntriples, render_turtle},
    sparql::{count_value, parse_ask_json, parse_select_json},
    types::{
        AskResult, Binding, ConstructResult, NamespaceBinding, RepositoryInfo, SelectResult,
        StatisticsSnapshot,
    },
};

const NAME: &str = "rdf4j";

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

/// A repository id the server has confirmed, with its query endpoint.
#[derive(Debug, Clone)]
struct RepositoryHandle {
    id: String,
    endpoint: Url,
}

struct RemoteSession {
    client: Client,
    base: Url,
    /// Session default, resolved once and reused until reselected
    current: Option<RepositoryHandle>,
}

/// Networked engine speaking the RDF4J REST protocol.
pub struct RemoteRepositoryBackend {
    config: RemoteServerConfig,
    session: RwLock<Option<RemoteSession>>,
}

impl RemoteRepositoryBackend {
    pub fn new(config: RemoteServerConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    fn build_client(&self) -> Result<Client> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(self.config.connect_timeout())
            .timeout(self.config.request_timeout())
            .build()?;
        Ok(client)
    }

    fn base_url(&self) -> Result<Url> {
        let url = &self.config.server_url;
        let base = Url::parse(url.trim_end_matches('/')).map_err(|e| {
            BackendError::InvalidServerUrl {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidServerUrl {
                url: url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }
        Ok(base)
    }

    async fn client_and_base(&self) -> Result<(Client, Url)> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(BackendError::NotConnected)?;
        Ok((session.client.clone(), session.base.clone()))
    }

    /// Handle for a per-call id or the session default.
    ///
    /// The cached default is reused when no id is given or the id matches it;
    /// any other id is resolved for this call only.
    async fn repository(&self, repository_id: Option<&str>) -> Result<(Client, RepositoryHandle)> {
        let (client, base) = {
            let guard = self.session.read().await;
            let session = guard.as_ref().ok_or(BackendError::NotConnected)?;

            match (repository_id, &session.current) {
                (None, Some(handle)) => return Ok((session.client.clone(), handle.clone())),
                (Some(id), Some(handle)) if id == handle.id => {
                    return Ok((session.client.clone(), handle.clone()));
                }
                (None, None) => return Err(BackendError::NoRepositorySelected),
                _ => (session.client.clone(), session.base.clone()),
            }
        };

        let id = repository_id.ok_or(BackendError::NoRepositorySelected)?;
        let (handle, _) = resolve(&client, &base, id).await?;
        Ok((client, handle))
    }
}

#[async_trait]
impl Backend for RemoteRepositoryBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn connect(&self) -> Result<()> {
        metrics::observe(NAME, "connect", async {
            if self.session.read().await.is_some() {
                return Ok(());
            }

            let base = self.base_url()?;
            let client = self.build_client()?;

            let response = client
                .get(join(&base, &["protocol"]))
                .send()
                .await
                .map_err(|e| BackendError::EngineUnavailable {
                    reason: format!("{} is unreachable: {e}", self.config.server_url),
                })?;
            let protocol = check_status(response, None).await?.text().await?;

            // Dropping `client` on any error below releases its connections.
            let current = match &self.config.default_repository {
                Some(id) => Some(resolve(&client, &base, id).await?.0),
                None => None,
            };

            let mut guard = self.session.write().await;
            if guard.is_none() {
                tracing::info!(
                    backend = NAME,
                    server = %base,
                    protocol = %protocol.trim(),
                    repository = ?current.as_ref().map(|handle| handle.id.as_str()),
                    "Connected to repository server"
                );
                *guard = Some(RemoteSession {
                    client,
                    base,
                    current,
                });
                metrics::record_connection(NAME, "connect");
            }
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        if self.session.write().await.take().is_some() {
            metrics::record_connection(NAME, "close");
            tracing::info!(backend = NAME, "Closed repository server session");
        }
        Ok(())
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>> {
        metrics::observe(NAME, "list_repositories", async {
            let (client, base) = self.client_and_base().await?;
            let response = client
                .get(join(&base, &["repositories"]))
                .header(header::ACCEPT, SPARQL_RESULTS_JSON)
                .send()
                .await?;
            let response = check_status(response, None).await?;
            let catalog = parse_select_json(&response.bytes().await?)?;

            catalog.bindings.iter().map(repository_info).collect()
        })
        .await
    }

    async fn select_repository(&self, repository_id: &str) -> Result<()> {
        metrics::observe(NAME, "select_repository", async {
            let (client, base) = self.client_and_base().await?;
            let (handle, _) = resolve(&client, &base, repository_id).await?;

            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(BackendError::NotConnected)?;
            session.current = Some(handle);

            tracing::info!(backend = NAME, repository = %repository_id, "Selected repository");
            Ok(())
        })
        .await
    }

    async fn current_repository(&self) -> Result<Option<String>> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(BackendError::NotConnected)?;
        Ok(session.current.as_ref().map(|handle| handle.id.clone()))
    }

    async fn sparql_select(
        &self,
        query: &str,
        repository_id: Option<&str>,
    ) -> Result<SelectResult> {
        metrics::observe(NAME, "select", async {
            metrics::record_query_bytes(NAME, "select", query);
            let (client, handle) = self.repository(repository_id).await?;
            let result = select(&client, &handle, query).await?;
            metrics::record_result_rows(NAME, "select", result.bindings.len());
            Ok(result)
        })
        .await
    }

    async fn sparql_construct(
        &self,
        query: &str,
        repository_id: Option<&str>,
    ) -> Result<ConstructResult> {
        metrics::observe(NAME, "construct", async {
            metrics::record_query_bytes(NAME, "construct", query);
            let (client, handle) = self.repository(repository_id).await?;
            let response = post_query(&client, &handle, query, N_TRIPLES).await?;
            let triples = parse_ntriples(&response.bytes().await?)?;
            Ok(ConstructResult {
                turtle: render_turtle(&triples),
            })
        })
        .await
    }

    async fn sparql_ask(&self, query: &str, repository_id: Option<&str>) -> Result<AskResult> {
        metrics::observe(NAME, "ask", async {
            metrics::record_query_bytes(NAME, "ask", query);
            let (client, handle) = self.repository(repository_id).await?;
            let response = post_query(&client, &handle, query, SPARQL_RESULTS_JSON).await?;
            let boolean = parse_ask_json(&response.bytes().await?)?;
            Ok(AskResult { boolean })
        })
        .await
    }

    async fn namespaces(&self, repository_id: Option<&str>) -> Result<Vec<NamespaceBinding>> {
        metrics::observe(NAME, "namespaces", async {
            let (client, handle) = self.repository(repository_id).await?;
            let response = client
                .get(join(&handle.endpoint, &["namespaces"]))
                .header(header::ACCEPT, SPARQL_RESULTS_JSON)
                .send()
                .await?;
            let response = check_status(response, Some(&handle.id)).await?;
            let listing = parse_select_json(&response.bytes().await?)?;

            listing
                .bindings
                .iter()
                .map(|binding| {
                    Ok(NamespaceBinding::new(
                        required(binding, "prefix")?,
                        required(binding, "namespace")?,
                    ))
                })
                .collect()
        })
        .await
    }

    async fn statistics(&self, repository_id: Option<&str>) -> Result<StatisticsSnapshot> {
        metrics::observe(NAME, "statistics", async {
            let (client, handle) = self.repository(repository_id).await?;
            let (client, handle) = (&client, &handle);
            let count = move |query: String| async move {
                count_value(&select(client, handle, &query).await?, "count")
            };

            Ok(StatisticsSnapshot {
                total_statements: repository_size(client, handle).await?,
                total_classes: count(query::count_classes()).await?,
                total_properties: count(query::count_properties()).await?,
                total_subjects: count(query::COUNT_SUBJECTS.to_string()).await?,
                total_objects: count(query::COUNT_OBJECTS.to_string()).await?,
            })
        })
        .await
    }
}

async fn post_query(
    client: &Client,
    handle: &RepositoryHandle,
    query: &str,
    accept: &str,
) -> Result<Response> {
    tracing::debug!(
        backend = NAME,
        repository = %handle.id,
        accept,
        "Executing SPARQL query"
    );

    let response = client
        .post(handle.endpoint.clone())
        .header(header::CONTENT_TYPE, SPARQL_QUERY)
        .header(header::ACCEPT, accept)
        .body(query.to_owned())
        .send()
        .await?;

    match response.status() {
        StatusCode::BAD_REQUEST => {
            let reason = error_body(response).await;
            return Err(BackendError::QuerySyntax { reason });
        }
        // The query form has no serialization in the requested result format.
        StatusCode::NOT_ACCEPTABLE => {
            let body = error_body(response).await;
            return Err(BackendError::QuerySyntax {
                reason: format!("Query form does not produce {accept} results: {body}"),
            });
        }
        _ => {}
    }
    check_status(response, Some(&handle.id)).await
}

async fn select(client: &Client, handle: &RepositoryHandle, query: &str) -> Result<SelectResult> {
    let response = post_query(client, handle, query, SPARQL_RESULTS_JSON).await?;
    parse_select_json(&response.bytes().await?)
}

/// `base` with `segments` appended as percent-encoded path segments.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Confirms `id` exists via its size endpoint. 404 means the server rejects it.
async fn resolve(client: &Client, base: &Url, id: &str) -> Result<(RepositoryHandle, u64)> {
    let handle = RepositoryHandle {
        id: id.to_string(),
        endpoint: join(base, &["repositories", id]),
    };
    let size = repository_size(client, &handle).await?;

    tracing::debug!(backend = NAME, repository = %id, size, "Resolved repository");
    Ok((handle, size))
}

async fn repository_size(client: &Client, handle: &RepositoryHandle) -> Result<u64> {
    let response = client.get(join(&handle.endpoint, &["size"])).send().await?;
    let body = check_status(response, Some(&handle.id)).await?.text().await?;

    body.trim().parse().map_err(|e| BackendError::ParseError {
        reason: format!("Repository size '{}' is not a number: {e}", body.trim()),
    })
}

async fn check_status(response: Response, repository: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND
        && let Some(id) = repository
    {
        return Err(BackendError::RepositoryNotFound(id.to_string()));
    }

    let message = error_body(response).await;
    Err(BackendError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

fn repository_info(binding: &Binding) -> Result<RepositoryInfo> {
    let id = required(binding, "id")?;
    Ok(RepositoryInfo {
        title: optional(binding, "title").unwrap_or_else(|| id.clone()),
        location: optional(binding, "uri"),
        readable: flag(binding, "readable"),
        writable: flag(binding, "writable"),
        id,
    })
}

fn required(binding: &Binding, variable: &str) -> Result<String> {
    optional(binding, variable).ok_or_else(|| BackendError::ParseError {
        reason: format!("Missing '{variable}' in server response"),
    })
}

fn optional(binding: &Binding, variable: &str) -> Option<String> {
    binding.get(variable).map(|term| term.value().to_string())
}

/// Absent flags default to true.
fn flag(binding: &Binding, variable: &str) -> bool {
    binding
        .get(variable)
        .is_none_or(|term| term.value().eq_ignore_ascii_case("true"))
}

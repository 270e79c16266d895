use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use oxigraph::{
    io::{RdfFormat, RdfParser},
    model::{GraphName, Quad},
    sparql::{PreparedSparqlQuery, QueryResults, SparqlEvaluator},
    store::{StorageError, Store},
};
use tokio::sync::RwLock;

use super::Backend;
use crate::{
    config::{LocalStoreConfig, StoreFormat},
    error::{BackendError, Result},
    metrics, query,
    query::vocab::STANDARD_PREFIXES,
    rdf::{binding_from_solution, render_turtle},
    sparql::count_value,
    types::{
        AskResult, ConstructResult, NamespaceBinding, RdfTriple, RepositoryInfo, SelectResult,
        StatisticsSnapshot,
    },
};

/// Id of the single repository the in-process engine exposes.
pub const LOCAL_REPOSITORY_ID: &str = "local";

const NAME: &str = "in_memory";

#[derive(Clone)]
struct LocalGraph {
    store: Store,
    namespaces: Vec<NamespaceBinding>,
}

impl LocalGraph {
    fn empty() -> Result<Self> {
        let store = Store::new().map_err(|e| BackendError::EngineUnavailable {
            reason: format!("Failed to create in-memory store: {e}"),
        })?;

        let mut graph = Self {
            store,
            namespaces: Vec::new(),
        };
        for (prefix, namespace) in STANDARD_PREFIXES {
            graph.bind(NamespaceBinding::new(prefix, namespace));
        }
        Ok(graph)
    }

    /// Rebinds an existing prefix in place, otherwise appends.
    fn bind(&mut self, binding: NamespaceBinding) {
        match self
            .namespaces
            .iter_mut()
            .find(|existing| existing.prefix == binding.prefix)
        {
            Some(existing) => existing.namespace = binding.namespace,
            None => self.namespaces.push(binding),
        }
    }

    /// Parses `query` with every bound prefix predeclared.
    fn prepare(&self, query: &str) -> Result<PreparedSparqlQuery> {
        let mut evaluator = SparqlEvaluator::new();
        for binding in &self.namespaces {
            evaluator = evaluator
                .with_prefix(binding.prefix.as_str(), binding.namespace.as_str())
                .map_err(|e| {
                    BackendError::engine(format!(
                        "Invalid namespace bound to prefix '{}': {e}",
                        binding.prefix
                    ))
                })?;
        }

        evaluator
            .parse_query(query)
            .map_err(|e| BackendError::QuerySyntax {
                reason: e.to_string(),
            })
    }

    fn select(&self, query: &str) -> Result<SelectResult> {
        evaluate_select(self.prepare(query)?, &self.store)
    }
}

/// In-process graph engine backed by an in-memory Oxigraph store.
///
/// Exposes exactly one repository, [`LOCAL_REPOSITORY_ID`]. The store is
/// created on `connect`, seeded from `store_path` when configured, and
/// dropped on `close`.
pub struct InMemoryGraphBackend {
    config: LocalStoreConfig,
    graph: RwLock<Option<LocalGraph>>,
}

impl InMemoryGraphBackend {
    pub fn new(config: LocalStoreConfig) -> Self {
        Self {
            config,
            graph: RwLock::new(None),
        }
    }

    /// Parse `data` into the graph. Returns the number of statements added.
    pub async fn load_data(&self, data: &str, format: StoreFormat) -> Result<usize> {
        metrics::observe(NAME, "load_data", async {
            let rdf_format = format.rdf_format(None)?;
            let graph = self.snapshot().await?;
            let data = data.to_owned();

            let (added, prefixes) =
                run_blocking(move || load_into(&graph.store, rdf_format, data.as_bytes())).await?;
            self.merge_namespaces(prefixes).await?;

            tracing::info!(backend = NAME, format = %format, added, "Loaded RDF data");
            Ok(added)
        })
        .await
    }

    /// Parse the file at `path` into the graph. Without a format the file
    /// extension decides. Returns the number of statements added.
    pub async fn load_file(&self, path: &Path, format: Option<StoreFormat>) -> Result<usize> {
        metrics::observe(NAME, "load_file", async {
            let graph = self.snapshot().await?;
            let (added, prefixes) =
                load_file_into(graph.store, path.to_path_buf(), format.unwrap_or(StoreFormat::Auto))
                    .await?;
            self.merge_namespaces(prefixes).await?;

            tracing::info!(
                backend = NAME,
                path = %path.display(),
                added,
                "Loaded RDF file"
            );
            Ok(added)
        })
        .await
    }

    async fn snapshot(&self) -> Result<LocalGraph> {
        self.graph
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(BackendError::NotConnected)
    }

    async fn merge_namespaces(&self, prefixes: Vec<NamespaceBinding>) -> Result<()> {
        let mut guard = self.graph.write().await;
        let graph = guard.as_mut().ok_or(BackendError::NotConnected)?;
        for binding in prefixes {
            graph.bind(binding);
        }
        Ok(())
    }

    /// Snapshot of the connected graph after checking a per-call repository id.
    async fn graph_for(&self, repository_id: Option<&str>) -> Result<LocalGraph> {
        let graph = self.snapshot().await?;
        if let Some(id) = repository_id
            && id != LOCAL_REPOSITORY_ID
        {
            return Err(BackendError::UnknownRepository(id.to_string()));
        }
        Ok(graph)
    }

    async fn open_graph(&self) -> Result<LocalGraph> {
        let mut graph = LocalGraph::empty()?;

        if let Some(path) = &self.config.store_path {
            let (added, prefixes) =
                load_file_into(graph.store.clone(), path.clone(), self.config.store_format).await?;
            for binding in prefixes {
                graph.bind(binding);
            }
            tracing::info!(
                backend = NAME,
                path = %path.display(),
                format = %self.config.store_format,
                statements = added,
                "Seeded in-memory graph from file"
            );
        }

        Ok(graph)
    }
}

#[async_trait]
impl Backend for InMemoryGraphBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn connect(&self) -> Result<()> {
        metrics::observe(NAME, "connect", async {
            if self.graph.read().await.is_some() {
                return Ok(());
            }

            // A failed load drops the half-built store here.
            let graph = self.open_graph().await?;

            let mut guard = self.graph.write().await;
            if guard.is_none() {
                *guard = Some(graph);
                metrics::record_connection(NAME, "connect");
                tracing::info!(backend = NAME, "Connected to in-memory graph");
            }
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        if self.graph.write().await.take().is_some() {
            metrics::record_connection(NAME, "close");
            tracing::info!(backend = NAME, "Closed in-memory graph");
        }
        Ok(())
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>> {
        metrics::observe(NAME, "list_repositories", async {
            self.snapshot().await?;
            Ok(vec![RepositoryInfo {
                id: LOCAL_REPOSITORY_ID.to_string(),
                title: "Local RDF Store".to_string(),
                location: self
                    .config
                    .store_path
                    .as_ref()
                    .map(|path| path.display().to_string()),
                readable: true,
                writable: true,
            }])
        })
        .await
    }

    async fn select_repository(&self, repository_id: &str) -> Result<()> {
        metrics::observe(NAME, "select_repository", async {
            self.graph_for(Some(repository_id)).await?;
            Ok(())
        })
        .await
    }

    async fn current_repository(&self) -> Result<Option<String>> {
        self.snapshot().await?;
        Ok(Some(LOCAL_REPOSITORY_ID.to_string()))
    }

    async fn sparql_select(
        &self,
        query: &str,
        repository_id: Option<&str>,
    ) -> Result<SelectResult> {
        metrics::observe(NAME, "select", async {
            let graph = self.graph_for(repository_id).await?;
            metrics::record_query_bytes(NAME, "select", query);
            tracing::debug!(backend = NAME, "Executing SPARQL SELECT");

            let query = query.to_owned();
            let result = run_blocking(move || graph.select(&query)).await?;
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
            let graph = self.graph_for(repository_id).await?;
            metrics::record_query_bytes(NAME, "construct", query);
            tracing::debug!(backend = NAME, "Executing SPARQL CONSTRUCT");

            let query = query.to_owned();
            run_blocking(move || {
                let results = graph
                    .prepare(&query)?
                    .on_store(&graph.store)
                    .execute()
                    .map_err(|e| BackendError::engine(format!("SPARQL CONSTRUCT failed: {e}")))?;

                match results {
                    QueryResults::Graph(triples) => {
                        let triples = triples
                            .map(|triple| {
                                triple.map(|triple| RdfTriple::from(&triple)).map_err(|e| {
                                    BackendError::engine(format!("Failed to read triple: {e}"))
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(ConstructResult {
                            turtle: render_turtle(&triples),
                        })
                    }
                    _ => Err(BackendError::QuerySyntax {
                        reason: "Expected a CONSTRUCT or DESCRIBE query".to_string(),
                    }),
                }
            })
            .await
        })
        .await
    }

    async fn sparql_ask(&self, query: &str, repository_id: Option<&str>) -> Result<AskResult> {
        metrics::observe(NAME, "ask", async {
            let graph = self.graph_for(repository_id).await?;
            metrics::record_query_bytes(NAME, "ask", query);
            tracing::debug!(backend = NAME, "Executing SPARQL ASK");

            let query = query.to_owned();
            run_blocking(move || {
                let results = graph
                    .prepare(&query)?
                    .on_store(&graph.store)
                    .execute()
                    .map_err(|e| BackendError::engine(format!("SPARQL ASK failed: {e}")))?;

                match results {
                    QueryResults::Boolean(boolean) => Ok(AskResult { boolean }),
                    _ => Err(BackendError::QuerySyntax {
                        reason: "Expected an ASK query".to_string(),
                    }),
                }
            })
            .await
        })
        .await
    }

    async fn namespaces(&self, repository_id: Option<&str>) -> Result<Vec<NamespaceBinding>> {
        metrics::observe(NAME, "namespaces", async {
            Ok(self.graph_for(repository_id).await?.namespaces)
        })
        .await
    }

    async fn statistics(&self, repository_id: Option<&str>) -> Result<StatisticsSnapshot> {
        metrics::observe(NAME, "statistics", async {
            let graph = self.graph_for(repository_id).await?;

            run_blocking(move || {
                let store = &graph.store;
                let total_statements = store
                    .len()
                    .map_err(|e| BackendError::engine(format!("Failed to count statements: {e}")))?;
                let total_classes = count_value(&graph.select(&query::count_classes())?, "count")?;
                let total_properties =
                    count_value(&graph.select(&query::count_properties())?, "count")?;

                let mut subjects = HashSet::new();
                let mut objects = HashSet::new();
                for quad in store.iter() {
                    let quad = quad
                        .map_err(|e| BackendError::engine(format!("Failed to scan store: {e}")))?;
                    subjects.insert(quad.subject);
                    objects.insert(quad.object);
                }

                Ok(StatisticsSnapshot {
                    total_statements: total_statements as u64,
                    total_classes,
                    total_properties,
                    total_subjects: subjects.len() as u64,
                    total_objects: objects.len() as u64,
                })
            })
            .await
        })
        .await
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| BackendError::engine(format!("Task join error: {e}")))?
}

fn evaluate_select(prepared: PreparedSparqlQuery, store: &Store) -> Result<SelectResult> {
    let results = prepared
        .on_store(store)
        .execute()
        .map_err(|e| BackendError::engine(format!("SPARQL SELECT failed: {e}")))?;

    let QueryResults::Solutions(solutions) = results else {
        return Err(BackendError::QuerySyntax {
            reason: "Expected a SELECT query".to_string(),
        });
    };

    let variables = solutions.variables().to_vec();
    let bindings = solutions
        .map(|solution| {
            solution
                .map(|solution| binding_from_solution(&variables, &solution))
                .map_err(|e| BackendError::engine(format!("Failed to read solution: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SelectResult {
        variables: variables
            .iter()
            .map(|variable| variable.as_str().to_owned())
            .collect(),
        bindings,
    })
}

async fn load_file_into(
    store: Store,
    path: PathBuf,
    format: StoreFormat,
) -> Result<(usize, Vec<NamespaceBinding>)> {
    let rdf_format = format.rdf_format(Some(&path))?;
    run_blocking(move || {
        let file = File::open(&path).map_err(|e| BackendError::Load {
            reason: format!("Failed to open {}: {e}", path.display()),
        })?;
        load_into(&store, rdf_format, BufReader::new(file))
    })
    .await
}

/// Parses the whole document before touching the store, so a syntax error
/// leaves the graph unchanged. Named graphs are flattened into the default
/// graph. Returns the statements added and the prefixes the document declared.
fn load_into(
    store: &Store,
    format: RdfFormat,
    reader: impl Read,
) -> Result<(usize, Vec<NamespaceBinding>)> {
    let mut parser = RdfParser::from_format(format).for_reader(reader);

    let mut quads = Vec::new();
    for quad in parser.by_ref() {
        quads.push(quad.map_err(|e| BackendError::Load {
            reason: e.to_string(),
        })?);
    }
    let prefixes = parser
        .prefixes()
        .map(|(prefix, namespace)| NamespaceBinding::new(prefix, namespace))
        .collect();

    let storage_error = |e: StorageError| BackendError::engine(format!("Failed to store statement: {e}"));
    let mut added = 0;
    for quad in quads {
        let quad = Quad::new(quad.subject, quad.predicate, quad.object, GraphName::DefaultGraph);
        if store.contains(&quad).map_err(storage_error)? {
            continue;
        }
        store.insert(&quad).map_err(storage_error)?;
        added += 1;
    }

    Ok((added, prefixes))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use std::io::Write;

    use super::*;

    const PEOPLE: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:alice a ex:Person ;
            ex:name "Alice" .
        ex:bob a ex:Person .
    "#;

    async fn connected() -> InMemoryGraphBackend {
        let backend = InMemoryGraphBackend::new(LocalStoreConfig::default());
        backend.connect().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_starts_with_standard_prefixes() {
        let backend = connected().await;
        let prefixes: Vec<String> = backend
            .namespaces(None)
            .await
            .unwrap()
            .into_iter()
            .map(|binding| binding.prefix)
            .collect();
        assert_eq!(prefixes, vec!["rdf", "rdfs", "owl", "xsd"]);
    }

    #[tokio::test]
    async fn test_load_data_reports_added_and_merges_prefixes() {
        let backend = connected().await;
        assert_eq!(backend.load_data(PEOPLE, StoreFormat::Turtle).await.unwrap(), 3);
        // Same statements again add nothing.
        assert_eq!(backend.load_data(PEOPLE, StoreFormat::Turtle).await.unwrap(), 0);

        let namespaces = backend.namespaces(None).await.unwrap();
        assert_eq!(namespaces.len(), 5);
        assert_eq!(namespaces[4], NamespaceBinding::new("ex", "http://example.org/"));
    }

    #[tokio::test]
    async fn test_statement_repeated_across_graphs_counts_once() {
        let backend = connected().await;
        let data = "<http://example.org/s> <http://example.org/p> \"v\" <http://example.org/g1> .\n\
                    <http://example.org/s> <http://example.org/p> \"v\" <http://example.org/g2> .\n\
                    <http://example.org/s> <http://example.org/p> \"w\" .\n";

        assert_eq!(backend.load_data(data, StoreFormat::NQuads).await.unwrap(), 2);
        assert_eq!(backend.statistics(None).await.unwrap().total_statements, 2);
    }

    #[tokio::test]
    async fn test_bound_prefixes_usable_without_declaration() {
        let backend = connected().await;
        backend.load_data(PEOPLE, StoreFormat::Turtle).await.unwrap();

        let answer = backend
            .sparql_ask("ASK { ex:alice rdf:type ex:Person }", None)
            .await
            .unwrap();
        assert!(answer.boolean);
    }

    #[tokio::test]
    async fn test_malformed_data_is_load_error_and_leaves_graph_unchanged() {
        let backend = connected().await;
        let error = backend
            .load_data("<http://example.org/a> <http://example.org/b> .", StoreFormat::Turtle)
            .await
            .unwrap_err();
        assert!(matches!(error, BackendError::Load { .. }));
        assert_eq!(backend.statistics(None).await.unwrap().total_statements, 0);
    }

    #[tokio::test]
    async fn test_nquads_are_flattened_into_default_graph() {
        let backend = connected().await;
        let data = "<http://example.org/s> <http://example.org/p> <http://example.org/o> <http://example.org/g> .\n";
        assert_eq!(backend.load_data(data, StoreFormat::NQuads).await.unwrap(), 1);

        let answer = backend
            .sparql_ask(
                "ASK { <http://example.org/s> <http://example.org/p> <http://example.org/o> }",
                None,
            )
            .await
            .unwrap();
        assert!(answer.boolean);
    }

    #[tokio::test]
    async fn test_connect_seeds_from_file() {
        let mut file = tempfile::Builder::new().suffix(".ttl").tempfile().unwrap();
        file.write_all(PEOPLE.as_bytes()).unwrap();

        let backend = InMemoryGraphBackend::new(LocalStoreConfig {
            store_path: Some(file.path().to_path_buf()),
            store_format: StoreFormat::Auto,
        });
        backend.connect().await.unwrap();

        assert_eq!(backend.statistics(None).await.unwrap().total_statements, 3);
        let repositories = backend.list_repositories().await.unwrap();
        assert_eq!(
            repositories[0].location.as_deref(),
            Some(file.path().display().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_backend_disconnected() {
        let backend = InMemoryGraphBackend::new(LocalStoreConfig {
            store_path: Some(PathBuf::from("/nonexistent/graph.ttl")),
            store_format: StoreFormat::Turtle,
        });

        let error = backend.connect().await.unwrap_err();
        assert!(matches!(error, BackendError::Load { .. }));
        assert!(matches!(
            backend.sparql_ask("ASK {}", None).await.unwrap_err(),
            BackendError::NotConnected
        ));
    }

    #[tokio::test]
    async fn test_load_file_detects_format_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".nt").tempfile().unwrap();
        writeln!(
            file,
            "<http://example.org/s> <http://example.org/p> \"v\"@en ."
        )
        .unwrap();

        let backend = connected().await;
        assert_eq!(backend.load_file(file.path(), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wrong_query_form_is_rejected() {
        let backend = connected().await;
        let error = backend
            .sparql_select("ASK { ?s ?p ?o }", None)
            .await
            .unwrap_err();
        assert!(matches!(error, BackendError::QuerySyntax { .. }));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let backend = connected().await;
        backend.load_data(PEOPLE, StoreFormat::Turtle).await.unwrap();
        backend.connect().await.unwrap();
        assert_eq!(backend.statistics(None).await.unwrap().total_statements, 3);
    }
}

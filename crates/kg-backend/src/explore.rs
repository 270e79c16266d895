//! Exploration operations composed from the [`Backend`] primitives.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    backend::Backend,
    error::Result,
    query,
    types::{Binding, ConstructResult, NamespaceBinding, SelectResult, StatisticsSnapshot},
};

const DEFAULT_LIMIT: usize = 100;
const SUMMARY_LIMIT: usize = 50;

/// Filters for [`Explore::search_classes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSearch {
    /// Case-insensitive regex over the class IRI
    pub pattern: Option<String>,
    pub limit: usize,
}

impl Default for ClassSearch {
    fn default() -> Self {
        Self {
            pattern: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Filters for [`Explore::search_properties`]. All given filters must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySearch {
    /// Case-insensitive regex over the property IRI
    pub pattern: Option<String>,
    /// Declared `rdfs:domain`
    pub domain: Option<String>,
    /// Declared `rdfs:range`
    pub range: Option<String>,
    pub limit: usize,
}

impl Default for PropertySearch {
    fn default() -> Self {
        Self {
            pattern: None,
            domain: None,
            range: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Overview of a repository's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub statistics: StatisticsSnapshot,
    pub classes: Vec<Binding>,
    pub properties: Vec<Binding>,
    pub namespaces: Vec<NamespaceBinding>,
}

/// Derived operations, available on every [`Backend`].
#[async_trait]
pub trait Explore: Backend {
    /// All statements about `iri`, via `DESCRIBE`.
    async fn describe_resource(
        &self,
        iri: &str,
        repository_id: Option<&str>,
    ) -> Result<ConstructResult> {
        self.sparql_construct(&query::describe(iri), repository_id)
            .await
    }

    /// Classes declared as `owl:Class`/`rdfs:Class` or used as an `rdf:type`,
    /// one row per IRI with optional `label` and `comment`, ordered by IRI.
    async fn search_classes(
        &self,
        search: &ClassSearch,
        repository_id: Option<&str>,
    ) -> Result<SelectResult> {
        let text = query::search_classes(search.pattern.as_deref(), search.limit);
        self.sparql_select(&text, repository_id).await
    }

    /// Properties declared as `rdf:Property`, `owl:ObjectProperty` or
    /// `owl:DatatypeProperty`, or used as a predicate.
    async fn search_properties(
        &self,
        search: &PropertySearch,
        repository_id: Option<&str>,
    ) -> Result<SelectResult> {
        let text = query::search_properties(
            search.pattern.as_deref(),
            search.domain.as_deref(),
            search.range.as_deref(),
            search.limit,
        );
        self.sparql_select(&text, repository_id).await
    }

    /// Subjects typed as `class_iri`, ordered by IRI, with optional `label`.
    async fn find_instances(
        &self,
        class_iri: &str,
        limit: usize,
        repository_id: Option<&str>,
    ) -> Result<SelectResult> {
        self.sparql_select(&query::find_instances(class_iri, limit), repository_id)
            .await
    }

    /// Classes, properties, statistics and namespaces in one structure.
    /// The four lookups are independent and run concurrently.
    async fn schema_summary(&self, repository_id: Option<&str>) -> Result<SchemaSummary> {
        let classes = ClassSearch {
            limit: SUMMARY_LIMIT,
            ..ClassSearch::default()
        };
        let properties = PropertySearch {
            limit: SUMMARY_LIMIT,
            ..PropertySearch::default()
        };

        let (classes, properties, statistics, namespaces) = tokio::try_join!(
            self.search_classes(&classes, repository_id),
            self.search_properties(&properties, repository_id),
            self.statistics(repository_id),
            self.namespaces(repository_id),
        )?;

        Ok(SchemaSummary {
            statistics,
            classes: classes.bindings,
            properties: properties.bindings,
            namespaces,
        })
    }
}

impl<T: Backend + ?Sized> Explore for T {}

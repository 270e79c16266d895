//! Turns command results into the text written to stdout.

use kg_backend::{
    SchemaSummary,
    types::{
        AskResult, Binding, ConstructResult, NamespaceBinding, RepositoryInfo, SelectResult,
        StatisticsSnapshot,
    },
};
use serde::Serialize;

/// A rendered command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Output {
    /// Pretty JSON document
    Json(String),
    /// Comment header followed by Turtle text
    Turtle { header: Vec<String>, turtle: String },
}

impl Output {
    pub(crate) fn into_text(self) -> String {
        match self {
            Output::Json(text) => text,
            Output::Turtle { header, turtle } => {
                let mut text = String::new();
                for line in header {
                    text.push_str("# ");
                    text.push_str(&line);
                    text.push('\n');
                }
                text.push('\n');
                text.push_str(&turtle);
                text
            }
        }
    }
}

/// JSON documents, tagged with `type`. Borrowed so binding order is kept.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Document<'a> {
    Select {
        variables: &'a [String],
        bindings: &'a [Binding],
        count: usize,
    },
    Ask {
        result: bool,
    },
    Repositories {
        count: usize,
        repositories: &'a [RepositoryInfo],
    },
    RepositorySelected {
        repository_id: &'a str,
        message: String,
    },
    CurrentRepository {
        repository_id: Option<&'a str>,
        message: String,
    },
    Namespaces {
        count: usize,
        namespaces: &'a [NamespaceBinding],
        sparql_prefixes: String,
    },
    Statistics(&'a StatisticsSnapshot),
    Classes {
        pattern: Option<&'a str>,
        count: usize,
        classes: &'a [Binding],
    },
    Properties {
        pattern: Option<&'a str>,
        domain_filter: Option<&'a str>,
        range_filter: Option<&'a str>,
        count: usize,
        properties: &'a [Binding],
    },
    Instances {
        class: &'a str,
        count: usize,
        instances: &'a [Binding],
    },
    SchemaSummary {
        #[serde(flatten)]
        summary: &'a SchemaSummary,
        sparql_prefixes: String,
    },
}

impl Document<'_> {
    fn into_output(self) -> Result<Output, serde_json::Error> {
        serde_json::to_string_pretty(&self).map(Output::Json)
    }
}

pub(crate) fn select(result: &SelectResult) -> Result<Output, serde_json::Error> {
    Document::Select {
        variables: &result.variables,
        bindings: &result.bindings,
        count: result.bindings.len(),
    }
    .into_output()
}

pub(crate) fn construct(result: ConstructResult) -> Output {
    Output::Turtle {
        header: vec![
            "SPARQL CONSTRUCT/DESCRIBE Result".to_string(),
            "Format: Turtle".to_string(),
        ],
        turtle: result.turtle,
    }
}

pub(crate) fn describe(iri: &str, result: ConstructResult) -> Output {
    Output::Turtle {
        header: vec!["Resource Description".to_string(), format!("IRI: {iri}")],
        turtle: result.turtle,
    }
}

pub(crate) fn ask(result: AskResult) -> Result<Output, serde_json::Error> {
    Document::Ask {
        result: result.boolean,
    }
    .into_output()
}

pub(crate) fn repositories(repositories: &[RepositoryInfo]) -> Result<Output, serde_json::Error> {
    Document::Repositories {
        count: repositories.len(),
        repositories,
    }
    .into_output()
}

pub(crate) fn repository_selected(repository_id: &str) -> Result<Output, serde_json::Error> {
    Document::RepositorySelected {
        repository_id,
        message: format!("Repository '{repository_id}' is now the default."),
    }
    .into_output()
}

pub(crate) fn current_repository(current: Option<&str>) -> Result<Output, serde_json::Error> {
    let message = match current {
        Some(id) => format!("Current repository: {id}"),
        None => "No repository selected".to_string(),
    };
    Document::CurrentRepository {
        repository_id: current,
        message,
    }
    .into_output()
}

pub(crate) fn namespaces(namespaces: &[NamespaceBinding]) -> Result<Output, serde_json::Error> {
    Document::Namespaces {
        count: namespaces.len(),
        namespaces,
        sparql_prefixes: sparql_prefixes(namespaces),
    }
    .into_output()
}

pub(crate) fn statistics(statistics: &StatisticsSnapshot) -> Result<Output, serde_json::Error> {
    Document::Statistics(statistics).into_output()
}

pub(crate) fn classes(
    pattern: Option<&str>,
    result: &SelectResult,
) -> Result<Output, serde_json::Error> {
    Document::Classes {
        pattern,
        count: result.bindings.len(),
        classes: &result.bindings,
    }
    .into_output()
}

pub(crate) fn properties(
    pattern: Option<&str>,
    domain: Option<&str>,
    range: Option<&str>,
    result: &SelectResult,
) -> Result<Output, serde_json::Error> {
    Document::Properties {
        pattern,
        domain_filter: domain,
        range_filter: range,
        count: result.bindings.len(),
        properties: &result.bindings,
    }
    .into_output()
}

pub(crate) fn instances(class: &str, result: &SelectResult) -> Result<Output, serde_json::Error> {
    Document::Instances {
        class,
        count: result.bindings.len(),
        instances: &result.bindings,
    }
    .into_output()
}

pub(crate) fn summary(summary: &SchemaSummary) -> Result<Output, serde_json::Error> {
    Document::SchemaSummary {
        summary,
        sparql_prefixes: sparql_prefixes(&summary.namespaces),
    }
    .into_output()
}

fn sparql_prefixes(namespaces: &[NamespaceBinding]) -> String {
    namespaces
        .iter()
        .map(|binding| format!("PREFIX {}: <{}>", binding.prefix, binding.namespace))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use kg_backend::types::RdfTerm;
    use serde_json::Value;

    use super::*;

    fn json(output: Output) -> (String, Value) {
        let text = output.into_text();
        let value = serde_json::from_str(&text).unwrap();
        (text, value)
    }

    #[test]
    fn select_keeps_projection_order_and_counts() {
        let mut row = Binding::new();
        row.push("s", RdfTerm::iri("http://example.org/alice"));
        row.push("name", RdfTerm::literal("Alice"));
        let result = SelectResult {
            variables: vec!["s".to_string(), "name".to_string()],
            bindings: vec![row],
        };

        let (text, value) = json(select(&result).unwrap());

        assert_eq!(value["type"], "select");
        assert_eq!(value["count"], 1);
        assert_eq!(value["variables"], serde_json::json!(["s", "name"]));
        assert_eq!(value["bindings"][0]["s"]["type"], "uri");
        assert!(text.find("\"s\": {").unwrap() < text.find("\"name\": {").unwrap());
    }

    #[test]
    fn construct_prints_header_then_turtle() {
        let output = construct(ConstructResult {
            turtle: "<http://example.org/a> <http://example.org/b> \"c\" .\n".to_string(),
        });

        assert_eq!(
            output.into_text(),
            "# SPARQL CONSTRUCT/DESCRIBE Result\n# Format: Turtle\n\n\
             <http://example.org/a> <http://example.org/b> \"c\" .\n"
        );
    }

    #[test]
    fn namespaces_include_prefix_declarations() {
        let bindings = vec![
            NamespaceBinding::new("ex", "http://example.org/"),
            NamespaceBinding::new("foaf", "http://xmlns.com/foaf/0.1/"),
        ];
        let (_, value) = json(namespaces(&bindings).unwrap());

        assert_eq!(value["count"], 2);
        assert_eq!(
            value["sparql_prefixes"],
            "PREFIX ex: <http://example.org/>\nPREFIX foaf: <http://xmlns.com/foaf/0.1/>"
        );
    }

    #[test]
    fn statistics_are_tagged() {
        let snapshot = StatisticsSnapshot {
            total_statements: 3,
            total_classes: 1,
            total_properties: 2,
            total_subjects: 1,
            total_objects: 3,
        };
        let (_, value) = json(statistics(&snapshot).unwrap());

        assert_eq!(value["type"], "statistics");
        assert_eq!(value["total_statements"], 3);
        assert_eq!(value["total_objects"], 3);
    }

    #[test]
    fn property_listing_reports_filters() {
        let (_, value) = json(
            properties(
                Some("name"),
                Some("http://example.org/Person"),
                None,
                &SelectResult::default(),
            )
            .unwrap(),
        );

        assert_eq!(value["type"], "properties");
        assert_eq!(value["pattern"], "name");
        assert_eq!(value["domain_filter"], "http://example.org/Person");
        assert!(value["range_filter"].is_null());
        assert_eq!(value["count"], 0);
    }

    #[test]
    fn current_repository_without_selection() {
        let (_, value) = json(current_repository(None).unwrap());
        assert!(value["repository_id"].is_null());
        assert_eq!(value["message"], "No repository selected");
    }
}

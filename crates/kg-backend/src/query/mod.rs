//! SPARQL text for the exploration operations and statistics.
//!
//! Every builder declares the prefixes it uses, so the text runs unchanged on
//! either engine.

pub mod vocab;

const PREFIXES: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX owl: <http://www.w3.org/2002/07/owl#>
";

const CLASS_PATTERNS: &str = "{ ?class a owl:Class }
    UNION { ?class a rdfs:Class }
    UNION { ?s a ?class }";

const PROPERTY_PATTERNS: &str = "{ ?property a rdf:Property }
    UNION { ?property a owl:ObjectProperty }
    UNION { ?property a owl:DatatypeProperty }
    UNION { ?s ?property ?o }";

pub(crate) fn count_classes() -> String {
    format!(
        "{PREFIXES}SELECT (COUNT(DISTINCT ?class) AS ?count) WHERE {{
    {CLASS_PATTERNS}
    FILTER(isIRI(?class))
}}"
    )
}

pub(crate) fn count_properties() -> String {
    format!(
        "{PREFIXES}SELECT (COUNT(DISTINCT ?property) AS ?count) WHERE {{
    {PROPERTY_PATTERNS}
}}"
    )
}

pub(crate) const COUNT_SUBJECTS: &str = "SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE { ?s ?p ?o }";

pub(crate) const COUNT_OBJECTS: &str = "SELECT (COUNT(DISTINCT ?o) AS ?count) WHERE { ?s ?p ?o }";

pub(crate) fn describe(iri: &str) -> String {
    format!("DESCRIBE <{iri}>")
}

/// Classes from explicit declarations and `rdf:type` usage, one row per IRI.
pub(crate) fn search_classes(pattern: Option<&str>, limit: usize) -> String {
    let mut filters = vec!["isIRI(?class)".to_string()];
    if let Some(pattern) = pattern {
        filters.push(regex_filter("?class", pattern));
    }

    format!(
        "{PREFIXES}SELECT ?class (SAMPLE(?l) AS ?label) (SAMPLE(?c) AS ?comment)
WHERE {{
    {CLASS_PATTERNS}
    OPTIONAL {{ ?class rdfs:label ?l }}
    OPTIONAL {{ ?class rdfs:comment ?c }}
    FILTER({})
}}
GROUP BY ?class
ORDER BY ?class
LIMIT {limit}",
        filters.join(" && ")
    )
}

/// Properties from explicit declarations and predicate usage, one row per IRI.
///
/// Domain and range filters apply to the declared `rdfs:domain`/`rdfs:range`.
pub(crate) fn search_properties(
    pattern: Option<&str>,
    domain: Option<&str>,
    range: Option<&str>,
    limit: usize,
) -> String {
    let mut filters = vec!["isIRI(?property)".to_string()];
    if let Some(pattern) = pattern {
        filters.push(regex_filter("?property", pattern));
    }
    if let Some(domain) = domain {
        filters.push(format!("?d = <{domain}>"));
    }
    if let Some(range) = range {
        filters.push(format!("?r = <{range}>"));
    }

    format!(
        "{PREFIXES}SELECT ?property (SAMPLE(?l) AS ?label) (SAMPLE(?d) AS ?domain) (SAMPLE(?r) AS ?range)
WHERE {{
    {PROPERTY_PATTERNS}
    OPTIONAL {{ ?property rdfs:label ?l }}
    OPTIONAL {{ ?property rdfs:domain ?d }}
    OPTIONAL {{ ?property rdfs:range ?r }}
    FILTER({})
}}
GROUP BY ?property
ORDER BY ?property
LIMIT {limit}",
        filters.join(" && ")
    )
}

pub(crate) fn find_instances(class_iri: &str, limit: usize) -> String {
    format!(
        "{PREFIXES}SELECT ?instance (SAMPLE(?l) AS ?label)
WHERE {{
    ?instance a <{class_iri}> .
    OPTIONAL {{ ?instance rdfs:label ?l }}
}}
GROUP BY ?instance
ORDER BY ?instance
LIMIT {limit}"
    )
}

/// Case-insensitive match on the string form of `variable`.
fn regex_filter(variable: &str, pattern: &str) -> String {
    format!(
        "REGEX(STR({variable}), \"{}\", \"i\")",
        escape_string_literal(pattern)
    )
}

fn escape_string_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_search_groups_and_limits() {
        let query = search_classes(None, 7);
        assert!(query.contains("GROUP BY ?class"));
        assert!(query.contains("ORDER BY ?class"));
        assert!(query.trim_end().ends_with("LIMIT 7"));
        assert!(!query.contains("REGEX"));
    }

    #[test]
    fn class_search_pattern_is_escaped() {
        let query = search_classes(Some(r#"Per"son\d"#), 100);
        assert!(query.contains(r#"REGEX(STR(?class), "Per\"son\\d", "i")"#));
    }

    #[test]
    fn property_filters_are_conjoined() {
        let query = search_properties(
            Some("name"),
            Some("http://example.org/Person"),
            Some("http://www.w3.org/2001/XMLSchema#string"),
            10,
        );
        assert!(query.contains(
            "FILTER(isIRI(?property) && REGEX(STR(?property), \"name\", \"i\") && \
             ?d = <http://example.org/Person> && \
             ?r = <http://www.w3.org/2001/XMLSchema#string>)"
        ));
    }

    #[test]
    fn instances_target_the_class() {
        let query = find_instances("http://example.org/Person", 5);
        assert!(query.contains("?instance a <http://example.org/Person> ."));
        assert!(query.contains("LIMIT 5"));
    }

    #[test]
    fn describe_wraps_iri() {
        assert_eq!(
            describe("http://example.org/alice"),
            "DESCRIBE <http://example.org/alice>"
        );
    }
}

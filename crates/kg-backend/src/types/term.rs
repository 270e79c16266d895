use std::fmt;

use serde::{Deserialize, Serialize};

/// Datatype of plain literals. Rendering omits it.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Portable RDF term.
///
/// Serializes to the SPARQL 1.1 JSON results term shape, so bindings coming
/// back from a remote engine deserialize directly into it.
///
/// A literal normally carries at most one of `language` and `datatype`.
/// Whatever the engine reported is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RdfTerm {
    #[serde(rename = "uri")]
    Iri { value: String },
    #[serde(rename = "literal", alias = "typed-literal")]
    Literal {
        value: String,
        #[serde(
            rename = "xml:lang",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        language: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
    #[serde(rename = "bnode")]
    BlankNode { value: String },
}

impl RdfTerm {
    pub fn iri(value: impl Into<String>) -> Self {
        RdfTerm::Iri {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn blank_node(value: impl Into<String>) -> Self {
        RdfTerm::BlankNode {
            value: value.into(),
        }
    }

    /// Lexical value: the IRI, the literal's lexical form, or the blank node label.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Iri { value } | RdfTerm::BlankNode { value } => value,
            RdfTerm::Literal { value, .. } => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, RdfTerm::Iri { .. })
    }
}

/// Writes the term as a Turtle token with IRIs fully expanded.
impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::Iri { value } => write!(f, "<{value}>"),
            RdfTerm::BlankNode { value } => write!(f, "_:{value}"),
            RdfTerm::Literal {
                value,
                language,
                datatype,
            } => {
                f.write_str("\"")?;
                for c in value.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")?;
                if let Some(language) = language {
                    write!(f, "@{language}")
                } else if let Some(datatype) = datatype
                    && datatype != XSD_STRING
                {
                    write!(f, "^^<{datatype}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A (subject, predicate, object) statement in portable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RdfTriple {
    pub subject: RdfTerm,
    pub predicate: RdfTerm,
    pub object: RdfTerm,
}

impl RdfTriple {
    pub fn new(subject: RdfTerm, predicate: RdfTerm, object: RdfTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for RdfTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn renders_each_term_kind() {
        assert_eq!(
            RdfTerm::iri("http://example.org/a").to_string(),
            "<http://example.org/a>"
        );
        assert_eq!(RdfTerm::blank_node("b0").to_string(), "_:b0");
        assert_eq!(RdfTerm::literal("plain").to_string(), "\"plain\"");
        assert_eq!(
            RdfTerm::lang_literal("chat", "fr").to_string(),
            "\"chat\"@fr"
        );
        assert_eq!(
            RdfTerm::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer").to_string(),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn omits_xsd_string_datatype() {
        assert_eq!(
            RdfTerm::typed_literal("Alice", XSD_STRING).to_string(),
            "\"Alice\""
        );
    }

    #[test]
    fn escapes_quotes_backslashes_and_line_breaks() {
        let term = RdfTerm::literal("say \"hi\"\\\nbye");
        assert_eq!(term.to_string(), r#""say \"hi\"\\\nbye""#);
    }

    #[test]
    fn deserializes_sparql_json_terms() {
        let uri: RdfTerm =
            serde_json::from_str(r#"{"type":"uri","value":"http://example.org/x"}"#).unwrap();
        assert_eq!(uri, RdfTerm::iri("http://example.org/x"));

        let tagged: RdfTerm =
            serde_json::from_str(r#"{"type":"literal","value":"hallo","xml:lang":"de"}"#)
                .unwrap();
        assert_eq!(tagged, RdfTerm::lang_literal("hallo", "de"));

        let legacy: RdfTerm = serde_json::from_str(
            r#"{"type":"typed-literal","value":"1","datatype":"http://www.w3.org/2001/XMLSchema#integer"}"#,
        )
        .unwrap();
        assert_eq!(
            legacy,
            RdfTerm::typed_literal("1", "http://www.w3.org/2001/XMLSchema#integer")
        );

        let bnode: RdfTerm = serde_json::from_str(r#"{"type":"bnode","value":"n1"}"#).unwrap();
        assert_eq!(bnode, RdfTerm::blank_node("n1"));
    }

    #[test]
    fn serializes_without_absent_fields() {
        let json = serde_json::to_value(RdfTerm::literal("x")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "literal", "value": "x"}));
    }
}

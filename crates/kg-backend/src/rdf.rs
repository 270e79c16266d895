//! Conversion of engine-native RDF values into the portable model, and the
//! Turtle subset renderer used for constructed graphs.

use oxigraph::{
    io::{RdfFormat, RdfParser},
    model::{Literal, NamedNode, NamedOrBlankNode, Term, Triple, Variable},
    sparql::QuerySolution,
};

use crate::{
    error::{BackendError, Result},
    types::{Binding, RdfTerm, RdfTriple},
};

impl From<&NamedNode> for RdfTerm {
    fn from(node: &NamedNode) -> Self {
        RdfTerm::iri(node.as_str())
    }
}

impl From<&NamedOrBlankNode> for RdfTerm {
    fn from(node: &NamedOrBlankNode) -> Self {
        match node {
            NamedOrBlankNode::NamedNode(node) => node.into(),
            NamedOrBlankNode::BlankNode(node) => RdfTerm::blank_node(node.as_str()),
        }
    }
}

/// Language tag wins over datatype. Never inferred from the lexical form.
impl From<&Literal> for RdfTerm {
    fn from(literal: &Literal) -> Self {
        match literal.language() {
            Some(language) => RdfTerm::lang_literal(literal.value(), language),
            None => RdfTerm::typed_literal(literal.value(), literal.datatype().as_str()),
        }
    }
}

impl From<&Term> for RdfTerm {
    fn from(term: &Term) -> Self {
        match term {
            Term::NamedNode(node) => node.into(),
            Term::BlankNode(node) => RdfTerm::blank_node(node.as_str()),
            Term::Literal(literal) => literal.into(),
        }
    }
}

impl From<&Triple> for RdfTriple {
    fn from(triple: &Triple) -> Self {
        RdfTriple::new(
            (&triple.subject).into(),
            (&triple.predicate).into(),
            (&triple.object).into(),
        )
    }
}

/// Builds a binding by walking the declared projection, not the row's own keys.
pub(crate) fn binding_from_solution(variables: &[Variable], solution: &QuerySolution) -> Binding {
    variables
        .iter()
        .filter_map(|variable| {
            solution
                .get(variable.as_str())
                .map(|term| (variable.as_str().to_owned(), RdfTerm::from(term)))
        })
        .collect()
}

/// Renders triples as Turtle, one `subject predicate object .` statement per
/// line, IRIs fully expanded and no prefix section.
pub fn render_turtle<'a>(triples: impl IntoIterator<Item = &'a RdfTriple>) -> String {
    triples
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses an N-Triples document into portable triples.
pub(crate) fn parse_ntriples(body: &[u8]) -> Result<Vec<RdfTriple>> {
    RdfParser::from_format(RdfFormat::NTriples)
        .for_reader(body)
        .map(|parsed| {
            let quad = parsed.map_err(|e| BackendError::ParseError {
                reason: format!("Failed to parse N-Triples response: {e}"),
            })?;
            Ok(RdfTriple::new(
                (&quad.subject).into(),
                (&quad.predicate).into(),
                (&quad.object).into(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use std::collections::HashSet;

    use oxigraph::model::{BlankNode, Literal, NamedNode};

    use super::*;

    fn parse_turtle(text: &str) -> HashSet<RdfTriple> {
        RdfParser::from_format(RdfFormat::Turtle)
            .for_reader(text.as_bytes())
            .map(|quad| {
                let quad = quad.unwrap();
                RdfTriple::new(
                    (&quad.subject).into(),
                    (&quad.predicate).into(),
                    (&quad.object).into(),
                )
            })
            .collect()
    }

    fn sample_triples() -> Vec<Triple> {
        let alice = NamedNode::new("http://example.org/alice").unwrap();
        let name = NamedNode::new("http://example.org/name").unwrap();
        let note = NamedNode::new("http://example.org/note").unwrap();
        let age = NamedNode::new("http://example.org/age").unwrap();
        let knows = NamedNode::new("http://example.org/knows").unwrap();
        let anon = BlankNode::new("friend1").unwrap();

        vec![
            Triple::new(alice.clone(), name.clone(), Literal::new_simple_literal("Alice")),
            Triple::new(
                alice.clone(),
                note.clone(),
                Literal::new_simple_literal("quote \" and backslash \\ and\nnewline"),
            ),
            Triple::new(
                alice.clone(),
                note,
                Literal::new_language_tagged_literal("bonjour", "fr").unwrap(),
            ),
            Triple::new(
                alice.clone(),
                age,
                Literal::new_typed_literal(
                    "42",
                    NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap(),
                ),
            ),
            Triple::new(alice, knows, anon.clone()),
            Triple::new(anon, name, Literal::new_simple_literal("Bob")),
        ]
    }

    #[test]
    fn literal_keeps_language_and_drops_implicit_datatype() {
        let tagged = Literal::new_language_tagged_literal("hallo", "de").unwrap();
        assert_eq!(RdfTerm::from(&tagged), RdfTerm::lang_literal("hallo", "de"));

        let typed = Literal::new_typed_literal(
            "3.5",
            NamedNode::new("http://www.w3.org/2001/XMLSchema#decimal").unwrap(),
        );
        assert_eq!(
            RdfTerm::from(&typed),
            RdfTerm::typed_literal("3.5", "http://www.w3.org/2001/XMLSchema#decimal")
        );
    }

    #[test]
    fn literal_that_looks_numeric_is_not_retyped() {
        let plain = Literal::new_simple_literal("123");
        match RdfTerm::from(&plain) {
            RdfTerm::Literal { datatype, .. } => {
                assert_eq!(datatype.as_deref(), Some(crate::types::XSD_STRING));
            }
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn rendered_turtle_parses_back_to_same_triples() {
        let originals: Vec<RdfTriple> = sample_triples().iter().map(RdfTriple::from).collect();
        let turtle = render_turtle(&originals);

        assert_eq!(turtle.lines().count(), originals.len());
        assert!(!turtle.contains("@prefix"));

        let reparsed = parse_turtle(&turtle);
        let expected: HashSet<RdfTriple> = originals.into_iter().collect();
        assert_eq!(reparsed, expected);
    }

    #[test]
    fn renders_statement_shape() {
        let triple = RdfTriple::new(
            RdfTerm::blank_node("b1"),
            RdfTerm::iri("http://example.org/p"),
            RdfTerm::lang_literal("hi", "en"),
        );
        assert_eq!(
            render_turtle([&triple]),
            "_:b1 <http://example.org/p> \"hi\"@en ."
        );
    }

    #[test]
    fn empty_graph_renders_empty_text() {
        assert_eq!(render_turtle(&Vec::<RdfTriple>::new()), "");
    }

    #[test]
    fn parses_ntriples_body() {
        let body = b"<http://example.org/s> <http://example.org/p> \"v\"@en .\n\
                     _:x <http://example.org/p> <http://example.org/o> .\n";
        let triples = parse_ntriples(body).unwrap();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].object, RdfTerm::lang_literal("v", "en"));
        assert_eq!(triples[1].subject, RdfTerm::blank_node("x"));
    }

    #[test]
    fn malformed_ntriples_is_a_parse_error() {
        let error = parse_ntriples(b"<http://example.org/s> oops .\n").unwrap_err();
        assert!(matches!(error, BackendError::ParseError { .. }));
    }
}

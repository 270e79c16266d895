use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    error::{BackendError, Result},
    types::{Binding, RdfTerm, SelectResult},
};

/// Either result form of `application/sparql-results+json`. A boolean body
/// answers ASK, a `results` body answers SELECT.
#[derive(Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    head: SparqlHead,
    results: Option<SparqlSelectResults>,
    boolean: Option<bool>,
}

#[derive(Deserialize, Default)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct SparqlSelectResults {
    bindings: Vec<HashMap<String, RdfTerm>>,
}

fn parse_response(json: &[u8], form: &str) -> Result<SparqlResponse> {
    serde_json::from_slice(json).map_err(|e| BackendError::ParseError {
        reason: format!("Failed to parse {form} response: {e}"),
    })
}

/// Decodes `application/sparql-results+json` SELECT output.
///
/// Rows are re-ordered along `head.vars`, so keys the server lists in a
/// different order still come out in projection order. A boolean body means
/// the text was not a SELECT query.
pub(crate) fn parse_select_json(json: &[u8]) -> Result<SelectResult> {
    let response = parse_response(json, "SELECT")?;

    let results = match (response.results, response.boolean) {
        (Some(results), _) => results,
        (None, Some(_)) => {
            return Err(BackendError::QuerySyntax {
                reason: "Expected a SELECT query".to_string(),
            });
        }
        (None, None) => {
            return Err(BackendError::ParseError {
                reason: "SELECT response carries neither results nor boolean".to_string(),
            });
        }
    };

    let variables = response.head.vars;
    let bindings = results
        .bindings
        .into_iter()
        .map(|row| order_row(&variables, row))
        .collect();

    Ok(SelectResult {
        variables,
        bindings,
    })
}

/// Decodes an ASK answer. A `results` body means the text was not an ASK query.
pub(crate) fn parse_ask_json(json: &[u8]) -> Result<bool> {
    let response = parse_response(json, "ASK")?;

    match (response.boolean, response.results) {
        (Some(boolean), _) => Ok(boolean),
        (None, Some(_)) => Err(BackendError::QuerySyntax {
            reason: "Expected an ASK query".to_string(),
        }),
        (None, None) => Err(BackendError::ParseError {
            reason: "ASK response carries neither boolean nor results".to_string(),
        }),
    }
}

fn order_row(variables: &[String], mut row: HashMap<String, RdfTerm>) -> Binding {
    variables
        .iter()
        .filter_map(|variable| row.remove(variable).map(|term| (variable.clone(), term)))
        .collect()
}

/// Reads an aggregate count from the first row; an empty result counts as zero.
pub(crate) fn count_value(result: &SelectResult, variable: &str) -> Result<u64> {
    let Some(term) = result.values(variable).next() else {
        return Ok(0);
    };
    term.value()
        .trim()
        .parse()
        .map_err(|e| BackendError::ParseError {
            reason: format!("Count '{}' is not a non-negative integer: {e}", term.value()),
        })
}

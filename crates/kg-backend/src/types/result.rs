use serde::{Serialize, Serializer, ser::SerializeMap};

use super::RdfTerm;

/// One solution row.
///
/// Entries follow the query's projection order. Variables left unbound in
/// this row are absent rather than mapped to a null marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    entries: Vec<(String, RdfTerm)>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, variable: impl Into<String>, term: RdfTerm) {
        self.entries.push((variable.into(), term));
    }

    pub fn get(&self, variable: &str) -> Option<&RdfTerm> {
        self.entries
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, term)| term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RdfTerm)> {
        self.entries.iter().map(|(name, term)| (name.as_str(), term))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, RdfTerm)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, RdfTerm)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Binding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, term) in &self.entries {
            map.serialize_entry(name, term)?;
        }
        map.end()
    }
}

/// Payload of a SELECT query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectResult {
    /// Projected variables in SELECT clause order.
    pub variables: Vec<String>,
    pub bindings: Vec<Binding>,
}

impl SelectResult {
    /// Values bound to `variable` across all rows, skipping rows where it is unbound.
    pub fn values<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a RdfTerm> + 'a {
        self.bindings
            .iter()
            .filter_map(move |binding| binding.get(variable))
    }
}

/// Payload of a CONSTRUCT or DESCRIBE query: one Turtle statement per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstructResult {
    #[serde(rename = "triples")]
    pub turtle: String,
}

/// Payload of an ASK query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AskResult {
    pub boolean: bool,
}

/// Query result tagged by query form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResult {
    Select(SelectResult),
    Construct(ConstructResult),
    Ask(AskResult),
}

impl From<SelectResult> for QueryResult {
    fn from(result: SelectResult) -> Self {
        QueryResult::Select(result)
    }
}

impl From<ConstructResult> for QueryResult {
    fn from(result: ConstructResult) -> Self {
        QueryResult::Construct(result)
    }
}

impl From<AskResult> for QueryResult {
    fn from(result: AskResult) -> Self {
        QueryResult::Ask(result)
    }
}

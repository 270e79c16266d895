//! Portable model shared by every backend.
//!
//! Engine-native terms and results never cross the [`crate::Backend`]
//! boundary; adapters convert into these types first.

mod repository;
mod result;
mod term;

pub use repository::{NamespaceBinding, RepositoryInfo, StatisticsSnapshot};
pub use result::{AskResult, Binding, ConstructResult, QueryResult, SelectResult};
pub use term::{RdfTerm, RdfTriple, XSD_STRING};

//! Ontology knowledge base and type resolver.
//!
//! The knowledge base is an immutable [`OntologyGraph`] snapshot loaded once
//! (bundled or from a Turtle file) and shared behind an `Arc`. Reloading
//! builds a complete new snapshot and swaps the pointer, so readers see
//! either the old ontology or the new one, never a mix.
//!
//! Lookups go through an [`OntologyView`], which layers the extra triples of
//! one parameter (its synthesized class) over a snapshot without touching it.

mod resolve;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::OntologyError;
use crate::rdf::turtle;
use crate::rdf::{AnnotationGraph, Term};

pub use resolve::{BaseDatatype, OntologyView, TypeInfo};

/// Result type for ontology operations.
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;

const BUNDLED_TTL: &str = include_str!("../../data/ontology.ttl");

/// Subject-indexed, read-only triple store.
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    name: String,
    by_subject: HashMap<String, Vec<(String, Term)>>,
    triple_count: usize,
}

impl OntologyGraph {
    /// An ontology with no triples.
    pub fn empty() -> Self {
        Self {
            name: "empty".into(),
            ..Default::default()
        }
    }

    /// The ontology bundled with the crate.
    pub fn bundled() -> OntologyResult<Self> {
        Self::from_turtle("bundled", BUNDLED_TTL)
    }

    /// Load an ontology from a Turtle file.
    pub fn load(path: &Path) -> OntologyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OntologyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_turtle(path.display().to_string(), &content)
    }

    /// Parse a Turtle document. Statements involving blank nodes are dropped.
    pub fn from_turtle(name: impl Into<String>, document: &str) -> OntologyResult<Self> {
        let name = name.into();
        let (graph, skipped) =
            turtle::parse_named(document).map_err(|source| OntologyError::Parse {
                name: name.clone(),
                source,
            })?;
        if skipped > 0 {
            tracing::debug!(ontology = %name, skipped, "dropped blank-node statements");
        }
        Ok(Self::from_graph(name, &graph))
    }

    /// Index an already parsed graph.
    pub fn from_graph(name: impl Into<String>, graph: &AnnotationGraph) -> Self {
        let mut by_subject: HashMap<String, Vec<(String, Term)>> = HashMap::new();
        for t in graph {
            by_subject
                .entry(t.subject.clone())
                .or_default()
                .push((t.predicate.clone(), t.object.clone()));
        }
        let ontology = Self {
            name: name.into(),
            by_subject,
            triple_count: graph.len(),
        };
        tracing::debug!(
            ontology = %ontology.name,
            triples = ontology.triple_count,
            subjects = ontology.by_subject.len(),
            "indexed ontology"
        );
        ontology
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.triple_count
    }

    pub fn is_empty(&self) -> bool {
        self.triple_count == 0
    }

    /// Whether `iri` is described by at least one statement.
    pub fn has_subject(&self, iri: &str) -> bool {
        self.by_subject.contains_key(iri)
    }

    /// Objects of (`subject`, `predicate`).
    pub fn objects<'a>(
        &'a self,
        subject: &'a str,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .filter(move |(p, _)| p == predicate)
            .map(|(_, o)| o)
    }

    /// All described subjects, sorted.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = self.by_subject.keys().map(String::as_str).collect();
        subjects.sort_unstable();
        subjects
    }
}

/// Shared knowledge base holding the current ontology snapshot.
pub struct KnowledgeBase {
    current: RwLock<Arc<OntologyGraph>>,
}

impl KnowledgeBase {
    pub fn new(ontology: OntologyGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(ontology)),
        }
    }

    /// Knowledge base over the bundled ontology.
    pub fn bundled() -> OntologyResult<Self> {
        OntologyGraph::bundled().map(Self::new)
    }

    /// The current snapshot. Holding it keeps that version alive across
    /// later swaps.
    pub fn snapshot(&self) -> Arc<OntologyGraph> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the snapshot atomically, returning the previous one.
    pub fn swap(&self, ontology: OntologyGraph) -> Arc<OntologyGraph> {
        let next = Arc::new(ontology);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            from = %guard.name(),
            to = %next.name(),
            triples = next.len(),
            "swapping ontology snapshot"
        );
        std::mem::replace(&mut *guard, next)
    }

    /// Load a Turtle file and swap it in. On error the current snapshot is
    /// left untouched.
    pub fn reload(&self, path: &Path) -> OntologyResult<Arc<OntologyGraph>> {
        let ontology = OntologyGraph::load(path)?;
        Ok(self.swap(ontology))
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("KnowledgeBase")
            .field("ontology", &snapshot.name())
            .field("triples", &snapshot.len())
            .finish()
    }
}

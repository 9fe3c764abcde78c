//! Owned RDF model used by the annotation and ontology layers.
//!
//! Turtle text is parsed with `oxigraph` ([`turtle::parse`]) and converted
//! into these small, ordered types so that graphs can be compared, sorted and
//! serialized deterministically ([`turtle::serialize`]).

pub mod turtle;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::namespace::{XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};

/// A literal value with its datatype IRI and optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, XSD_STRING)
    }

    /// A literal with an explicit datatype.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Numeric value for `xsd:integer`/`decimal`/`double`/`float` style literals.
    pub fn as_f64(&self) -> Option<f64> {
        if !self.is_numeric() {
            return None;
        }
        self.value.trim().parse().ok()
    }

    /// Integer value when the literal is an integer type.
    pub fn as_i64(&self) -> Option<i64> {
        let integral = self.datatype == XSD_INTEGER
            || self.datatype.ends_with("#int")
            || self.datatype.ends_with("#long");
        if !integral {
            return None;
        }
        self.value.trim().parse().ok()
    }

    /// Whether the datatype is one of the XSD numeric types.
    pub fn is_numeric(&self) -> bool {
        const NUMERIC: [&str; 6] = ["integer", "decimal", "double", "float", "int", "long"];
        self.datatype
            .strip_prefix(crate::namespace::XSD_NS)
            .is_some_and(|local| NUMERIC.contains(&local))
    }

    /// Whether this literal can be written in Turtle's bare form.
    pub(crate) fn is_bare(&self) -> bool {
        let v = self.value.as_str();
        match self.datatype.as_str() {
            XSD_INTEGER => {
                let digits = v.strip_prefix(['+', '-']).unwrap_or(v);
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
            }
            XSD_DECIMAL => {
                let body = v.strip_prefix(['+', '-']).unwrap_or(v);
                match body.split_once('.') {
                    Some((int, frac)) => {
                        int.chars().all(|c| c.is_ascii_digit())
                            && !frac.is_empty()
                            && frac.chars().all(|c| c.is_ascii_digit())
                    }
                    None => false,
                }
            }
            XSD_DOUBLE => {
                v.contains(['e', 'E'])
                    && v.parse::<f64>().is_ok_and(f64::is_finite)
                    && v.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c))
            }
            XSD_BOOLEAN => v == "true" || v == "false",
            _ => false,
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::typed(v.to_string(), XSD_INTEGER)
    }
}

/// An RDF term in subject or object position.
///
/// Blank nodes are deliberately absent: annotations containing them cannot
/// be given stable names and are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            Term::Iri(_) => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Literal(lit) => match &lit.language {
                Some(lang) => write!(f, "\"{}\"@{lang}", lit.value),
                None => write!(f, "\"{}\"^^<{}>", lit.value, lit.datatype),
            },
        }
    }
}

/// A (subject, predicate, object) statement. Subjects are always IRIs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

/// A small ordered triple set, typically the annotation of one parameter.
///
/// Backed by a `BTreeSet` so iteration order, and therefore serialization,
/// depends only on content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationGraph {
    triples: BTreeSet<Triple>,
}

impl AnnotationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All (predicate, object) pairs of `subject`, in order.
    pub fn predicate_objects<'a>(
        &'a self,
        subject: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Term)> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.subject == subject)
            .map(|t| (t.predicate.as_str(), &t.object))
    }

    /// All objects for (`subject`, `predicate`).
    pub fn objects<'a>(
        &'a self,
        subject: &'a str,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Remove every triple of `subject`, returning them.
    pub fn take_subject(&mut self, subject: &str) -> Vec<Triple> {
        let taken: Vec<Triple> = self
            .triples
            .iter()
            .filter(|t| t.subject == subject)
            .cloned()
            .collect();
        for t in &taken {
            self.triples.remove(t);
        }
        taken
    }

    /// Distinct subjects, in order.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = self.triples.iter().map(|t| t.subject.as_str()).collect();
        subjects.dedup();
        subjects
    }
}

impl FromIterator<Triple> for AnnotationGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AnnotationGraph {
    type Item = Triple;
    type IntoIter = std::collections::btree_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a AnnotationGraph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_iteration_is_content_ordered() {
        let a = Triple::new("http://x/s", "http://x/p2", Term::iri("http://x/o"));
        let b = Triple::new("http://x/s", "http://x/p1", Term::iri("http://x/o"));
        let g1: AnnotationGraph = [a.clone(), b.clone()].into_iter().collect();
        let g2: AnnotationGraph = [b, a].into_iter().collect();
        assert_eq!(g1, g2);
        assert_eq!(g1.iter().next().map(|t| t.predicate.as_str()), Some("http://x/p1"));
    }

    #[test]
    fn take_subject_removes_only_that_subject() {
        let mut g = AnnotationGraph::new();
        g.insert(Triple::new("http://x/s", "http://x/p", Term::iri("http://x/o")));
        g.insert(Triple::new("http://x/t", "http://x/p", Term::iri("http://x/o")));
        let taken = g.take_subject("http://x/s");
        assert_eq!(taken.len(), 1);
        assert_eq!(g.len(), 1);
        assert_eq!(g.subjects(), vec!["http://x/t"]);
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(Literal::from(30).as_f64(), Some(30.0));
        assert_eq!(Literal::typed("2.5", XSD_DECIMAL).as_f64(), Some(2.5));
        assert_eq!(Literal::string("5").as_f64(), None);
        assert_eq!(Literal::from(-3).as_i64(), Some(-3));
    }

    #[test]
    fn bare_literal_forms() {
        assert!(Literal::from(3).is_bare());
        assert!(Literal::typed("2.5", XSD_DECIMAL).is_bare());
        assert!(Literal::typed("1e3", XSD_DOUBLE).is_bare());
        assert!(!Literal::typed("NaN", XSD_DOUBLE).is_bare());
        assert!(!Literal::string("x").is_bare());
    }
}

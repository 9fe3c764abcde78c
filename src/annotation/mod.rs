//! Semantic comments: Turtle annotations written next to notebook parameters.
//!
//! A parameter line such as
//!
//! ```text
//! e_min = 20.0  # oda:energyMin; oda:limits 3, 30
//! ```
//!
//! carries a free-text comment that is tried as Turtle about a fresh
//! parameter subject, first as a class list (`<s> a <comment> .`) and then as
//! a predicate-object list (`<s> <comment> .`). Comments that parse are
//! reduced ([`reduce`]) to one ontology type; comments that don't are plain
//! prose and are ignored.

pub mod reduce;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnnotationError;
use crate::namespace::{Namespaces, RDF_TYPE};
use crate::rdf::turtle;
use crate::rdf::AnnotationGraph;

pub use reduce::reduce;

/// Result type for annotation operations.
pub type AnnotationResult<T> = std::result::Result<T, AnnotationError>;

/// Bare `http(s)://` IRIs. String literals and already bracketed IRIs are
/// matched first so that they are left untouched.
static RE_IRI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|<[^>]*>|https?://[^\s<>;,"]+"#).unwrap()
});

/// The ontology type and residual triples derived from one comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticAnnotation {
    /// Canonical ontology type of the parameter.
    pub owl_type: Option<String>,
    /// Turtle describing a synthesized `owl_type`, if any.
    pub extra_ttl: Option<String>,
}

impl SemanticAnnotation {
    /// An annotation carrying nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.owl_type.is_none() && self.extra_ttl.is_none()
    }
}

/// Parse a parameter's semantic comment.
///
/// Non-inline comments (annotation lines standing on their own) describe the
/// notebook, not a parameter, and yield an empty annotation here; see
/// [`parse_notebook_annotation`]. A comment that is not Turtle under either
/// reading also yields an empty annotation. A comment that parses but
/// asserts nothing about the parameter is an error.
pub fn parse_semantic_comment(
    comment: &str,
    inline: bool,
    ns: &Namespaces,
) -> AnnotationResult<SemanticAnnotation> {
    if !inline {
        return Ok(SemanticAnnotation::none());
    }

    let subject = fresh_subject(ns);
    match parse_comment_graph(comment, &subject, ns) {
        Ok(graph) => reduce(graph, &subject, ns),
        Err(e) => {
            tracing::debug!(comment, error = %e, "comment carries no semantic annotation");
            Ok(SemanticAnnotation::none())
        }
    }
}

/// Parse a stand-alone annotation line about `subject` (typically the
/// notebook itself). The triples are returned as written, without
/// canonicalization. `None` if the line is not Turtle.
pub fn parse_notebook_annotation(
    line: &str,
    subject: &str,
    ns: &Namespaces,
) -> Option<AnnotationGraph> {
    match parse_comment_graph(line, subject, ns) {
        Ok(graph) if !graph.is_empty() => Some(graph),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(line, error = %e, "notebook annotation line is not Turtle");
            None
        }
    }
}

/// Parse `comment` about `subject` under both readings.
pub fn parse_comment_graph(
    comment: &str,
    subject: &str,
    ns: &Namespaces,
) -> AnnotationResult<AnnotationGraph> {
    let body = bracket_bare_iris(comment.trim().trim_end_matches('.'));
    let as_types = format!("<{subject}> a {body} .");
    let as_properties = format!("<{subject}> {body} .");

    // A class list only counts if every class is an IRI; `# 42` is prose.
    turtle::parse_with_prefixes(&as_types, ns)
        .ok()
        .filter(|graph| graph.objects(subject, RDF_TYPE).all(|o| o.as_iri().is_some()))
        .map_or_else(|| turtle::parse_with_prefixes(&as_properties, ns), Ok)
        .map_err(|source| AnnotationError::ParseFailure {
            comment: comment.to_string(),
            source,
        })
}

/// Wrap every bare absolute IRI in angle brackets. A trailing `.` is kept
/// outside the brackets as a statement terminator.
pub fn bracket_bare_iris(text: &str) -> String {
    RE_IRI
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let m = &caps[0];
            if m.starts_with('<') || m.starts_with('"') {
                return m.to_string();
            }
            let iri = m.trim_end_matches('.');
            let dots = &m[iri.len()..];
            format!("<{iri}>{dots}")
        })
        .into_owned()
}

/// A fresh, opaque parameter subject under the ontology namespace.
fn fresh_subject(ns: &Namespaces) -> String {
    ns.oda(&format!("param_{:032x}", rand::random::<u128>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::RDFS_SUBCLASS_OF;
    use crate::rdf::Term;

    const ODA: &str = "http://odahub.io/ontology#";

    #[test]
    fn bare_iris_are_bracketed() {
        assert_eq!(
            bracket_bare_iris("http://odahub.io/ontology#Float"),
            "<http://odahub.io/ontology#Float>"
        );
        assert_eq!(
            bracket_bare_iris("<http://x.org/a> ; oda:unit http://x.org/keV."),
            "<http://x.org/a> ; oda:unit <http://x.org/keV>."
        );
    }

    #[test]
    fn single_type_comment() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("oda:Float", true, &ns).unwrap();
        assert_eq!(a.owl_type.as_deref(), Some("http://odahub.io/ontology#Float"));
        assert_eq!(a.extra_ttl, None);
    }

    #[test]
    fn bare_iri_comment() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("http://odahub.io/ontology#Integer", true, &ns).unwrap();
        assert_eq!(a.owl_type.as_deref(), Some("http://odahub.io/ontology#Integer"));
    }

    #[test]
    fn energy_limits_example() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("oda:energyMin; oda:limits 3, 30", true, &ns).unwrap();
        assert_eq!(
            a.owl_type.as_deref(),
            Some("http://odahub.io/ontology#30integer_3integer_energyMin_lower_limit_upper_limit")
        );
        let extra = a.extra_ttl.unwrap();
        assert!(extra.contains("lower_limit 3"));
        assert!(extra.contains("upper_limit 30"));
        assert!(extra.contains("subClassOf oda:energyMin"));
    }

    #[test]
    fn property_list_reading_is_tried_second() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("oda:unit unit:keV", true, &ns).unwrap();
        assert_eq!(a.owl_type.as_deref(), Some("http://odahub.io/ontology#unit_unitkeV"));
        assert!(a.extra_ttl.unwrap().contains("oda:unit unit:keV"));
    }

    #[test]
    fn prose_comment_is_ignored() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("minimal energy in keV", true, &ns).unwrap();
        assert!(a.is_none());
    }

    #[test]
    fn literal_comment_is_prose() {
        let ns = Namespaces::default();
        for comment in ["42", "1", "2.5", "\"just a note\""] {
            let a = parse_semantic_comment(comment, true, &ns).unwrap();
            assert!(a.is_none(), "{comment} produced {a:?}");
        }
        let nb = format!("{ODA}ThisNotebook");
        assert!(parse_notebook_annotation("42", &nb, &ns).is_none());
    }

    #[test]
    fn iris_inside_literals_are_left_alone() {
        let comment = "oda:Float; rdfs:label \"see http://example.org/x\"";
        assert_eq!(bracket_bare_iris(comment), comment);
        assert_eq!(
            bracket_bare_iris("oda:unit http://x.org/keV; rdfs:label \"<b> http://y\""),
            "oda:unit <http://x.org/keV>; rdfs:label \"<b> http://y\""
        );

        let ns = Namespaces::default();
        let a = parse_semantic_comment(comment, true, &ns).unwrap();
        let owl_type = a.owl_type.unwrap();
        assert!(owl_type.starts_with(ODA));
        let graph = turtle::parse(&a.extra_ttl.unwrap()).unwrap();
        let supers: Vec<_> = graph.objects(&owl_type, RDFS_SUBCLASS_OF).collect();
        assert_eq!(supers, vec![&Term::iri(format!("{ODA}Float"))]);
    }

    #[test]
    fn non_inline_comment_is_ignored() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("oda:Float", false, &ns).unwrap();
        assert!(a.is_none());
    }

    #[test]
    fn parsing_is_deterministic() {
        let ns = Namespaces::default();
        let c = "oda:Float, oda:optional; oda:label \"Radius\"";
        let a = parse_semantic_comment(c, true, &ns).unwrap();
        let b = parse_semantic_comment(c, true, &ns).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn two_types_become_subclass_of_both() {
        let ns = Namespaces::default();
        let a = parse_semantic_comment("oda:Float, oda:optional", true, &ns).unwrap();
        let owl_type = a.owl_type.unwrap();
        assert_eq!(owl_type, format!("{ODA}Float_optional"));
        let graph = turtle::parse(&a.extra_ttl.unwrap()).unwrap();
        let supers: Vec<_> = graph.objects(&owl_type, RDFS_SUBCLASS_OF).collect();
        assert_eq!(
            supers,
            vec![&Term::iri(format!("{ODA}Float")), &Term::iri(format!("{ODA}optional"))]
        );
    }

    #[test]
    fn notebook_annotation_keeps_subject() {
        let ns = Namespaces::default();
        let nb = format!("{ODA}ThisNotebook");
        let g = parse_notebook_annotation("oda:WorkflowNotebook", &nb, &ns).unwrap();
        let types: Vec<_> = g.objects(&nb, RDF_TYPE).collect();
        assert_eq!(types, vec![&Term::iri(format!("{ODA}WorkflowNotebook"))]);
        assert!(parse_notebook_annotation("just some words", &nb, &ns).is_none());
    }
}

//! Type/limit graph reducer.
//!
//! Turns the triples parsed from one parameter comment into a single
//! ontology class:
//!
//! 1. several `oda:limits` values collapse into `oda:lower_limit` (minimum)
//!    and `oda:upper_limit` (maximum);
//! 2. a lone `rdf:type` assertion is used as-is;
//! 3. anything richer becomes a synthesized class named from its content,
//!    a subclass of every asserted type, carrying the remaining assertions.

use crate::error::AnnotationError;
use crate::namespace::{self, oda, Namespaces, RDFS_SUBCLASS_OF, RDF_TYPE};
use crate::rdf::turtle;
use crate::rdf::{AnnotationGraph, Term, Triple};

use super::{AnnotationResult, SemanticAnnotation};

/// Reduce `graph`, anchored at `subject`, to an owl type plus extra triples.
pub fn reduce(
    mut graph: AnnotationGraph,
    subject: &str,
    ns: &Namespaces,
) -> AnnotationResult<SemanticAnnotation> {
    infer_limits(&mut graph, subject, ns);

    let pairs: Vec<(String, Term)> = graph
        .predicate_objects(subject)
        .map(|(p, o)| (p.to_string(), o.clone()))
        .collect();

    let literal_type = pairs
        .iter()
        .any(|(predicate, object)| predicate == RDF_TYPE && object.as_iri().is_none());
    if literal_type {
        return Err(AnnotationError::UnsupportedShape {
            subject: subject.to_string(),
        });
    }

    let owl_type = match pairs.as_slice() {
        [] => {
            return Err(AnnotationError::UnsupportedShape {
                subject: subject.to_string(),
            });
        }
        [(predicate, Term::Iri(class))] if predicate == RDF_TYPE => {
            graph.take_subject(subject);
            class.clone()
        }
        _ => synthesize_root_class(&mut graph, subject, &pairs, ns)?,
    };

    let extra_ttl = Some(turtle::serialize(&graph, ns)).filter(|ttl| !ttl.is_empty());
    tracing::debug!(owl_type = %owl_type, extra = extra_ttl.is_some(), "reduced annotation");

    Ok(SemanticAnnotation {
        owl_type: Some(owl_type),
        extra_ttl,
    })
}

/// Replace two or more numeric `oda:limits` values of `subject` with one
/// lower and one upper limit. Returns `true` if the graph changed.
pub fn infer_limits(graph: &mut AnnotationGraph, subject: &str, ns: &Namespaces) -> bool {
    let limits_iri = ns.oda(oda::LIMITS);
    let limits: Vec<Term> = graph
        .objects(subject, &limits_iri)
        .filter(|o| o.as_literal().and_then(|l| l.as_f64()).is_some())
        .cloned()
        .collect();
    if limits.len() < 2 {
        return false;
    }

    let value = |t: &Term| t.as_literal().and_then(|l| l.as_f64()).unwrap_or(f64::NAN);
    let lower = limits
        .iter()
        .min_by(|a, b| value(a).total_cmp(&value(b)))
        .cloned();
    let upper = limits
        .iter()
        .max_by(|a, b| value(a).total_cmp(&value(b)))
        .cloned();

    for object in &limits {
        graph.remove(&Triple::new(subject, &limits_iri, object.clone()));
    }
    if let (Some(lower), Some(upper)) = (lower, upper) {
        graph.insert(Triple::new(subject, ns.oda(oda::LOWER_LIMIT), lower));
        graph.insert(Triple::new(subject, ns.oda(oda::UPPER_LIMIT), upper));
    }
    true
}

/// Move every assertion of `subject` onto a new, content-named class.
fn synthesize_root_class(
    graph: &mut AnnotationGraph,
    subject: &str,
    pairs: &[(String, Term)],
    ns: &Namespaces,
) -> AnnotationResult<String> {
    let predicates: Vec<Term> = pairs.iter().map(|(p, _)| Term::iri(p.as_str())).collect();
    let name = namespace::synthesize_name(
        predicates.iter().chain(pairs.iter().map(|(_, o)| o)),
        ns,
    );
    if name.is_empty() {
        return Err(AnnotationError::UnsupportedShape {
            subject: subject.to_string(),
        });
    }
    let root = ns.oda(&name);

    for triple in graph.take_subject(subject) {
        let predicate = if triple.predicate == RDF_TYPE {
            RDFS_SUBCLASS_OF.to_string()
        } else {
            triple.predicate
        };
        graph.insert(Triple::new(&root, predicate, triple.object));
    }

    // Other statements in the comment may point back at the parameter.
    let back_refs: Vec<Triple> = graph
        .iter()
        .filter(|t| t.object.as_iri() == Some(subject))
        .cloned()
        .collect();
    for triple in back_refs {
        graph.remove(&triple);
        graph.insert(Triple::new(triple.subject, triple.predicate, Term::iri(&root)));
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{XSD_DECIMAL, XSD_INTEGER};
    use crate::rdf::Literal;

    const ODA: &str = "http://odahub.io/ontology#";
    const SUBJECT: &str = "http://odahub.io/ontology#p0123";

    fn oda(local: &str) -> String {
        format!("{ODA}{local}")
    }

    #[test]
    fn limits_collapse_to_bounds_in_any_order() {
        let ns = Namespaces::default();
        for order in [[15, 1000], [1000, 15]] {
            let mut g = AnnotationGraph::new();
            for v in order {
                g.insert(Triple::new(SUBJECT, oda("limits"), Term::Literal(Literal::from(v))));
            }
            assert!(infer_limits(&mut g, SUBJECT, &ns));
            let lower: Vec<_> = g.objects(SUBJECT, &oda("lower_limit")).cloned().collect();
            let upper: Vec<_> = g.objects(SUBJECT, &oda("upper_limit")).cloned().collect();
            assert_eq!(lower, vec![Term::Literal(Literal::from(15))]);
            assert_eq!(upper, vec![Term::Literal(Literal::from(1000))]);
            assert_eq!(g.objects(SUBJECT, &oda("limits")).count(), 0);
        }
    }

    #[test]
    fn limits_compare_numerically_across_datatypes() {
        let ns = Namespaces::default();
        let mut g = AnnotationGraph::new();
        g.insert(Triple::new(SUBJECT, oda("limits"), Term::Literal(Literal::from(10))));
        g.insert(Triple::new(
            SUBJECT,
            oda("limits"),
            Term::Literal(Literal::typed("9.5", XSD_DECIMAL)),
        ));
        infer_limits(&mut g, SUBJECT, &ns);
        let lower: Vec<_> = g.objects(SUBJECT, &oda("lower_limit")).collect();
        assert_eq!(lower, vec![&Term::Literal(Literal::typed("9.5", XSD_DECIMAL))]);
    }

    #[test]
    fn single_limit_is_left_alone() {
        let ns = Namespaces::default();
        let mut g = AnnotationGraph::new();
        g.insert(Triple::new(SUBJECT, oda("limits"), Term::Literal(Literal::from(3))));
        assert!(!infer_limits(&mut g, SUBJECT, &ns));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn single_type_fast_path() {
        let ns = Namespaces::default();
        let g: AnnotationGraph = [Triple::new(SUBJECT, RDF_TYPE, Term::iri(oda("Float")))]
            .into_iter()
            .collect();
        let reduced = reduce(g, SUBJECT, &ns).unwrap();
        assert_eq!(reduced.owl_type.as_deref(), Some(oda("Float").as_str()));
        assert_eq!(reduced.extra_ttl, None);
    }

    #[test]
    fn literal_type_is_rejected() {
        let ns = Namespaces::default();
        let g: AnnotationGraph = [
            Triple::new(SUBJECT, RDF_TYPE, Term::Literal(Literal::from(42))),
            Triple::new(SUBJECT, oda("unit"), Term::iri(oda("keV"))),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            reduce(g, SUBJECT, &ns),
            Err(AnnotationError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn multiple_assertions_synthesize_root_class() {
        let ns = Namespaces::default();
        let g: AnnotationGraph = [
            Triple::new(SUBJECT, RDF_TYPE, Term::iri(oda("energyMin"))),
            Triple::new(SUBJECT, oda("limits"), Term::Literal(Literal::typed("3", XSD_INTEGER))),
            Triple::new(SUBJECT, oda("limits"), Term::Literal(Literal::typed("30", XSD_INTEGER))),
        ]
        .into_iter()
        .collect();

        let reduced = reduce(g, SUBJECT, &ns).unwrap();
        let root = oda("30integer_3integer_energyMin_lower_limit_upper_limit");
        assert_eq!(reduced.owl_type.as_deref(), Some(root.as_str()));

        let extra = reduced.extra_ttl.unwrap();
        assert!(extra.contains("rdfs:subClassOf oda:energyMin"));
        assert!(extra.contains("oda:lower_limit 3"));
        assert!(extra.contains("oda:upper_limit 30"));
        assert!(!extra.contains("p0123"));
    }

    #[test]
    fn single_non_type_assertion_is_synthesized() {
        let ns = Namespaces::default();
        let g: AnnotationGraph = [Triple::new(
            SUBJECT,
            oda("unit"),
            Term::iri("http://odahub.io/ontology/unit#keV"),
        )]
        .into_iter()
        .collect();
        let reduced = reduce(g, SUBJECT, &ns).unwrap();
        assert_eq!(reduced.owl_type.as_deref(), Some(oda("unit_unitkeV").as_str()));
    }

    #[test]
    fn empty_annotation_is_unsupported() {
        let ns = Namespaces::default();
        let err = reduce(AnnotationGraph::new(), SUBJECT, &ns).unwrap_err();
        assert!(matches!(err, AnnotationError::UnsupportedShape { .. }));
    }
}

//! Turtle input and output.
//!
//! Parsing delegates to oxigraph's Turtle parser; output is written by hand
//! so that the text depends only on graph content: subjects and predicates
//! are sorted, and `@prefix` lines are emitted only for namespaces the body
//! actually uses.

use std::collections::BTreeSet;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedOrBlankNode, Term as OxTerm};

use crate::error::RdfError;
use crate::namespace::{Namespaces, RDF_TYPE, XSD_STRING};

use super::{AnnotationGraph, Literal, Term, Triple};

/// Result type for Turtle operations.
pub type RdfResult<T> = std::result::Result<T, RdfError>;

/// Parse a Turtle document into an [`AnnotationGraph`].
///
/// Fails on syntax errors and on any blank node, since blank nodes have no
/// stable identity across parses.
pub fn parse(document: &str) -> RdfResult<AnnotationGraph> {
    parse_inner(document, false).map(|(graph, _)| graph)
}

/// Parse a Turtle document, dropping statements that involve blank nodes.
///
/// Returns the graph and the number of dropped statements. Used for whole
/// ontologies, where OWL restrictions are written with blank nodes that the
/// resolver has no use for.
pub fn parse_named(document: &str) -> RdfResult<(AnnotationGraph, usize)> {
    parse_inner(document, true)
}

fn parse_inner(document: &str, skip_blank: bool) -> RdfResult<(AnnotationGraph, usize)> {
    let mut graph = AnnotationGraph::new();
    let mut skipped = 0;
    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(document.as_bytes()) {
        let quad = quad.map_err(|e| RdfError::Syntax {
            message: e.to_string(),
        })?;

        let subject = match quad.subject {
            NamedOrBlankNode::NamedNode(node) => Some(node.into_string()),
            #[allow(unreachable_patterns)]
            _ => None,
        };

        let object = match quad.object {
            OxTerm::NamedNode(node) => Some(Term::Iri(node.into_string())),
            OxTerm::Literal(lit) => Some(Term::Literal(Literal {
                value: lit.value().to_string(),
                datatype: lit.datatype().as_str().to_string(),
                language: lit.language().map(str::to_string),
            })),
            _ => None,
        };

        match (subject, object) {
            (Some(subject), Some(object)) => {
                graph.insert(Triple::new(subject, quad.predicate.into_string(), object));
            }
            _ if skip_blank => skipped += 1,
            _ => return Err(RdfError::BlankNode),
        }
    }
    Ok((graph, skipped))
}

/// Parse a Turtle fragment after prepending the `@prefix` header of `ns`.
pub fn parse_with_prefixes(fragment: &str, ns: &Namespaces) -> RdfResult<AnnotationGraph> {
    parse(&format!("{}{fragment}", ns.turtle_header()))
}

/// Serialize a graph as Turtle. An empty graph yields an empty string.
pub fn serialize(graph: &AnnotationGraph, ns: &Namespaces) -> String {
    if graph.is_empty() {
        return String::new();
    }

    let mut used = BTreeSet::new();
    let mut body = String::new();

    for subject in graph.subjects() {
        body.push_str(&write_iri(subject, ns, &mut used));
        let pairs: Vec<(&str, &Term)> = graph.predicate_objects(subject).collect();
        for (i, (predicate, object)) in pairs.iter().enumerate() {
            body.push_str(if i == 0 { " " } else { " ;\n    " });
            if *predicate == RDF_TYPE {
                body.push('a');
            } else {
                body.push_str(&write_iri(predicate, ns, &mut used));
            }
            body.push(' ');
            body.push_str(&write_term(object, ns, &mut used));
        }
        body.push_str(" .\n");
    }

    let mut out = String::new();
    for (prefix, namespace) in ns.entries().collect::<BTreeSet<_>>() {
        if used.contains(prefix) {
            out.push_str(&format!("@prefix {prefix}: <{namespace}> .\n"));
        }
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&body);
    out
}

fn write_iri(iri: &str, ns: &Namespaces, used: &mut BTreeSet<String>) -> String {
    let compact = ns.compact(iri);
    if let Some((prefix, _)) = compact.split_once(':') {
        if !compact.starts_with('<') {
            used.insert(prefix.to_string());
        }
    }
    compact
}

fn write_term(term: &Term, ns: &Namespaces, used: &mut BTreeSet<String>) -> String {
    match term {
        Term::Iri(iri) => write_iri(iri, ns, used),
        Term::Literal(lit) if lit.is_bare() => lit.value.clone(),
        Term::Literal(lit) => {
            let quoted = turtle_string(&lit.value);
            match &lit.language {
                Some(lang) => format!("{quoted}@{lang}"),
                None if lit.datatype == XSD_STRING => quoted,
                None => format!("{quoted}^^{}", write_iri(&lit.datatype, ns, used)),
            }
        }
    }
}

fn turtle_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{RDFS_SUBCLASS_OF, XSD_INTEGER};

    const ODA: &str = "http://odahub.io/ontology#";

    #[test]
    fn parses_prefixed_fragment() {
        let ns = Namespaces::default();
        let g = parse_with_prefixes(
            "<http://odahub.io/ontology#p> a oda:Float ; oda:limits 3, 30 .",
            &ns,
        )
        .unwrap();
        assert_eq!(g.len(), 3);
        let s = format!("{ODA}p");
        let limits: Vec<_> = g.objects(&s, &format!("{ODA}limits")).collect();
        assert_eq!(limits.len(), 2);
        assert!(limits.contains(&&Term::Literal(Literal::typed("3", XSD_INTEGER))));
    }

    #[test]
    fn rejects_syntax_errors() {
        assert!(matches!(
            parse("<http://x/s> a energy in keV ."),
            Err(RdfError::Syntax { .. })
        ));
    }

    #[test]
    fn rejects_blank_nodes() {
        assert!(matches!(
            parse("<http://x/s> <http://x/p> [ <http://x/q> 1 ] ."),
            Err(RdfError::BlankNode)
        ));
    }

    #[test]
    fn serializes_with_used_prefixes_only() {
        let ns = Namespaces::default();
        let subject = format!("{ODA}Thing");
        let g: AnnotationGraph = [
            Triple::new(&subject, RDFS_SUBCLASS_OF, Term::iri(format!("{ODA}energyMin"))),
            Triple::new(&subject, format!("{ODA}lower_limit"), Term::Literal(Literal::from(3))),
            Triple::new(&subject, format!("{ODA}label"), Term::Literal(Literal::string("a \"b\""))),
        ]
        .into_iter()
        .collect();

        let ttl = serialize(&g, &ns);
        assert!(ttl.starts_with("@prefix oda: <http://odahub.io/ontology#> .\n"));
        assert!(ttl.contains("@prefix rdfs:"));
        assert!(!ttl.contains("@prefix xsd:"));
        assert!(!ttl.contains("@prefix unit:"));
        assert!(ttl.contains("oda:lower_limit 3"));
        assert!(ttl.contains("rdfs:subClassOf oda:energyMin"));
        assert!(ttl.contains(r#""a \"b\"""#));

        let reparsed = parse(&ttl).unwrap();
        assert_eq!(reparsed, g);
    }

    #[test]
    fn empty_graph_serializes_to_nothing() {
        assert_eq!(serialize(&AnnotationGraph::new(), &Namespaces::default()), "");
    }
}

//! Well-known RDF namespaces, CURIE handling, and canonical name tokens.
//!
//! Every place that turns an IRI into something shorter goes through this
//! module: the Turtle writer compacts IRIs with [`compact`], and the
//! annotation reducer builds synthetic class names from [`canonical_token`].

use crate::rdf::Term;

/// Default ontology namespace for parameter and data-product classes.
pub const ODA_NS: &str = "http://odahub.io/ontology#";
/// Unit vocabulary namespace.
pub const UNIT_NS: &str = "http://odahub.io/ontology/unit#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Local names of the ontology vocabulary the engine interprets.
pub mod oda {
    pub const LIMITS: &str = "limits";
    pub const LOWER_LIMIT: &str = "lower_limit";
    pub const UPPER_LIMIT: &str = "upper_limit";
    pub const OPTIONAL: &str = "optional";
    pub const BASE_DATATYPE: &str = "base_datatype";
    pub const ALLOWED_VALUE: &str = "allowed_value";
    pub const UNIT: &str = "unit";
    pub const DATA_PRODUCT: &str = "DataProduct";
}

/// A prefix table used for CURIE expansion and IRI compaction.
///
/// The ontology prefix is configurable, so the table is a value rather than
/// a static; [`Namespaces::new`] builds the standard set around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    ontology: String,
    /// (prefix, namespace IRI) pairs, most specific first.
    entries: Vec<(String, String)>,
}

impl Namespaces {
    /// Standard table with `oda:` bound to `ontology_prefix`.
    pub fn new(ontology_prefix: impl Into<String>) -> Self {
        let ontology = ontology_prefix.into();
        let mut entries = vec![
            ("unit".to_string(), UNIT_NS.to_string()),
            ("oda".to_string(), ontology.clone()),
            ("rdf".to_string(), RDF_NS.to_string()),
            ("rdfs".to_string(), RDFS_NS.to_string()),
            ("xsd".to_string(), XSD_NS.to_string()),
            ("owl".to_string(), OWL_NS.to_string()),
        ];
        // Longest namespace first so `unit:` wins over `oda:` when one is a
        // prefix of the other.
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
        Self { ontology, entries }
    }

    /// The ontology namespace (`oda:`).
    pub fn ontology(&self) -> &str {
        &self.ontology
    }

    /// Full IRI for a term in the ontology namespace.
    pub fn oda(&self, local: &str) -> String {
        format!("{}{local}", self.ontology)
    }

    /// All (prefix, namespace) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// `@prefix` header lines for every namespace in the table.
    pub fn turtle_header(&self) -> String {
        let mut prefixes: Vec<_> = self.entries().collect();
        prefixes.sort();
        prefixes
            .into_iter()
            .map(|(p, ns)| format!("@prefix {p}: <{ns}> .\n"))
            .collect()
    }

    /// Expand a CURIE (`oda:Float`) to an absolute IRI.
    ///
    /// Absolute IRIs pass through; angle brackets are stripped. Unknown
    /// prefixes are returned unchanged.
    pub fn expand(&self, curie_or_iri: &str) -> String {
        let s = curie_or_iri.trim();
        let s = s
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(s);
        if s.contains("://") {
            return s.to_string();
        }
        if let Some((prefix, local)) = s.split_once(':') {
            if let Some((_, ns)) = self.entries.iter().find(|(p, _)| p == prefix) {
                return format!("{ns}{local}");
            }
        }
        s.to_string()
    }

    /// Split an IRI into (prefix, local) if a known namespace matches.
    pub fn split<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        self.entries.iter().find_map(|(prefix, ns)| {
            iri.strip_prefix(ns.as_str())
                .map(|local| (prefix.as_str(), local))
        })
    }

    /// Compact form of an IRI: `prefix:local` when a namespace matches and the
    /// local part is a safe Turtle local name, `<iri>` otherwise.
    pub fn compact(&self, iri: &str) -> String {
        match self.split(iri) {
            Some((prefix, local)) if is_safe_local(local) => format!("{prefix}:{local}"),
            _ => format!("<{iri}>"),
        }
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::new(ODA_NS)
    }
}

fn is_safe_local(local: &str) -> bool {
    !local.is_empty()
        && !local.ends_with('-')
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Canonical name fragment for one RDF term.
///
/// The term is rendered in compact Turtle form, `rdf:type`, the `xsd:`
/// prefix and the ontology prefix are stripped, and every character outside
/// `[A-Za-z0-9_]` is removed. `rdf:type` therefore yields an empty token,
/// `oda:lower_limit` yields `lower_limit`, and the literal `30` (an
/// `xsd:integer`) yields `30integer`.
///
/// This is the only function that produces synthetic name tokens; changing
/// it changes every synthesized class URI.
pub fn canonical_token(term: &Term, ns: &Namespaces) -> String {
    let compact = match term {
        Term::Iri(iri) if iri == RDF_TYPE => String::new(),
        Term::Iri(iri) => strip_known(iri, ns),
        Term::Literal(lit) => {
            let mut out = lit.value.clone();
            if let Some(lang) = &lit.language {
                out.push('@');
                out.push_str(lang);
            } else if lit.datatype != XSD_STRING {
                out.push_str("^^");
                out.push_str(&strip_known(&lit.datatype, ns));
            }
            out
        }
    };
    compact
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn strip_known(iri: &str, ns: &Namespaces) -> String {
    if let Some(local) = iri.strip_prefix(XSD_NS) {
        return local.to_string();
    }
    if let Some(local) = iri.strip_prefix(ns.ontology()) {
        return local.to_string();
    }
    match ns.split(iri) {
        Some((prefix, local)) => format!("{prefix}:{local}"),
        None => iri.to_string(),
    }
}

/// Synthetic class name from a set of terms: canonical tokens, empties
/// dropped, sorted, joined with `_`.
pub fn synthesize_name<'a>(terms: impl IntoIterator<Item = &'a Term>, ns: &Namespaces) -> String {
    let mut tokens: Vec<String> = terms
        .into_iter()
        .map(|t| canonical_token(t, ns))
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort();
    tokens.join("_")
}

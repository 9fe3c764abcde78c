//! Type resolution over an ontology snapshot plus per-parameter overlay.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::namespace::{
    oda, Namespaces, RDFS_LABEL, RDFS_SUBCLASS_OF, RDF_JSON, XSD_BOOLEAN, XSD_NS,
};
use crate::rdf::{Literal, Term};
use crate::value::{ParamValue, PyType};

use super::OntologyGraph;

/// Primitive datatype a parameter class bottoms out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseDatatype {
    Boolean,
    Integer,
    Float,
    String,
    /// `rdf:JSON`: a list or a mapping.
    Structured,
}

impl BaseDatatype {
    /// Map an `xsd:` datatype or `rdf:JSON` to a base datatype.
    pub fn from_iri(iri: &str) -> Option<Self> {
        if iri == RDF_JSON {
            return Some(BaseDatatype::Structured);
        }
        let local = iri.strip_prefix(XSD_NS)?;
        match local {
            "boolean" => Some(BaseDatatype::Boolean),
            "integer" | "int" | "long" | "short" | "nonNegativeInteger"
            | "positiveInteger" | "negativeInteger" | "nonPositiveInteger" => {
                Some(BaseDatatype::Integer)
            }
            "float" | "double" | "decimal" => Some(BaseDatatype::Float),
            "string" | "anyURI" | "dateTime" | "date" | "time" => Some(BaseDatatype::String),
            _ => None,
        }
    }

    /// Python type for this datatype. Structured maps to `dict` unless the
    /// value says otherwise.
    pub fn py_type(self) -> PyType {
        match self {
            BaseDatatype::Boolean => PyType::Bool,
            BaseDatatype::Integer => PyType::Int,
            BaseDatatype::Float => PyType::Float,
            BaseDatatype::String => PyType::Str,
            BaseDatatype::Structured => PyType::Dict,
        }
    }
}

/// Everything the ontology says about one parameter class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeInfo {
    pub uri: String,
    pub base_datatype: Option<BaseDatatype>,
    pub label: Option<String>,
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
    pub is_optional: bool,
    pub allowed_values: Vec<ParamValue>,
    pub unit: Option<String>,
    pub known: bool,
}

impl TypeInfo {
    /// Info for a URI nothing is known about.
    pub fn unknown(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base_datatype: None,
            label: None,
            lower_limit: None,
            upper_limit: None,
            is_optional: false,
            allowed_values: Vec::new(),
            unit: None,
            known: false,
        }
    }

    pub fn has_limits(&self) -> bool {
        self.lower_limit.is_some() || self.upper_limit.is_some()
    }
}

/// Read-only view over a knowledge-base snapshot with an optional overlay.
///
/// Either layer may be absent: with no base the view answers from the
/// overlay alone, which is how an unavailable knowledge base degrades.
#[derive(Debug, Clone, Copy)]
pub struct OntologyView<'a> {
    base: Option<&'a OntologyGraph>,
    overlay: Option<&'a OntologyGraph>,
    ns: &'a Namespaces,
}

impl<'a> OntologyView<'a> {
    pub fn new(
        base: Option<&'a OntologyGraph>,
        overlay: Option<&'a OntologyGraph>,
        ns: &'a Namespaces,
    ) -> Self {
        Self { base, overlay, ns }
    }

    /// View over a snapshot alone.
    pub fn of(base: &'a OntologyGraph, ns: &'a Namespaces) -> Self {
        Self::new(Some(base), None, ns)
    }

    fn layers(&self) -> impl Iterator<Item = &'a OntologyGraph> {
        self.overlay.into_iter().chain(self.base)
    }

    fn objects<'s>(
        &'s self,
        subject: &'s str,
        predicate: &'s str,
    ) -> impl Iterator<Item = &'s Term> + 's {
        self.layers()
            .flat_map(move |layer| layer.objects(subject, predicate))
    }

    /// Whether any layer describes `uri`.
    pub fn is_known(&self, uri: &str) -> bool {
        self.layers().any(|layer| layer.has_subject(uri))
    }

    /// `uri` and its `rdfs:subClassOf` ancestors, breadth first, nearest
    /// first, each listed once.
    pub fn ancestors(&self, uri: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([uri.to_string()]);
        while let Some(class) = queue.pop_front() {
            if !seen.insert(class.clone()) {
                continue;
            }
            for parent in self.objects(&class, RDFS_SUBCLASS_OF) {
                if let Term::Iri(parent) = parent {
                    if !seen.contains(parent) {
                        queue.push_back(parent.clone());
                    }
                }
            }
            order.push(class);
        }
        order
    }

    /// Resolve `uri` (absolute IRI or CURIE). Nearest ancestor wins for each
    /// field; allowed values are collected from the nearest class that has any.
    pub fn lookup(&self, uri: &str) -> TypeInfo {
        let uri = self.ns.expand(uri);
        if !self.is_known(&uri) {
            return TypeInfo::unknown(uri);
        }

        let base_datatype_iri = self.ns.oda(oda::BASE_DATATYPE);
        let lower_iri = self.ns.oda(oda::LOWER_LIMIT);
        let upper_iri = self.ns.oda(oda::UPPER_LIMIT);
        let allowed_iri = self.ns.oda(oda::ALLOWED_VALUE);
        let unit_iri = self.ns.oda(oda::UNIT);
        let optional_iri = self.ns.oda(oda::OPTIONAL);

        let mut info = TypeInfo::unknown(uri.as_str());
        info.known = true;

        for class in self.ancestors(&uri) {
            if class == optional_iri {
                info.is_optional = true;
            }
            if info.base_datatype.is_none() {
                info.base_datatype = BaseDatatype::from_iri(&class).or_else(|| {
                    self.objects(&class, &base_datatype_iri)
                        .filter_map(Term::as_iri)
                        .find_map(BaseDatatype::from_iri)
                });
            }
            if info.label.is_none() {
                info.label = self
                    .objects(&class, RDFS_LABEL)
                    .filter_map(Term::as_literal)
                    .map(|l| l.value.clone())
                    .next();
            }
            if info.lower_limit.is_none() {
                info.lower_limit = self.numeric(&class, &lower_iri);
            }
            if info.upper_limit.is_none() {
                info.upper_limit = self.numeric(&class, &upper_iri);
            }
            if info.unit.is_none() {
                info.unit = self
                    .objects(&class, &unit_iri)
                    .filter_map(Term::as_iri)
                    .map(str::to_string)
                    .next();
            }
            if info.allowed_values.is_empty() {
                let mut allowed: Vec<ParamValue> = self
                    .objects(&class, &allowed_iri)
                    .filter_map(Term::as_literal)
                    .map(literal_value)
                    .collect();
                allowed.dedup();
                info.allowed_values = allowed;
            }
        }

        tracing::trace!(
            uri = %info.uri,
            base = ?info.base_datatype,
            optional = info.is_optional,
            "resolved type"
        );
        info
    }

    /// Whether `uri` is a data product class.
    pub fn is_data_product(&self, uri: &str) -> bool {
        let uri = self.ns.expand(uri);
        let data_product = self.ns.oda(oda::DATA_PRODUCT);
        self.ancestors(&uri).iter().any(|c| *c == data_product)
    }

    fn numeric(&self, class: &str, predicate: &str) -> Option<f64> {
        self.objects(class, predicate)
            .filter_map(Term::as_literal)
            .find_map(Literal::as_f64)
    }
}

fn literal_value(lit: &Literal) -> ParamValue {
    if let Some(i) = lit.as_i64() {
        return ParamValue::Int(i);
    }
    if let Some(f) = lit.as_f64() {
        return ParamValue::Float(f);
    }
    if lit.datatype == XSD_BOOLEAN {
        return ParamValue::Bool(lit.value == "true" || lit.value == "1");
    }
    ParamValue::Str(lit.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::turtle;

    fn bundled() -> OntologyGraph {
        OntologyGraph::bundled().unwrap()
    }

    #[test]
    fn datatype_mapping() {
        assert_eq!(
            BaseDatatype::from_iri("http://www.w3.org/2001/XMLSchema#double"),
            Some(BaseDatatype::Float)
        );
        assert_eq!(BaseDatatype::from_iri(RDF_JSON), Some(BaseDatatype::Structured));
        assert_eq!(BaseDatatype::from_iri("http://example.org/x"), None);
        assert_eq!(BaseDatatype::Structured.py_type(), PyType::Dict);
    }

    #[test]
    fn inherits_base_datatype_and_unit() {
        let onto = bundled();
        let ns = Namespaces::default();
        let info = OntologyView::of(&onto, &ns).lookup("oda:Energy_keV");
        assert!(info.known);
        assert_eq!(info.base_datatype, Some(BaseDatatype::Float));
        assert_eq!(info.unit.as_deref(), Some("http://odahub.io/ontology/unit#keV"));
        assert_eq!(info.label.as_deref(), Some("Energy in keV"));
        assert!(!info.is_optional);
    }

    #[test]
    fn nearest_limit_wins() {
        let onto = bundled();
        let ns = Namespaces::default();
        let view = OntologyView::of(&onto, &ns);
        let dec = view.lookup("oda:Declination");
        assert_eq!(dec.lower_limit, Some(-90.0));
        assert_eq!(dec.upper_limit, Some(90.0));
        let bins = view.lookup("oda:NumberOfBins");
        assert_eq!(bins.base_datatype, Some(BaseDatatype::Integer));
        assert_eq!(bins.lower_limit, Some(1.0));
        assert_eq!(bins.upper_limit, None);
    }

    #[test]
    fn allowed_values_are_collected() {
        let onto = bundled();
        let ns = Namespaces::default();
        let info = OntologyView::of(&onto, &ns).lookup("oda:Instrument");
        assert_eq!(info.allowed_values.len(), 3);
        assert!(info.allowed_values.contains(&ParamValue::Str("isgri".into())));
    }

    #[test]
    fn unknown_uri_is_empty() {
        let onto = bundled();
        let ns = Namespaces::default();
        let info = OntologyView::of(&onto, &ns).lookup("http://example.org/UnknownType");
        assert_eq!(info, TypeInfo::unknown("http://example.org/UnknownType"));
    }

    #[test]
    fn overlay_extends_snapshot_without_mutating_it() {
        let onto = bundled();
        let ns = Namespaces::default();
        let extra = turtle::parse_with_prefixes(
            "oda:MyEnergy rdfs:subClassOf oda:energyMin, oda:optional ; oda:lower_limit 3 ; oda:upper_limit 30 .",
            &ns,
        )
        .unwrap();
        let overlay = OntologyGraph::from_graph("extra", &extra);
        let view = OntologyView::new(Some(&onto), Some(&overlay), &ns);

        let info = view.lookup("oda:MyEnergy");
        assert!(info.known);
        assert!(info.is_optional);
        assert_eq!(info.base_datatype, Some(BaseDatatype::Float));
        assert_eq!(info.lower_limit, Some(3.0));
        assert_eq!(info.upper_limit, Some(30.0));

        assert!(!onto.has_subject("http://odahub.io/ontology#MyEnergy"));
    }

    #[test]
    fn overlay_alone_when_knowledge_base_is_unavailable() {
        let ns = Namespaces::default();
        let extra = turtle::parse_with_prefixes(
            "oda:Flag rdfs:subClassOf oda:optional ; oda:base_datatype xsd:boolean .",
            &ns,
        )
        .unwrap();
        let overlay = OntologyGraph::from_graph("extra", &extra);
        let view = OntologyView::new(None, Some(&overlay), &ns);
        let info = view.lookup("oda:Flag");
        assert_eq!(info.base_datatype, Some(BaseDatatype::Boolean));
        assert!(info.is_optional);
        assert!(!view.lookup("oda:Float").known);
    }

    #[test]
    fn cycles_terminate() {
        let ns = Namespaces::default();
        let g = turtle::parse_with_prefixes(
            "oda:A rdfs:subClassOf oda:B . oda:B rdfs:subClassOf oda:A ; oda:base_datatype xsd:string .",
            &ns,
        )
        .unwrap();
        let onto = OntologyGraph::from_graph("cyclic", &g);
        let view = OntologyView::of(&onto, &ns);
        assert_eq!(view.ancestors(&ns.oda("A")).len(), 2);
        assert_eq!(view.lookup("oda:A").base_datatype, Some(BaseDatatype::String));
    }

    #[test]
    fn data_products() {
        let onto = bundled();
        let ns = Namespaces::default();
        let view = OntologyView::of(&onto, &ns);
        assert!(view.is_data_product("oda:LightCurve"));
        assert!(!view.is_data_product("oda:Float"));
    }
}

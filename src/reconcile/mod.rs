//! Parameter type reconciliation.
//!
//! Three independent sources can say what type a parameter has: its default
//! value, its static type annotation, and its ontology class. Each yields at
//! most one [`TypeSignal`]; [`reconcile`] checks that they agree and produces
//! the single `(python type, optional)` decision the service layer uses.
//!
//! Everything that influences the decision is passed in explicitly through a
//! [`ReconcileContext`], so the function is pure.

mod grammar;

use std::fmt;

use serde::Serialize;

use crate::error::ReconcileError;
use crate::namespace::Namespaces;
use crate::ontology::{BaseDatatype, OntologyGraph, OntologyView, TypeInfo};
use crate::rdf::turtle;
use crate::value::{ParamValue, PyType};

pub use grammar::{parse_type_annotation, TypeAnnotation};

/// Result type for reconciliation.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// Where a type claim came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Value,
    Annotation,
    Ontology,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalSource::Value => "value",
            SignalSource::Annotation => "annotation",
            SignalSource::Ontology => "ontology",
        })
    }
}

/// A claimed type. Ontology classes based on `rdf:JSON` claim "some
/// structured value" rather than a specific container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimedType {
    Exact(PyType),
    Structured,
}

impl ClaimedType {
    fn from_datatype(dt: BaseDatatype) -> Self {
        match dt {
            BaseDatatype::Structured => ClaimedType::Structured,
            other => ClaimedType::Exact(other.py_type()),
        }
    }

    /// Whether a value of type `value` satisfies this claim. An int value is
    /// accepted where float is claimed.
    pub fn accepts_value(self, value: PyType) -> bool {
        match self {
            ClaimedType::Exact(t) => t == value || (t == PyType::Float && value == PyType::Int),
            ClaimedType::Structured => matches!(value, PyType::List | PyType::Dict),
        }
    }

    /// Common type of two declared claims. No widening between declarations.
    fn unify(self, other: ClaimedType) -> Option<ClaimedType> {
        match (self, other) {
            (ClaimedType::Exact(a), ClaimedType::Exact(b)) => (a == b).then_some(self),
            (ClaimedType::Structured, ClaimedType::Structured) => Some(self),
            (ClaimedType::Structured, ClaimedType::Exact(t))
            | (ClaimedType::Exact(t), ClaimedType::Structured) => {
                matches!(t, PyType::List | PyType::Dict).then_some(ClaimedType::Exact(t))
            }
        }
    }
}

impl fmt::Display for ClaimedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimedType::Exact(t) => write!(f, "{t}"),
            ClaimedType::Structured => f.write_str("list | dict"),
        }
    }
}

/// One source's claim about a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSignal {
    pub source: SignalSource,
    pub ty: ClaimedType,
    pub optional: bool,
}

/// The authoritative decision for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    pub py_type: PyType,
    pub optional: bool,
}

/// Inputs to reconciliation beyond the parameter itself.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// Knowledge-base snapshot; `None` when the knowledge base is unavailable.
    pub ontology: Option<&'a OntologyGraph>,
    pub namespaces: &'a Namespaces,
    /// Type for a `None` default nothing else describes.
    pub fallback: Option<PyType>,
}

impl<'a> ReconcileContext<'a> {
    pub fn new(ontology: Option<&'a OntologyGraph>, namespaces: &'a Namespaces) -> Self {
        Self {
            ontology,
            namespaces,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<PyType>) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Signal carried by the value itself; none for `None`.
pub fn value_signal(value: &ParamValue) -> Option<TypeSignal> {
    value.py_type().map(|ty| TypeSignal {
        source: SignalSource::Value,
        ty: ClaimedType::Exact(ty),
        optional: false,
    })
}

/// Signal carried by a static type annotation.
pub fn annotation_signal(annotation: Option<&str>) -> ReconcileResult<Option<TypeSignal>> {
    annotation
        .map(|a| {
            parse_type_annotation(a).map(|parsed| TypeSignal {
                source: SignalSource::Annotation,
                ty: ClaimedType::Exact(parsed.ty),
                optional: parsed.optional,
            })
        })
        .transpose()
}

/// Resolve `owl_type` in the context snapshot overlaid with `extra_ttl`.
///
/// Returns `None` without an owl type, and for URIs the view knows nothing
/// about (logged as a warning).
pub fn resolve_owl_type(
    ctx: &ReconcileContext<'_>,
    owl_type: Option<&str>,
    extra_ttl: Option<&str>,
) -> Option<TypeInfo> {
    let owl_type = owl_type?;
    let overlay = extra_ttl
        .filter(|ttl| !ttl.trim().is_empty())
        .and_then(|ttl| match turtle::parse_with_prefixes(ttl, ctx.namespaces) {
            Ok(graph) => Some(OntologyGraph::from_graph("extra", &graph)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparseable extra triples");
                None
            }
        });

    let view = OntologyView::new(ctx.ontology, overlay.as_ref(), ctx.namespaces);
    let info = view.lookup(owl_type);
    if !info.known {
        tracing::warn!(uri = %info.uri, "unknown datatype for given URI");
        return None;
    }
    Some(info)
}

/// Signal carried by resolved ontology info; none when the class has no
/// base datatype.
pub fn ontology_signal(info: &TypeInfo) -> Option<TypeSignal> {
    info.base_datatype.map(|dt| TypeSignal {
        source: SignalSource::Ontology,
        ty: ClaimedType::from_datatype(dt),
        optional: info.is_optional,
    })
}

/// Reconcile a parameter's value, type annotation and ontology type.
pub fn reconcile(
    ctx: &ReconcileContext<'_>,
    value: &ParamValue,
    type_annotation: Option<&str>,
    owl_type: Option<&str>,
    extra_ttl: Option<&str>,
) -> ReconcileResult<Reconciled> {
    reconcile_with_info(ctx, value, type_annotation, owl_type, extra_ttl).map(|(r, _)| r)
}

/// [`reconcile`], also returning the resolved ontology info.
pub fn reconcile_with_info(
    ctx: &ReconcileContext<'_>,
    value: &ParamValue,
    type_annotation: Option<&str>,
    owl_type: Option<&str>,
    extra_ttl: Option<&str>,
) -> ReconcileResult<(Reconciled, Option<TypeInfo>)> {
    let annotation = annotation_signal(type_annotation)?;
    let info = resolve_owl_type(ctx, owl_type, extra_ttl);
    let ontology = info.as_ref().and_then(ontology_signal);
    let ontology_optional = info.as_ref().is_some_and(|i| i.is_optional);

    let result = decide(
        ctx,
        value_signal(value),
        annotation,
        ontology,
        ontology_optional,
    );
    match &result {
        Ok(r) => {
            tracing::debug!(py_type = %r.py_type, optional = r.optional, "reconciled parameter");
        }
        Err(e) => tracing::debug!(error = %e, "reconciliation failed"),
    }
    result.map(|r| (r, info))
}

/// Core decision over already extracted signals.
///
/// `ontology_optional` covers ontology classes that mark a parameter
/// optional without giving it a datatype.
pub fn decide(
    ctx: &ReconcileContext<'_>,
    value: Option<TypeSignal>,
    annotation: Option<TypeSignal>,
    ontology: Option<TypeSignal>,
    ontology_optional: bool,
) -> ReconcileResult<Reconciled> {
    let declared: Vec<TypeSignal> = annotation.into_iter().chain(ontology).collect();
    let declared_optional =
        ontology_optional || declared.iter().any(|signal| signal.optional);

    let conflict = || ReconcileError::TypeConflict {
        summary: summarize(value.iter().chain(&declared)),
    };

    let mut unified: Option<ClaimedType> = None;
    for signal in &declared {
        unified = match unified {
            None => Some(signal.ty),
            Some(current) => Some(current.unify(signal.ty).ok_or_else(conflict)?),
        };
    }

    let Some(value) = value else {
        let Some(unified) = unified else {
            return match ctx.fallback {
                Some(py_type) => Ok(Reconciled {
                    py_type,
                    optional: true,
                }),
                None => Err(ReconcileError::Underspecified),
            };
        };
        if !declared_optional {
            return Err(ReconcileError::NullNotOptional {
                declared: summarize(&declared),
            });
        }
        return Ok(Reconciled {
            py_type: resolve_claim(unified, None),
            optional: true,
        });
    };

    let ClaimedType::Exact(value_type) = value.ty else {
        return Err(conflict());
    };
    if !declared.iter().all(|signal| signal.ty.accepts_value(value_type)) {
        return Err(conflict());
    }

    Ok(Reconciled {
        py_type: unified.map_or(value_type, |claim| resolve_claim(claim, Some(value_type))),
        optional: declared_optional,
    })
}

/// Concrete python type for a claim, using the value's container type for
/// structured claims.
fn resolve_claim(claim: ClaimedType, value: Option<PyType>) -> PyType {
    match (claim, value) {
        (ClaimedType::Exact(t), _) => t,
        (ClaimedType::Structured, Some(PyType::List)) => PyType::List,
        (ClaimedType::Structured, _) => PyType::Dict,
    }
}

fn summarize<'a>(signals: impl IntoIterator<Item = &'a TypeSignal>) -> String {
    signals
        .into_iter()
        .map(|s| format!("{} says {}", s.source, s.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

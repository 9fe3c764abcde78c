//! Rich diagnostic error types for the nbonto engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so notebook authors know which
//! declaration is at fault and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::interpret::InterpretError;
use crate::notebook::NotebookError;

/// Top-level error type for the engine.
#[derive(Debug, Error, Diagnostic)]
pub enum NbOntoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rdf(#[from] RdfError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Notebook(#[from] NotebookError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot reconcile parameter \"{name}\" (line {line})")]
    #[diagnostic(code(nbonto::parameter))]
    Parameter {
        name: String,
        line: usize,
        #[source]
        #[diagnostic_source]
        source: ReconcileError,
    },
}

// ---------------------------------------------------------------------------
// RDF errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RdfError {
    #[error("Turtle syntax error: {message}")]
    #[diagnostic(
        code(nbonto::rdf::syntax),
        help("Check the Turtle syntax. Prefixed names need a declared prefix (oda:, rdfs:, xsd:, owl:, unit:).")
    )]
    Syntax { message: String },

    #[error("blank nodes are not supported here")]
    #[diagnostic(
        code(nbonto::rdf::blank_node),
        help(
            "Blank nodes have no stable identity, so no canonical name can be derived from them. \
             Name the resource with an IRI instead."
        )
    )]
    BlankNode,
}

// ---------------------------------------------------------------------------
// Annotation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotationError {
    #[error("semantic comment is not valid Turtle: {comment}")]
    #[diagnostic(
        code(nbonto::annotation::parse_failure),
        help(
            "The comment was tried both as a class list (`a <comment>`) and as a \
             predicate-object list. Free-text comments are fine; they simply carry no \
             ontology annotation."
        )
    )]
    ParseFailure {
        comment: String,
        #[source]
        source: RdfError,
    },

    #[error("annotation of {subject} has no predicate-object assertions")]
    #[diagnostic(
        code(nbonto::annotation::unsupported_shape),
        help(
            "The annotation parsed but says nothing about the parameter. \
             Give at least one class (e.g. `oda:Float`) or property (e.g. `oda:unit unit:keV`)."
        )
    )]
    UnsupportedShape { subject: String },
}

// ---------------------------------------------------------------------------
// Ontology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("failed to read ontology: {path}")]
    #[diagnostic(
        code(nbonto::ontology::io),
        help("Ensure the ontology file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ontology \"{name}\"")]
    #[diagnostic(
        code(nbonto::ontology::parse),
        help("The ontology must be a Turtle document without blank nodes.")
    )]
    Parse {
        name: String,
        #[source]
        source: RdfError,
    },

    #[error("not an absolute IRI or known CURIE: \"{iri}\"")]
    #[diagnostic(
        code(nbonto::ontology::invalid_iri),
        help("Use an absolute IRI (http://...) or a CURIE with a known prefix, e.g. oda:Float.")
    )]
    InvalidIri { iri: String },
}

// ---------------------------------------------------------------------------
// Reconciliation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReconcileError {
    #[error("conflicting parameter types: {summary}")]
    #[diagnostic(
        code(nbonto::reconcile::type_conflict),
        help(
            "The default value, the type annotation and the ontology type must agree. \
             An int value is accepted where float is declared; bool and int never mix."
        )
    )]
    TypeConflict { summary: String },

    #[error("parameter has no default value, no type annotation and no ontology type")]
    #[diagnostic(
        code(nbonto::reconcile::underspecified),
        help("Add a type annotation such as `float | None`, or an ontology comment such as `# oda:Float, oda:optional`.")
    )]
    Underspecified,

    #[error("default is None but the declared type is not optional ({declared})")]
    #[diagnostic(
        code(nbonto::reconcile::null_not_optional),
        help("Declare the parameter optional, e.g. `Optional[float]`, `float | None`, or `oda:optional`.")
    )]
    NullNotOptional { declared: String },

    #[error("unrecognized type annotation: \"{annotation}\"")]
    #[diagnostic(
        code(nbonto::reconcile::unrecognized_annotation),
        help(
            "Supported annotations: bool, int, float, str, dict, list (optionally \
             parameterized, e.g. dict[str, list]), wrapped as `T | None`, `Optional[T]` \
             or `Union[T, None]`."
        )
    )]
    UnrecognizedAnnotation { annotation: String },
}

/// Convenience alias for functions returning engine results.
pub type NbOntoResult<T> = std::result::Result<T, NbOntoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdf_error_converts_to_top_level() {
        let err: NbOntoError = RdfError::BlankNode.into();
        assert!(matches!(err, NbOntoError::Rdf(RdfError::BlankNode)));
    }

    #[test]
    fn reconcile_error_converts_to_top_level() {
        let err: NbOntoError = ReconcileError::Underspecified.into();
        assert!(matches!(
            err,
            NbOntoError::Reconcile(ReconcileError::Underspecified)
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ReconcileError::UnrecognizedAnnotation {
            annotation: "complex".into(),
        };
        assert!(err.to_string().contains("complex"));

        let err = AnnotationError::UnsupportedShape {
            subject: "http://odahub.io/ontology#p".into(),
        };
        assert!(err.to_string().contains("ontology#p"));
    }
}

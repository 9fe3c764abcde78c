//! Engine facade: top-level API for nbonto.
//!
//! The `Engine` owns the ontology knowledge base and the configuration and
//! exposes the two core entry points, [`Engine::parse_comment`] and
//! [`Engine::reconcile`], plus notebook inspection and argument
//! interpretation built on them.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::annotation::{self, SemanticAnnotation};
use crate::error::{NbOntoError, NbOntoResult, OntologyError};
use crate::interpret::{self, ParameterContract};
use crate::namespace::Namespaces;
use crate::notebook::{self, ParameterDeclaration, ParametersCell};
use crate::ontology::{KnowledgeBase, OntologyGraph, OntologyView, TypeInfo};
use crate::reconcile::{self, ReconcileContext, Reconciled};
use crate::value::ParamValue;

pub use crate::config::EngineConfig;

/// The nbonto engine.
pub struct Engine {
    config: EngineConfig,
    namespaces: Namespaces,
    knowledge: KnowledgeBase,
}

/// Contracts for every parameter of a notebook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookContract {
    pub parameters: Vec<ParameterContract>,
    /// Turtle about the notebook itself, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_ttl: Option<String>,
}

impl Engine {
    /// Create an engine, loading the configured ontology (or the bundled one).
    pub fn new(config: EngineConfig) -> NbOntoResult<Self> {
        let ontology = match &config.ontology.source {
            Some(path) => OntologyGraph::load(path)?,
            None => OntologyGraph::bundled()?,
        };
        Ok(Self::with_ontology(config, ontology))
    }

    /// Create an engine over an already loaded ontology.
    pub fn with_ontology(config: EngineConfig, ontology: OntologyGraph) -> Self {
        tracing::info!(
            prefix = %config.ontology.prefix,
            ontology = %ontology.name(),
            triples = ontology.len(),
            enabled = config.ontology.enabled,
            "initializing nbonto engine"
        );
        Self {
            namespaces: config.namespaces(),
            knowledge: KnowledgeBase::new(ontology),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Current knowledge-base snapshot, or `None` when the knowledge base
    /// is disabled.
    pub fn snapshot(&self) -> Option<Arc<OntologyGraph>> {
        self.config
            .ontology
            .enabled
            .then(|| self.knowledge.snapshot())
    }

    /// Parse a parameter's semantic comment.
    pub fn parse_comment(&self, comment: &str, inline: bool) -> NbOntoResult<SemanticAnnotation> {
        Ok(annotation::parse_semantic_comment(
            comment,
            inline,
            &self.namespaces,
        )?)
    }

    /// Reconcile value, type annotation and ontology type of one parameter.
    pub fn reconcile(
        &self,
        value: &ParamValue,
        type_annotation: Option<&str>,
        owl_type: Option<&str>,
        extra_ttl: Option<&str>,
    ) -> NbOntoResult<Reconciled> {
        let snapshot = self.snapshot();
        let ctx = self.context(snapshot.as_deref());
        Ok(reconcile::reconcile(
            &ctx,
            value,
            type_annotation,
            owl_type,
            extra_ttl,
        )?)
    }

    /// Resolve an ontology class.
    pub fn lookup(&self, uri: &str) -> NbOntoResult<TypeInfo> {
        let iri = self.namespaces.expand(uri);
        if !iri.contains("://") && !iri.starts_with("urn:") {
            return Err(OntologyError::InvalidIri {
                iri: uri.to_string(),
            }
            .into());
        }
        let snapshot = self.snapshot();
        let info = OntologyView::new(snapshot.as_deref(), None, &self.namespaces).lookup(&iri);
        if !info.known {
            tracing::warn!(uri = %iri, "unknown datatype for given URI");
        }
        Ok(info)
    }

    /// Whether `uri` is a data product class.
    pub fn is_data_product(&self, uri: &str) -> bool {
        let snapshot = self.snapshot();
        OntologyView::new(snapshot.as_deref(), None, &self.namespaces).is_data_product(uri)
    }

    /// Parse a parameters cell with the configured namespaces and notebook URI.
    pub fn parse_notebook(&self, source: &str) -> NbOntoResult<ParametersCell> {
        Ok(notebook::parse_parameters_cell(
            source,
            &self.config.notebook_options(),
        )?)
    }

    /// Reconcile one declaration into a contract.
    pub fn contract(&self, decl: &ParameterDeclaration) -> NbOntoResult<ParameterContract> {
        let snapshot = self.snapshot();
        let ctx = self.context(snapshot.as_deref());
        let (reconciled, info) = reconcile::reconcile_with_info(
            &ctx,
            &decl.default,
            decl.annotation.as_deref(),
            decl.semantic.owl_type.as_deref(),
            decl.semantic.extra_ttl.as_deref(),
        )
        .map_err(|source| NbOntoError::Parameter {
            name: decl.name.clone(),
            line: decl.line,
            source,
        })?;
        Ok(ParameterContract::new(decl, reconciled, info))
    }

    /// Parse a parameters cell and reconcile every declaration.
    pub fn inspect_notebook(&self, source: &str) -> NbOntoResult<NotebookContract> {
        let cell = self.parse_notebook(source)?;
        let parameters = cell
            .parameters
            .iter()
            .map(|decl| self.contract(decl))
            .collect::<NbOntoResult<Vec<_>>>()?;
        let notebook_ttl =
            Some(cell.notebook.to_turtle(&self.namespaces)).filter(|ttl| !ttl.is_empty());
        tracing::info!(parameters = parameters.len(), "inspected notebook");
        Ok(NotebookContract {
            parameters,
            notebook_ttl,
        })
    }

    /// Interpret request arguments against a notebook's contracts.
    pub fn interpret(
        &self,
        contracts: &[ParameterContract],
        args: &[(String, ParamValue)],
    ) -> NbOntoResult<Vec<(String, ParamValue)>> {
        Ok(interpret::interpret_arguments(contracts, args)?)
    }

    /// Reload the ontology from `path` (or the configured source, or the
    /// bundled ontology) and swap it in atomically. Readers holding the old
    /// snapshot are unaffected.
    pub fn reload_ontology(&self, path: Option<&Path>) -> NbOntoResult<()> {
        let path = path.or(self.config.ontology.source.as_deref());
        let ontology = match path {
            Some(path) => OntologyGraph::load(path)?,
            None => OntologyGraph::bundled()?,
        };
        self.knowledge.swap(ontology);
        Ok(())
    }

    /// Engine statistics.
    pub fn info(&self) -> EngineInfo {
        let snapshot = self.knowledge.snapshot();
        EngineInfo {
            prefix: self.config.ontology.prefix.clone(),
            ontology: snapshot.name().to_string(),
            triple_count: snapshot.len(),
            class_count: snapshot.subjects().len(),
            enabled: self.config.ontology.enabled,
        }
    }

    fn context<'a>(&'a self, snapshot: Option<&'a OntologyGraph>) -> ReconcileContext<'a> {
        ReconcileContext::new(snapshot, &self.namespaces)
            .with_fallback(self.config.reconcile.fallback_type)
    }
}

/// Summary statistics about the engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub prefix: String,
    pub ontology: String,
    pub triple_count: usize,
    pub class_count: usize,
    pub enabled: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "nbonto engine info")?;
        writeln!(f, "  prefix:    {}", self.prefix)?;
        writeln!(f, "  ontology:  {}", self.ontology)?;
        writeln!(f, "  triples:   {}", self.triple_count)?;
        writeln!(f, "  subjects:  {}", self.class_count)?;
        writeln!(f, "  enabled:   {}", self.enabled)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("knowledge", &self.knowledge)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::value::PyType;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn reconcile_through_engine() {
        let e = engine();
        let r = e
            .reconcile(&ParamValue::Int(25), None, Some("oda:Float"), None)
            .unwrap();
        assert_eq!(r.py_type, PyType::Float);
        assert!(!r.optional);
    }

    #[test]
    fn disabled_knowledge_base() {
        let mut config = EngineConfig::default();
        config.ontology.enabled = false;
        let e = Engine::new(config).unwrap();
        assert!(e.snapshot().is_none());
        // Without the knowledge base oda:Float is unknown and the value decides.
        let r = e
            .reconcile(&ParamValue::Int(25), None, Some("oda:Float"), None)
            .unwrap();
        assert_eq!(r.py_type, PyType::Int);
    }

    #[test]
    fn fallback_type_from_config() {
        let mut config = EngineConfig::default();
        config.reconcile.fallback_type = Some(PyType::Str);
        let e = Engine::new(config).unwrap();
        let r = e.reconcile(&ParamValue::Null, None, None, None).unwrap();
        assert_eq!(r.py_type, PyType::Str);
        assert!(r.optional);
    }

    #[test]
    fn lookup_validates_iri() {
        let e = engine();
        assert!(e.lookup("oda:Energy").unwrap().known);
        assert!(!e.lookup("http://example.org/Nope").unwrap().known);
        assert!(e.is_data_product("oda:Spectrum"));
        assert!(!e.is_data_product("oda:Energy"));
        assert!(matches!(
            e.lookup("nope:thing"),
            Err(NbOntoError::Ontology(OntologyError::InvalidIri { .. }))
        ));
    }

    #[test]
    fn inspect_reports_the_failing_parameter() {
        let e = engine();
        let err = e.inspect_notebook("a = 1\nb: int = 5.0\n").unwrap_err();
        assert!(matches!(
            err,
            NbOntoError::Parameter {
                ref name,
                line: 2,
                source: ReconcileError::TypeConflict { .. },
            } if name == "b"
        ));
    }

    #[test]
    fn inspect_builds_contracts() {
        let e = engine();
        let cell = "# oda:WorkflowNotebook\ne_min = 20  # oda:energyMin; oda:limits 15, 1000\n";
        let contract = e.inspect_notebook(cell).unwrap();
        assert_eq!(contract.parameters.len(), 1);
        let p = &contract.parameters[0];
        assert_eq!(p.py_type, PyType::Float);
        let info = p.info.as_ref().unwrap();
        assert_eq!(info.lower_limit, Some(15.0));
        assert!(contract.notebook_ttl.unwrap().contains("oda:WorkflowNotebook"));
    }

    #[test]
    fn reload_swaps_ontology() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("small.ttl");
        std::fs::write(
            &path,
            "<http://odahub.io/ontology#Only> <http://odahub.io/ontology#base_datatype> <http://www.w3.org/2001/XMLSchema#string> .\n",
        )
        .unwrap();

        let e = engine();
        let before = e.snapshot().unwrap();
        e.reload_ontology(Some(&path)).unwrap();
        assert!(e.lookup("oda:Only").unwrap().known);
        assert!(!e.lookup("oda:Float").unwrap().known);
        assert!(before.has_subject("http://odahub.io/ontology#Float"));

        assert!(e.reload_ontology(Some(&dir.path().join("missing.ttl"))).is_err());
        assert!(e.lookup("oda:Only").unwrap().known);
    }
}

// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # nbonto
//!
//! Semantic typing of notebook workflow parameters. A parameter's default
//! value, its Python type annotation and an RDF class named in its trailing
//! comment are reconciled into a single type contract, checked against an
//! ontology knowledge base.
//!
//! ## Architecture
//!
//! - **RDF layer** (`rdf`): Triples, small ordered graphs, Turtle via `oxigraph`
//! - **Annotations** (`annotation`): Semantic comments reduced to one synthesized class
//! - **Ontology** (`ontology`): Knowledge base with snapshot swap and subclass resolution
//! - **Reconciliation** (`reconcile`): Value, annotation and ontology signals unified
//! - **Notebooks** (`notebook`): Parameters-cell parsing with Python literal defaults
//! - **Interpretation** (`interpret`): Request arguments coerced and range-checked
//!
//! ## Library usage
//!
//! ```no_run
//! use nbonto::engine::{Engine, EngineConfig};
//! use nbonto::value::ParamValue;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let annotation = engine.parse_comment("oda:energyMin; oda:limits 3, 30", true).unwrap();
//! let reconciled = engine
//!     .reconcile(
//!         &ParamValue::Int(20),
//!         None,
//!         annotation.owl_type.as_deref(),
//!         annotation.extra_ttl.as_deref(),
//!     )
//!     .unwrap();
//! println!("{} (optional: {})", reconciled.py_type, reconciled.optional);
//! ```

pub mod annotation;
pub mod config;
pub mod engine;
pub mod error;
pub mod interpret;
pub mod namespace;
pub mod notebook;
pub mod ontology;
pub mod rdf;
pub mod reconcile;
pub mod value;

//! Notebook parameter cells.
//!
//! A parameters cell is a block of plain assignments, one per parameter:
//!
//! ```text
//! # oda:WorkflowNotebook
//! src_name = "Crab"                    # oda:AstrophysicalObject
//! e_min: float = 20.0                  # oda:energyMin; oda:limits 15, 1000
//! nbins: int | None = None             # oda:NumberOfBins, oda:optional
//! ```
//!
//! Every assignment becomes a [`ParameterDeclaration`] with its default
//! value, static annotation and inline comment; the comment is parsed as a
//! semantic annotation right away. Comment-only lines that are Turtle are
//! statements about the notebook itself.

pub mod literal;

use std::collections::HashMap;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::annotation::{self, SemanticAnnotation};
use crate::namespace::Namespaces;
use crate::rdf::turtle;
use crate::rdf::AnnotationGraph;
use crate::value::ParamValue;

pub use literal::LiteralError;

/// Errors from parameter cell parsing.
#[derive(Debug, Error, Diagnostic)]
pub enum NotebookError {
    #[error("line {line} is not a parameter assignment: {text}")]
    #[diagnostic(
        code(nbonto::notebook::invalid_line),
        help(
            "A parameters cell may only contain `name = value` or `name: type = value` \
             lines, comments and blank lines."
        )
    )]
    InvalidLine { line: usize, text: String },

    #[error("invalid default for \"{name}\" on line {line}: {text}")]
    #[diagnostic(
        code(nbonto::notebook::invalid_default),
        help(
            "Defaults must be Python literals: None, True/False, numbers, strings, \
             lists, tuples or dicts. Expressions and names are not evaluated."
        )
    )]
    InvalidDefault {
        line: usize,
        name: String,
        text: String,
        #[source]
        source: LiteralError,
    },

    #[error("parameter \"{name}\" is assigned twice (lines {first_line} and {line})")]
    #[diagnostic(
        code(nbonto::notebook::duplicate_parameter),
        help("Each parameter must be declared exactly once in the parameters cell.")
    )]
    DuplicateParameter {
        name: String,
        first_line: usize,
        line: usize,
    },
}

pub type NotebookResult<T> = std::result::Result<T, NotebookError>;

/// `name` or `name: annotation`, then `=`.
static RE_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*([^=]*?))?\s*=(.*)$").unwrap()
});

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDeclaration {
    pub name: String,
    pub default: ParamValue,
    pub annotation: Option<String>,
    pub comment: Option<String>,
    /// Semantic annotation parsed from `comment`.
    pub semantic: SemanticAnnotation,
    /// 1-based line of the assignment.
    pub line: usize,
}

/// Statements about the notebook itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookAnnotations {
    pub subject: String,
    pub graph: AnnotationGraph,
}

impl NotebookAnnotations {
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn to_turtle(&self, ns: &Namespaces) -> String {
        turtle::serialize(&self.graph, ns)
    }
}

/// A parsed parameters cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametersCell {
    pub parameters: Vec<ParameterDeclaration>,
    pub notebook: NotebookAnnotations,
}

impl ParametersCell {
    pub fn get(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

/// Parsing options.
#[derive(Debug, Clone)]
pub struct NotebookOptions {
    pub namespaces: Namespaces,
    /// Subject of notebook-level annotations.
    pub notebook_uri: String,
}

impl NotebookOptions {
    pub fn new(namespaces: Namespaces, notebook_uri: impl Into<String>) -> Self {
        Self {
            namespaces,
            notebook_uri: notebook_uri.into(),
        }
    }
}

impl Default for NotebookOptions {
    fn default() -> Self {
        let namespaces = Namespaces::default();
        let notebook_uri = namespaces.oda("ThisNotebook");
        Self {
            namespaces,
            notebook_uri,
        }
    }
}

/// Parse the source of a parameters cell.
pub fn parse_parameters_cell(
    source: &str,
    options: &NotebookOptions,
) -> NotebookResult<ParametersCell> {
    let ns = &options.namespaces;
    let lines: Vec<&str> = source.lines().collect();
    let mut cell = ParametersCell {
        parameters: Vec::new(),
        notebook: NotebookAnnotations {
            subject: options.notebook_uri.clone(),
            graph: AnnotationGraph::new(),
        },
    };
    let mut seen: HashMap<String, usize> = HashMap::new();

    let mut idx = 0;
    while idx < lines.len() {
        let line_no = idx + 1;
        let line = lines[idx].trim();
        idx += 1;

        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim();
            if comment.is_empty() {
                continue;
            }
            if let Some(graph) =
                annotation::parse_notebook_annotation(comment, &options.notebook_uri, ns)
            {
                tracing::debug!(line = line_no, triples = graph.len(), "notebook annotation");
                for triple in graph {
                    cell.notebook.graph.insert(triple);
                }
            }
            continue;
        }

        let Some(caps) = RE_ASSIGNMENT.captures(line) else {
            return Err(NotebookError::InvalidLine {
                line: line_no,
                text: line.to_string(),
            });
        };
        let name = caps[1].to_string();
        let type_annotation = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|a| !a.is_empty());

        // Bracketed and triple-quoted values may continue on following lines.
        let mut text = caps[3].to_string();
        let parsed = loop {
            let attempt =
                literal::parse_prefix(&text).map(|(value, rest)| (value, rest.to_string()));
            match attempt {
                Err(LiteralError::UnexpectedEnd) if idx < lines.len() => {
                    text.push('\n');
                    text.push_str(lines[idx]);
                    idx += 1;
                }
                Err(source) => {
                    return Err(NotebookError::InvalidDefault {
                        line: line_no,
                        name,
                        text: text.trim().to_string(),
                        source,
                    });
                }
                Ok(parsed) => break parsed,
            }
        };
        let (default, rest) = parsed;

        let comment = match rest.trim() {
            "" => None,
            rest => match rest.strip_prefix('#') {
                Some(comment) => Some(comment.trim().to_string()).filter(|c| !c.is_empty()),
                None => {
                    return Err(NotebookError::InvalidDefault {
                        line: line_no,
                        name,
                        text: text.trim().to_string(),
                        source: LiteralError::Invalid {
                            column: text.len() - rest.len() + 1,
                            message: "unexpected trailing input".into(),
                        },
                    });
                }
            },
        };

        if let Some(&first_line) = seen.get(&name) {
            return Err(NotebookError::DuplicateParameter {
                name,
                first_line,
                line: line_no,
            });
        }
        seen.insert(name.clone(), line_no);

        let semantic = match &comment {
            Some(c) => annotation::parse_semantic_comment(c, true, ns).unwrap_or_else(|e| {
                tracing::warn!(parameter = %name, error = %e, "ignoring semantic comment");
                SemanticAnnotation::none()
            }),
            None => SemanticAnnotation::none(),
        };

        tracing::debug!(
            parameter = %name,
            line = line_no,
            owl_type = ?semantic.owl_type,
            "declared parameter"
        );
        cell.parameters.push(ParameterDeclaration {
            name,
            default,
            annotation: type_annotation,
            comment,
            semantic,
            line: line_no,
        });
    }

    Ok(cell)
}

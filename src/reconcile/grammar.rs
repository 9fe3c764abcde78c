//! Static type-annotation grammar.
//!
//! ```text
//! annotation := optional | base
//! optional   := base "|" "None" | "None" "|" base
//!             | "Optional[" annotation "]"
//!             | "Union[" annotation "," "None" "]" | "Union[" "None" "," annotation "]"
//! base       := "bool" | "int" | "float" | "str"
//!             | ("list" | "List" | "dict" | "Dict") ["[" ... "]"]
//! ```
//!
//! A `typing.` qualifier is accepted on the outermost name.

use crate::error::ReconcileError;
use crate::value::PyType;

use super::ReconcileResult;

/// A parsed annotation: the python type and whether `None` is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub ty: PyType,
    pub optional: bool,
}

/// Parse a type annotation string.
pub fn parse_type_annotation(annotation: &str) -> ReconcileResult<TypeAnnotation> {
    parse(annotation.trim()).ok_or_else(|| ReconcileError::UnrecognizedAnnotation {
        annotation: annotation.to_string(),
    })
}

fn parse(s: &str) -> Option<TypeAnnotation> {
    let s = s.trim();

    let alternatives = split_top_level(s, '|');
    if alternatives.len() == 2 {
        return optional_of(&alternatives);
    }
    if alternatives.len() > 2 {
        return None;
    }

    let s = s.strip_prefix("typing.").unwrap_or(s);
    if let Some(inner) = generic_args(s, "Optional") {
        let inner = parse(inner)?;
        return Some(TypeAnnotation {
            ty: inner.ty,
            optional: true,
        });
    }
    if let Some(inner) = generic_args(s, "Union") {
        return optional_of(&split_top_level(inner, ','));
    }

    base(s).map(|ty| TypeAnnotation {
        ty,
        optional: false,
    })
}

/// Two alternatives, exactly one of which is `None`.
fn optional_of(parts: &[&str]) -> Option<TypeAnnotation> {
    let [a, b] = parts else {
        return None;
    };
    let (a, b) = (a.trim(), b.trim());
    let other = match (a == "None", b == "None") {
        (true, false) => b,
        (false, true) => a,
        _ => return None,
    };
    let inner = parse(other)?;
    Some(TypeAnnotation {
        ty: inner.ty,
        optional: true,
    })
}

fn base(s: &str) -> Option<PyType> {
    match s.split_once('[') {
        Some((name, args)) => {
            args.strip_suffix(']')?;
            match name.trim() {
                "list" | "List" => Some(PyType::List),
                "dict" | "Dict" => Some(PyType::Dict),
                _ => None,
            }
        }
        None => match s {
            "bool" | "int" | "float" | "str" | "list" | "List" | "dict" | "Dict" => {
                PyType::from_name(s)
            }
            _ => None,
        },
    }
}

/// `Name[args]` → `args`.
fn generic_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('[')?
        .strip_suffix(']')
}

/// Split on `sep` outside square brackets.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

//! Request-time argument interpretation.
//!
//! Once a notebook's parameters are reconciled, each becomes a
//! [`ParameterContract`]. Arguments arriving with a request (usually as
//! strings) are coerced to the contract's type and checked against the
//! ontology's limits and allowed values before the notebook runs.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::notebook::ParameterDeclaration;
use crate::ontology::TypeInfo;
use crate::reconcile::Reconciled;
use crate::value::{ParamValue, PyType};

/// Errors from argument interpretation.
#[derive(Debug, Error, Diagnostic)]
pub enum InterpretError {
    #[error("parameter \"{name}\" requires a value")]
    #[diagnostic(
        code(nbonto::interpret::missing_value),
        help("The parameter is not optional; pass a value or declare it optional in the notebook.")
    )]
    MissingValue { name: String },

    #[error("cannot interpret {value} as {expected} for parameter \"{name}\"")]
    #[diagnostic(
        code(nbonto::interpret::coercion),
        help(
            "Strings are converted by the parameter type: numbers for int/float, \
             true/false/yes/no/1/0 for bool, JSON for list and dict."
        )
    )]
    Coercion {
        name: String,
        expected: PyType,
        value: String,
    },

    #[error("{value} is out of range for parameter \"{name}\" (allowed: {range})")]
    #[diagnostic(
        code(nbonto::interpret::out_of_range),
        help("The ontology type of this parameter declares lower/upper limits.")
    )]
    OutOfRange {
        name: String,
        value: f64,
        range: String,
    },

    #[error("{value} is not an allowed value for parameter \"{name}\" (allowed: {allowed})")]
    #[diagnostic(
        code(nbonto::interpret::not_allowed),
        help("The ontology type of this parameter enumerates its allowed values.")
    )]
    NotAllowed {
        name: String,
        value: String,
        allowed: String,
    },

    #[error("unknown parameter \"{name}\"")]
    #[diagnostic(
        code(nbonto::interpret::unknown_parameter),
        help("Only parameters declared in the notebook's parameters cell can be set.")
    )]
    UnknownParameter { name: String },
}

pub type InterpretResult<T> = std::result::Result<T, InterpretError>;

/// A declared parameter with its reconciled type and ontology info.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterContract {
    pub name: String,
    pub default: ParamValue,
    pub py_type: PyType,
    pub optional: bool,
    pub owl_type: Option<String>,
    pub extra_ttl: Option<String>,
    /// Resolved ontology info, when the owl type is known.
    pub info: Option<TypeInfo>,
}

impl ParameterContract {
    pub fn new(
        decl: &ParameterDeclaration,
        reconciled: Reconciled,
        info: Option<TypeInfo>,
    ) -> Self {
        Self {
            name: decl.name.clone(),
            default: decl.default.clone(),
            py_type: reconciled.py_type,
            optional: reconciled.optional,
            owl_type: decl.semantic.owl_type.clone(),
            extra_ttl: decl.semantic.extra_ttl.clone(),
            info,
        }
    }
}

/// Coerce and validate one raw argument against `contract`.
pub fn interpret_argument(
    contract: &ParameterContract,
    raw: &ParamValue,
) -> InterpretResult<ParamValue> {
    if raw.is_null() {
        return if contract.optional {
            Ok(ParamValue::Null)
        } else {
            Err(InterpretError::MissingValue {
                name: contract.name.clone(),
            })
        };
    }

    let value = coerce(raw, contract.py_type).ok_or_else(|| InterpretError::Coercion {
        name: contract.name.clone(),
        expected: contract.py_type,
        value: raw.to_string(),
    })?;

    if let Some(info) = &contract.info {
        if info.has_limits() {
            check_limits(&contract.name, &value, info)?;
        }
        check_allowed(&contract.name, &value, info)?;
    }
    Ok(value)
}

/// Interpret a set of named arguments. Parameters without an argument keep
/// their default.
pub fn interpret_arguments(
    contracts: &[ParameterContract],
    args: &[(String, ParamValue)],
) -> InterpretResult<Vec<(String, ParamValue)>> {
    if let Some((name, _)) = args
        .iter()
        .find(|(name, _)| !contracts.iter().any(|c| c.name == *name))
    {
        return Err(InterpretError::UnknownParameter { name: name.clone() });
    }

    contracts
        .iter()
        .map(|contract| {
            let raw = args
                .iter()
                .rev()
                .find(|(name, _)| *name == contract.name)
                .map(|(_, v)| v);
            let value = match raw {
                Some(raw) => interpret_argument(contract, raw)?,
                None => contract.default.clone(),
            };
            Ok((contract.name.clone(), value))
        })
        .collect()
}

fn coerce(raw: &ParamValue, target: PyType) -> Option<ParamValue> {
    match (target, raw) {
        (PyType::Bool, ParamValue::Bool(_))
        | (PyType::Int, ParamValue::Int(_))
        | (PyType::Float, ParamValue::Float(_))
        | (PyType::Str, ParamValue::Str(_))
        | (PyType::List, ParamValue::List(_))
        | (PyType::Dict, ParamValue::Mapping(_)) => Some(raw.clone()),

        (PyType::Float, ParamValue::Int(i)) => Some(ParamValue::Float(*i as f64)),

        (PyType::Bool, ParamValue::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(ParamValue::Bool(true)),
            "false" | "no" | "0" => Some(ParamValue::Bool(false)),
            _ => None,
        },
        (PyType::Int, ParamValue::Str(s)) => s.trim().parse().ok().map(ParamValue::Int),
        (PyType::Float, ParamValue::Str(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(ParamValue::Float),
        (PyType::List, ParamValue::Str(s)) => {
            match serde_json::from_str::<serde_json::Value>(s.trim()) {
                Ok(json @ serde_json::Value::Array(_)) => Some(ParamValue::from_json(json)),
                _ => None,
            }
        }
        (PyType::Dict, ParamValue::Str(s)) => {
            match serde_json::from_str::<serde_json::Value>(s.trim()) {
                Ok(json @ serde_json::Value::Object(_)) => Some(ParamValue::from_json(json)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn check_limits(name: &str, value: &ParamValue, info: &TypeInfo) -> InterpretResult<()> {
    let Some(v) = value.as_f64() else {
        return Ok(());
    };
    let below = info.lower_limit.is_some_and(|lo| v < lo);
    let above = info.upper_limit.is_some_and(|hi| v > hi);
    if below || above {
        let bound = |b: Option<f64>| b.map_or_else(|| "..".to_string(), |b| b.to_string());
        return Err(InterpretError::OutOfRange {
            name: name.to_string(),
            value: v,
            range: format!("{} to {}", bound(info.lower_limit), bound(info.upper_limit)),
        });
    }
    Ok(())
}

fn check_allowed(name: &str, value: &ParamValue, info: &TypeInfo) -> InterpretResult<()> {
    if info.allowed_values.is_empty() {
        return Ok(());
    }
    let matches = |allowed: &ParamValue| match (allowed.as_f64(), value.as_f64()) {
        (Some(a), Some(v)) => a == v,
        _ => allowed == value,
    };
    if info.allowed_values.iter().any(matches) {
        return Ok(());
    }
    Err(InterpretError::NotAllowed {
        name: name.to_string(),
        value: value.to_string(),
        allowed: info
            .allowed_values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(py_type: PyType, optional: bool) -> ParameterContract {
        ParameterContract {
            name: "p".into(),
            default: ParamValue::Null,
            py_type,
            optional,
            owl_type: None,
            extra_ttl: None,
            info: None,
        }
    }

    fn with_info(mut c: ParameterContract, f: impl FnOnce(&mut TypeInfo)) -> ParameterContract {
        let mut info = TypeInfo::unknown("http://odahub.io/ontology#P");
        info.known = true;
        f(&mut info);
        c.info = Some(info);
        c
    }

    fn s(v: &str) -> ParamValue {
        ParamValue::Str(v.into())
    }

    #[test]
    fn null_only_for_optional() {
        assert_eq!(
            interpret_argument(&contract(PyType::Float, true), &ParamValue::Null).unwrap(),
            ParamValue::Null
        );
        assert!(matches!(
            interpret_argument(&contract(PyType::Float, false), &ParamValue::Null),
            Err(InterpretError::MissingValue { .. })
        ));
    }

    #[test]
    fn string_coercion() {
        let c = contract(PyType::Int, false);
        assert_eq!(interpret_argument(&c, &s("5")).unwrap(), ParamValue::Int(5));
        assert!(interpret_argument(&c, &s("2.5")).is_err());

        let c = contract(PyType::Float, false);
        assert_eq!(interpret_argument(&c, &s("2.5")).unwrap(), ParamValue::Float(2.5));
        assert!(interpret_argument(&c, &s("inf")).is_err());

        let c = contract(PyType::Bool, false);
        for (raw, want) in [("true", true), ("No", false), ("1", true), ("0", false)] {
            assert_eq!(interpret_argument(&c, &s(raw)).unwrap(), ParamValue::Bool(want));
        }
        assert!(interpret_argument(&c, &s("maybe")).is_err());

        let c = contract(PyType::List, false);
        assert_eq!(
            interpret_argument(&c, &s("[1, 2]")).unwrap(),
            ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)])
        );
        assert!(interpret_argument(&c, &s("{}")).is_err());

        let c = contract(PyType::Dict, false);
        assert_eq!(
            interpret_argument(&c, &s(r#"{"a": 1}"#)).unwrap(),
            ParamValue::Mapping(vec![(s("a"), ParamValue::Int(1))])
        );
    }

    #[test]
    fn int_widens_but_bool_does_not() {
        let c = contract(PyType::Float, false);
        assert_eq!(interpret_argument(&c, &ParamValue::Int(3)).unwrap(), ParamValue::Float(3.0));
        let c = contract(PyType::Int, false);
        let err = interpret_argument(&c, &ParamValue::Bool(true)).unwrap_err();
        assert!(matches!(err, InterpretError::Coercion { expected: PyType::Int, .. }));
    }

    #[test]
    fn limits_are_enforced() {
        let c = with_info(contract(PyType::Float, false), |i| {
            i.lower_limit = Some(15.0);
            i.upper_limit = Some(1000.0);
        });
        assert_eq!(interpret_argument(&c, &s("15")).unwrap(), ParamValue::Float(15.0));
        assert!(matches!(
            interpret_argument(&c, &ParamValue::Float(10.0)),
            Err(InterpretError::OutOfRange { value, .. }) if value == 10.0
        ));
        assert!(interpret_argument(&c, &ParamValue::Int(1001)).is_err());

        let unbounded = with_info(contract(PyType::Float, false), |_| {});
        assert!(!unbounded.info.as_ref().unwrap().has_limits());
        assert_eq!(
            interpret_argument(&unbounded, &ParamValue::Float(-1e300)).unwrap(),
            ParamValue::Float(-1e300)
        );
    }

    #[test]
    fn allowed_values_are_enforced() {
        let c = with_info(contract(PyType::Str, false), |i| {
            i.allowed_values = vec![s("isgri"), s("jemx1")];
        });
        assert_eq!(interpret_argument(&c, &s("isgri")).unwrap(), s("isgri"));
        let err = interpret_argument(&c, &s("spi")).unwrap_err();
        assert!(err.to_string().contains("'isgri', 'jemx1'"));
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        let mut a = contract(PyType::Int, false);
        a.name = "a".into();
        a.default = ParamValue::Int(1);
        let mut b = contract(PyType::Str, true);
        b.name = "b".into();

        let out = interpret_arguments(&[a.clone(), b.clone()], &[("b".into(), s("x"))]).unwrap();
        assert_eq!(out, vec![("a".into(), ParamValue::Int(1)), ("b".into(), s("x"))]);

        let err = interpret_arguments(&[a, b], &[("c".into(), s("x"))]).unwrap_err();
        assert!(matches!(err, InterpretError::UnknownParameter { .. }));
    }
}

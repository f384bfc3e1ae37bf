//! Parameter validation.
//!
//! Each action declares its parameters as a static slice of [`ParameterSpec`].
//! [`validate`] checks an incoming argument map against that slice and
//! returns a map holding only declared parameters, with defaults filled in
//! and count-style limits clamped.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use serde_json::{Map, Number, Value};

use super::error::ValidationError;

/// Accepted JSON shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    String,
    Integer,
    Float,
    Boolean,
    /// A string restricted to the listed values.
    Enum(&'static [&'static str]),
    /// A list whose items all have the given kind.
    List(&'static ParamKind),
}

impl ParamKind {
    fn label(&self) -> String {
        match self {
            Self::String => "a string".to_string(),
            Self::Integer => "an integer".to_string(),
            Self::Float => "a number".to_string(),
            Self::Boolean => "a boolean".to_string(),
            Self::Enum(allowed) => format!("one of: {}", allowed.join(", ")),
            Self::List(item) => format!("a list of {}", item.label()),
        }
    }
}

/// Extra restriction applied after the type check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    None,
    /// Reject values outside `min..=max`.
    Range { min: f64, max: f64 },
    /// Narrow values outside `min..=max` to the nearest bound. Only meant for
    /// result-count style parameters.
    Clamp { min: i64, max: i64 },
    /// The string form must match `regex` (anchored by the caller).
    Pattern {
        regex: &'static str,
        description: &'static str,
    },
}

/// Default value for an optional parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.to_string()),
            Self::Int(i) => Value::from(i),
            Self::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            Self::Bool(b) => Value::Bool(b),
        }
    }
}

/// Static contract for one parameter of an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: ParamKind,
    pub default: Option<DefaultValue>,
    pub constraint: Constraint,
}

impl ParameterSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            required: true,
            kind,
            default: None,
            constraint: Constraint::None,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            required: false,
            kind,
            default: None,
            constraint: Constraint::None,
        }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.constraint = Constraint::Range { min, max };
        self
    }

    pub const fn clamp(mut self, min: i64, max: i64) -> Self {
        self.constraint = Constraint::Clamp { min, max };
        self
    }

    pub const fn pattern(mut self, regex: &'static str, description: &'static str) -> Self {
        self.constraint = Constraint::Pattern { regex, description };
        self
    }
}

/// Validate `parameters` against `specs`.
///
/// Absent, `null` and empty-string values all count as missing. Undeclared
/// parameters are dropped from the returned map.
pub fn validate(
    parameters: &Map<String, Value>,
    specs: &[ParameterSpec],
) -> Result<Map<String, Value>, ValidationError> {
    let mut resolved = Map::new();

    for spec in specs {
        let provided = parameters.get(spec.name).filter(|v| !is_blank(v));

        let value = match provided {
            Some(value) => check_value(spec, value)?,
            None if spec.required => return Err(ValidationError::missing(spec.name)),
            None => match spec.default {
                Some(default) => default.to_value(),
                None => continue,
            },
        };

        resolved.insert(spec.name.to_string(), value);
    }

    Ok(resolved)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_value(spec: &ParameterSpec, value: &Value) -> Result<Value, ValidationError> {
    let typed = check_kind(spec.name, &spec.kind, value)?;
    apply_constraint(spec, typed)
}

fn check_kind(name: &str, kind: &ParamKind, value: &Value) -> Result<Value, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        name: name.to_string(),
        expected: kind.label(),
        actual: json_type(value).to_string(),
    };

    match kind {
        ParamKind::String => value.as_str().map(|s| Value::from(s.trim())).ok_or_else(wrong_type),
        ParamKind::Integer => value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Value::from)
            .ok_or_else(wrong_type),
        ParamKind::Float => value
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(wrong_type),
        ParamKind::Boolean => value.as_bool().map(Value::Bool).ok_or_else(wrong_type),
        ParamKind::Enum(allowed) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            if allowed.contains(&s) {
                Ok(Value::from(s))
            } else {
                Err(ValidationError::NotAllowed {
                    name: name.to_string(),
                    value: s.to_string(),
                    allowed: allowed.join(", "),
                })
            }
        }
        ParamKind::List(item_kind) => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            items
                .iter()
                .map(|item| check_kind(name, item_kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn apply_constraint(spec: &ParameterSpec, value: Value) -> Result<Value, ValidationError> {
    match spec.constraint {
        Constraint::None => Ok(value),
        Constraint::Range { min, max } => {
            let Some(n) = value.as_f64() else {
                return Ok(value);
            };
            if n < min || n > max {
                return Err(ValidationError::OutOfRange {
                    name: spec.name.to_string(),
                    value: value.to_string(),
                    min: format_bound(min),
                    max: format_bound(max),
                });
            }
            Ok(value)
        }
        Constraint::Clamp { min, max } => match value.as_i64() {
            Some(n) => Ok(Value::from(n.clamp(min, max))),
            None => Ok(value),
        },
        Constraint::Pattern { regex, description } => {
            let Some(s) = value.as_str() else {
                return Ok(value);
            };
            let re = compiled(regex).map_err(|e| {
                ValidationError::invalid(spec.name, format!("bad validation pattern: {e}"))
            })?;
            if re.is_match(s) {
                Ok(value)
            } else {
                Err(ValidationError::PatternMismatch {
                    name: spec.name.to_string(),
                    value: s.to_string(),
                    format: description.to_string(),
                })
            }
        }
    }
}

/// Compiled pattern constraints, keyed by their source.
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> = LazyLock::new(Default::default);

fn compiled(pattern: &'static str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern, re.clone());
    Ok(re)
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STYLES: &[&str] = &["solid", "line"];

    const SPECS: &[ParameterSpec] = &[
        ParameterSpec::required("query", ParamKind::String),
        ParameterSpec::optional("num_results", ParamKind::Integer)
            .with_default(DefaultValue::Int(5))
            .clamp(1, 10),
        ParameterSpec::optional("safe_search", ParamKind::Enum(&["active", "off"]))
            .with_default(DefaultValue::Str("active")),
        ParameterSpec::optional("size", ParamKind::Integer).range(20.0, 1200.0),
        ParameterSpec::optional("styles", ParamKind::List(&ParamKind::Enum(STYLES))),
        ParameterSpec::optional("color", ParamKind::String)
            .pattern("^[0-9A-Fa-f]{6}$", "6-digit hex color"),
        ParameterSpec::optional("orb", ParamKind::Float).with_default(DefaultValue::Float(8.0)),
    ];

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_filled() {
        let resolved = validate(&args(json!({"query": "Orion"})), SPECS).unwrap();
        assert_eq!(resolved["query"], "Orion");
        assert_eq!(resolved["num_results"], 5);
        assert_eq!(resolved["safe_search"], "active");
        assert_eq!(resolved["orb"], 8.0);
        assert!(!resolved.contains_key("size"));
        assert!(!resolved.contains_key("color"));
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&args(json!({"num_results": 3})), SPECS).unwrap_err();
        assert_eq!(err, ValidationError::missing("query"));
        assert_eq!(err.to_string(), "Missing required parameter: query");
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let err = validate(&args(json!({"query": "   "})), SPECS).unwrap_err();
        assert_eq!(err.parameter(), "query");

        let err = validate(&args(json!({"query": null})), SPECS).unwrap_err();
        assert_eq!(err.parameter(), "query");
    }

    #[test]
    fn test_count_parameters_are_clamped() {
        let resolved = validate(&args(json!({"query": "q", "num_results": 37})), SPECS).unwrap();
        assert_eq!(resolved["num_results"], 10);

        let resolved = validate(&args(json!({"query": "q", "num_results": 0})), SPECS).unwrap();
        assert_eq!(resolved["num_results"], 1);
    }

    #[test]
    fn test_wrong_type_rejected_not_coerced() {
        let err = validate(&args(json!({"query": "q", "num_results": "5"})), SPECS).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { ref name, .. } if name == "num_results"));

        let err = validate(&args(json!({"query": "q", "num_results": 2.5})), SPECS).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { .. }));
    }

    #[test]
    fn test_whole_float_accepted_as_integer() {
        let resolved = validate(&args(json!({"query": "q", "num_results": 4.0})), SPECS).unwrap();
        assert_eq!(resolved["num_results"], 4);
    }

    #[test]
    fn test_enum_membership() {
        let err = validate(&args(json!({"query": "q", "safe_search": "medium"})), SPECS)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'safe_search': 'medium' is not one of: active, off"
        );
    }

    #[test]
    fn test_range_rejects() {
        let err = validate(&args(json!({"query": "q", "size": 5000})), SPECS).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert!(err.to_string().contains("20..=1200"));

        let ok = validate(&args(json!({"query": "q", "size": 200})), SPECS).unwrap();
        assert_eq!(ok["size"], 200);
    }

    #[test]
    fn test_list_items_checked() {
        let ok = validate(&args(json!({"query": "q", "styles": ["line"]})), SPECS).unwrap();
        assert_eq!(ok["styles"], json!(["line"]));

        let err = validate(&args(json!({"query": "q", "styles": ["line", "glyph"]})), SPECS)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref value, .. } if value == "glyph"));

        let err = validate(&args(json!({"query": "q", "styles": "line"})), SPECS).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { .. }));
    }

    #[test]
    fn test_pattern() {
        let ok = validate(&args(json!({"query": "q", "color": "FF8800"})), SPECS).unwrap();
        assert_eq!(ok["color"], "FF8800");

        let err = validate(&args(json!({"query": "q", "color": "orange"})), SPECS).unwrap_err();
        assert!(matches!(err, ValidationError::PatternMismatch { .. }));
    }

    #[test]
    fn test_patterns_compiled_once() {
        const ZIP: &str = "^[0-9]{5}$";
        let first = compiled(ZIP).unwrap();
        let second = compiled(ZIP).unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(PATTERNS.lock().unwrap().contains_key(ZIP));

        assert!(compiled("(unclosed").is_err());
        assert!(!PATTERNS.lock().unwrap().contains_key("(unclosed"));
    }

    #[test]
    fn test_undeclared_parameters_dropped() {
        let resolved = validate(&args(json!({"query": "q", "extra": true})), SPECS).unwrap();
        assert!(!resolved.contains_key("extra"));
    }
}

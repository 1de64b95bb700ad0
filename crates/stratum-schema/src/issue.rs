//! Issue records produced by validation.
//!
//! An [`Issue`] is data, not an error: every failing check appends one to the
//! shared sink of the current parse call and evaluation carries on. Issues
//! serialize flat, with the code-specific fields next to `code`, `path` and
//! `message`:
//!
//! ```json
//! { "code": "too_small", "minimum": 2, "inclusive": true, "type": "string",
//!   "path": ["username"], "message": "String must contain at least 2 character(s)" }
//! ```

use crate::validation_error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self {
        PathSegment::Key(k)
    }
}

/// Build an issue path from keys and indices: `issue_path!["a", 0, "b"]`.
#[macro_export]
macro_rules! issue_path {
    () => { ::std::vec::Vec::<$crate::PathSegment>::new() };
    ($($seg:expr),+ $(,)?) => {
        vec![$($crate::PathSegment::from($seg)),+]
    };
}

/// The observed kind of an input, or the kind a schema expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Float,
    Boolean,
    Null,
    Array,
    Object,
    Undefined,
}

impl ValueKind {
    /// Kind of an input; `None` is an absent value.
    pub fn of(data: Option<&Value>) -> Self {
        match data {
            None => ValueKind::Undefined,
            Some(Value::Null) => ValueKind::Null,
            Some(Value::Bool(_)) => ValueKind::Boolean,
            Some(Value::Number(_)) => ValueKind::Number,
            Some(Value::String(_)) => ValueKind::String,
            Some(Value::Array(_)) => ValueKind::Array,
            Some(Value::Object(_)) => ValueKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a size bound counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeKind {
    String,
    Number,
    Array,
}

/// A size bound; integers serialize without a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl From<usize> for Bound {
    fn from(n: usize) -> Self {
        Bound::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Bound {
    fn from(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < 9.0e15 {
            Bound::Int(n as i64)
        } else {
            Bound::Float(n)
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(n) => write!(f, "{n}"),
            Bound::Float(n) => write!(f, "{n}"),
        }
    }
}

/// Which string format check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringValidation {
    Email,
    Url,
    Regex,
    StartsWith(String),
    EndsWith(String),
}

/// Issue code with its code-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType {
        expected: ValueKind,
        received: ValueKind,
    },
    InvalidString {
        validation: StringValidation,
    },
    TooSmall {
        minimum: Bound,
        inclusive: bool,
        #[serde(rename = "type")]
        kind: SizeKind,
    },
    TooBig {
        maximum: Bound,
        inclusive: bool,
        #[serde(rename = "type")]
        kind: SizeKind,
    },
    Custom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
    },
    UnrecognizedKeys {
        keys: Vec<String>,
    },
    InvalidUnion {
        #[serde(rename = "unionErrors")]
        union_errors: Vec<ValidationError>,
    },
    Required,
}

impl IssueCode {
    /// The wire name of the code, e.g. `"too_small"`.
    pub fn name(&self) -> &'static str {
        match self {
            IssueCode::InvalidType { .. } => "invalid_type",
            IssueCode::InvalidString { .. } => "invalid_string",
            IssueCode::TooSmall { .. } => "too_small",
            IssueCode::TooBig { .. } => "too_big",
            IssueCode::Custom { .. } => "custom",
            IssueCode::UnrecognizedKeys { .. } => "unrecognized_keys",
            IssueCode::InvalidUnion { .. } => "invalid_union",
            IssueCode::Required => "required",
        }
    }
}

/// A recorded validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub code: IssueCode,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn code_name(&self) -> &'static str {
        self.code.name()
    }
}

/// An issue before its message is resolved.
///
/// Checks build these; refinements pass them to
/// [`RefinementCtx::add_issue`](crate::RefinementCtx::add_issue). `path` is
/// relative to the node raising the issue. When `message` is set it wins over
/// every error map.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueData {
    pub code: IssueCode,
    pub path: Vec<PathSegment>,
    pub message: Option<String>,
    pub fatal: bool,
}

impl IssueData {
    pub fn new(code: IssueCode) -> Self {
        Self {
            code,
            path: Vec::new(),
            message: None,
            fatal: false,
        }
    }

    /// A `custom` issue with an explicit message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(IssueCode::Custom { params: None }).with_message(message)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Abort the enclosing evaluation once recorded.
    #[must_use]
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

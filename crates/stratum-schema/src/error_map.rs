//! Issue message resolution.
//!
//! An issue's message comes from the first of these that applies:
//!
//! 1. the explicit message of the issue
//! 2. the contextual map passed to one parse call ([`ParseParams`](crate::ParseParams))
//! 3. the map bound to the schema node ([`Params`])
//! 4. the process-wide map installed with [`set_error_map`]
//! 5. the built-in English messages
//!
//! Maps are applied from the bottom up; each sees the message produced below
//! it as [`ErrorMapCtx::default_error`] and may return it unchanged.

use crate::error::SchemaError;
use crate::issue::{IssueCode, IssueData, SizeKind, StringValidation};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Maps an issue to its message.
pub type ErrorMap = Arc<dyn Fn(&IssueData, &ErrorMapCtx<'_>) -> String + Send + Sync>;

/// What an error map sees besides the issue itself.
#[derive(Debug, Clone, Copy)]
pub struct ErrorMapCtx<'a> {
    /// The message produced by the maps below this one.
    pub default_error: &'a str,
    /// The input at the issue's node; `None` when the input was absent.
    pub data: Option<&'a Value>,
}

static GLOBAL_ERROR_MAP: RwLock<Option<ErrorMap>> = RwLock::new(None);

/// Install the process-wide error map. Meant to be called once at startup.
pub fn set_error_map<F>(map: F)
where
    F: Fn(&IssueData, &ErrorMapCtx<'_>) -> String + Send + Sync + 'static,
{
    *GLOBAL_ERROR_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(map));
}

/// Remove the process-wide error map.
pub fn reset_error_map() {
    *GLOBAL_ERROR_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

pub(crate) fn global_error_map() -> Option<ErrorMap> {
    GLOBAL_ERROR_MAP
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The built-in English message for an issue.
pub fn default_message(issue: &IssueData) -> String {
    match &issue.code {
        IssueCode::InvalidType { expected, received } => {
            format!("Expected {expected}, received {received}")
        }
        IssueCode::InvalidString { validation } => match validation {
            StringValidation::StartsWith(prefix) => {
                format!("Invalid input: must start with \"{prefix}\"")
            }
            StringValidation::EndsWith(suffix) => {
                format!("Invalid input: must end with \"{suffix}\"")
            }
            StringValidation::Email => "Invalid email".to_owned(),
            StringValidation::Url => "Invalid url".to_owned(),
            StringValidation::Regex => "Invalid".to_owned(),
        },
        IssueCode::TooSmall {
            minimum,
            inclusive,
            kind,
        } => match kind {
            SizeKind::Array => format!(
                "Array must contain {} {minimum} element(s)",
                if *inclusive { "at least" } else { "more than" }
            ),
            SizeKind::String => format!(
                "String must contain {} {minimum} character(s)",
                if *inclusive { "at least" } else { "over" }
            ),
            SizeKind::Number => format!(
                "Number must be greater than {}{minimum}",
                if *inclusive { "or equal to " } else { "" }
            ),
        },
        IssueCode::TooBig {
            maximum,
            inclusive,
            kind,
        } => match kind {
            SizeKind::Array => format!(
                "Array must contain {} {maximum} element(s)",
                if *inclusive { "at most" } else { "less than" }
            ),
            SizeKind::String => format!(
                "String must contain {} {maximum} character(s)",
                if *inclusive { "at most" } else { "under" }
            ),
            SizeKind::Number => format!(
                "Number must be less than {}{maximum}",
                if *inclusive { "or equal to " } else { "" }
            ),
        },
        IssueCode::UnrecognizedKeys { keys } => {
            let quoted: Vec<String> = keys.iter().map(|k| format!("'{k}'")).collect();
            format!("Unrecognized key(s) in object: {}", quoted.join(", "))
        }
        IssueCode::Required => "Required".to_owned(),
        IssueCode::Custom { .. } | IssueCode::InvalidUnion { .. } => "Invalid input".to_owned(),
    }
}

/// Resolve the message of an issue through the map chain.
///
/// `maps` is ordered from the highest precedence down, matching the list in
/// the module docs; missing maps are skipped.
pub(crate) fn resolve_message(
    issue: &IssueData,
    data: Option<&Value>,
    maps: [Option<&ErrorMap>; 2],
) -> String {
    if let Some(message) = &issue.message {
        return message.clone();
    }

    let mut message = default_message(issue);
    if let Some(global) = global_error_map() {
        message = global(
            issue,
            &ErrorMapCtx {
                default_error: &message,
                data,
            },
        );
    }
    for map in maps.into_iter().rev().flatten() {
        message = map(
            issue,
            &ErrorMapCtx {
                default_error: &message,
                data,
            },
        );
    }
    message
}

// ============================================================================
// Schema construction parameters
// ============================================================================

/// Message options accepted when building a schema node.
///
/// `invalid_type_error` and `required_error` are shorthands for an error map
/// that rewrites `invalid_type` issues for present and absent input; they
/// cannot be combined with `error_map`.
#[derive(Clone, Default)]
pub struct Params {
    pub error_map: Option<ErrorMap>,
    pub invalid_type_error: Option<String>,
    pub required_error: Option<String>,
    pub description: Option<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn error_map<F>(mut self, map: F) -> Self
    where
        F: Fn(&IssueData, &ErrorMapCtx<'_>) -> String + Send + Sync + 'static,
    {
        self.error_map = Some(Arc::new(map));
        self
    }

    #[must_use]
    pub fn invalid_type_error(mut self, message: impl Into<String>) -> Self {
        self.invalid_type_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn required_error(mut self, message: impl Into<String>) -> Self {
        self.required_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .field("invalid_type_error", &self.invalid_type_error)
            .field("required_error", &self.required_error)
            .field("description", &self.description)
            .finish()
    }
}

/// Settings shared by every schema node.
#[derive(Clone, Default)]
pub(crate) struct Def {
    pub(crate) error_map: Option<ErrorMap>,
    pub(crate) description: Option<String>,
}

impl Def {
    pub(crate) fn from_params(params: Params) -> Result<Self, SchemaError> {
        let Params {
            error_map,
            invalid_type_error,
            required_error,
            description,
        } = params;

        if error_map.is_some() && (invalid_type_error.is_some() || required_error.is_some()) {
            return Err(SchemaError::ErrorMapConflict);
        }
        if error_map.is_some() {
            return Ok(Self {
                error_map,
                description,
            });
        }
        if invalid_type_error.is_none() && required_error.is_none() {
            return Ok(Self {
                error_map: None,
                description,
            });
        }

        let map: ErrorMap = Arc::new(move |issue: &IssueData, ctx: &ErrorMapCtx<'_>| {
            if !matches!(issue.code, IssueCode::InvalidType { .. }) {
                return ctx.default_error.to_owned();
            }
            let shorthand = if ctx.data.is_none() {
                &required_error
            } else {
                &invalid_type_error
            };
            shorthand
                .clone()
                .unwrap_or_else(|| ctx.default_error.to_owned())
        });
        Ok(Self {
            error_map: Some(map),
            description,
        })
    }
}

impl fmt::Debug for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Def")
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Bound, ValueKind};
    use serde_json::json;

    fn too_small(kind: SizeKind, inclusive: bool) -> IssueData {
        IssueData::new(IssueCode::TooSmall {
            minimum: Bound::from(2usize),
            inclusive,
            kind,
        })
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(
            default_message(&too_small(SizeKind::Array, true)),
            "Array must contain at least 2 element(s)"
        );
        assert_eq!(
            default_message(&too_small(SizeKind::String, false)),
            "String must contain over 2 character(s)"
        );
        assert_eq!(
            default_message(&IssueData::new(IssueCode::InvalidType {
                expected: ValueKind::String,
                received: ValueKind::Number,
            })),
            "Expected string, received number"
        );
        assert_eq!(
            default_message(&IssueData::new(IssueCode::InvalidString {
                validation: StringValidation::StartsWith("ab".into()),
            })),
            "Invalid input: must start with \"ab\""
        );
    }

    #[test]
    fn test_explicit_message_wins() {
        let map: ErrorMap = Arc::new(|_, _| "mapped".to_owned());
        let issue = IssueData::custom("explicit");
        assert_eq!(
            resolve_message(&issue, None, [Some(&map), None]),
            "explicit"
        );
    }

    #[test]
    fn test_contextual_overrides_schema_map() {
        let contextual: ErrorMap = Arc::new(|_, ctx| format!("ctx({})", ctx.default_error));
        let schema: ErrorMap = Arc::new(|_, _| "schema".to_owned());
        let issue = IssueData::new(IssueCode::Custom { params: None });
        assert_eq!(
            resolve_message(&issue, Some(&json!(1)), [Some(&contextual), Some(&schema)]),
            "ctx(schema)"
        );
    }

    #[test]
    fn test_params_conflict() {
        let params = Params::new()
            .error_map(|_, ctx| ctx.default_error.to_owned())
            .required_error("needed");
        assert!(matches!(
            Def::from_params(params),
            Err(SchemaError::ErrorMapConflict)
        ));
    }

    #[test]
    fn test_shorthand_map() {
        let def = Def::from_params(
            Params::new()
                .required_error("needed")
                .invalid_type_error("not a string"),
        )
        .unwrap();
        let map = def.error_map.unwrap();
        let issue = IssueData::new(IssueCode::InvalidType {
            expected: ValueKind::String,
            received: ValueKind::Undefined,
        });
        let absent = ErrorMapCtx {
            default_error: "Required",
            data: None,
        };
        assert_eq!(map(&issue, &absent), "needed");
        let present = ErrorMapCtx {
            default_error: "x",
            data: Some(&json!(1)),
        };
        assert_eq!(map(&issue, &present), "not a string");
    }
}

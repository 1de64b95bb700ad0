use super::{set_last_message, Check};
use crate::context::Ctx;
use crate::error_map::Def;
use crate::issue::{Bound, IssueCode, IssueData, SizeKind, ValueKind};
use crate::status::{Outcome, Status};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumberCheck {
    Min(f64),
    Max(f64),
    Gt(f64),
    Lt(f64),
    Int,
}

impl NumberCheck {
    fn violation(self, n: f64) -> Option<IssueCode> {
        let too_small = |minimum: f64, inclusive| IssueCode::TooSmall {
            minimum: Bound::from(minimum),
            inclusive,
            kind: SizeKind::Number,
        };
        let too_big = |maximum: f64, inclusive| IssueCode::TooBig {
            maximum: Bound::from(maximum),
            inclusive,
            kind: SizeKind::Number,
        };
        match self {
            NumberCheck::Min(min) => (n < min).then(|| too_small(min, true)),
            NumberCheck::Gt(min) => (n <= min).then(|| too_small(min, false)),
            NumberCheck::Max(max) => (n > max).then(|| too_big(max, true)),
            NumberCheck::Lt(max) => (n >= max).then(|| too_big(max, false)),
            NumberCheck::Int => (n.fract() != 0.0).then_some(IssueCode::InvalidType {
                expected: ValueKind::Integer,
                received: ValueKind::Float,
            }),
        }
    }
}

/// Number schema. Like strings, every check runs.
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    pub(crate) def: Def,
    checks: Vec<Check<NumberCheck>>,
}

impl NumberSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_check(mut self, kind: NumberCheck) -> Self {
        self.checks.push(Check::new(kind));
        self
    }

    /// Replace the default message of the last added check.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        set_last_message(&mut self.checks, message.into());
        self
    }

    /// At least `min`.
    #[must_use]
    pub fn min(self, min: f64) -> Self {
        self.with_check(NumberCheck::Min(min))
    }

    /// At most `max`.
    #[must_use]
    pub fn max(self, max: f64) -> Self {
        self.with_check(NumberCheck::Max(max))
    }

    /// Strictly greater than `min`.
    #[must_use]
    pub fn gt(self, min: f64) -> Self {
        self.with_check(NumberCheck::Gt(min))
    }

    /// Strictly less than `max`.
    #[must_use]
    pub fn lt(self, max: f64) -> Self {
        self.with_check(NumberCheck::Lt(max))
    }

    #[must_use]
    pub fn int(self) -> Self {
        self.with_check(NumberCheck::Int)
    }

    pub(crate) fn check(&self, data: Option<Value>, ctx: &Ctx) -> Outcome {
        let n = match data.as_ref().and_then(Value::as_f64) {
            Some(n) => n,
            None => {
                ctx.add_issue(
                    data.as_ref(),
                    IssueData::new(IssueCode::InvalidType {
                        expected: ValueKind::Number,
                        received: ValueKind::of(data.as_ref()),
                    }),
                );
                return Outcome::Aborted;
            }
        };

        let mut status = Status::Valid;
        for check in &self.checks {
            if let Some(code) = check.kind.violation(n) {
                let mut issue = IssueData::new(code);
                issue.message = check.message.clone();
                ctx.add_issue(data.as_ref(), issue);
                status.dirty();
            }
        }
        status.with(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{number, SchemaExt};
    use serde_json::json;

    #[test]
    fn test_bounds() {
        assert!(number().min(1.0).max(3.0).safe_parse(&json!(3)).is_ok());
        assert!(number().gt(1.0).safe_parse(&json!(1)).is_err());
        assert!(number().lt(1.0).safe_parse(&json!(0.5)).is_ok());

        let err = number().min(2.0).safe_parse(&json!(1)).unwrap_err();
        assert_eq!(err.errors()[0].message, "Number must be greater than or equal to 2");
    }

    #[test]
    fn test_int_and_all_checks_run() {
        let err = number().int().min(5.0).safe_parse(&json!(1.5)).unwrap_err();
        let codes: Vec<_> = err.errors().iter().map(|i| i.code_name()).collect();
        assert_eq!(codes, vec!["invalid_type", "too_small"]);
        assert_eq!(err.errors()[0].message, "Expected integer, received float");
    }

    #[test]
    fn test_rejects_numeric_strings() {
        let err = number().safe_parse(&json!("1")).unwrap_err();
        assert_eq!(err.errors()[0].message, "Expected number, received string");
    }
}

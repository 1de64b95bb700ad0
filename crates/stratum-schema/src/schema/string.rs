use super::{set_last_message, Check, SizeCheck};
use crate::context::Ctx;
use crate::error::SchemaError;
use crate::error_map::Def;
use crate::issue::{IssueCode, IssueData, SizeKind, StringValidation, ValueKind};
use crate::status::{Outcome, Status};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s)
}

fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

#[derive(Debug, Clone)]
pub(crate) enum StringCheck {
    Size(SizeCheck),
    Email,
    Url,
    Regex(Regex),
    StartsWith(String),
    EndsWith(String),
    Trim,
    Required,
}

/// String schema. Lengths count `char`s.
///
/// Every check runs even after an earlier one failed, so one parse reports
/// all problems with the string. `trim` rewrites the value seen by the checks
/// after it and the output.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub(crate) def: Def,
    checks: Vec<Check<StringCheck>>,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_check(mut self, kind: StringCheck) -> Self {
        self.checks.push(Check::new(kind));
        self
    }

    /// Replace the default message of the last added check.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        set_last_message(&mut self.checks, message.into());
        self
    }

    #[must_use]
    pub fn min(self, len: usize) -> Self {
        self.with_check(StringCheck::Size(SizeCheck::Min(len)))
    }

    #[must_use]
    pub fn max(self, len: usize) -> Self {
        self.with_check(StringCheck::Size(SizeCheck::Max(len)))
    }

    #[must_use]
    pub fn length(self, len: usize) -> Self {
        self.with_check(StringCheck::Size(SizeCheck::Length(len)))
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.with_check(StringCheck::Email)
    }

    #[must_use]
    pub fn url(self) -> Self {
        self.with_check(StringCheck::Url)
    }

    #[must_use]
    pub fn regex(self, regex: Regex) -> Self {
        self.with_check(StringCheck::Regex(regex))
    }

    /// Compile `pattern` and add it as a regex check.
    pub fn pattern(self, pattern: &str) -> Result<Self, SchemaError> {
        Ok(self.regex(Regex::new(pattern)?))
    }

    #[must_use]
    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.with_check(StringCheck::StartsWith(prefix.into()))
    }

    #[must_use]
    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.with_check(StringCheck::EndsWith(suffix.into()))
    }

    #[must_use]
    pub fn trim(self) -> Self {
        self.with_check(StringCheck::Trim)
    }

    /// Reject the empty string with a `required` issue.
    #[must_use]
    pub fn required(self) -> Self {
        self.with_check(StringCheck::Required)
    }

    pub(crate) fn check(&self, data: Option<Value>, ctx: &Ctx) -> Outcome {
        let mut text = match data {
            Some(Value::String(s)) => s,
            other => {
                ctx.add_issue(
                    other.as_ref(),
                    IssueData::new(IssueCode::InvalidType {
                        expected: ValueKind::String,
                        received: ValueKind::of(other.as_ref()),
                    }),
                );
                return Outcome::Aborted;
            }
        };

        let mut status = Status::Valid;
        for check in &self.checks {
            let code = match &check.kind {
                StringCheck::Trim => {
                    let trimmed = text.trim();
                    if trimmed.len() != text.len() {
                        text = trimmed.to_owned();
                    }
                    None
                }
                StringCheck::Size(size) => size.violation(text.chars().count(), SizeKind::String),
                StringCheck::Email => (!is_email(&text)).then_some(StringValidation::Email).map(invalid_string),
                StringCheck::Url => (!is_url(&text)).then_some(StringValidation::Url).map(invalid_string),
                StringCheck::Regex(regex) => (!regex.is_match(&text))
                    .then_some(StringValidation::Regex)
                    .map(invalid_string),
                StringCheck::StartsWith(prefix) => (!text.starts_with(prefix.as_str()))
                    .then(|| invalid_string(StringValidation::StartsWith(prefix.clone()))),
                StringCheck::EndsWith(suffix) => (!text.ends_with(suffix.as_str()))
                    .then(|| invalid_string(StringValidation::EndsWith(suffix.clone()))),
                StringCheck::Required => text.is_empty().then_some(IssueCode::Required),
            };

            if let Some(code) = code {
                let mut issue = IssueData::new(code);
                issue.message = check.message.clone();
                ctx.add_issue(Some(&Value::String(text.clone())), issue);
                status.dirty();
            }
        }

        status.with(Some(Value::String(text)))
    }
}

fn invalid_string(validation: StringValidation) -> IssueCode {
    IssueCode::InvalidString { validation }
}

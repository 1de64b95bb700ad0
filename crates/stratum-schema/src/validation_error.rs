//! The failure payload of a parse call.

use crate::issue::{Issue, IssueCode, PathSegment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every issue recorded by one failed parse call, in recording order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// The flat issue list.
    pub fn errors(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_errors(self) -> Vec<Issue> {
        self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn add_issues(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    /// Nested tree of messages keyed by path segment.
    pub fn format(&self) -> FormattedError {
        self.format_with(|issue| issue.message.clone())
    }

    /// Like [`format`](Self::format) with a custom leaf mapper.
    ///
    /// `invalid_union` issues are expanded into the errors of every option.
    pub fn format_with<U, F>(&self, mapper: F) -> FormattedError<U>
    where
        F: Fn(&Issue) -> U,
    {
        let mut root = FormattedError::default();
        fill_tree(&mut root, &self.issues, &mapper);
        root
    }

    /// Root issues as form errors, the rest grouped by their first segment.
    pub fn flatten(&self) -> FlattenedError {
        self.flatten_with(|issue| issue.message.clone())
    }

    pub fn flatten_with<U, F>(&self, mapper: F) -> FlattenedError<U>
    where
        F: Fn(&Issue) -> U,
    {
        let mut flattened = FlattenedError::default();
        for issue in &self.issues {
            match issue.path.first() {
                Some(segment) => flattened
                    .field_errors
                    .entry(segment.to_string())
                    .or_default()
                    .push(mapper(issue)),
                None => flattened.form_errors.push(mapper(issue)),
            }
        }
        flattened
    }

    /// First message recorded for each of `fields`, keyed by field name.
    pub fn field_error(&self, fields: &[&str]) -> IndexMap<String, String> {
        let flattened = self.flatten();
        fields
            .iter()
            .filter_map(|field| {
                let first = flattened.field_errors.get(*field)?.first()?;
                Some(((*field).to_owned(), first.clone()))
            })
            .collect()
    }
}

fn fill_tree<U, F>(root: &mut FormattedError<U>, issues: &[Issue], mapper: &F)
where
    F: Fn(&Issue) -> U,
{
    for issue in issues {
        if let IssueCode::InvalidUnion { union_errors } = &issue.code {
            for option in union_errors {
                fill_tree(root, &option.issues, mapper);
            }
            continue;
        }
        let mut node = &mut *root;
        for segment in &issue.path {
            node = node.fields.entry(segment.to_string()).or_default();
        }
        node.errors.push(mapper(issue));
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.issues) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{} validation issue(s)", self.issues.len()),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<Vec<Issue>> for ValidationError {
    fn from(issues: Vec<Issue>) -> Self {
        Self::new(issues)
    }
}

/// One level of [`ValidationError::format`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedError<U = String> {
    #[serde(rename = "_errors")]
    pub errors: Vec<U>,
    #[serde(flatten)]
    pub fields: IndexMap<String, FormattedError<U>>,
}

impl<U> Default for FormattedError<U> {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            fields: IndexMap::new(),
        }
    }
}

impl<U> FormattedError<U> {
    /// The subtree at one path segment.
    pub fn get(&self, segment: impl Into<PathSegment>) -> Option<&FormattedError<U>> {
        self.fields.get(&segment.into().to_string())
    }
}

/// Result of [`ValidationError::flatten`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedError<U = String> {
    pub form_errors: Vec<U>,
    pub field_errors: IndexMap<String, Vec<U>>,
}

impl<U> Default for FlattenedError<U> {
    fn default() -> Self {
        Self {
            form_errors: Vec::new(),
            field_errors: IndexMap::new(),
        }
    }
}

use super::{evaluate, set_last_message, Check, Schema, SizeCheck};
use crate::context::{Ctx, Mode};
use crate::error_map::Def;
use crate::issue::{IssueCode, IssueData, SizeKind, ValueKind};
use crate::status::{merge_array, Outcome, Status};
use futures::future::join_all;
use serde_json::Value;

/// Array schema.
///
/// Elements are validated with their index appended to the path. Any aborted
/// element aborts the array; any dirty element dirties it.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub(crate) def: Def,
    element: Schema,
    checks: Vec<Check<SizeCheck>>,
}

impl ArraySchema {
    pub fn new(element: impl Into<Schema>) -> Self {
        Self {
            def: Def::default(),
            element: element.into(),
            checks: Vec::new(),
        }
    }

    pub fn element(&self) -> &Schema {
        &self.element
    }

    fn with_check(mut self, kind: SizeCheck) -> Self {
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
        self.with_check(SizeCheck::Min(len))
    }

    #[must_use]
    pub fn max(self, len: usize) -> Self {
        self.with_check(SizeCheck::Max(len))
    }

    #[must_use]
    pub fn length(self, len: usize) -> Self {
        self.with_check(SizeCheck::Length(len))
    }

    #[must_use]
    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    pub(crate) async fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> Outcome {
        let items = match data {
            Some(Value::Array(items)) => items,
            other => {
                ctx.add_issue(
                    other.as_ref(),
                    IssueData::new(IssueCode::InvalidType {
                        expected: ValueKind::Array,
                        received: ValueKind::of(other.as_ref()),
                    }),
                );
                return Outcome::Aborted;
            }
        };

        let mut status = Status::Valid;
        for check in &self.checks {
            if let Some(code) = check.kind.violation(items.len(), SizeKind::Array) {
                let mut issue = IssueData::new(code);
                issue.message = check.message.clone();
                ctx.add_issue(Some(&Value::Array(items.clone())), issue);
                status.dirty();
            }
        }

        let outcomes = match ctx.mode() {
            Mode::Sync => {
                let mut outcomes = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    outcomes.push(evaluate(&self.element, Some(item), ctx.child(index)).await);
                }
                outcomes
            }
            Mode::Async => {
                join_all(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| evaluate(&self.element, Some(item), ctx.child(index))),
                )
                .await
            }
        };

        merge_array(status, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{array, string, SchemaExt};
    use serde_json::json;

    #[test]
    fn test_min_length_issue() {
        let err = array(string()).min(2).safe_parse(&json!(["x"])).unwrap_err();
        assert_eq!(err.len(), 1);
        let issue = serde_json::to_value(&err.errors()[0]).unwrap();
        assert_eq!(issue["code"], "too_small");
        assert_eq!(issue["minimum"], 2);
        assert_eq!(issue["type"], "array");
        assert_eq!(err.errors()[0].message, "Array must contain at least 2 element(s)");
    }

    #[test]
    fn test_element_paths_and_order() {
        let err = array(string().min(2))
            .safe_parse(&json!(["ok", "x", 3]))
            .unwrap_err();
        let paths: Vec<_> = err.errors().iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec![crate::issue_path![1], crate::issue_path![2]]);
    }

    #[test]
    fn test_size_and_element_issues_accumulate() {
        let err = array(string()).nonempty().max(0).safe_parse(&json!([1])).unwrap_err();
        let codes: Vec<_> = err.errors().iter().map(|i| i.code_name()).collect();
        assert_eq!(codes, vec!["too_big", "invalid_type"]);
    }

    #[test]
    fn test_rejects_non_arrays() {
        let err = string().array().safe_parse(&json!({"0": "a"})).unwrap_err();
        assert_eq!(err.errors()[0].message, "Expected array, received object");
    }
}

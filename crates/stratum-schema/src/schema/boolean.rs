use crate::context::Ctx;
use crate::error_map::Def;
use crate::issue::{IssueCode, IssueData, ValueKind};
use crate::status::Outcome;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    pub(crate) def: Def,
}

impl BooleanSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check(&self, data: Option<Value>, ctx: &Ctx) -> Outcome {
        match data {
            Some(Value::Bool(b)) => Outcome::Valid(Some(Value::Bool(b))),
            other => {
                ctx.add_issue(
                    other.as_ref(),
                    IssueData::new(IssueCode::InvalidType {
                        expected: ValueKind::Boolean,
                        received: ValueKind::of(other.as_ref()),
                    }),
                );
                Outcome::Aborted
            }
        }
    }
}

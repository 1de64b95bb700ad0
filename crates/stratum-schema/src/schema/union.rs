use super::{evaluate, Schema};
use crate::context::{Ctx, Mode};
use crate::error_map::Def;
use crate::issue::{IssueCode, IssueData};
use crate::status::{Outcome, Status};
use crate::validation_error::ValidationError;
use futures::future::join_all;
use serde_json::Value;

/// Union of alternative schemas.
///
/// Each option is evaluated against its own issue sink. The first valid
/// option wins outright. Failing that, the first dirty option wins and only
/// its issues are kept. When every option aborts, one `invalid_union` issue
/// carries the errors of each option.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    pub(crate) def: Def,
    options: Vec<Schema>,
}

impl UnionSchema {
    pub fn new(options: Vec<Schema>) -> Self {
        Self {
            def: Def::default(),
            options,
        }
    }

    pub fn options(&self) -> &[Schema] {
        &self.options
    }

    /// Append another option.
    #[must_use]
    pub fn or(mut self, option: impl Into<Schema>) -> Self {
        self.options.push(option.into());
        self
    }

    pub(crate) async fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> Outcome {
        let mut runs: Vec<(Outcome, Ctx)> = match ctx.mode() {
            Mode::Sync => {
                let mut runs = Vec::with_capacity(self.options.len());
                for option in &self.options {
                    let isolated = ctx.isolated();
                    let outcome = evaluate(option, data.clone(), isolated.clone()).await;
                    if outcome.is_valid() {
                        return outcome;
                    }
                    runs.push((outcome, isolated));
                }
                runs
            }
            Mode::Async => {
                let mut runs = join_all(self.options.iter().map(|option| {
                    let isolated = ctx.isolated();
                    let data = data.clone();
                    async move {
                        let outcome = evaluate(option, data, isolated.clone()).await;
                        (outcome, isolated)
                    }
                }))
                .await;
                if let Some(index) = runs.iter().position(|(outcome, _)| outcome.is_valid()) {
                    return runs.swap_remove(index).0;
                }
                runs
            }
        };

        if let Some(index) = runs
            .iter()
            .position(|(outcome, _)| outcome.status() == Status::Dirty)
        {
            let (outcome, isolated) = runs.swap_remove(index);
            ctx.extend_issues(isolated.take_issues());
            return outcome;
        }

        let union_errors = runs
            .iter()
            .map(|(_, isolated)| ValidationError::new(isolated.take_issues()))
            .collect();
        tracing::trace!(path = ?ctx.path(), "no union option matched");
        ctx.add_issue(
            data.as_ref(),
            IssueData::new(IssueCode::InvalidUnion { union_errors }),
        );
        Outcome::Aborted
    }
}

//! The valid / dirty / aborted lattice.
//!
//! `Dirty` means issues were recorded but the node still produced a value its
//! parent can use; `Aborted` means it produced nothing. Merging a collection
//! takes the worst status of its parts.

use serde_json::{Map, Value};

/// Running status of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Valid,
    Dirty,
    Aborted,
}

impl Status {
    /// Mark dirty unless already aborted.
    pub fn dirty(&mut self) {
        if *self == Status::Valid {
            *self = Status::Dirty;
        }
    }

    pub fn abort(&mut self) {
        *self = Status::Aborted;
    }

    pub fn is_aborted(self) -> bool {
        self == Status::Aborted
    }

    /// Combine with the status of a child.
    pub fn absorb(&mut self, other: Status) {
        *self = (*self).max(other);
    }

    /// Finish with an output value.
    pub fn with(self, value: Option<Value>) -> Outcome {
        match self {
            Status::Valid => Outcome::Valid(value),
            Status::Dirty => Outcome::Dirty(value),
            Status::Aborted => Outcome::Aborted,
        }
    }
}

/// Result of evaluating one node. `None` is an absent output.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Valid(Option<Value>),
    Dirty(Option<Value>),
    Aborted,
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Valid(_) => Status::Valid,
            Outcome::Dirty(_) => Status::Dirty,
            Outcome::Aborted => Status::Aborted,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Valid(value) | Outcome::Dirty(value) => value,
            Outcome::Aborted => None,
        }
    }
}

/// Merge element outcomes in index order. Absent outputs become `null`.
pub fn merge_array(mut status: Status, outcomes: Vec<Outcome>) -> Outcome {
    let mut items = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Outcome::Aborted => return Outcome::Aborted,
            Outcome::Dirty(value) => {
                status.dirty();
                items.push(value.unwrap_or(Value::Null));
            }
            Outcome::Valid(value) => items.push(value.unwrap_or(Value::Null)),
        }
    }
    status.with(Some(Value::Array(items)))
}

/// One merged object member.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub key: String,
    pub outcome: Outcome,
    /// The key was present on the input.
    pub always_set: bool,
}

/// Merge member outcomes in order.
///
/// An absent output is kept as `null` only when the key was present on the
/// input; otherwise the key is left out.
pub fn merge_object(mut status: Status, pairs: Vec<Pair>) -> Outcome {
    let mut object = Map::new();
    for pair in pairs {
        let value = match pair.outcome {
            Outcome::Aborted => return Outcome::Aborted,
            Outcome::Dirty(value) => {
                status.dirty();
                value
            }
            Outcome::Valid(value) => value,
        };
        match value {
            Some(value) => {
                object.insert(pair.key, value);
            }
            None if pair.always_set => {
                object.insert(pair.key, Value::Null);
            }
            None => {}
        }
    }
    status.with(Some(Value::Object(object)))
}

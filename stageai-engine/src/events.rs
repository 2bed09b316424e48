use serde::Serialize;
use stageai_core::types::OperationKind;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum StateChange {
    Auth,
    Probe,
    Submitted { kind: OperationKind, seq: u64 },
    Settled { kind: OperationKind, seq: u64 },
    Discarded { kind: OperationKind, seq: u64 },
}

/// Callback invoked after a component has applied a state transition.
///
/// Must be fast; it runs on the task that performed the transition.
pub type StateListener = Arc<dyn Fn(StateChange) + Send + Sync>;

pub(crate) fn notify(listener: &Option<StateListener>, change: StateChange) {
    if let Some(l) = listener {
        l(change);
    }
}

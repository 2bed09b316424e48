use crate::events::{StateChange, StateListener, notify};
use crate::traits::{ApiError, PlaygroundApi};
use async_trait::async_trait;
use serde::Serialize;
use stageai_core::text::{BlankField, require_present};
use stageai_core::types::OperationKind;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    EmptyInput(#[from] BlankField),

    #[error("a {} request is already pending", .0.label())]
    Busy(OperationKind),
}

/// One kind of submit/await/settle round-trip.
///
/// The lifecycle owns pending tracking and sequencing; the operation owns the
/// network call and what its slot looks like before and after.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Slot: Clone + Default + Send + 'static;

    fn kind(&self) -> OperationKind;

    /// Whether a new submission may be issued while an earlier one is pending.
    fn allows_overlap(&self) -> bool {
        true
    }

    async fn call(&self, api: &dyn PlaygroundApi, input: &str) -> Result<String, ApiError>;

    /// Applied when a submission is accepted, before the call is issued.
    fn begin(&self, slot: &mut Self::Slot, input: &str);

    /// Applied only for the latest submission.
    fn settle(&self, slot: &mut Self::Slot, outcome: Result<String, ApiError>);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleSnapshot<S> {
    pub pending: bool,
    pub latest_seq: u64,
    pub slot: S,
}

#[derive(Default)]
struct Inner<S> {
    pending: bool,
    latest_seq: u64,
    slot: S,
}

pub struct RequestLifecycle<T: Operation> {
    op: Arc<T>,
    api: Arc<dyn PlaygroundApi>,
    inner: Arc<Mutex<Inner<T::Slot>>>,
    listener: Option<StateListener>,
}

impl<T: Operation> Clone for RequestLifecycle<T> {
    fn clone(&self) -> Self {
        Self {
            op: self.op.clone(),
            api: self.api.clone(),
            inner: self.inner.clone(),
            listener: self.listener.clone(),
        }
    }
}

impl<T: Operation> RequestLifecycle<T> {
    pub fn new(op: T, api: Arc<dyn PlaygroundApi>) -> Self {
        Self {
            op: Arc::new(op),
            api,
            inner: Arc::new(Mutex::new(Inner::default())),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: StateListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.op.kind()
    }

    /// Validates, issues and settles one submission. Returns its sequence number.
    ///
    /// The outcome is observed through [`Self::snapshot`]; a settlement that is
    /// no longer the latest submission of this kind is dropped.
    ///
    /// If the returned future is dropped before the submission settles, the
    /// submission is settled as a connection failure so `pending` never sticks.
    pub async fn submit(&self, input: &str) -> Result<u64, LifecycleError> {
        let seq = self.begin(input).await?;
        let guard = SettleOnDrop {
            lifecycle: Some(self.clone()),
            seq,
        };
        let outcome = self.op.call(self.api.as_ref(), input).await;
        self.settle(seq, outcome).await;
        guard.disarm();
        Ok(seq)
    }

    /// Accepts a submission: marks pending and hands out the next sequence number.
    pub async fn begin(&self, input: &str) -> Result<u64, LifecycleError> {
        let kind = self.op.kind();
        require_present(kind.request_field(), input)?;

        let seq = {
            let mut inner = self.inner.lock().await;
            if inner.pending && !self.op.allows_overlap() {
                return Err(LifecycleError::Busy(kind));
            }

            inner.latest_seq = inner.latest_seq.wrapping_add(1);
            inner.pending = true;
            self.op.begin(&mut inner.slot, input);
            inner.latest_seq
        };

        log::debug!("{} submission #{seq} issued", kind.label());
        notify(&self.listener, StateChange::Submitted { kind, seq });
        Ok(seq)
    }

    /// Applies `outcome` if `seq` is still the latest submission. Returns whether it was applied.
    pub async fn settle(&self, seq: u64, outcome: Result<String, ApiError>) -> bool {
        let kind = self.op.kind();
        if let Err(e) = &outcome {
            log::warn!("{} request #{seq} failed: {e}", kind.label());
        }

        let applied = {
            let mut inner = self.inner.lock().await;
            self.apply(&mut inner, seq, outcome)
        };
        self.announce(seq, applied);
        applied
    }

    /// Settles a submission whose caller went away. Runs from `Drop`, so it
    /// cannot await the lock; when the lock is busy the settlement is spawned.
    fn abandon(self, seq: u64) {
        let kind = self.op.kind();
        log::warn!("{} request #{seq} dropped before settling", kind.label());
        let outcome = Err(ApiError::Transport("request cancelled".into()));

        if let Ok(mut inner) = self.inner.try_lock() {
            let applied = self.apply(&mut inner, seq, outcome);
            drop(inner);
            self.announce(seq, applied);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    self.settle(seq, outcome).await;
                });
            }
            Err(_) => log::error!("{} request #{seq} left pending: no runtime", kind.label()),
        }
    }

    fn apply(
        &self,
        inner: &mut Inner<T::Slot>,
        seq: u64,
        outcome: Result<String, ApiError>,
    ) -> bool {
        if inner.latest_seq != seq {
            return false;
        }
        self.op.settle(&mut inner.slot, outcome);
        inner.pending = false;
        true
    }

    fn announce(&self, seq: u64, applied: bool) {
        let kind = self.op.kind();
        if applied {
            notify(&self.listener, StateChange::Settled { kind, seq });
        } else {
            log::debug!("{} response #{seq} is stale; discarded", kind.label());
            notify(&self.listener, StateChange::Discarded { kind, seq });
        }
    }

    pub async fn is_pending(&self) -> bool {
        self.inner.lock().await.pending
    }

    pub async fn snapshot(&self) -> LifecycleSnapshot<T::Slot> {
        let inner = self.inner.lock().await;
        LifecycleSnapshot {
            pending: inner.pending,
            latest_seq: inner.latest_seq,
            slot: inner.slot.clone(),
        }
    }
}

/// Settles an outstanding submission if the future driving it is dropped.
struct SettleOnDrop<T: Operation> {
    lifecycle: Option<RequestLifecycle<T>>,
    seq: u64,
}

impl<T: Operation> SettleOnDrop<T> {
    fn disarm(mut self) {
        self.lifecycle = None;
    }
}

impl<T: Operation> Drop for SettleOnDrop<T> {
    fn drop(&mut self) {
        if let Some(lifecycle) = self.lifecycle.take() {
            lifecycle.abandon(self.seq);
        }
    }
}

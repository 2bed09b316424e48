use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stageai_core::text::{MSG_CHAT_CONNECTION_FAILED, MSG_FILL_ALL_FIELDS, MSG_LOGIN_FAILED};
use stageai_core::types::{AuthStatus, ChatMessage, Identity, OperationKind, SlotResult};
use stageai_engine::events::StateChange;
use stageai_engine::lifecycle::{LifecycleError, RequestLifecycle};
use stageai_engine::operations::{ChatTurn, TextGeneration};
use stageai_engine::session::SessionStore;
use stageai_engine::traits::{ApiError, PlaygroundApi};
use tokio::sync::oneshot;

type Reply = Result<String, ApiError>;

/// Fake service whose responses are released by the test, keyed by input.
#[derive(Default)]
struct ScriptedApi {
    login: Mutex<Option<Result<(), ApiError>>>,
    logout: Mutex<Option<Result<(), ApiError>>>,
    logout_gate: Mutex<Option<oneshot::Receiver<()>>>,
    replies: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    fn hold(&self, input: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().insert(input.to_string(), rx);
        tx
    }

    fn respond(&self, input: &str, reply: Reply) {
        let _ = self.hold(input).send(reply);
    }

    async fn reply_for(&self, op: &str, input: &str) -> Reply {
        self.calls.lock().unwrap().push(format!("{op}:{input}"));
        let rx = self.replies.lock().unwrap().remove(input);
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Transport("dropped".into()))),
            None => Err(ApiError::Transport("unscripted".into())),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PlaygroundApi for ScriptedApi {
    async fn probe(&self) -> Result<String, ApiError> {
        Ok("Hello".into())
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push("login".into());
        self.login.lock().unwrap().clone().unwrap_or(Ok(()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push("logout".into());
        let gate = self.logout_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.logout.lock().unwrap().clone().unwrap_or(Ok(()))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ApiError> {
        self.reply_for("text", prompt).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError> {
        self.reply_for("image", prompt).await
    }

    async fn chat(&self, message: &str) -> Result<String, ApiError> {
        self.reply_for("chat", message).await
    }
}

async fn wait_for_seq<T: stageai_engine::lifecycle::Operation>(lc: &RequestLifecycle<T>, seq: u64) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while lc.snapshot().await.latest_seq < seq {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("submission was not issued");
}

fn recording_listener() -> (Arc<Mutex<Vec<StateChange>>>, stageai_engine::events::StateListener) {
    let events = Arc::new(Mutex::new(vec![]));
    let sink = events.clone();
    (events, Arc::new(move |c: StateChange| sink.lock().unwrap().push(c)))
}

#[tokio::test]
async fn login_success_sets_identity() {
    let api = Arc::new(ScriptedApi::default());
    let store = SessionStore::new(api.clone());

    assert!(store.login("alice", "secret").await);

    let snap = store.snapshot().await;
    assert_eq!(snap.status, AuthStatus::LoggedIn);
    assert_eq!(snap.identity, Some(Identity::new("alice")));
}

#[tokio::test]
async fn declined_login_reports_server_message() {
    let api = Arc::new(ScriptedApi::default());
    *api.login.lock().unwrap() = Some(Err(ApiError::Status {
        status: 401,
        message: Some("bad credentials".into()),
    }));
    let store = SessionStore::new(api.clone());

    assert!(!store.login("alice", "wrong").await);

    let snap = store.snapshot().await;
    assert_eq!(snap.status, AuthStatus::error("bad credentials"));
    assert_eq!(snap.identity, None);
}

#[tokio::test]
async fn failed_login_after_success_clears_identity() {
    let api = Arc::new(ScriptedApi::default());
    let store = SessionStore::new(api.clone());
    assert!(store.login("alice", "secret").await);

    *api.login.lock().unwrap() = Some(Err(ApiError::Status {
        status: 401,
        message: None,
    }));
    assert!(!store.login("bob", "nope").await);

    assert_eq!(store.identity().await, None);
    assert_eq!(store.snapshot().await.status, AuthStatus::error(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn blank_credentials_never_reach_the_service() {
    let api = Arc::new(ScriptedApi::default());
    let store = SessionStore::new(api.clone());

    assert!(!store.login("alice", "   ").await);
    assert!(!store.login("", "secret").await);

    assert_eq!(api.call_count(), 0);
    assert_eq!(store.snapshot().await.status, AuthStatus::error(MSG_FILL_ALL_FIELDS));
}

#[tokio::test]
async fn logout_clears_locally_even_when_remote_fails() {
    let api = Arc::new(ScriptedApi::default());
    *api.logout.lock().unwrap() = Some(Err(ApiError::Transport("connection refused".into())));
    let store = SessionStore::new(api.clone());
    assert!(store.login("alice", "secret").await);

    store.logout().await;
    assert_eq!(store.identity().await, None);
    assert_eq!(store.snapshot().await.status, AuthStatus::LoggedOut);

    // Idempotent.
    store.logout().await;
    assert_eq!(store.identity().await, None);
    assert!(!store.is_logged_in().await);
}

#[tokio::test]
async fn logout_clears_before_remote_revoke_returns() {
    let api = Arc::new(ScriptedApi::default());
    let store = SessionStore::new(api.clone());
    assert!(store.login("alice", "secret").await);

    let (release, gate) = oneshot::channel();
    *api.logout_gate.lock().unwrap() = Some(gate);
    let task = tokio::spawn({
        let store = store.clone();
        async move { store.logout().await }
    });

    tokio::time::timeout(Duration::from_secs(2), async {
        while store.is_logged_in().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("session was not cleared while the revoke was in flight");
    assert!(!task.is_finished());
    assert_eq!(store.identity().await, None);
    assert_eq!(store.snapshot().await.status, AuthStatus::LoggedOut);

    release.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(store.snapshot().await.status, AuthStatus::LoggedOut);
}

#[tokio::test]
async fn pending_toggles_once_per_submission() {
    let api = Arc::new(ScriptedApi::default());
    let (events, listener) = recording_listener();
    let lc = RequestLifecycle::new(TextGeneration, api.clone()).with_listener(listener);

    let release = api.hold("a haiku about rivers");
    let task = tokio::spawn({
        let lc = lc.clone();
        async move { lc.submit("a haiku about rivers").await }
    });

    wait_for_seq(&lc, 1).await;
    assert!(lc.is_pending().await);

    release.send(Ok("water finds its way".into())).unwrap();
    assert_eq!(task.await.unwrap(), Ok(1));

    let snap = lc.snapshot().await;
    assert!(!snap.pending);
    assert_eq!(snap.slot.result, Some(SlotResult::Ready("water finds its way".into())));

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            StateChange::Submitted {
                kind: OperationKind::Text,
                seq: 1
            },
            StateChange::Settled {
                kind: OperationKind::Text,
                seq: 1
            },
        ]
    );
}

#[tokio::test]
async fn stale_response_does_not_overwrite_newer_result() {
    let api = Arc::new(ScriptedApi::default());
    let lc = RequestLifecycle::new(TextGeneration, api.clone());

    let release_first = api.hold("first");
    let release_second = api.hold("second");

    let first = tokio::spawn({
        let lc = lc.clone();
        async move { lc.submit("first").await }
    });
    wait_for_seq(&lc, 1).await;

    let second = tokio::spawn({
        let lc = lc.clone();
        async move { lc.submit("second").await }
    });
    wait_for_seq(&lc, 2).await;

    release_second.send(Ok("second result".into())).unwrap();
    assert_eq!(second.await.unwrap(), Ok(2));
    assert!(!lc.is_pending().await);

    release_first.send(Ok("first result".into())).unwrap();
    assert_eq!(first.await.unwrap(), Ok(1));

    let snap = lc.snapshot().await;
    assert!(!snap.pending);
    assert_eq!(snap.slot.result, Some(SlotResult::Ready("second result".into())));
}

#[tokio::test]
async fn stale_settlement_keeps_newer_request_pending() {
    let api = Arc::new(ScriptedApi::default());
    let lc = RequestLifecycle::new(TextGeneration, api.clone());

    let first = lc.begin("first").await.unwrap();
    let second = lc.begin("second").await.unwrap();

    assert!(!lc.settle(first, Ok("late".into())).await);
    assert!(lc.is_pending().await);
    assert_eq!(lc.snapshot().await.slot.result, None);

    assert!(lc.settle(second, Err(ApiError::Transport("reset".into()))).await);
    assert!(!lc.is_pending().await);
}

#[tokio::test]
async fn blank_prompt_is_rejected_for_every_kind() {
    let api = Arc::new(ScriptedApi::default());
    let text = RequestLifecycle::new(TextGeneration, api.clone());
    let chat = RequestLifecycle::new(ChatTurn, api.clone());

    assert!(matches!(
        text.submit("  ").await,
        Err(LifecycleError::EmptyInput(_))
    ));
    assert!(matches!(chat.submit("").await, Err(LifecycleError::EmptyInput(_))));

    assert_eq!(api.call_count(), 0);
    assert_eq!(text.snapshot().await.latest_seq, 0);
    assert!(chat.snapshot().await.slot.is_empty());
}

#[tokio::test]
async fn chat_turn_appends_user_then_reply() {
    let api = Arc::new(ScriptedApi::default());
    api.respond("hello", Ok("hi there".into()));
    let chat = RequestLifecycle::new(ChatTurn, api.clone());

    chat.submit("hello").await.unwrap();

    let snap = chat.snapshot().await;
    assert!(!snap.pending);
    assert_eq!(
        snap.slot.messages(),
        &[ChatMessage::user("hello"), ChatMessage::assistant("hi there")]
    );
}

#[tokio::test]
async fn chat_refuses_second_turn_while_pending() {
    let api = Arc::new(ScriptedApi::default());
    let chat = RequestLifecycle::new(ChatTurn, api.clone());

    let release = api.hold("first");
    let task = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("first").await }
    });
    wait_for_seq(&chat, 1).await;

    // The user message is visible before the reply arrives.
    assert_eq!(chat.snapshot().await.slot.len(), 1);
    assert_eq!(
        chat.submit("second").await,
        Err(LifecycleError::Busy(OperationKind::Chat))
    );

    drop(release);
    task.await.unwrap().unwrap();

    let snap = chat.snapshot().await;
    assert_eq!(snap.slot.len(), 2);
    assert_eq!(
        snap.slot.last(),
        Some(&ChatMessage::assistant(MSG_CHAT_CONNECTION_FAILED))
    );
}

#[tokio::test]
async fn transcript_grows_by_two_per_turn() {
    let api = Arc::new(ScriptedApi::default());
    api.respond("one", Ok("1".into()));
    api.respond(
        "two",
        Err(ApiError::Status {
            status: 500,
            message: None,
        }),
    );
    api.respond("three", Err(ApiError::MissingField("reply")));
    let chat = RequestLifecycle::new(ChatTurn, api.clone());

    let mut expected = 0;
    for msg in ["one", "two", "three"] {
        chat.submit(msg).await.unwrap();
        expected += 2;
        assert_eq!(chat.snapshot().await.slot.len(), expected);
    }
}

#[tokio::test]
async fn dropped_chat_turn_still_completes_the_exchange() {
    let api = Arc::new(ScriptedApi::default());
    let chat = RequestLifecycle::new(ChatTurn, api.clone());

    let _unanswered = api.hold("hello");
    let res = tokio::time::timeout(Duration::from_millis(50), chat.submit("hello")).await;
    assert!(res.is_err());

    let snap = chat.snapshot().await;
    assert!(!snap.pending);
    assert_eq!(
        snap.slot.messages(),
        &[
            ChatMessage::user("hello"),
            ChatMessage::assistant(MSG_CHAT_CONNECTION_FAILED)
        ]
    );

    api.respond("again", Ok("back again".into()));
    assert_eq!(chat.submit("again").await, Ok(2));
    assert_eq!(chat.snapshot().await.slot.len(), 4);
}

#[tokio::test]
async fn aborted_older_submission_does_not_clear_newer_pending() {
    let api = Arc::new(ScriptedApi::default());
    let lc = RequestLifecycle::new(TextGeneration, api.clone());

    let _first_reply = api.hold("first");
    let release_second = api.hold("second");

    let first = tokio::spawn({
        let lc = lc.clone();
        async move { lc.submit("first").await }
    });
    wait_for_seq(&lc, 1).await;
    let second = tokio::spawn({
        let lc = lc.clone();
        async move { lc.submit("second").await }
    });
    wait_for_seq(&lc, 2).await;

    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());
    assert!(lc.is_pending().await);

    release_second.send(Ok("second result".into())).unwrap();
    assert_eq!(second.await.unwrap(), Ok(2));

    let snap = lc.snapshot().await;
    assert!(!snap.pending);
    assert_eq!(snap.slot.result, Some(SlotResult::Ready("second result".into())));
}

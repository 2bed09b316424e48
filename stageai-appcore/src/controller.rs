use std::sync::Arc;

use stageai_core::config::ClientConfig;
use stageai_core::text::MSG_BACKEND_UNREACHABLE;
use stageai_engine::events::{StateChange, StateListener};
use stageai_engine::lifecycle::{LifecycleError, RequestLifecycle};
use stageai_engine::operations::{
    ChatLifecycle, ChatTurn, ImageGeneration, ImageLifecycle, TextGeneration, TextLifecycle,
};
use stageai_engine::session::SessionStore;
use stageai_engine::traits::PlaygroundApi;
use stageai_runtime::http_api::HttpPlaygroundApi;
use tokio::sync::{Mutex, broadcast};

use crate::view::{ViewParts, ViewState, project};

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct LocalView {
    mounted: bool,
    backend_message: String,
    login_form_open: bool,
}

/// Composition root: one session, three request lifecycles, one chat transcript.
///
/// Cheap to clone; clones share state, so a front-end can hand a clone to a
/// spawned task per submission and keep reading input.
#[derive(Clone)]
pub struct PlaygroundController {
    base_url: String,
    api: Arc<dyn PlaygroundApi>,
    session: SessionStore,
    text: TextLifecycle,
    image: ImageLifecycle,
    chat: ChatLifecycle,
    local: Arc<Mutex<LocalView>>,
    events: broadcast::Sender<StateChange>,
}

impl PlaygroundController {
    pub fn new(api: Arc<dyn PlaygroundApi>, base_url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let tx = events.clone();
        // No receivers is fine; the send result is irrelevant.
        let listener: StateListener = Arc::new(move |change: StateChange| {
            let _ = tx.send(change);
        });

        Self {
            base_url: base_url.into(),
            session: SessionStore::new(api.clone()).with_listener(listener.clone()),
            text: RequestLifecycle::new(TextGeneration, api.clone())
                .with_listener(listener.clone()),
            image: RequestLifecycle::new(ImageGeneration, api.clone())
                .with_listener(listener.clone()),
            chat: RequestLifecycle::new(ChatTurn, api.clone()).with_listener(listener),
            api,
            local: Arc::new(Mutex::new(LocalView::default())),
            events,
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let api = HttpPlaygroundApi::from_config(cfg)?;
        Ok(Self::new(Arc::new(api), cfg.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    /// Runs the connectivity probe once per controller. Only the display text depends on it.
    pub async fn mount(&self) {
        {
            let mut local = self.local.lock().await;
            if local.mounted {
                return;
            }
            local.mounted = true;
        }

        let message = match self.api.probe().await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("connectivity probe failed: {e}");
                MSG_BACKEND_UNREACHABLE.into()
            }
        };

        self.local.lock().await.backend_message = message;
        let _ = self.events.send(StateChange::Probe);
    }

    /// Shows or hides the login form. Returns the new visibility flag.
    pub async fn toggle_login_form(&self) -> bool {
        let mut local = self.local.lock().await;
        local.login_form_open = !local.login_form_open;
        local.login_form_open
    }

    pub async fn login(&self, username: &str, password: &str) -> bool {
        let ok = self.session.login(username, password).await;
        if ok {
            self.local.lock().await.login_form_open = false;
        }
        ok
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn submit_text(&self, prompt: &str) -> Result<u64, LifecycleError> {
        self.text.submit(prompt).await
    }

    pub async fn submit_image(&self, prompt: &str) -> Result<u64, LifecycleError> {
        self.image.submit(prompt).await
    }

    pub async fn send_chat(&self, message: &str) -> Result<u64, LifecycleError> {
        self.chat.submit(message).await
    }

    pub async fn view(&self) -> ViewState {
        let (backend_message, login_form_open) = {
            let local = self.local.lock().await;
            (local.backend_message.clone(), local.login_form_open)
        };

        let parts = ViewParts {
            backend_message,
            login_form_open,
            session: self.session.snapshot().await,
            text: self.text.snapshot().await,
            image: self.image.snapshot().await,
            chat: self.chat.snapshot().await,
        };
        project(parts, &self.base_url)
    }
}

use serde::Serialize;
use stageai_core::types::{AuthStatus, ChatMessage, SlotResult};
use stageai_engine::lifecycle::LifecycleSnapshot;
use stageai_engine::operations::GenerationSlot;
use stageai_engine::session::SessionSnapshot;
use stageai_engine::transcript::ChatTranscript;
use stageai_providers::playground::resolve_asset_url;

/// Everything a front-end needs to draw the page. Built fresh on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub backend_message: String,
    pub auth: AuthView,
    pub login_form_visible: bool,
    pub text: TextView,
    pub image: ImageView,
    pub chat: ChatView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthView {
    pub status: AuthStatus,
    pub message: Option<String>,
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextView {
    pub pending: bool,
    pub generated_text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub pending: bool,
    // Absolute URL, ready to display.
    pub image_src: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatView {
    pub pending: bool,
    pub messages: Vec<ChatMessage>,
}

pub(crate) struct ViewParts {
    pub backend_message: String,
    pub login_form_open: bool,
    pub session: SessionSnapshot,
    pub text: LifecycleSnapshot<GenerationSlot>,
    pub image: LifecycleSnapshot<GenerationSlot>,
    pub chat: LifecycleSnapshot<ChatTranscript>,
}

pub(crate) fn project(parts: ViewParts, base_url: &str) -> ViewState {
    let logged_in = parts.session.status.is_logged_in();

    let auth = AuthView {
        message: parts.session.status.display_message().map(str::to_string),
        identity: parts.session.identity.map(|i| i.0),
        status: parts.session.status,
    };

    let (generated_text, text_error) = split(parts.text.slot.result);
    let (image_path, image_error) = split(parts.image.slot.result);

    ViewState {
        backend_message: parts.backend_message,
        auth,
        // The form is never shown over an authenticated page.
        login_form_visible: parts.login_form_open && !logged_in,
        text: TextView {
            pending: parts.text.pending,
            generated_text,
            error: text_error,
        },
        image: ImageView {
            pending: parts.image.pending,
            image_src: image_path.map(|p| resolve_asset_url(base_url, &p)),
            error: image_error,
        },
        chat: ChatView {
            pending: parts.chat.pending,
            messages: parts.chat.slot.messages().to_vec(),
        },
    }
}

fn split(result: Option<SlotResult>) -> (Option<String>, Option<String>) {
    match result {
        Some(SlotResult::Ready(v)) => (Some(v), None),
        Some(SlotResult::Failed(m)) => (None, Some(m)),
        None => (None, None),
    }
}

use stageai_appcore::view::{AuthView, ChatView, ImageView, TextView, ViewState};
use stageai_core::types::{ChatMessage, Role};

pub fn render_backend(message: &str) -> String {
    format!("Message du backend : {message}")
}

pub fn render_auth(auth: &AuthView, login_form_visible: bool) -> String {
    let mut out = match &auth.identity {
        Some(user) if auth.status.is_logged_in() => format!("[connecté: {user}]"),
        _ => "[non connecté]".to_string(),
    };
    if let Some(message) = &auth.message {
        out.push(' ');
        out.push_str(message);
    }
    if login_form_visible {
        out.push_str(" (formulaire de connexion ouvert)");
    }
    out
}

pub fn render_text(text: &TextView) -> String {
    if text.pending {
        return "Texte : Génération...".into();
    }
    match (&text.generated_text, &text.error) {
        (Some(t), _) => format!("Texte généré :\n{t}"),
        (None, Some(e)) => format!("Texte : {e}"),
        (None, None) => "Texte : -".into(),
    }
}

pub fn render_image(image: &ImageView) -> String {
    if image.pending {
        return "Image : Génération...".into();
    }
    match (&image.image_src, &image.error) {
        (Some(src), _) => format!("Image générée : {src}"),
        (None, Some(e)) => format!("Image : {e}"),
        (None, None) => "Image : -".into(),
    }
}

fn render_message(m: &ChatMessage) -> String {
    let who = match m.role {
        Role::User => "Vous",
        Role::Assistant => "IA",
    };
    format!("{who}: {}", m.content)
}

/// The loading marker is drawn after the transcript, never inside it.
pub fn render_chat(chat: &ChatView) -> String {
    let mut lines: Vec<String> = if chat.messages.is_empty() {
        vec!["Commencez la conversation...".into()]
    } else {
        chat.messages.iter().map(render_message).collect()
    };
    if chat.pending {
        lines.push("...".into());
    }
    lines.join("\n")
}

pub fn render_last_exchange(chat: &ChatView) -> String {
    let start = chat.messages.len().saturating_sub(2);
    chat.messages[start..]
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_view(view: &ViewState) -> String {
    [
        render_auth(&view.auth, view.login_form_visible),
        render_backend(&view.backend_message),
        render_text(&view.text),
        render_image(&view.image),
        render_chat(&view.chat),
    ]
    .join("\n")
}

use thiserror::Error;

// User-facing strings. The product UI is French.
pub const MSG_LOGGED_IN: &str = "Connecté !";
pub const MSG_LOGGED_OUT: &str = "Déconnecté.";
pub const MSG_FILL_ALL_FIELDS: &str = "Veuillez remplir tous les champs.";
pub const MSG_LOGIN_FAILED: &str = "Erreur de connexion";
pub const MSG_SERVER_UNREACHABLE: &str = "Erreur de connexion au serveur";
pub const MSG_BACKEND_UNREACHABLE: &str = "Erreur de connexion au backend";
pub const MSG_TEXT_FAILED: &str = "Erreur lors de la génération.";
pub const MSG_IMAGE_FAILED: &str = "Erreur lors de la génération de l'image.";
pub const MSG_CHAT_AI_FAILED: &str = "Erreur de l'IA.";
pub const MSG_CHAT_CONNECTION_FAILED: &str = "Erreur de connexion.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required field `{0}` is empty")]
pub struct BlankField(pub &'static str);

/// Presence check shared by every submission path. Whitespace-only counts as blank.
pub fn require_present<'a>(field: &'static str, value: &'a str) -> Result<&'a str, BlankField> {
    if value.trim().is_empty() {
        return Err(BlankField(field));
    }
    Ok(value)
}

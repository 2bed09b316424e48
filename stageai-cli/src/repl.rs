#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    ToggleLoginForm,
    Login { username: String, password: String },
    Logout,
    Text(String),
    Image(String),
    Chat(String),
    Quit,
}

pub const HELP: &str = "\
commands:
  status                     show the whole page
  form                       show/hide the login form
  login <username> <password>
  logout
  text <prompt>              generate text
  image <prompt>             generate an image
  chat <message>             send a chat message
  help
  quit";

/// Parses one input line. Empty lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };

    // Payload presence is validated downstream; an empty prompt is passed through.
    let cmd = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "status" => Command::Status,
        "form" => Command::ToggleLoginForm,
        "logout" => Command::Logout,
        "quit" | "exit" => Command::Quit,
        "text" => Command::Text(rest.to_string()),
        "image" => Command::Image(rest.to_string()),
        "chat" => Command::Chat(rest.to_string()),
        "login" => {
            let mut parts = rest.split_whitespace();
            let username = parts.next().unwrap_or_default().to_string();
            let password = parts.next().unwrap_or_default().to_string();
            if parts.next().is_some() {
                return Err("usage: login <username> <password>".into());
            }
            Command::Login { username, password }
        }
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(cmd))
}

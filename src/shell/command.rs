//! Line-oriented commands accepted by the shell.

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; try `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Whoami,
    Menu,
    Open(String),
    Refresh,
    Help,
    Quit,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => {
                f.debug_struct("Login").field("username", username).field("password", &"<redacted>").finish()
            }
            Self::Logout => f.write_str("Logout"),
            Self::Whoami => f.write_str("Whoami"),
            Self::Menu => f.write_str("Menu"),
            Self::Open(path) => f.debug_tuple("Open").field(path).finish(),
            Self::Refresh => f.write_str("Refresh"),
            Self::Help => f.write_str("Help"),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

pub const HELP: &str = "\
commands:
  login <username> <password>  sign in
  logout                       sign out
  whoami                       show the current user
  menu                         show the navigation for your role
  open <path>                  go to a page, e.g. `open /patients`
  refresh                      re-check the session and pending counts
  help                         this text
  quit                         leave";

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// [`CommandError`] for unknown commands or wrong arguments.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("login", [username, password]) => {
            Command::Login { username: (*username).to_owned(), password: (*password).to_owned() }
        }
        ("login", _) => return Err(CommandError::Usage("login <username> <password>")),
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::Whoami,
        ("menu", []) => Command::Menu,
        ("open", [path]) if path.starts_with('/') => Command::Open((*path).to_owned()),
        ("open", _) => return Err(CommandError::Usage("open <path starting with />")),
        ("refresh", []) => Command::Refresh,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        ("logout" | "whoami" | "menu" | "refresh", _) => return Err(CommandError::Usage("command takes no arguments")),
        (other, _) => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

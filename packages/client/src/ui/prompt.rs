//! Prompt handling and command parsing for the terminal client.

use std::io::Write;

/// Redisplay the prompt after printing an event
pub fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    std::io::stdout().flush().ok();
}

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Create,
    Start,
    Kick(String),
    Status,
    Help,
    Quit,
}

impl UserCommand {
    /// Parse one input line.
    ///
    /// # Returns
    ///
    /// * `Ok(command)` - recognised command
    /// * `Err(message)` - what to tell the user instead
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err("empty command".to_string());
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "create" => Self::Create,
            "start" => Self::Start,
            "kick" => match words.next() {
                Some(user_id) => Self::Kick(user_id.to_string()),
                None => return Err("usage: kick <userId>".to_string()),
            },
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}', type 'help'", other)),
        };
        if words.next().is_some() {
            return Err(format!("too many arguments for '{}'", head));
        }
        Ok(command)
    }
}

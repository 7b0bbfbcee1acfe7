//! Chat commands: chat lines starting with `::` are commands rather than messages

use thiserror::Error;

pub const COMMAND_PREFIX: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `::playerName <name>` sets the sender's display name if it has none yet
    PlayerName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("not a command: missing '::' prefix")]
    NotACommand,
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("command '{0}' expects an argument")]
    MissingArgument(String),
}

pub fn is_command(text: &str) -> bool {
    text.starts_with(COMMAND_PREFIX)
}

impl ChatCommand {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let body = text
            .strip_prefix(COMMAND_PREFIX)
            .ok_or(CommandError::NotACommand)?;

        let (name, args) = match body.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (body.trim_end(), ""),
        };

        match name {
            "" => Err(CommandError::Empty),
            "playerName" if args.is_empty() => Err(CommandError::MissingArgument(name.to_string())),
            "playerName" => Ok(ChatCommand::PlayerName(args.to_string())),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

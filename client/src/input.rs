//! Terminal input: each line typed by the player becomes one action

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Sent to the server as-is; `::` lines are server commands
    Chat(String),
    ShowScores,
    Quit,
}

impl InputAction {
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "" => None,
            "/scores" => Some(InputAction::ShowScores),
            "/quit" => Some(InputAction::Quit),
            text => Some(InputAction::Chat(text.to_string())),
        }
    }
}

/// Reads actions from stdin
pub struct InputManager {
    lines: Lines<BufReader<Stdin>>,
    closed: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            closed: false,
        }
    }

    /// Waits for the next non-empty line. Once stdin is closed this never resolves, so it can
    /// sit in a `select!` next to the network without spinning.
    pub async fn next_action(&mut self) -> InputAction {
        while !self.closed {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(action) = InputAction::from_line(&line) {
                        return action;
                    }
                }
                Ok(None) | Err(_) => self.closed = true,
            }
        }
        std::future::pending().await
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

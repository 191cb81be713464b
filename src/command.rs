//! Text commands received from the chat.
//!
//! Nobody is authenticated: whoever can write to the bot can close the door.

use log::info;

use crate::notifier::Keyboard;

pub const CLOSE: &str = "close";

/// The last command read from the chat and whether it has been acted on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Command {
    pub keyword: Option<String>,
    pub executed: bool,
}

impl Command {
    /// Replace the command with newly received text. A new message re-arms
    /// the command even if it repeats the previous keyword.
    pub fn receive(&mut self, text: &str) {
        info!("receive: new command '{}'", text);
        self.keyword = Some(text.to_string());
        self.executed = false;
    }

    /// A close request that has not been carried out yet.
    pub fn close_pending(&self) -> bool {
        !self.executed && self.keyword.as_deref() == Some(CLOSE)
    }

    pub fn mark_executed(&mut self) {
        self.executed = true;
    }
}

/// Commands understood in direct chat mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChatCommand {
    Joke,
    Led,
    Status,
}

impl ChatCommand {
    pub fn parse(text: &str) -> Option<Self> {
        // Group chats append the bot name, as in /joke@garage_bot
        let keyword = text.trim().split('@').next().unwrap_or("");
        match keyword {
            "/joke" => Some(ChatCommand::Joke),
            "/led" => Some(ChatCommand::Led),
            "/status" => Some(ChatCommand::Status),
            _ => None,
        }
    }

    pub fn keyboard() -> Keyboard {
        Keyboard::one_time(vec![vec!["/status", "/led"], vec!["/joke"]])
    }
}

const JOKES: &[&str] = &[
    "Why did the garage door break up with the car? It felt taken for granted every time it opened up.",
    "I bought a garage door opener. It's a little remote, but it always gets through.",
    "My garage door has a great sense of humour. It always cracks up when I come home.",
    "What does a garage door say after a long day? I'm completely shut down.",
];

/// Pick a joke, cycling through the list with `seed`.
pub fn joke(seed: usize) -> &'static str {
    JOKES[seed % JOKES.len()]
}

//! [`Notifier`] backed by the Telegram Bot API.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use json::{object, JsonValue};
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::notifier::{InboundMessage, Keyboard, Notifier};

const API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// Telegram forgets update ids after a week, an older cursor is meaningless.
const CURSOR_MAX_AGE: i64 = 7 * 24 * 60 * 60;

/// The last update that was consumed, persisted across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor {
    pub last_update_id: i64,
    /// Unix timestamp of the last consumed message
    pub last_update_time: i64,
}

impl UpdateCursor {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let value = json::parse(&contents)?;
        Ok(UpdateCursor {
            last_update_id: value["last_upd_id"].as_i64().unwrap_or(0),
            last_update_time: value["time_of_last_upd"].as_i64().unwrap_or(0),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let value = object! {
            last_upd_id: self.last_update_id,
            time_of_last_upd: self.last_update_time
        };
        fs::write(path, json::stringify(value))?;
        Ok(())
    }

    /// The `offset` to request updates with.
    pub fn offset(&self, now: i64) -> i64 {
        if now - self.last_update_time < CURSOR_MAX_AGE {
            self.last_update_id + 1
        } else {
            1
        }
    }
}

pub struct TelegramBot {
    agent: ureq::Agent,
    base_url: String,
    cursor: UpdateCursor,
    cursor_path: PathBuf,
}

impl TelegramBot {
    pub fn new(token: &str, cursor_path: PathBuf) -> Result<Self> {
        let cursor = UpdateCursor::load(&cursor_path)?;
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Ok(TelegramBot {
            agent,
            base_url: format!("{}/bot{}", API_URL, token),
            cursor,
            cursor_path,
        })
    }

    fn post_message(&self, fields: &[(&str, &str)]) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = read_body(self.agent.post(&url).send_form(fields))?;
        api_result(&body, "sendMessage")?;
        Ok(())
    }
}

impl Notifier for TelegramBot {
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<()> {
        self.post_message(&[("chat_id", &chat_id.to_string()), ("text", text)])
    }

    fn send_keyboard_message(&mut self, chat_id: i64, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.post_message(&[
            ("chat_id", &chat_id.to_string()),
            ("text", text),
            ("reply_markup", &keyboard.to_json()),
        ])
    }

    fn poll_inbox(&mut self) -> Result<Option<InboundMessage>> {
        let offset = self.cursor.offset(unix_now());
        let url = format!("{}/getUpdates", self.base_url);
        let request = self
            .agent
            .get(&url)
            .query("offset", &offset.to_string())
            .query("allowed_updates", r#"["message"]"#);
        let body = read_body(request.call())?;
        let result = api_result(&body, "getUpdates")?;
        Ok(self.consume(&result, unix_now()))
    }
}

impl TelegramBot {
    /// Advance the cursor past `result` and return its newest text message.
    /// The message is handed out even when the cursor cannot be persisted.
    fn consume(&mut self, result: &JsonValue, now: i64) -> Option<InboundMessage> {
        match newest_update(result, now) {
            Some((cursor, message)) => {
                info!("poll_inbox: received update {}", cursor.last_update_id);
                self.cursor = cursor;
                if let Err(err) = self.cursor.save(&self.cursor_path) {
                    warn!(
                        "poll_inbox: unable to save cursor to {}: {}",
                        self.cursor_path.display(),
                        err
                    );
                }
                message
            }
            None => {
                debug!("poll_inbox: no new updates");
                None
            }
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs() as i64)
        .unwrap_or(0)
}

// The API answers errors with a JSON body too, so keep it for the description.
fn read_body(response: std::result::Result<ureq::Response, ureq::Error>) -> Result<String> {
    match response {
        Ok(response) => Ok(response.into_string()?),
        Err(ureq::Error::Status(_, response)) => Ok(response.into_string()?),
        Err(err) => Err(err.into()),
    }
}

/// Unwrap the `result` of an API response, turning `ok: false` into an error.
fn api_result(body: &str, method: &str) -> Result<JsonValue> {
    let mut value = json::parse(body)?;
    if value["ok"].as_bool() != Some(true) {
        return Err(Error::transport(format!(
            "{} failed: {}",
            method,
            value["description"].as_str().unwrap_or("no description")
        )));
    }
    Ok(value["result"].take())
}

/// The cursor past the last update and the newest text message, if any.
fn newest_update(result: &JsonValue, now: i64) -> Option<(UpdateCursor, Option<InboundMessage>)> {
    let last = result.members().last()?;
    let last_update_id = last["update_id"].as_i64()?;
    let cursor = UpdateCursor {
        last_update_id,
        last_update_time: last["message"]["date"].as_i64().unwrap_or(now),
    };
    let message = result.members().rev().find_map(|update| {
        let message = &update["message"];
        Some(InboundMessage {
            id: update["update_id"].as_i64()?,
            text: message["text"].as_str()?.to_string(),
            date: message["date"].as_i64().unwrap_or(now),
        })
    });
    Some((cursor, message))
}

use crate::error::Result;

/// The newest message found in the inbox since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: i64,
    pub text: String,
    /// Unix timestamp of the message
    pub date: i64,
}

/// A reply keyboard shown to the chat members instead of the regular keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
    pub one_time: bool,
}

impl Keyboard {
    pub fn one_time<R, B>(rows: R) -> Self
    where
        R: IntoIterator<Item = B>,
        B: IntoIterator<Item = &'static str>,
    {
        Keyboard {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
            one_time: true,
        }
    }

    pub fn to_json(&self) -> String {
        let rows: Vec<json::JsonValue> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|button| button.as_str()).collect::<Vec<_>>().into())
            .collect();
        json::stringify(json::object! {
            keyboard: rows,
            one_time_keyboard: self.one_time,
            resize_keyboard: true
        })
    }
}

/// The remote messaging channel. Sending is fire-and-forget from the point of
/// view of the control loop: callers log failures and carry on.
pub trait Notifier {
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<()>;

    fn send_keyboard_message(&mut self, chat_id: i64, text: &str, keyboard: &Keyboard) -> Result<()>;

    /// Fetch the newest unseen message, advancing the cursor past everything
    /// that was returned by the server.
    fn poll_inbox(&mut self) -> Result<Option<InboundMessage>>;
}

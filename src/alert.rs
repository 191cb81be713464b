use std::time::{Duration, Instant};

use log::{error, info};
use time::Time;

use crate::notifier::Notifier;

pub const DOOR_OPEN_MESSAGE: &str = "The garage door is open";

pub fn seconds_since_midnight(time: Time) -> u32 {
    u32::from(time.hour()) * 3600 + u32::from(time.minute()) * 60 + u32::from(time.second())
}

pub fn is_past_deadline(now: Time, deadline: Time) -> bool {
    seconds_since_midnight(now) >= seconds_since_midnight(deadline)
}

/// Nags the group chat while the door is left open.
///
/// The first message goes out as soon as the alarm is raised, reminders
/// follow every `reminder_delay` until the alarm is cleared by a closed door.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Alarm {
    pub active: bool,
    pub last_sent: Option<Instant>,
}

impl Alarm {
    /// Raise the alarm if needed and send a message when one is due. Returns
    /// whether a message was sent.
    pub fn maybe_send<N: Notifier>(
        &mut self,
        notifier: &mut N,
        chat_id: i64,
        now: Instant,
        reminder_delay: Duration,
    ) -> bool {
        if !self.active {
            info!("maybe_send: door open past the deadline, raising alarm");
            self.active = true;
        }
        let due = match self.last_sent {
            None => true,
            Some(sent) => sent.checked_add(reminder_delay).map_or(false, |due| now >= due),
        };
        if !due {
            return false;
        }
        // A failed send leaves `last_sent` alone so the next tick tries again.
        match notifier.send_message(chat_id, DOOR_OPEN_MESSAGE) {
            Ok(()) => {
                self.last_sent = Some(now);
                true
            }
            Err(err) => {
                error!("maybe_send: unable to send alarm: {}", err);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        if self.active {
            info!("clear: door closed, alarm cleared");
        }
        *self = Alarm::default();
    }
}

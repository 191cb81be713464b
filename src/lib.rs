pub mod alert;
pub mod chat;
pub mod command;
pub mod config;
pub mod control;
mod door_state;
pub mod error;
pub mod http;
pub mod led;
pub mod notifier;
pub mod relay;
pub mod reposition;
pub mod sensor;
pub mod telegram;

use std::time::Instant;

pub use door_state::DoorPosition;

#[macro_export]
macro_rules! term_on_err {
    ($expr:expr, $term:expr) => {
        match $expr {
            std::result::Result::Ok(val) => val,
            std::result::Result::Err(err) => {
                log::error!("setting term due to error: {}", err);
                $term.store(true, std::sync::atomic::Ordering::SeqCst);
                break;
            }
        }
    };
}

/// What the control loop last observed, shared read-only with the status page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub position: DoorPosition,
    pub open_since: Option<Instant>,
    pub alarm_active: bool,
    pub notified_at: Option<Instant>,
}

impl Default for Status {
    fn default() -> Self {
        Status {
            position: DoorPosition::Unknown,
            open_since: None,
            alarm_active: false,
            notified_at: None,
        }
    }
}

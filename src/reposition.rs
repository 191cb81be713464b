//! Moving the door to a target position with one retry.
//!
//! The opener has a single button that cycles the motor, so a pulse may stop
//! or reverse the door instead of finishing the move. After a pulse the
//! position is checked; one more pulse is allowed, after that a human has to
//! look at the door. Pulsing without bound risks the motor.

use log::{error, info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::notifier::Notifier;
use crate::relay::Actuator;
use crate::sensor::{DoorSensors, Switch};
use crate::DoorPosition;

const MAX_ATTEMPTS: u32 = 2;

pub const ESCALATION_MESSAGE: &str =
    "The garage door could not be moved into position after repeated attempts and needs to be checked manually.";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Success,
    Failed,
}

pub fn success_message(target: DoorPosition) -> String {
    format!("The garage door was moved to position '{}'.", target)
}

/// Pulse the relay until the sensors report `target`, at most twice.
///
/// Errors from the actuator are returned as is; notification failures are
/// only logged.
pub fn reposition<S, A, N>(
    target: DoorPosition,
    sensors: &DoorSensors<S>,
    actuator: &mut A,
    notifier: &mut N,
    settings: &Settings,
) -> Result<Outcome>
where
    S: Switch,
    A: Actuator,
    N: Notifier,
{
    for attempt in 1..=MAX_ATTEMPTS {
        actuator.pulse(settings.relay_on_time, settings.door_transition_time)?;
        let position = sensors.read_position();
        if position == target {
            info!("reposition: door reached {} after {} pulse(s)", target, attempt);
            send(notifier, settings.chat_id, &success_message(target));
            return Ok(Outcome::Success);
        }
        warn!(
            "reposition: door is {} after pulse {}, expected {}",
            position, attempt, target
        );
    }

    error!("reposition: door could not be moved to {}, manual inspection required", target);
    send(notifier, settings.chat_id, ESCALATION_MESSAGE);
    Ok(Outcome::Failed)
}

fn send<N: Notifier>(notifier: &mut N, chat_id: i64, text: &str) {
    if let Err(err) = notifier.send_message(chat_id, text) {
        error!("reposition: unable to send notification: {}", err);
    }
}

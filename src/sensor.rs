//! The two end-stop switches that report where the door is.

use log::warn;
use rppal::gpio::InputPin;

use crate::DoorPosition;

/// A single digital input that is either pressed or not.
pub trait Switch {
    fn is_pressed(&self) -> bool;
}

// The switches pull the input to ground when pressed.
impl Switch for InputPin {
    fn is_pressed(&self) -> bool {
        self.is_low()
    }
}

pub struct DoorSensors<S> {
    closed_switch: S,
    open_switch: S,
}

impl<S: Switch> DoorSensors<S> {
    pub fn new(closed_switch: S, open_switch: S) -> Self {
        DoorSensors {
            closed_switch,
            open_switch,
        }
    }

    /// Query the current door position. Has no side effects besides logging
    /// an invalid switch combination.
    pub fn read_position(&self) -> DoorPosition {
        let closed = self.closed_switch.is_pressed();
        let open = self.open_switch.is_pressed();
        let position = DoorPosition::from_switches(closed, open);
        if position == DoorPosition::Unknown {
            warn!("read_position: closed and open switches are both pressed, check the sensors");
        }
        position
    }
}

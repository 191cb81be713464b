use std::thread;
use std::time::Duration;

use rppal::gpio::OutputPin;

use crate::DoorPosition;

const BLINK_DURATION: Duration = Duration::from_millis(100);

pub struct StatusLed {
    pin: OutputPin,
    enabled: bool,
}

impl StatusLed {
    pub fn new(pin: OutputPin) -> Self {
        StatusLed { pin, enabled: true }
    }

    /// One blink for closed, two for open, three for anything else.
    pub fn flash_position(&mut self, position: DoorPosition) {
        if !self.enabled {
            return;
        }
        let times = match position {
            DoorPosition::Closed => 1,
            DoorPosition::Open => 2,
            DoorPosition::InTransition | DoorPosition::Unknown => 3,
        };
        (0..times).for_each(|_| {
            self.pin.set_high();
            thread::sleep(BLINK_DURATION);
            self.pin.set_low();
            thread::sleep(BLINK_DURATION);
        })
    }

    /// Switch the LED between steady on and off, returning whether it is on now.
    /// While it is on the position flashes are suppressed.
    pub fn toggle(&mut self) -> bool {
        self.pin.toggle();
        self.enabled = !self.pin.is_set_high();
        self.pin.is_set_high()
    }
}

//! The relay wired in parallel to the door opener's push button.

use std::thread;
use std::time::Duration;

use log::info;
use rppal::gpio::Gpio;

use crate::error::Result;

/// Something that can simulate a press of the door opener button.
pub trait Actuator {
    /// Drive the output high for `pulse`, low again, then block for `settle`
    /// so the door can finish moving before the caller looks at it.
    fn pulse(&mut self, pulse: Duration, settle: Duration) -> Result<()>;
}

/// The relay pin is acquired for each pulse, so a pin that cannot be acquired
/// surfaces as an error on the pulse itself. Between pulses the pin stays a
/// low output instead of floating as an input.
pub struct Relay {
    gpio: Gpio,
    pin: u8,
}

impl Relay {
    pub fn new(gpio: Gpio, pin: u8) -> Self {
        Relay { gpio, pin }
    }
}

impl Actuator for Relay {
    fn pulse(&mut self, pulse: Duration, settle: Duration) -> Result<()> {
        let mut relay = self.gpio.get(self.pin)?.into_output();
        relay.set_reset_on_drop(false);
        relay.set_high();
        info!("pulse: relay on pin {} activated for {:?}", self.pin, pulse);
        thread::sleep(pulse);
        relay.set_low();
        drop(relay);
        thread::sleep(settle);
        Ok(())
    }
}

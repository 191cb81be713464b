//! The control loop: one tick reads the chat and the sensors, then closes the
//! door on request or nags about it when it stays open.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use log::{error, info, warn};
use time::Time;

use crate::alert::{self, Alarm};
use crate::command::Command;
use crate::config::{Settings, SettingsSource};
use crate::error::Result;
use crate::led::StatusLed;
use crate::notifier::Notifier;
use crate::relay::Actuator;
use crate::reposition::{self, Outcome};
use crate::sensor::{DoorSensors, Switch};
use crate::{term_on_err, DoorPosition, Status};

pub const STARTUP_MESSAGE: &str = "Garage door monitoring has started";

pub const UNKNOWN_POSITION_MESSAGE: &str =
    "The garage door was not closed: its sensors report an impossible position and need to be checked manually.";

// Upper bound on one sleep so a termination signal is noticed promptly.
const MAX_SLEEP: Duration = Duration::from_secs(1);

pub struct Controller<S, A, N> {
    sensors: DoorSensors<S>,
    actuator: A,
    notifier: N,
    pub command: Command,
    pub alarm: Alarm,
    pub open_since: Option<Instant>,
    position: DoorPosition,
}

impl<S, A, N> Controller<S, A, N>
where
    S: Switch,
    A: Actuator,
    N: Notifier,
{
    pub fn new(sensors: DoorSensors<S>, actuator: A, notifier: N) -> Self {
        Controller {
            sensors,
            actuator,
            notifier,
            command: Command::default(),
            alarm: Alarm::default(),
            open_since: None,
            position: DoorPosition::Unknown,
        }
    }

    pub fn announce_start(&mut self, chat_id: i64) {
        if let Err(err) = self.notifier.send_message(chat_id, STARTUP_MESSAGE) {
            error!("announce_start: unable to send startup message: {}", err);
        }
    }

    /// Run one iteration against the given settings. Only a failure to drive
    /// the relay is returned as an error.
    pub fn tick(&mut self, settings: &Settings, now: Instant, time_of_day: Time) -> Result<DoorPosition> {
        match self.notifier.poll_inbox() {
            Ok(Some(message)) => self.command.receive(&message.text),
            Ok(None) => {}
            Err(err) => error!("tick: unable to poll inbox: {}", err),
        }

        let position = self.sensors.read_position();
        self.position = position;
        if position.is_closed() {
            self.door_closed();
            if self.command.close_pending() {
                info!("tick: door already closed, nothing to do for close command");
                self.command.mark_executed();
            }
            return Ok(position);
        }

        self.open_since.get_or_insert(now);

        if self.command.close_pending() {
            if position == DoorPosition::Unknown {
                // Pulsing with inconsistent sensors could just as well open the door.
                warn!("tick: close requested but door position is unknown, not actuating");
                self.command.mark_executed();
                if let Err(err) = self.notifier.send_message(settings.chat_id, UNKNOWN_POSITION_MESSAGE) {
                    error!("tick: unable to send notification: {}", err);
                }
                return Ok(position);
            }
            let outcome = reposition::reposition(
                DoorPosition::Closed,
                &self.sensors,
                &mut self.actuator,
                &mut self.notifier,
                settings,
            )?;
            self.command.mark_executed();
            if outcome == Outcome::Success {
                self.position = DoorPosition::Closed;
                self.door_closed();
            }
            return Ok(self.position);
        }

        if alert::is_past_deadline(time_of_day, settings.deadline) {
            self.alarm
                .maybe_send(&mut self.notifier, settings.chat_id, now, settings.reminder_delay);
        }
        Ok(position)
    }

    fn door_closed(&mut self) {
        self.alarm.clear();
        self.open_since = None;
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn status(&self) -> Status {
        Status {
            position: self.position,
            open_since: self.open_since,
            alarm_active: self.alarm.active,
            notified_at: self.alarm.last_sent,
        }
    }
}

/// Tick until `term` is set, publishing the observed state after every tick.
///
/// Each tick takes at least `loop_sleep_time`; a tick that overruns is
/// followed immediately by the next one.
pub fn run<S, A, N>(
    controller: &mut Controller<S, A, N>,
    source: &mut SettingsSource,
    status: &RwLock<Status>,
    mut led: Option<&mut StatusLed>,
    term: &AtomicBool,
) -> Result<()>
where
    S: Switch,
    A: Actuator,
    N: Notifier,
{
    while !term.load(Ordering::Relaxed) {
        let tick_start = Instant::now();
        let settings = source.reload().clone();
        let time_of_day = local_time_of_day()?;

        let position = controller.tick(&settings, tick_start, time_of_day)?;
        *term_on_err!(status.write(), term) = controller.status();
        if let Some(led) = led.as_mut() {
            led.flash_position(position);
        }

        loop {
            let elapsed = tick_start.elapsed();
            if elapsed >= settings.loop_sleep_time || term.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep((settings.loop_sleep_time - elapsed).min(MAX_SLEEP));
        }
    }
    info!("run: control loop exiting");
    Ok(())
}

/// The current wall clock time in the local time zone.
pub fn local_time_of_day() -> io::Result<Time> {
    let now = Local::now();
    // chrono reports a leap second as second 59 with extra nanoseconds
    Time::from_hms(now.hour() as u8, now.minute() as u8, now.second() as u8)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

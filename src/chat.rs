//! Direct chat mode: answer slash commands instead of guarding the door.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::command::{self, ChatCommand};
use crate::led::StatusLed;
use crate::notifier::Notifier;
use crate::sensor::{DoorSensors, Switch};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ChatBot<S, N> {
    sensors: DoorSensors<S>,
    notifier: N,
    led: Option<StatusLed>,
    chat_id: i64,
    jokes_told: usize,
}

impl<S: Switch, N: Notifier> ChatBot<S, N> {
    pub fn new(sensors: DoorSensors<S>, notifier: N, led: Option<StatusLed>, chat_id: i64) -> Self {
        ChatBot {
            sensors,
            notifier,
            led,
            chat_id,
            jokes_told: 0,
        }
    }

    /// The reply to a command.
    pub fn handle(&mut self, command: ChatCommand) -> String {
        match command {
            ChatCommand::Joke => {
                self.jokes_told += 1;
                command::joke(self.jokes_told - 1).to_string()
            }
            ChatCommand::Led => match self.led.as_mut() {
                Some(led) => {
                    let state = if led.toggle() { "on" } else { "off" };
                    format!("LED is {}", state)
                }
                None => String::from("No status LED is configured"),
            },
            ChatCommand::Status => format!("The garage door is: {}", self.sensors.read_position()),
        }
    }

    /// Poll the inbox once and answer a recognised command. Unknown text is
    /// ignored.
    pub fn poll(&mut self) {
        let message = match self.notifier.poll_inbox() {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(err) => {
                error!("poll: unable to poll inbox: {}", err);
                return;
            }
        };
        let command = match ChatCommand::parse(&message.text) {
            Some(command) => command,
            None => {
                debug!("poll: ignoring '{}'", message.text);
                return;
            }
        };
        let reply = self.handle(command);
        self.send(&reply);
    }

    pub fn run(&mut self, term: &AtomicBool) {
        self.send("Up and running ;)");
        if let Err(err) =
            self.notifier
                .send_keyboard_message(self.chat_id, "Choose:", &ChatCommand::keyboard())
        {
            error!("run: unable to send keyboard: {}", err);
        }
        while !term.load(Ordering::Relaxed) {
            self.poll();
            thread::sleep(POLL_INTERVAL);
        }
        info!("run: chat loop exiting");
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn send(&mut self, text: &str) {
        if let Err(err) = self.notifier.send_message(self.chat_id, text) {
            error!("send: unable to send message: {}", err);
        }
    }
}

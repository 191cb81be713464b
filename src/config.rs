use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Time;

use crate::error::{Error, Result};

const DEADLINE_FORMAT: &[FormatItem<'_>] = format_description!("[hour]:[minute]:[second]");

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct RawConfig {
    /// Telegram bot token
    pub bot_token: String,

    /// Chat that receives alerts and whose messages are read as commands
    pub chat_id_group: i64,

    /// Time of day (HH:MM) after which an open door raises the alarm
    pub deadline: String,

    /// Longest expected opening in seconds; validated with the rest but not acted on
    pub max_open_time: f64,

    /// Minimum length of one control loop iteration in seconds
    pub loop_sleep_time: u64,

    /// Seconds the relay is held closed to trigger the door motor
    #[serde(alias = "relay_activation_duration")]
    pub relay_on_time: f64,

    /// Seconds the door needs to travel between its end positions
    pub door_transition_time: f64,

    /// Minutes between reminder messages while the alarm is active
    pub reminder_delay: f64,

    /// File the Telegram update cursor is persisted in
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default)]
    pub pins: Pins,

    #[serde(default)]
    pub http: Http,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pins {
    pub closed_switch: u8,
    pub open_switch: u8,
    pub relay: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led: Option<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Pins {
            closed_switch: 2,
            open_switch: 21,
            relay: 12,
            led: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Http {
    pub address: String,
}

impl Default for Http {
    fn default() -> Self {
        Http {
            address: String::from("0.0.0.0:8888"),
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("updinf.json")
}

impl RawConfig {
    /// Parse the config file at the specified path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| Error::config(format!("unable to read {}: {}", path.display(), err)))?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn example() -> Self {
        RawConfig {
            bot_token: "123456:your-bot-token".to_string(),
            chat_id_group: -1001234567890,
            deadline: "21:00".to_string(),
            max_open_time: 1800.0,
            loop_sleep_time: 5,
            relay_on_time: 0.5,
            door_transition_time: 20.0,
            reminder_delay: 10.0,
            state_file: default_state_file(),
            pins: Pins::default(),
            http: Http::default(),
        }
    }
}

/// The values that may change while running. Reloaded every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bot_token: String,
    pub chat_id: i64,
    pub deadline: Time,
    pub max_open_time: Duration,
    pub loop_sleep_time: Duration,
    pub relay_on_time: Duration,
    pub door_transition_time: Duration,
    pub reminder_delay: Duration,
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
    pub state_file: PathBuf,
    pub pins: Pins,
    pub http: Http,
}

impl TryFrom<RawConfig> for Config {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        // HH:MM, seconds are always zero
        let deadline = Time::parse(&format!("{}:00", raw.deadline.trim()), DEADLINE_FORMAT)
            .map_err(|err| Error::config(format!("deadline '{}': {}", raw.deadline, err)))?;
        if raw.loop_sleep_time == 0 {
            return Err(Error::config("loop_sleep_time must be at least one second"));
        }
        let reminder_delay = seconds("reminder_delay", raw.reminder_delay * 60.0)?;
        if reminder_delay == Duration::ZERO {
            return Err(Error::config("reminder_delay must be positive"));
        }

        let settings = Settings {
            bot_token: raw.bot_token,
            chat_id: raw.chat_id_group,
            deadline,
            max_open_time: seconds("max_open_time", raw.max_open_time)?,
            loop_sleep_time: Duration::from_secs(raw.loop_sleep_time),
            relay_on_time: seconds("relay_on_time", raw.relay_on_time)?,
            door_transition_time: seconds("door_transition_time", raw.door_transition_time)?,
            reminder_delay,
        };
        Ok(Config {
            settings,
            state_file: raw.state_file,
            pins: raw.pins,
            http: raw.http,
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::config(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|err| Error::config(format!("{} is out of range: {}", name, err)))
}

pub fn load(path: &Path) -> Result<Config> {
    Config::try_from(RawConfig::load(path)?)
}

/// Rereads the config file, falling back to the last snapshot that validated.
pub struct SettingsSource {
    path: PathBuf,
    current: Settings,
}

impl SettingsSource {
    pub fn new(path: PathBuf, initial: Settings) -> Self {
        SettingsSource {
            path,
            current: initial,
        }
    }

    pub fn reload(&mut self) -> &Settings {
        match load(&self.path) {
            Ok(config) => self.current = config.settings,
            Err(err) => warn!(
                "reload: keeping previous settings, {} is invalid: {}",
                self.path.display(),
                err
            ),
        }
        &self.current
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }
}

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};
use std::{process, thread};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use rppal::gpio::{Gpio, InputPin};
use syslog::{BasicLogger, Facility, Formatter3164};

use garage_door_control::chat::ChatBot;
use garage_door_control::config::{self, Pins, RawConfig, SettingsSource};
use garage_door_control::control::{self, Controller};
use garage_door_control::led::StatusLed;
use garage_door_control::relay::Relay;
use garage_door_control::sensor::DoorSensors;
use garage_door_control::telegram::TelegramBot;
use garage_door_control::{http, Status};

const PROCESS_NAME: &str = "garage-door-control";

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log debug messages
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Watch the door and close it on request (default)
    Run,
    /// Answer chat commands like /joke, /led and /status
    Chat,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("main: failed to load config: {}", err);
            eprintln!("Error: Failed to load config: {}", err);
            eprintln!();
            eprintln!(
                "Example config:\n\n{}",
                toml::to_string(&RawConfig::example())?
            );
            process::exit(1);
        }
    };

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))?;

    let gpio = Gpio::new().context("Unable to access GPIO")?;
    let sensors = setup_sensors(&gpio, &config.pins).context("Unable to set up door sensors")?;
    let led = match config.pins.led {
        Some(pin) => Some(StatusLed::new(
            gpio.get(pin)
                .with_context(|| format!("Unable to set up LED on pin {}", pin))?
                .into_output(),
        )),
        None => None,
    };
    let bot = TelegramBot::new(&config.settings.bot_token, config.state_file.clone())
        .context("Unable to set up Telegram bot")?;

    if let Some(Mode::Chat) = args.mode {
        info!("main: starting in chat mode");
        ChatBot::new(sensors, bot, led, config.settings.chat_id).run(&term);
        return Ok(());
    }

    let status = Arc::new(RwLock::new(Status::default()));
    let server = match http::Server::new(config.http.address.as_str()) {
        Ok(server) => Arc::new(server),
        Err(err) => {
            error!("main: unable to start http server on {}: {}", config.http.address, err);
            process::exit(1);
        }
    };
    info!("main: http server running on {}", config.http.address);
    let server_thread = {
        let status = Arc::clone(&status);
        let server = Arc::clone(&server);
        thread::spawn(move || {
            server.handle_requests(status);
            info!("main: server thread exiting");
        })
    };

    let relay = Relay::new(gpio, config.pins.relay);
    let mut controller = Controller::new(sensors, relay, bot);
    controller.announce_start(config.settings.chat_id);

    let mut source = SettingsSource::new(args.config, config.settings);
    let mut led = led;
    let result = control::run(&mut controller, &mut source, &status, led.as_mut(), &term);

    server.shutdown();
    let _ = server_thread.join();

    result.context("Control loop stopped")
}

fn setup_sensors(gpio: &Gpio, pins: &Pins) -> rppal::gpio::Result<DoorSensors<InputPin>> {
    let closed = gpio.get(pins.closed_switch)?.into_input_pullup();
    let open = gpio.get(pins.open_switch)?.into_input_pullup();
    Ok(DoorSensors::new(closed, open))
}

fn setup_logging(verbose: bool) {
    let formatter = Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: PROCESS_NAME.into(),
        pid: process::id(),
    };
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let installed = syslog::unix(formatter)
        .map_err(|err| err.to_string())
        .and_then(|logger| {
            log::set_boxed_logger(Box::new(BasicLogger::new(logger))).map_err(|err| err.to_string())
        });
    match installed {
        Ok(()) => log::set_max_level(level),
        Err(err) => eprintln!("Unable to connect to syslog: {}", err),
    }
}

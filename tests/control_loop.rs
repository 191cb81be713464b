use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use time::Time;

use garage_door_control::alert::DOOR_OPEN_MESSAGE;
use garage_door_control::config::Settings;
use garage_door_control::control::{Controller, UNKNOWN_POSITION_MESSAGE};
use garage_door_control::error::{Error, Result};
use garage_door_control::notifier::{InboundMessage, Keyboard, Notifier};
use garage_door_control::relay::Actuator;
use garage_door_control::reposition::{success_message, ESCALATION_MESSAGE};
use garage_door_control::sensor::{DoorSensors, Switch};
use garage_door_control::DoorPosition;

#[derive(Clone)]
struct SharedSwitch(Rc<Cell<bool>>);

impl Switch for SharedSwitch {
    fn is_pressed(&self) -> bool {
        self.0.get()
    }
}

#[derive(Clone)]
struct Door {
    closed: Rc<Cell<bool>>,
    open: Rc<Cell<bool>>,
}

impl Door {
    fn new(position: DoorPosition) -> Self {
        let door = Door {
            closed: Rc::new(Cell::new(false)),
            open: Rc::new(Cell::new(false)),
        };
        door.set(position);
        door
    }

    fn set(&self, position: DoorPosition) {
        let (closed, open) = match position {
            DoorPosition::Closed => (true, false),
            DoorPosition::Open => (false, true),
            DoorPosition::InTransition => (false, false),
            DoorPosition::Unknown => (true, true),
        };
        self.closed.set(closed);
        self.open.set(open);
    }

    fn sensors(&self) -> DoorSensors<SharedSwitch> {
        DoorSensors::new(SharedSwitch(self.closed.clone()), SharedSwitch(self.open.clone()))
    }
}

struct Motor {
    door: Door,
    closes: bool,
    broken: bool,
    pulses: u32,
}

impl Actuator for Motor {
    fn pulse(&mut self, _pulse: Duration, _settle: Duration) -> Result<()> {
        if self.broken {
            return Err(Error::Gpio("relay pin unavailable".into()));
        }
        self.pulses += 1;
        if self.closes {
            self.door.set(DoorPosition::Closed);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Chat {
    inbox: VecDeque<String>,
    sent: Vec<String>,
}

impl Notifier for Chat {
    fn send_message(&mut self, _chat_id: i64, text: &str) -> Result<()> {
        self.sent.push(text.to_string());
        Ok(())
    }

    fn send_keyboard_message(&mut self, chat_id: i64, text: &str, _: &Keyboard) -> Result<()> {
        self.send_message(chat_id, text)
    }

    fn poll_inbox(&mut self) -> Result<Option<InboundMessage>> {
        Ok(self.inbox.pop_front().map(|text| InboundMessage {
            id: 1,
            text,
            date: 0,
        }))
    }
}

struct Setup {
    door: Door,
    controller: Controller<SharedSwitch, Motor, Chat>,
    settings: Settings,
}

fn setup(position: DoorPosition, closes: bool, inbox: &[&str]) -> Setup {
    let door = Door::new(position);
    let motor = Motor {
        door: door.clone(),
        closes,
        broken: false,
        pulses: 0,
    };
    let chat = Chat {
        inbox: inbox.iter().map(|text| text.to_string()).collect(),
        sent: Vec::new(),
    };
    let controller = Controller::new(door.sensors(), motor, chat);
    let settings = Settings {
        bot_token: String::from("token"),
        chat_id: 42,
        deadline: hm(18, 0),
        max_open_time: Duration::from_secs(3600),
        loop_sleep_time: Duration::from_secs(5),
        relay_on_time: Duration::from_millis(500),
        door_transition_time: Duration::from_secs(15),
        reminder_delay: Duration::from_secs(600),
    };
    Setup {
        door,
        controller,
        settings,
    }
}

fn hm(hour: u8, minute: u8) -> Time {
    Time::from_hms(hour, minute, 0).unwrap()
}

#[test]
fn open_before_deadline_does_nothing() {
    let mut s = setup(DoorPosition::Open, true, &[]);
    let position = s.controller.tick(&s.settings, Instant::now(), hm(12, 0)).unwrap();
    assert_eq!(position, DoorPosition::Open);
    assert!(s.controller.notifier().sent.is_empty());
    assert_eq!(s.controller.actuator().pulses, 0);
    assert!(!s.controller.alarm.active);
}

#[test]
fn open_after_deadline_alarms_once() {
    let mut s = setup(DoorPosition::Open, true, &[]);
    let start = Instant::now();
    s.controller.tick(&s.settings, start, hm(18, 30)).unwrap();
    assert_eq!(s.controller.notifier().sent, vec![DOOR_OPEN_MESSAGE]);
    assert!(s.controller.alarm.active);

    s.controller
        .tick(&s.settings, start + Duration::from_secs(5), hm(18, 30))
        .unwrap();
    assert_eq!(s.controller.notifier().sent.len(), 1);

    s.controller
        .tick(&s.settings, start + Duration::from_secs(601), hm(18, 40))
        .unwrap();
    assert_eq!(s.controller.notifier().sent.len(), 2);
    assert_eq!(s.controller.actuator().pulses, 0);
}

#[test]
fn close_command_closes_door_without_alarm() {
    let mut s = setup(DoorPosition::Open, true, &["close"]);
    let position = s.controller.tick(&s.settings, Instant::now(), hm(22, 0)).unwrap();
    assert_eq!(position, DoorPosition::Closed);
    assert_eq!(s.controller.actuator().pulses, 1);
    assert_eq!(
        s.controller.notifier().sent,
        vec![success_message(DoorPosition::Closed)]
    );
    assert!(s.controller.command.executed);
    assert!(!s.controller.alarm.active);
}

#[test]
fn executed_close_is_not_repeated() {
    let mut s = setup(DoorPosition::Open, false, &["close"]);
    let start = Instant::now();
    s.controller.tick(&s.settings, start, hm(12, 0)).unwrap();
    assert_eq!(s.controller.actuator().pulses, 2);
    assert_eq!(s.controller.notifier().sent, vec![ESCALATION_MESSAGE]);

    s.controller
        .tick(&s.settings, start + Duration::from_secs(5), hm(12, 0))
        .unwrap();
    assert_eq!(s.controller.actuator().pulses, 2);
    assert_eq!(s.controller.notifier().sent.len(), 1);
}

#[test]
fn closing_the_door_clears_the_alarm() {
    let mut s = setup(DoorPosition::Open, true, &[]);
    let start = Instant::now();
    s.controller.tick(&s.settings, start, hm(19, 0)).unwrap();
    assert!(s.controller.alarm.active);

    s.door.set(DoorPosition::Closed);
    s.controller
        .tick(&s.settings, start + Duration::from_secs(5), hm(19, 0))
        .unwrap();
    assert!(!s.controller.alarm.active);
    assert_eq!(s.controller.open_since, None);

    // Opening again raises a fresh alarm right away
    s.door.set(DoorPosition::Open);
    s.controller
        .tick(&s.settings, start + Duration::from_secs(10), hm(19, 0))
        .unwrap();
    assert_eq!(s.controller.notifier().sent.len(), 2);
}

#[test]
fn long_open_before_deadline_stays_quiet() {
    let mut s = setup(DoorPosition::InTransition, true, &[]);
    let start = Instant::now();
    s.controller.tick(&s.settings, start, hm(9, 0)).unwrap();
    s.controller
        .tick(&s.settings, start + Duration::from_secs(3600), hm(10, 0))
        .unwrap();
    s.controller
        .tick(&s.settings, start + Duration::from_secs(7200), hm(11, 0))
        .unwrap();
    assert!(s.controller.notifier().sent.is_empty());
    assert!(!s.controller.alarm.active);

    s.controller
        .tick(&s.settings, start + Duration::from_secs(32400), hm(18, 0))
        .unwrap();
    assert_eq!(s.controller.notifier().sent, vec![DOOR_OPEN_MESSAGE]);
}

#[test]
fn close_command_on_closed_door_is_satisfied() {
    let mut s = setup(DoorPosition::Closed, true, &["close"]);
    s.controller.tick(&s.settings, Instant::now(), hm(12, 0)).unwrap();
    assert!(s.controller.command.executed);
    assert_eq!(s.controller.actuator().pulses, 0);

    s.door.set(DoorPosition::Open);
    s.controller.tick(&s.settings, Instant::now(), hm(12, 0)).unwrap();
    assert_eq!(s.controller.actuator().pulses, 0);
}

#[test]
fn unknown_position_is_not_actuated() {
    let mut s = setup(DoorPosition::Unknown, true, &["close"]);
    let position = s.controller.tick(&s.settings, Instant::now(), hm(12, 0)).unwrap();
    assert_eq!(position, DoorPosition::Unknown);
    assert_eq!(s.controller.actuator().pulses, 0);
    assert!(s.controller.command.executed);
    assert_eq!(s.controller.notifier().sent, vec![UNKNOWN_POSITION_MESSAGE]);
}

#[test]
fn unknown_position_with_close_keeps_alarming() {
    let mut s = setup(DoorPosition::Unknown, true, &["close"]);
    let start = Instant::now();
    for hour in 0..10u64 {
        s.controller
            .tick(&s.settings, start + Duration::from_secs(hour * 3600), hm(22, 0))
            .unwrap();
    }
    let sent = &s.controller.notifier().sent;
    assert_eq!(sent[0], UNKNOWN_POSITION_MESSAGE);
    assert_eq!(sent[1..].len(), 9);
    assert!(sent[1..].iter().all(|text| text == DOOR_OPEN_MESSAGE));
    assert!(s.controller.alarm.active);
    assert_eq!(s.controller.actuator().pulses, 0);
}

#[test]
fn actuation_failure_stops_the_tick() {
    let door = Door::new(DoorPosition::Open);
    let motor = Motor {
        door: door.clone(),
        closes: true,
        broken: true,
        pulses: 0,
    };
    let chat = Chat {
        inbox: vec![String::from("close")].into(),
        sent: Vec::new(),
    };
    let mut controller = Controller::new(door.sensors(), motor, chat);
    let settings = setup(DoorPosition::Open, true, &[]).settings;
    let result = controller.tick(&settings, Instant::now(), hm(12, 0));
    assert!(matches!(result, Err(Error::Gpio(_))));
}

#[test]
fn status_reflects_last_tick() {
    let mut s = setup(DoorPosition::Open, true, &[]);
    let start = Instant::now();
    s.controller.tick(&s.settings, start, hm(20, 0)).unwrap();
    let status = s.controller.status();
    assert_eq!(status.position, DoorPosition::Open);
    assert_eq!(status.open_since, Some(start));
    assert!(status.alarm_active);
    assert_eq!(status.notified_at, Some(start));
}

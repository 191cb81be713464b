use std::borrow::Cow;
use std::error::Error;
use std::net::ToSocketAddrs;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use json::object;
use log::error;
use systemstat::{Platform, System};
use tiny_http::{Header, Response};

use crate::{DoorPosition, Status};

const HTML: &str = include_str!("home.html");

pub struct Server(tiny_http::Server);

impl Server {
    pub fn new<A>(addr: A) -> Result<Server, Box<dyn Error + Send + Sync + 'static>>
    where
        A: ToSocketAddrs,
    {
        tiny_http::Server::http(addr).map(Server)
    }

    pub fn handle_requests(&self, status: Arc<RwLock<Status>>) {
        let (json, html) = match (
            "Content-type: application/json; charset=utf-8".parse::<Header>(),
            "Content-type: text/html; charset=utf-8".parse::<Header>(),
        ) {
            (Ok(json), Ok(html)) => (json, html),
            _ => {
                error!("handle_requests: invalid content type header");
                return;
            }
        };
        let system = System::new();
        for request in self.0.incoming_requests() {
            let current = match status.read() {
                Ok(status) => *status,
                Err(err) => {
                    error!("handle_requests: status lock poisoned: {}", err);
                    return;
                }
            };
            let response = match request.url() {
                "/" => {
                    let page = HTML.replace("$doorstate$", &render_status(&current, Instant::now()));
                    Response::from_string(page).with_header(html.clone())
                }
                "/door.json" => {
                    let body = json::stringify_pretty(
                        door_json(&current, Instant::now(), system.cpu_temp().ok()),
                        2,
                    );
                    Response::from_string(body).with_header(json.clone())
                }
                _ => Response::from_string("Not found").with_status_code(404),
            };

            // Ignoring I/O errors that occur here so that we don't take down the process if there
            // is an issue sending the response.
            let _ = request.respond(response);
        }
    }

    pub fn shutdown(&self) {
        self.0.unblock();
    }
}

fn render_status(status: &Status, now: Instant) -> String {
    match status.position {
        DoorPosition::Closed => String::from("🟢 Closed"),
        DoorPosition::Unknown => String::from("🔵 Unknown"),
        DoorPosition::Open | DoorPosition::InTransition => {
            let duration = status
                .open_since
                .map(|opened| {
                    let formatter = timeago::Formatter::new();
                    Cow::from(formatter.convert(now.duration_since(opened)))
                })
                .unwrap_or_else(|| Cow::from("at an unknown time"));
            let alarm = if status.alarm_active { " ⏰" } else { "" };
            format!("🔴 {} since {}{}", status.position, duration, alarm)
        }
    }
}

fn door_json(status: &Status, now: Instant, cpu_temp: Option<f32>) -> json::JsonValue {
    object! {
        state: status.position.to_string(),
        alarm_active: status.alarm_active,
        secs_since_notified: status.notified_at.map(|notified| now.duration_since(notified).as_secs()),
        open_for: status.open_since.map(|opened| now.duration_since(opened).as_secs()),
        cpu_temp: cpu_temp
    }
}

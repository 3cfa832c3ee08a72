// Endpoint handlers module
//
// One handler per route. Every handler is a pure function of its request
// inputs (plus the read-only constant tables); soft errors travel inside
// 200-status bodies, binding errors are mapped to 400 by the router.

use chrono::{NaiveDate, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use sysinfo::{ProcessesToUpdate, System};

use super::calc::{self, CalculationResponse};
use super::params::QueryParams;
use super::response::{json_response, text_response};
use super::types::{AppInfo, Health, Status, UserLookup, ENDPOINTS, USERS};
use crate::logger;

/// GET /
pub fn home() -> Response<Full<Bytes>> {
    text_response("Welcome to the Demo API Server!".to_string())
}

/// GET /hello
pub fn hello() -> Response<Full<Bytes>> {
    text_response("Hello, World!".to_string())
}

/// GET /hello/{name}
pub fn hello_name(name: &str) -> Response<Full<Bytes>> {
    text_response(hello_name_message(name))
}

fn hello_name_message(name: &str) -> String {
    format!("Hello, {name}! Welcome to our demo API.")
}

/// GET /greet?name=Guest
/// The embedded date is the current calendar date in UTC.
pub fn greet(params: &QueryParams) -> Response<Full<Bytes>> {
    let name = params.get_or("name", "Guest");
    text_response(greet_message(name, Utc::now().date_naive()))
}

fn greet_message(name: &str, date: NaiveDate) -> String {
    format!("Greetings, {name}! Today is {}", date.format("%Y-%m-%d"))
}

/// GET /welcome?name=Guest&city=Unknown
pub fn welcome(params: &QueryParams) -> Response<Full<Bytes>> {
    let name = params.get_or("name", "Guest");
    let city = params.get_or("city", "Unknown");
    text_response(welcome_message(name, city))
}

fn welcome_message(name: &str, city: &str) -> String {
    format!("Welcome {name} from {city}! Hope you're having a great day!")
}

/// GET /info
pub fn app_info() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &app_info_payload())
}

fn app_info_payload() -> AppInfo {
    AppInfo {
        application: "Demo API Server",
        version: "1.0.0",
        status: "running",
        developer: "Demo Team",
        timestamp: super::types::timestamp(),
    }
}

/// GET /health
pub fn health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &health_payload())
}

fn health_payload() -> Health {
    Health {
        status: "UP",
        uptime: "Server is running smoothly",
        memory: process_memory_bytes(),
        timestamp: super::types::timestamp(),
    }
}

/// Current process resident set size in bytes; 0 when the query fails.
/// An approximation, like the heap figure it stands in for.
fn process_memory_bytes() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        logger::log_warning("Could not determine current pid for memory reporting");
        return 0;
    };

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).map_or(0, |process| process.memory())
}

/// GET /users
pub fn users() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &USERS)
}

/// GET /users/{id}
/// Unknown ids are a normal result, not a transport failure: still 200.
pub fn user_by_id(id: i64) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &lookup_user(id))
}

fn lookup_user(id: i64) -> UserLookup {
    match USERS.iter().find(|user| user.id == id) {
        Some(user) => UserLookup::Found(*user),
        None => UserLookup::NotFound {
            error: "User not found",
            id,
        },
    }
}

/// GET /status
pub fn status() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &status_payload())
}

fn status_payload() -> Status {
    Status {
        api: "Demo REST API",
        version: "v1.0",
        status: "active",
        endpoints: ENDPOINTS,
        timestamp: super::types::timestamp(),
    }
}

/// GET /calculate?num1=10&num2=5&operation=add
/// Binding errors (non-integer num1/num2) surface as `Err` for the 400 branch.
pub fn calculate(params: &QueryParams) -> Result<Response<Full<Bytes>>, String> {
    let payload = calculate_payload(params)?;
    Ok(json_response(StatusCode::OK, &payload))
}

fn calculate_payload(params: &QueryParams) -> Result<CalculationResponse, String> {
    let num1 = params.get_i64_or("num1", 10)?;
    let num2 = params.get_i64_or("num2", 5)?;
    let operation = params.get_or("operation", "add");
    Ok(calc::calculate(num1, num2, operation))
}

// API types module
// Response payload types and the process-lifetime constant tables

use serde::Serialize;

/// Mock user record. Read-only constant table entry, never mutated.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: &'static str,
    pub email: &'static str,
    pub city: &'static str,
}

/// The fixed 3-record user table, in id order
pub const USERS: [User; 3] = [
    User {
        id: 1,
        name: "John Doe",
        email: "john@example.com",
        city: "New York",
    },
    User {
        id: 2,
        name: "Jane Smith",
        email: "jane@example.com",
        city: "London",
    },
    User {
        id: 3,
        name: "Mike Johnson",
        email: "mike@example.com",
        city: "Tokyo",
    },
];

/// Route path templates, with path-parameter placeholders as literal strings.
/// Enumerated by /status and by the 404 response body.
pub const ENDPOINTS: [&str; 11] = [
    "/",
    "/hello",
    "/hello/{name}",
    "/greet",
    "/welcome",
    "/info",
    "/health",
    "/users",
    "/users/{id}",
    "/status",
    "/calculate",
];

/// User lookup outcome. "Not found" is a normal result carried in a 200
/// response body, not a transport-level failure.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserLookup {
    Found(User),
    NotFound { error: &'static str, id: i64 },
}

/// /info payload
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub application: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub developer: &'static str,
    pub timestamp: String,
}

/// /health payload
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub uptime: &'static str,
    /// Process resident set size in bytes; 0 when the platform query fails
    pub memory: u64,
    pub timestamp: String,
}

/// /status payload
#[derive(Debug, Serialize)]
pub struct Status {
    pub api: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: [&'static str; 11],
    pub timestamp: String,
}

/// One timestamp representation everywhere: RFC 3339 in UTC
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

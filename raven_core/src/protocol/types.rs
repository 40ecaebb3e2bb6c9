/**
 * Core type definitions for the raven client.
 *
 * These structures mirror the JSON the collector's store endpoint expects.
 * `Event` is the top-level body; interface records hang off it under their
 * well-known `sentry.interfaces.*` keys.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::constants::{
    MAX_CULPRIT, MAX_EXCEPTION_TYPE, MAX_EXCEPTION_VALUE, MAX_FRAME_FIELD, MAX_HTTP_COOKIES,
    MAX_HTTP_DATA, MAX_HTTP_QUERY_STRING, MAX_HTTP_URL, MAX_MESSAGE, MAX_QUERY, MAX_QUERY_ENGINE,
    MAX_USER_FIELD,
};

// ---------------------------------------------------------------------------
// Event — the body POSTed to the store endpoint
// ---------------------------------------------------------------------------

/**
 * A fully-populated event, produced by `EventBuilder::construct`.
 *
 * ```json
 * {
 *   "event_id": "fc6d8c0c43fc4630ad850ee518f1b9d0",
 *   "timestamp": "2024-01-01T12:00:00",
 *   "level": "error",
 *   "logger": "root",
 *   "platform": "rust",
 *   "server_name": "web-1",
 *   "message": "HELO",
 *   "culprit": "",
 *   "extra": {},
 *   "tags": {},
 *   "fingerprint": ["{{ default }}"],
 *   "sentry.interfaces.Exception": { "type": "...", "value": "..." }
 * }
 * ```
 *
 * Key invariants:
 * - `extra` / `tags` are always present (possibly empty), never `null`.
 * - `event_id` is 32 lowercase hex chars without dashes.
 * - Interface blocks are only serialized when attached.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: String,

    /// ISO-8601, second precision, UTC.
    pub timestamp: String,

    pub level: Level,
    pub logger: String,
    pub platform: String,
    pub server_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    pub message: String,
    pub culprit: String,

    pub extra: Map<String, Value>,
    pub tags: Map<String, Value>,

    /// Grouping key; replaced wholesale, never merged.
    pub fingerprint: Vec<String>,

    #[serde(flatten)]
    pub interfaces: Interfaces,

    /// Caller-defined top-level fields. Never contains a reserved key.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Event {
    /// Top-level keys owned by the event itself.
    pub const RESERVED_KEYS: &'static [&'static str] = &[
        "event_id",
        "timestamp",
        "level",
        "logger",
        "platform",
        "server_name",
        "release",
        "message",
        "culprit",
        "extra",
        "tags",
        "fingerprint",
        Interfaces::EXCEPTION,
        Interfaces::HTTP,
        Interfaces::STACKTRACE,
        Interfaces::USER,
        Interfaces::QUERY,
    ];

    /// Clips every length-limited field in place.
    pub fn truncate(&mut self) {
        truncate(&mut self.message, MAX_MESSAGE);
        truncate(&mut self.culprit, MAX_CULPRIT);
        self.interfaces.truncate();
    }
}

// ---------------------------------------------------------------------------
// Level (severity)
// ---------------------------------------------------------------------------

/// Severity level, serialized lowercase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Fatal,
    #[default]
    Error,
    Warning,
    Info,
    Debug,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Fatal,
        Level::Error,
        Level::Warning,
        Level::Info,
        Level::Debug,
    ];

    /**
     * Returns the string representation used in the wire protocol.
     * E.g. `Level::Warning` -> `"warning"`.
     */
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the five level names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLevel(pub String);

impl fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid level {:?}", self.0)
    }
}

impl std::error::Error for InvalidLevel {}

impl FromStr for Level {
    type Err = InvalidLevel;

    /// Exact, case-sensitive match against the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| InvalidLevel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Interfaces
// ---------------------------------------------------------------------------

/**
 * A typed sub-record attached to an event.
 *
 * Closed set: adding a variant forces every `match` on it (attachment,
 * serialization) to handle the new kind.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Interface {
    Exception(Exception),
    Http(Http),
    Stacktrace(Stacktrace),
    User(User),
    Query(Query),
}

impl Interface {
    /// The key this interface is serialized under.
    pub fn key(&self) -> &'static str {
        match self {
            Interface::Exception(_) => Interfaces::EXCEPTION,
            Interface::Http(_) => Interfaces::HTTP,
            Interface::Stacktrace(_) => Interfaces::STACKTRACE,
            Interface::User(_) => Interfaces::USER,
            Interface::Query(_) => Interfaces::QUERY,
        }
    }
}

/// One optional slot per interface kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Interfaces {
    #[serde(rename = "sentry.interfaces.Exception", skip_serializing_if = "Option::is_none")]
    pub exception: Option<Exception>,

    #[serde(rename = "sentry.interfaces.Http", skip_serializing_if = "Option::is_none")]
    pub http: Option<Http>,

    #[serde(rename = "sentry.interfaces.Stacktrace", skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,

    #[serde(rename = "sentry.interfaces.User", skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(rename = "sentry.interfaces.Query", skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
}

impl Interfaces {
    pub const EXCEPTION: &'static str = "sentry.interfaces.Exception";
    pub const HTTP: &'static str = "sentry.interfaces.Http";
    pub const STACKTRACE: &'static str = "sentry.interfaces.Stacktrace";
    pub const USER: &'static str = "sentry.interfaces.User";
    pub const QUERY: &'static str = "sentry.interfaces.Query";

    /// Stores `interface` in its slot, replacing any previous value of the same kind.
    pub fn attach(&mut self, interface: Interface) {
        match interface {
            Interface::Exception(v) => self.exception = Some(v),
            Interface::Http(v) => self.http = Some(v),
            Interface::Stacktrace(v) => self.stacktrace = Some(v),
            Interface::User(v) => self.user = Some(v),
            Interface::Query(v) => self.query = Some(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exception.is_none()
            && self.http.is_none()
            && self.stacktrace.is_none()
            && self.user.is_none()
            && self.query.is_none()
    }

    pub fn truncate(&mut self) {
        if let Some(v) = self.exception.as_mut() {
            v.truncate();
        }
        if let Some(v) = self.http.as_mut() {
            v.truncate();
        }
        if let Some(v) = self.stacktrace.as_mut() {
            v.truncate();
        }
        if let Some(v) = self.user.as_mut() {
            v.truncate();
        }
        if let Some(v) = self.query.as_mut() {
            v.truncate();
        }
    }
}

// ---------------------------------------------------------------------------
// Exception
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Exception {
    pub fn truncate(&mut self) {
        truncate(&mut self.kind, MAX_EXCEPTION_TYPE);
        truncate(&mut self.value, MAX_EXCEPTION_VALUE);
    }
}

// ---------------------------------------------------------------------------
// Http
// ---------------------------------------------------------------------------

/// The HTTP request being handled when the event happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Http {
    pub url: String,
    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub env: Map<String, Value>,
}

impl Http {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn truncate(&mut self) {
        truncate(&mut self.url, MAX_HTTP_URL);
        truncate_opt(&mut self.data, MAX_HTTP_DATA);
        truncate_opt(&mut self.query_string, MAX_HTTP_QUERY_STRING);
        truncate_opt(&mut self.cookies, MAX_HTTP_COOKIES);
    }
}

// ---------------------------------------------------------------------------
// Stacktrace
// ---------------------------------------------------------------------------

/// Frames are ordered oldest call first, innermost (failing) frame last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
}

impl Stacktrace {
    pub fn truncate(&mut self) {
        for frame in &mut self.frames {
            frame.truncate();
        }
    }
}

/**
 * A single stack frame.
 *
 * Everything is optional. `in_app` and `colno` are passed through as given
 * and never defaulted.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_line: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_context: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_context: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub vars: Map<String, Value>,
}

impl Frame {
    pub fn truncate(&mut self) {
        truncate_opt(&mut self.filename, MAX_FRAME_FIELD);
        truncate_opt(&mut self.function, MAX_FRAME_FIELD);
        truncate_opt(&mut self.module, MAX_FRAME_FIELD);
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The user affected by the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn truncate(&mut self) {
        truncate_opt(&mut self.id, MAX_USER_FIELD);
        truncate_opt(&mut self.username, MAX_USER_FIELD);
        truncate_opt(&mut self.email, MAX_USER_FIELD);
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A database query associated with the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl Query {
    pub fn truncate(&mut self) {
        truncate(&mut self.query, MAX_QUERY);
        truncate_opt(&mut self.engine, MAX_QUERY_ENGINE);
    }
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

/**
 * Clips `s` to at most `max` chars. Never fails and never splits a
 * multi-byte character.
 */
pub fn truncate(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

fn truncate_opt(s: &mut Option<String>, max: usize) {
    if let Some(s) = s.as_mut() {
        truncate(s, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        let mut s = "ééééé".to_string();
        truncate(&mut s, 3);
        assert_eq!(s, "ééé");

        let mut short = "abc".to_string();
        truncate(&mut short, 10);
        assert_eq!(short, "abc");
    }

    #[test]
    fn test_level_parse() {
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
        }
        assert!("ERROR".parse::<Level>().is_err());
        assert!("warn".parse::<Level>().is_err());
    }

    #[test]
    fn test_interface_keys_match_serialized_names() {
        let mut interfaces = Interfaces::default();
        interfaces.attach(Interface::Query(Query {
            query: "SELECT 1".into(),
            engine: None,
        }));

        let json = serde_json::to_value(&interfaces).unwrap();
        assert!(json.get(Interfaces::QUERY).is_some());
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_attach_replaces_same_kind() {
        let mut interfaces = Interfaces::default();
        interfaces.attach(Interface::User(User {
            id: Some("1".into()),
            ..Default::default()
        }));
        interfaces.attach(Interface::User(User {
            id: Some("2".into()),
            ..Default::default()
        }));
        assert_eq!(interfaces.user.unwrap().id.as_deref(), Some("2"));
    }

    #[test]
    fn test_frame_optional_fields_skipped() {
        let frame = Frame {
            function: Some("main".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, serde_json::json!({ "function": "main" }));
    }
}

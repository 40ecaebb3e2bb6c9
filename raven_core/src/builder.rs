/**
 * Event builder — turns stored context plus per-call overrides into an
 * `Event`.
 *
 * Resolution order for every scalar field:
 *
 * ```text
 * per-call override  →  stored context  →  default
 * ```
 *
 * with `event_id` and `timestamp` generated from the injected id source
 * and clock when neither layer sets them.
 *
 * - `tags` / `extra` are shallow unions, override keys win.
 * - `fingerprint` is taken whole from the most specific layer.
 * - An invalid `level` falls back (stored value, then default) and emits
 *   `Warning::InvalidLevel`.
 * - Length-limited strings are truncated, never rejected.
 *
 * No I/O happens here. Given the same inputs, clock and id source,
 * `construct` returns the same event.
 */
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::Context;
use crate::protocol::constants::{
    DEFAULT_FINGERPRINT, DEFAULT_LOGGER, DEFAULT_PLATFORM, FALLBACK_SERVER_NAME,
};
use crate::protocol::types::{Event, Interface, Interfaces, Level};
use crate::warnings::{TracingSink, Warning, WarningSink};

/// Source of "now".
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Source of fresh event ids.
pub type IdSource = Arc<dyn Fn() -> Uuid + Send + Sync>;

/// `YYYY-MM-DDTHH:MM:SS`, UTC, no fractional seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/**
 * Per-call values for a single capture.
 *
 * ```ignore
 * let overrides = Overrides::new()
 *     .level("warning")
 *     .tag("region", "eu")
 *     .interface(interfaces::user(User { id: Some("42".into()), ..Default::default() }));
 * ```
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub fields: Context,
    pub interfaces: Vec<Interface>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.fields.message = Some(message.into());
        self
    }

    /// Raw level name; validated when the event is built.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.fields.level = Some(level.into());
        self
    }

    pub fn logger(mut self, logger: impl Into<String>) -> Self {
        self.fields.logger = Some(logger.into());
        self
    }

    pub fn culprit(mut self, culprit: impl Into<String>) -> Self {
        self.fields.culprit = Some(culprit.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.fields.platform = Some(platform.into());
        self
    }

    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.fields.server_name = Some(server_name.into());
        self
    }

    pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
        self.fields.event_id = Some(event_id.into());
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.fields.timestamp = Some(timestamp.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .tags
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn fingerprint<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.fingerprint = Some(parts.into_iter().map(Into::into).collect());
        self
    }

    /// Arbitrary top-level field. Reserved event keys are ignored at build time.
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.custom.insert(key.into(), value.into());
        self
    }

    pub fn interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }
}

impl From<Context> for Overrides {
    fn from(fields: Context) -> Self {
        Self {
            fields,
            interfaces: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Hard-coded values used when neither override nor context sets a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub level: Level,
    pub logger: String,
    pub platform: String,
    pub server_name: String,
    pub fingerprint: Vec<String>,
    pub release: Option<String>,
}

impl Default for Defaults {
    /// Resolves `server_name` from the local hostname.
    fn default() -> Self {
        Self {
            level: Level::default(),
            logger: DEFAULT_LOGGER.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            server_name: local_hostname(),
            fingerprint: vec![DEFAULT_FINGERPRINT.to_string()],
            release: None,
        }
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_SERVER_NAME.to_string())
}

// ---------------------------------------------------------------------------
// EventBuilder
// ---------------------------------------------------------------------------

pub struct EventBuilder {
    defaults: Defaults,
    clock: Clock,
    ids: IdSource,
    warnings: Arc<dyn WarningSink>,
}

impl EventBuilder {
    /// System clock, random v4 ids, warnings logged through `tracing`.
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults,
            clock: Arc::new(Utc::now),
            ids: Arc::new(Uuid::new_v4),
            warnings: Arc::new(TracingSink),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_source(mut self, ids: IdSource) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_warnings(mut self, warnings: Arc<dyn WarningSink>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn construct(&self, stored: &Context, overrides: Overrides) -> Event {
        let Overrides {
            fields,
            interfaces: attached,
        } = overrides;

        let event_id = resolve(fields.event_id, &stored.event_id)
            .unwrap_or_else(|| (self.ids)().simple().to_string());
        let timestamp = resolve(fields.timestamp, &stored.timestamp)
            .unwrap_or_else(|| self.now().format(TIMESTAMP_FORMAT).to_string());
        let level = self.resolve_level(fields.level.as_deref(), stored.level.as_deref());

        let mut custom = union(Some(&stored.custom), Some(fields.custom));
        custom.retain(|key, _| !Event::RESERVED_KEYS.contains(&key.as_str()));

        let mut interfaces = Interfaces::default();
        for interface in attached {
            interfaces.attach(interface);
        }

        let mut event = Event {
            event_id,
            timestamp,
            level,
            logger: resolve(fields.logger, &stored.logger)
                .unwrap_or_else(|| self.defaults.logger.clone()),
            platform: resolve(fields.platform, &stored.platform)
                .unwrap_or_else(|| self.defaults.platform.clone()),
            server_name: resolve(fields.server_name, &stored.server_name)
                .unwrap_or_else(|| self.defaults.server_name.clone()),
            release: self.defaults.release.clone(),
            message: resolve(fields.message, &stored.message).unwrap_or_default(),
            culprit: resolve(fields.culprit, &stored.culprit).unwrap_or_default(),
            extra: union(stored.extra.as_ref(), fields.extra),
            tags: union(stored.tags.as_ref(), fields.tags),
            fingerprint: resolve(fields.fingerprint, &stored.fingerprint)
                .unwrap_or_else(|| self.defaults.fingerprint.clone()),
            interfaces,
            custom,
        };

        event.truncate();
        event
    }

    /**
     * Picks the first valid level among override and stored value.
     * Every invalid candidate seen on the way produces one warning naming
     * the level finally used.
     */
    fn resolve_level(&self, overridden: Option<&str>, stored: Option<&str>) -> Level {
        let mut rejected = Vec::new();
        let mut resolved = None;

        for raw in [overridden, stored].into_iter().flatten() {
            match raw.parse::<Level>() {
                Ok(level) => {
                    resolved = Some(level);
                    break;
                }
                Err(_) => rejected.push(raw),
            }
        }

        let level = resolved.unwrap_or(self.defaults.level);
        for value in rejected {
            self.warnings.warn(Warning::InvalidLevel {
                value: value.to_string(),
                fallback: level.to_string(),
            });
        }
        level
    }
}

fn resolve<T: Clone>(overridden: Option<T>, stored: &Option<T>) -> Option<T> {
    overridden.or_else(|| stored.clone())
}

/// Shallow union; keys from `overrides` win.
fn union(
    stored: Option<&Map<String, Value>>,
    overrides: Option<Map<String, Value>>,
) -> Map<String, Value> {
    let mut merged = stored.cloned().unwrap_or_default();
    if let Some(overrides) = overrides {
        merged.extend(overrides);
    }
    merged
}

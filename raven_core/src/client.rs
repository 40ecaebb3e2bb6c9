/**
 * The raven client — owns configuration, default context, processors and
 * transport, and drives every capture call end to end.
 *
 * Lifecycle:
 * 1. Build `ClientOptions` and call `Client::new` (explicit DSN) or
 *    `Client::from_env` (falls back to `SENTRY_DSN`).
 * 2. Adjust the default context / processors through `&mut self`.
 * 3. `capture_*` builds an event, runs the processors, POSTs it and
 *    returns the collector's event id, if any.
 *
 * One capture call issues at most one blocking HTTP request. Transport
 * failures never reach the caller as errors: they are reported to the
 * warning sink and the call returns `Ok(None)`.
 */
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::builder::{Clock, Defaults, EventBuilder, IdSource, Overrides};
use crate::context::{Context, ContextStore};
use crate::error::Result;
use crate::frames;
use crate::processor::{Processor, ProcessorChain};
use crate::protocol::auth::{auth_header, AuthParams};
use crate::protocol::constants::{
    AUTH_HEADER, CLIENT_VERSION, MAX_RESPONSE_EXCERPT, PROTOCOL_VERSION,
};
use crate::protocol::dsn::Dsn;
use crate::protocol::interfaces;
use crate::protocol::types::{Event, Interface};
use crate::transport::{Encoding, HttpTransport, Transport};
use crate::warnings::{TracingSink, Warning, WarningSink};

/// Request timeout used by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// ClientOptions
// ---------------------------------------------------------------------------

/**
 * Configuration for a `Client`.
 *
 * All fields have sensible defaults via `Default`.
 *
 * # Example
 * ```ignore
 * let client = Client::from_env(ClientOptions {
 *     release: Some("1.4.2".into()),
 *     encoding: Encoding::Text,
 *     ..Default::default()
 * })?;
 * ```
 */
pub struct ClientOptions {
    /// Connection string. When `None`, only `from_env`/`with_env_lookup`
    /// can still find one.
    pub dsn: Option<String>,

    /// Timeout applied by the default transport. Ignored when `transport`
    /// is set; a custom transport owns its own timeouts.
    /// Default: 5 seconds.
    pub timeout: Duration,

    /// Custom transport. Default: `HttpTransport`.
    pub transport: Option<Box<dyn Transport>>,

    /// Default: `Encoding::Gzip`.
    pub encoding: Encoding,

    pub release: Option<String>,

    /// Initial processor chain, run in order.
    pub processors: Vec<Box<dyn Processor>>,

    /// Initial default context.
    pub context: Context,

    /// `sentry_version` in the auth header. Default: `"7"`.
    pub protocol_version: String,

    /// Receives non-fatal warnings. Default: `TracingSink`.
    pub warnings: Option<Arc<dyn WarningSink>>,

    /// Overrides the wall clock (timestamps, auth header).
    pub clock: Option<Clock>,

    /// Overrides random event id generation.
    pub id_source: Option<IdSource>,

    /// Overrides the built-in event defaults (logger, platform, hostname...).
    /// `release` above always wins over `defaults.release`.
    pub defaults: Option<Defaults>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dsn: None,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            encoding: Encoding::default(),
            release: None,
            processors: Vec::new(),
            context: Context::default(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            warnings: None,
            clock: None,
            id_source: None,
            defaults: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct Client {
    dsn: Dsn,
    protocol_version: String,
    encoding: Encoding,
    context: ContextStore,
    processors: ProcessorChain,
    builder: EventBuilder,
    transport: Box<dyn Transport>,
    warnings: Arc<dyn WarningSink>,
}

/// Body of a successful store response.
#[derive(Deserialize)]
struct StoreResponse {
    id: String,
}

impl Client {
    /// Creates a client from `options.dsn` only.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_env_lookup(options, |_| None)
    }

    /// Creates a client, falling back to the `SENTRY_DSN` environment variable.
    pub fn from_env(options: ClientOptions) -> Result<Self> {
        Self::with_env_lookup(options, |name| std::env::var(name).ok())
    }

    /**
     * Creates a client, resolving the DSN from `options.dsn` first and
     * `lookup("SENTRY_DSN")` second.
     *
     * # Errors
     * `RavenError::Config` if no DSN is found or it is malformed.
     */
    pub fn with_env_lookup<F>(options: ClientOptions, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dsn = Dsn::resolve(options.dsn.as_deref(), lookup)?;

        let warnings = options.warnings.unwrap_or_else(|| Arc::new(TracingSink));

        let mut defaults = options.defaults.unwrap_or_default();
        if options.release.is_some() {
            defaults.release = options.release;
        }

        let mut builder = EventBuilder::new(defaults).with_warnings(warnings.clone());
        if let Some(clock) = options.clock {
            builder = builder.with_clock(clock);
        }
        if let Some(ids) = options.id_source {
            builder = builder.with_id_source(ids);
        }

        let transport = options
            .transport
            .unwrap_or_else(|| Box::new(HttpTransport::new(options.timeout)));

        debug!(dsn = %dsn, encoding = %options.encoding, "raven client configured");

        Ok(Self {
            dsn,
            protocol_version: options.protocol_version,
            encoding: options.encoding,
            context: ContextStore::new(options.context),
            processors: ProcessorChain::new(options.processors),
            builder,
            transport,
            warnings,
        })
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    pub fn store_url(&self) -> &str {
        &self.dsn.store_url
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    // -----------------------------------------------------------------------
    // Context
    // -----------------------------------------------------------------------

    pub fn get_context(&self) -> Context {
        self.context.get()
    }

    pub fn add_context(&mut self, partial: Context) {
        self.context.add(partial);
    }

    pub fn merge_tags(&mut self, tags: serde_json::Map<String, serde_json::Value>) {
        self.context.merge_tags(tags);
    }

    pub fn merge_extra(&mut self, extra: serde_json::Map<String, serde_json::Value>) {
        self.context.merge_extra(extra);
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.context.set_tag(key, value);
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.context.set_extra(key, value);
    }

    pub fn clear_context(&mut self) {
        self.context.clear();
    }

    // -----------------------------------------------------------------------
    // Processors
    // -----------------------------------------------------------------------

    pub fn add_processor(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Box::new(processor));
    }

    pub fn clear_processors(&mut self) {
        self.processors.clear();
    }

    pub fn processors(&self) -> &ProcessorChain {
        &self.processors
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    /// Builds an event from the stored context and `overrides` without sending it.
    pub fn construct(&self, overrides: Overrides) -> Event {
        self.builder.construct(self.context.as_context(), overrides)
    }

    /// Builds and sends an event. Returns the collector's id on success.
    pub fn capture(&self, overrides: Overrides) -> Result<Option<String>> {
        self.send(self.construct(overrides))
    }

    pub fn capture_message(&self, message: &str, overrides: Overrides) -> Result<Option<String>> {
        self.capture(overrides.message(message))
    }

    /**
     * Captures a Rust error.
     *
     * The error's `Display` output becomes the message. An Exception
     * interface and a call-site stack trace are attached unless
     * `overrides` already carries them.
     */
    pub fn capture_exception(
        &self,
        error: &dyn std::error::Error,
        overrides: Overrides,
    ) -> Result<Option<String>> {
        let mut event = self.construct(overrides);

        if event.message.is_empty() {
            event.message = error.to_string();
        }
        if event.interfaces.exception.is_none() {
            if let Interface::Exception(mut exception) = interfaces::exception_from_error(error) {
                if let Some(source) = error.source() {
                    exception.value = format!("{}: {source}", exception.value);
                }
                event.interfaces.exception = Some(exception);
            }
        }
        if event.interfaces.stacktrace.is_none() {
            if let Some(frames) = frames::capture() {
                event.interfaces.attach(interfaces::stacktrace(frames));
            }
        }
        event.truncate();

        self.send(event)
    }

    // -----------------------------------------------------------------------
    // Transmission
    // -----------------------------------------------------------------------

    /**
     * Runs the processors, serializes, encodes and POSTs `event`.
     *
     * # Returns
     * - `Ok(Some(id))` — the collector accepted the event.
     * - `Ok(None)` — transport failure, non-200 status or unreadable
     *   response; a warning has been emitted.
     *
     * # Errors
     * Processor, serialization and encoding failures. Nothing is sent in
     * those cases.
     */
    pub fn send(&self, event: Event) -> Result<Option<String>> {
        let event = self.processors.process(event)?;

        let json = serde_json::to_vec(&event)?;
        let body = self.encoding.encode(json)?;
        let headers = self.headers();

        debug!(
            url = %self.dsn.store_url,
            event_id = %event.event_id,
            bytes = body.len(),
            "sending event"
        );

        let response = match self.transport.post(&self.dsn.store_url, &headers, &body) {
            Ok(response) => response,
            Err(err) => {
                self.warnings.warn(Warning::TransportFailed {
                    error: err.to_string(),
                });
                return Ok(None);
            }
        };

        if response.status != 200 {
            self.warnings.warn(Warning::Rejected {
                status: response.status,
                body: response.body.chars().take(MAX_RESPONSE_EXCERPT).collect(),
            });
            return Ok(None);
        }

        match serde_json::from_str::<StoreResponse>(&response.body) {
            Ok(parsed) => {
                debug!(event_id = %parsed.id, "event accepted");
                Ok(Some(parsed.id))
            }
            Err(err) => {
                self.warnings.warn(Warning::MalformedResponse {
                    error: err.to_string(),
                });
                Ok(None)
            }
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let auth = auth_header(AuthParams {
            protocol_version: &self.protocol_version,
            public_key: &self.dsn.public_key,
            secret_key: &self.dsn.secret_key,
            timestamp: self.builder.now().timestamp(),
        });

        let mut headers = vec![
            (AUTH_HEADER.to_string(), auth),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), CLIENT_VERSION.to_string()),
        ];
        if let Some(encoding) = self.encoding.content_encoding() {
            headers.push(("Content-Encoding".to_string(), encoding.to_string()));
        }
        headers
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("dsn", &self.dsn.to_string())
            .field("encoding", &self.encoding)
            .field("processors", &self.processors)
            .finish_non_exhaustive()
    }
}

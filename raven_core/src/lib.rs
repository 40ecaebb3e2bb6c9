/*!
 * Raven Core — the client engine.
 *
 * Builds events, runs them through the processor chain and submits them
 * to a Sentry-compatible collector over HTTP. End users normally depend
 * on the `raven` facade crate, which re-exports everything here plus the
 * failure/panic capture wrappers.
 *
 * # Module structure
 *
 * - `protocol/` — what we send: event types, interface builders, DSN, auth
 * - `transport/` — how we deliver: the `Transport` seam, ureq, gzip
 * - `context` — default field values applied to every event
 * - `builder` — override → context → default resolution
 * - `processor` — ordered pre-send transforms
 * - `frames` — backtrace → protocol frames
 * - `client` — ties it all together
 * - `warnings` — non-fatal problem reporting
 */

pub mod builder;
pub mod client;
pub mod context;
pub mod error;
pub mod frames;
pub mod processor;
pub mod protocol;
pub mod transport;
pub mod warnings;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use builder::{Clock, Defaults, EventBuilder, IdSource, Overrides};
pub use client::{Client, ClientOptions, DEFAULT_TIMEOUT};
pub use context::{Context, ContextStore};
pub use error::{BoxError, ConfigError, RavenError, Result};
pub use processor::{processor_fn, Processor, ProcessorChain, ProcessorResult};
pub use protocol::auth::{auth_header, AuthParams};
pub use protocol::constants::{CLIENT_VERSION, DSN_ENV_VAR, PROTOCOL_VERSION};
pub use protocol::dsn::Dsn;
pub use protocol::interfaces;
pub use protocol::types::{
    Event, Exception, Frame, Http, Interface, Interfaces, Level, Query, Stacktrace, User,
};
pub use transport::{Encoding, HttpTransport, Response, Transport, TransportError};
pub use warnings::{CollectingSink, TracingSink, Warning, WarningSink};

/**
 * Client-wide constants.
 *
 * These values identify this client to the collector and provide the
 * protocol defaults used when the caller does not override them.
 */

/// Client name reported in the `sentry_client` auth field and `User-Agent`.
pub const CLIENT_NAME: &str = "raven-rust";

/// Full client identifier, e.g. `"raven-rust/0.1.0"`.
/// Derived at compile time from the `raven_core` package version in `Cargo.toml`.
pub const CLIENT_VERSION: &str = concat!("raven-rust/", env!("CARGO_PKG_VERSION"));

/// Default `sentry_version` sent in the auth header.
pub const PROTOCOL_VERSION: &str = "7";

/// Environment variable consulted when no DSN is passed explicitly.
pub const DSN_ENV_VAR: &str = "SENTRY_DSN";

/// Name of the auth header carrying the signed request metadata.
pub const AUTH_HEADER: &str = "X-Sentry-Auth";

// ---------------------------------------------------------------------------
// Event defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_LOGGER: &str = "root";
pub const DEFAULT_PLATFORM: &str = "rust";
pub const DEFAULT_FINGERPRINT: &str = "{{ default }}";

/// Used for `server_name` when the hostname cannot be resolved.
pub const FALLBACK_SERVER_NAME: &str = "localhost";

// ---------------------------------------------------------------------------
// Field length limits (in chars)
// ---------------------------------------------------------------------------

pub const MAX_MESSAGE: usize = 2048;
pub const MAX_CULPRIT: usize = 200;

pub const MAX_EXCEPTION_TYPE: usize = 128;
pub const MAX_EXCEPTION_VALUE: usize = 256;

pub const MAX_HTTP_URL: usize = 1024;
pub const MAX_HTTP_DATA: usize = 2048;
pub const MAX_HTTP_QUERY_STRING: usize = 1024;
pub const MAX_HTTP_COOKIES: usize = 1024;

pub const MAX_FRAME_FIELD: usize = 256;

pub const MAX_USER_FIELD: usize = 128;

pub const MAX_QUERY: usize = 1024;
pub const MAX_QUERY_ENGINE: usize = 128;

/// How much of a rejected response body is surfaced in the warning.
pub const MAX_RESPONSE_EXCERPT: usize = 1000;

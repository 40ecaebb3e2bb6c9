/*!
 * Raven Capture — report failures of a unit of work to the collector.
 *
 * Two wrappers, both returning the work's value unchanged on success:
 *
 * - `capture_errors(client, work)` — `work` returns `Result<T, Failure>`.
 *   A `Failure` carries the stack trace captured where it was created
 *   (any `std::error::Error` converts into one with `?`).
 * - `capture_panics(client, work)` — `work` may panic. The panic is
 *   intercepted through a scoped hook that snapshots the trace at the
 *   panic site.
 *
 * On failure the wrappers build an event (message = failure text,
 * culprit = program name, Exception + Stacktrace interfaces) and send it
 * through the client.
 *
 * Unlike plain `Client::capture_*`, a failure report that the collector
 * does not confirm is escalated: the wrapper returns
 * `RavenError::ReportingFailed` carrying the full event JSON, so a lost
 * report never goes unnoticed.
 */

mod failure;
mod hook;

use std::panic::{self, AssertUnwindSafe, UnwindSafe};
use std::path::Path;

use raven_core::{interfaces, Client, Overrides, RavenError};
use thiserror::Error;
use tracing::debug;

pub use failure::Failure;
pub use hook::{depth, install};

/// Exception type attached to captured failures.
pub const FAILURE_TYPE: &str = "generic failure";

/// Culprit used when the program name cannot be determined.
const UNKNOWN_PROGRAM: &str = "<unknown>";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The work failed and the failure was delivered as `event_id`.
    #[error("{failure} (reported as event {event_id})")]
    Reported { event_id: String, failure: Failure },

    /// The failure could not be reported, or the client rejected the event
    /// before sending (e.g. a processor failed).
    #[error(transparent)]
    Raven(#[from] RavenError),
}

impl CaptureError {
    /// The id of the reported event, if the report went through.
    pub fn event_id(&self) -> Option<&str> {
        match self {
            CaptureError::Reported { event_id, .. } => Some(event_id),
            CaptureError::Raven(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

/**
 * Runs `work` and reports its failure, if any.
 *
 * # Returns
 * - `Ok(value)` — `work` succeeded; nothing was sent.
 * - `Err(CaptureError::Reported { .. })` — `work` failed and the
 *   collector confirmed the event.
 * - `Err(CaptureError::Raven(RavenError::ReportingFailed { .. }))` — the
 *   collector did not return an id.
 * - `Err(CaptureError::Raven(_))` — a processor or encoding error
 *   prevented sending.
 */
pub fn capture_errors<T, F>(client: &Client, work: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> Result<T, Failure>,
{
    match work() {
        Ok(value) => Ok(value),
        Err(failure) => Err(report(client, failure)),
    }
}

/**
 * Runs `work`, intercepting any panic it raises on this thread.
 *
 * Installs the process-wide hook on first use. Panics outside any
 * `capture_panics` scope keep their usual behaviour.
 */
pub fn capture_panics<T, F>(client: &Client, work: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> T + UnwindSafe,
{
    install();

    let scope = hook::Scope::enter();
    let outcome = panic::catch_unwind(work);
    let recorded = scope.take_recorded();
    drop(scope);

    match outcome {
        Ok(value) => Ok(value),
        Err(payload) => {
            let failure = recorded.unwrap_or_else(|| {
                Failure::with_frames(hook::panic_message(payload.as_ref()), Vec::new())
            });
            Err(report(client, failure))
        }
    }
}

/// Like `capture_panics` for closures that are not `UnwindSafe`.
pub fn capture_panics_unchecked<T, F>(client: &Client, work: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> T,
{
    capture_panics(client, AssertUnwindSafe(work))
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn report(client: &Client, failure: Failure) -> CaptureError {
    let mut overrides = Overrides::new()
        .message(failure.message())
        .culprit(program_name())
        .interface(interfaces::exception(FAILURE_TYPE, failure.message()));
    if !failure.frames().is_empty() {
        overrides = overrides.interface(interfaces::stacktrace(failure.frames().to_vec()));
    }

    let event = client.construct(overrides);
    let dump = serde_json::to_string_pretty(&event).unwrap_or_else(|_| format!("{event:#?}"));

    match client.send(event) {
        Ok(Some(event_id)) => {
            debug!(%event_id, "captured failure reported");
            CaptureError::Reported { event_id, failure }
        }
        Ok(None) => RavenError::ReportingFailed { event: dump }.into(),
        Err(err) => err.into(),
    }
}

/// File name of the running executable, as invoked.
fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::current_exe().ok())
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNKNOWN_PROGRAM.to_string())
}

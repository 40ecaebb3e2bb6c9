/**
 * Warning side-channel.
 *
 * Non-fatal problems (an invalid level, a transport failure, a rejected
 * event) never interrupt the caller. They are reported here instead.
 *
 * The default sink forwards to `tracing::warn!`. Hosts that want to react
 * programmatically install their own `WarningSink`, or a `CollectingSink`
 * to inspect them later.
 */
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::warn;

// ---------------------------------------------------------------------------
// Warning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A `level` value outside the fixed set; the event used `fallback`.
    InvalidLevel { value: String, fallback: String },

    /// The request never produced a response.
    TransportFailed { error: String },

    /// The collector answered with a non-200 status.
    /// `body` holds at most the first 1000 chars of the response.
    Rejected { status: u16, body: String },

    /// A 200 response whose body had no usable `id`.
    MalformedResponse { error: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidLevel { value, fallback } => {
                write!(f, "invalid level {value:?}, using {fallback:?}")
            }
            Warning::TransportFailed { error } => write!(f, "failed to send event: {error}"),
            Warning::Rejected { status, body } => {
                write!(f, "collector responded with HTTP {status}: {body}")
            }
            Warning::MalformedResponse { error } => {
                write!(f, "could not read event id from collector response: {error}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

pub trait WarningSink: Send + Sync {
    fn warn(&self, warning: Warning);
}

impl<F> WarningSink for F
where
    F: Fn(Warning) + Send + Sync,
{
    fn warn(&self, warning: Warning) {
        self(warning)
    }
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, warning: Warning) {
        warn!(target: "raven", "{warning}");
    }
}

/// Records every warning. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default()
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, warning: Warning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning);
        }
    }
}

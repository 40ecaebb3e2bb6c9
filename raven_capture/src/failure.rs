use std::fmt;

use raven_core::frames;
use raven_core::Frame;

/**
 * A failure together with the stack trace captured where it was created.
 *
 * Any `std::error::Error` converts into a `Failure`, so `?` inside a
 * `capture_errors` block records the trace at the point of propagation:
 *
 * ```ignore
 * raven_capture::capture_errors(&client, || {
 *     let raw = std::fs::read_to_string("settings.toml")?;
 *     Ok(raw.len())
 * })?;
 * ```
 *
 * `Failure` deliberately does not implement `std::error::Error` itself;
 * that would collide with the blanket `From` impl.
 */
pub struct Failure {
    message: String,
    frames: Vec<Frame>,
}

impl Failure {
    /// Captures a backtrace at the call site.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: frames::capture().unwrap_or_default(),
        }
    }

    /// Uses already captured frames (oldest first).
    pub fn with_frames(message: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            message: message.into(),
            frames,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error,
{
    fn from(error: E) -> Self {
        Self::new(error.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("message", &self.message)
            .field("frames", &self.frames.len())
            .finish()
    }
}

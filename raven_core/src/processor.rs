/**
 * Processor chain — ordered transforms applied to every event before it is
 * serialized.
 *
 * Typical uses: scrubbing secrets out of `extra`, adding tags computed at
 * send time, dropping noise.
 *
 * Each processor receives the event and returns:
 * - `Ok(Some(event))` — continue with this (possibly modified) event.
 * - `Ok(None)` — nothing to continue with; the chain aborts.
 * - `Err(e)` — the chain aborts.
 *
 * A panicking processor is treated like one that returned `Err`. An
 * aborted chain surfaces `RavenError::Processor` naming the offending
 * processor, and the event is never transmitted.
 */
use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, RavenError, Result};
use crate::protocol::types::Event;

pub type ProcessorResult = std::result::Result<Option<Event>, BoxError>;

// ---------------------------------------------------------------------------
// Processor trait
// ---------------------------------------------------------------------------

pub trait Processor: Send + Sync {
    /// Identifies the processor in `RavenError::Processor`.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn process(&self, event: Event) -> ProcessorResult;
}

/// Closure adapter created by [`processor_fn`].
pub struct FnProcessor<F> {
    name: String,
    f: F,
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(Event) -> ProcessorResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, event: Event) -> ProcessorResult {
        (self.f)(event)
    }
}

/**
 * Wraps a closure as a named processor.
 *
 * ```ignore
 * client.add_processor(processor_fn("scrub-password", |mut event| {
 *     event.extra.remove("password");
 *     Ok(Some(event))
 * }));
 * ```
 */
pub fn processor_fn<F>(name: impl Into<String>, f: F) -> FnProcessor<F>
where
    F: Fn(Event) -> ProcessorResult + Send + Sync,
{
    FnProcessor {
        name: name.into(),
        f,
    }
}

// ---------------------------------------------------------------------------
// ProcessorChain
// ---------------------------------------------------------------------------

/// Append-only list of processors, run in insertion order.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    pub fn push(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn clear(&mut self) {
        self.processors.clear();
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Runs every processor in order; stops at the first failure.
    pub fn process(&self, mut event: Event) -> Result<Event> {
        for (index, processor) in self.processors.iter().enumerate() {
            let fail = |reason: String| RavenError::Processor {
                index,
                name: processor.name().to_string(),
                reason,
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(event)));

            event = match outcome {
                Ok(Ok(Some(next))) => next,
                Ok(Ok(None)) => return Err(fail("returned no event".into())),
                Ok(Err(err)) => return Err(fail(err.to_string())),
                Err(_) => return Err(fail("panicked".into())),
            };
        }

        Ok(event)
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Defaults, EventBuilder, Overrides};
    use crate::context::Context;

    fn event() -> Event {
        EventBuilder::new(Defaults {
            server_name: "h".into(),
            ..Defaults::default()
        })
        .construct(&Context::default(), Overrides::new().message("original"))
    }

    struct Uppercase;

    impl Processor for Uppercase {
        fn process(&self, mut event: Event) -> ProcessorResult {
            event.message = event.message.to_uppercase();
            Ok(Some(event))
        }
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let input = event();
        let out = ProcessorChain::default().process(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_runs_in_order() {
        let mut chain = ProcessorChain::default();
        chain.push(Box::new(processor_fn("suffix", |mut e: Event| {
            e.message.push_str("-a");
            Ok(Some(e))
        })));
        chain.push(Box::new(Uppercase));

        let out = chain.process(event()).unwrap();
        assert_eq!(out.message, "ORIGINAL-A");
    }

    #[test]
    fn test_none_aborts_with_name_and_index() {
        let mut chain = ProcessorChain::default();
        chain.push(Box::new(Uppercase));
        chain.push(Box::new(processor_fn("drop-all", |_| Ok(None))));
        chain.push(Box::new(processor_fn("never-runs", |_| panic!("should not run"))));

        match chain.process(event()) {
            Err(RavenError::Processor { index, name, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "drop-all");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_error_and_panic_abort() {
        let mut chain = ProcessorChain::default();
        chain.push(Box::new(processor_fn("fails", |_| Err("boom".into()))));
        let err = chain.process(event()).unwrap_err();
        assert!(err.to_string().contains("boom"));

        chain.clear();
        chain.push(Box::new(processor_fn("panics", |_| panic!("kaboom"))));
        assert!(matches!(
            chain.process(event()),
            Err(RavenError::Processor { reason, .. }) if reason == "panicked"
        ));
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(Uppercase.name().ends_with("Uppercase"));
    }
}

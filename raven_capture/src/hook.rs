/**
 * Scoped panic interception.
 *
 * `std::panic::set_hook` is process-global, so the hook is installed once
 * and then consults thread-local state:
 *
 * - Inside an interception scope (`DEPTH > 0`) it records the panic
 *   message and a backtrace for the scope owner to pick up, and stays
 *   quiet.
 * - Outside any scope it forwards to the previous hook, so ordinary panics
 *   keep their default stderr output.
 *
 * Scopes nest with stack discipline: entering bumps the depth, dropping
 * the `Scope` restores the depth it saw on entry.
 */
use std::cell::{Cell, RefCell};
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};

use raven_core::frames;

use crate::failure::Failure;

/// Guards against stacking the hook on repeated `install()` calls.
static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };

    /// Re-entrancy guard for a panic raised while recording.
    static IN_HOOK: Cell<bool> = const { Cell::new(false) };

    static RECORDED: RefCell<Option<Failure>> = const { RefCell::new(None) };
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

/// Installs the process-wide hook. Idempotent.
pub fn install() {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if DEPTH.with(Cell::get) == 0 {
            previous_hook(info);
            return;
        }

        let is_recursive = IN_HOOK.with(|flag| flag.replace(true));
        if is_recursive {
            previous_hook(info);
            return;
        }

        let _ = panic::catch_unwind(panic::AssertUnwindSafe(|| record(info)));
        IN_HOOK.with(|flag| flag.set(false));
    }));
}

fn record(info: &PanicHookInfo<'_>) {
    let message = panic_message(info.payload());
    let message = match info.location() {
        Some(loc) => format!("{message} at {}:{}", loc.file(), loc.line()),
        None => message,
    };

    let frames = frames::capture_panic().unwrap_or_default();
    RECORDED.with(|slot| *slot.borrow_mut() = Some(Failure::with_frames(message, frames)));
}

/// Text of a panic payload; `&str` and `String` payloads are the common cases.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown panic>".to_string()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// An active interception scope on the current thread.
pub(crate) struct Scope {
    previous: usize,
}

impl Scope {
    pub(crate) fn enter() -> Self {
        let previous = DEPTH.with(|depth| depth.replace(depth.get() + 1));
        Self { previous }
    }

    /// Takes the failure recorded by the most recent intercepted panic.
    pub(crate) fn take_recorded(&self) -> Option<Failure> {
        RECORDED.with(|slot| slot.borrow_mut().take())
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(self.previous));
    }
}

/// Current interception depth on this thread.
pub fn depth() -> usize {
    DEPTH.with(Cell::get)
}

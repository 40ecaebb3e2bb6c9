/**
 * Stack-frame adapter.
 *
 * Converts a `backtrace::Backtrace` (innermost frame first) into the
 * protocol's frame list (oldest frame first, innermost last).
 *
 * For each resolved symbol we keep:
 * - `function` — demangled symbol name
 * - `module` — the symbol path minus its last segment
 * - `filename` / `abs_path` — file name and full path, if debug info exists
 * - `lineno` / `colno`
 * - `in_app` — false for std / runtime / capture machinery
 */
use std::path::Path;

use crate::protocol::types::Frame;

/// Captures a backtrace at the call site and converts it.
/// Returns `None` if no useful frames were resolved.
pub fn capture() -> Option<Vec<Frame>> {
    non_empty(convert_backtrace(&backtrace::Backtrace::new()))
}

/**
 * Captures a backtrace from inside a panic hook.
 *
 * Everything from the hook down to the panic entry points
 * (`core::panicking::panic_fmt`, `rust_begin_unwind`...) is dropped, so
 * the innermost remaining frame is the code that panicked.
 */
pub fn capture_panic() -> Option<Vec<Frame>> {
    let mut frames = innermost_first(&backtrace::Backtrace::new());

    match panic_entry_end(&frames) {
        Some(end) => {
            frames.drain(..=end);
        }
        None => skip_capture_machinery(&mut frames),
    }
    frames.reverse();

    non_empty(frames)
}

/**
 * Converts a resolved backtrace into frames, oldest first.
 *
 * Filters out symbols with no useful info (no file AND no function) and
 * the innermost frames that belong to the capture machinery itself.
 */
pub fn convert_backtrace(bt: &backtrace::Backtrace) -> Vec<Frame> {
    let mut frames = innermost_first(bt);
    skip_capture_machinery(&mut frames);
    frames.reverse();
    frames
}

/// `backtrace` order: innermost frame first.
fn innermost_first(bt: &backtrace::Backtrace) -> Vec<Frame> {
    let mut frames = Vec::new();

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let function = symbol.name().map(|n| format!("{n:#}"));
            let path = symbol.filename();

            if function.is_none() && path.is_none() {
                continue;
            }

            frames.push(Frame {
                filename: path
                    .and_then(Path::file_name)
                    .map(|f| f.to_string_lossy().into_owned()),
                abs_path: path.map(|p| p.display().to_string()),
                module: function.as_deref().and_then(module_of),
                in_app: function.as_deref().map(is_in_app),
                lineno: symbol.lineno(),
                colno: symbol.colno(),
                function,
                ..Default::default()
            });
        }
    }

    frames
}

fn skip_capture_machinery(frames: &mut Vec<Frame>) {
    let skip = frames
        .iter()
        .take_while(|f| f.function.as_deref().is_some_and(is_capture_machinery))
        .count();
    frames.drain(..skip);
}

/**
 * Index (innermost first) of the outermost panic entry frame.
 *
 * The hook and unwinding frames sit inside the panic entry points; after
 * the first entry frame we keep scanning through runtime frames and stop
 * at the first frame outside std/core/alloc.
 */
fn panic_entry_end(frames: &[Frame]) -> Option<usize> {
    let mut end = None;

    for (idx, frame) in frames.iter().enumerate() {
        let Some(function) = frame.function.as_deref() else {
            continue;
        };
        if is_panic_entry(function) {
            end = Some(idx);
        } else if end.is_some() && !is_runtime(function) {
            break;
        }
    }

    end
}

fn non_empty(frames: Vec<Frame>) -> Option<Vec<Frame>> {
    if frames.is_empty() {
        None
    } else {
        Some(frames)
    }
}

/// `a::b::c` -> `a::b`.
fn module_of(function: &str) -> Option<String> {
    let base = function.split('<').next().unwrap_or(function);
    base.rfind("::").map(|idx| base[..idx].to_string())
}

fn is_capture_machinery(function: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "backtrace::",
        "<backtrace::",
        "raven_core::frames::",
        "raven_capture::failure::",
        "<raven_capture::failure::",
        "raven_capture::hook::",
    ];
    PREFIXES.iter().any(|p| function.starts_with(p))
        || function.contains(" as core::ops::try_trait::FromResidual<")
}

fn is_panic_entry(function: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "core::panicking::",
        "std::panicking::begin_panic",
        "std::panicking::rust_panic_with_hook",
        "std::panicking::panic_with_hook",
    ];
    const CONTAINS: &[&str] = &["rust_begin_unwind", "__rust_end_short_backtrace"];

    PREFIXES.iter().any(|p| function.starts_with(p))
        || CONTAINS.iter().any(|c| function.contains(c))
}

/// std, core and alloc frames, including trait impls on their types.
fn is_runtime(function: &str) -> bool {
    const PREFIXES: &[&str] = &["std::", "core::", "alloc::", "<std::", "<core::", "<alloc::"];
    PREFIXES.iter().any(|p| function.starts_with(p))
}

/// Heuristic: anything outside std, the unwinding runtime and this client.
fn is_in_app(function: &str) -> bool {
    const SYSTEM_PREFIXES: &[&str] = &[
        "std::",
        "core::",
        "alloc::",
        "<std::",
        "<core::",
        "<alloc::",
        "backtrace::",
        "<backtrace::",
        "raven_core::",
        "raven_capture::",
        "panic_unwind::",
        "rust_begin_unwind",
        "rust_panic",
        "__rust_",
        "__rustc::",
        "_rust_",
    ];
    const SYSTEM_CONTAINS: &[&str] = &["::panicking::", "::rt::", "::sys_common::"];

    !(SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
        || SYSTEM_CONTAINS.iter().any(|c| function.contains(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_of() {
        assert_eq!(module_of("app::handlers::run").as_deref(), Some("app::handlers"));
        assert_eq!(module_of("main"), None);
    }

    #[test]
    fn test_in_app_heuristic() {
        assert!(!is_in_app("std::panicking::begin_panic"));
        assert!(!is_in_app("core::ops::function::FnOnce::call_once"));
        assert!(!is_in_app("raven_core::client::Client::send"));
        assert!(is_in_app("my_service::db::connect"));
    }

    fn named(names: &[&str]) -> Vec<Frame> {
        names
            .iter()
            .map(|name| Frame {
                function: Some(name.to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_panic_entry_end_stops_at_panicking_code() {
        // innermost first, as seen from inside the panic hook
        let frames = named(&[
            "raven_capture::hook::record",
            "core::ops::function::FnOnce::call_once",
            "std::panicking::catch_unwind::do_call",
            "__rust_try",
            "std::panic::catch_unwind",
            "raven_capture::hook::install::{{closure}}",
            "<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call",
            "std::panicking::rust_panic_with_hook",
            "std::panicking::begin_panic_handler::{{closure}}",
            "std::sys::backtrace::__rust_end_short_backtrace",
            "__rustc::rust_begin_unwind",
            "core::panicking::panic_fmt",
            "core::result::unwrap_failed",
            "app::load_config",
            "app::main",
            "std::rt::lang_start",
        ]);

        let end = panic_entry_end(&frames).unwrap();
        assert_eq!(frames[end].function.as_deref(), Some("core::panicking::panic_fmt"));
    }

    #[test]
    fn test_panic_entry_end_without_panic() {
        let frames = named(&["app::run", "std::rt::lang_start"]);
        assert_eq!(panic_entry_end(&frames), None);
    }

    #[test]
    fn test_capture_machinery_includes_question_mark_conversion() {
        let mut frames = named(&[
            "backtrace::capture::Backtrace::new",
            "raven_core::frames::capture",
            "raven_capture::failure::Failure::new",
            "<raven_capture::failure::Failure as core::convert::From<E>>::from",
            "<core::result::Result<T,F> as core::ops::try_trait::FromResidual<\
             core::result::Result<core::convert::Infallible,E>>>::from_residual",
            "app::parse_port",
            "app::main",
        ]);

        skip_capture_machinery(&mut frames);
        assert_eq!(frames[0].function.as_deref(), Some("app::parse_port"));
    }

    #[test]
    fn test_convert_is_oldest_first() {
        // Frames depend on debug info; only check ordering when we can see ourselves.
        let bt = backtrace::Backtrace::new();
        let frames = convert_backtrace(&bt);
        let this = frames.iter().position(|f| {
            f.function
                .as_deref()
                .is_some_and(|name| name.contains("test_convert_is_oldest_first"))
        });
        if let Some(idx) = this {
            assert!(frames[..idx]
                .iter()
                .all(|f| !f.function.as_deref().is_some_and(|n| n.starts_with("backtrace::"))));
        }
        assert!(frames
            .last()
            .and_then(|f| f.function.as_deref())
            .map_or(true, |name| !name.starts_with("backtrace::")));
    }
}

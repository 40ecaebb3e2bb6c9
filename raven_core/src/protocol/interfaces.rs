/*!
 * Interface builders.
 *
 * Each function produces a single `Interface` value with the per-field
 * length limits already applied, ready to be attached to an event through
 * `Overrides::interface`.
 */

use crate::frames;
use crate::protocol::types::{Exception, Frame, Http, Interface, Query, Stacktrace, User};

/// Exception interface: `kind` is the error class name, `value` its message.
pub fn exception(kind: impl Into<String>, value: impl Into<String>) -> Interface {
    let mut exception = Exception {
        kind: kind.into(),
        value: value.into(),
    };
    exception.truncate();
    Interface::Exception(exception)
}

/// Exception interface built from a Rust error.
///
/// The type name is the last path segment of `E`, e.g. `Error` for
/// `std::io::Error`.
pub fn exception_from_error<E: std::error::Error + ?Sized>(error: &E) -> Interface {
    exception(short_type_name::<E>(), error.to_string())
}

pub fn http(mut request: Http) -> Interface {
    request.truncate();
    Interface::Http(request)
}

/// Stacktrace interface from frames ordered oldest-first.
pub fn stacktrace(frames: Vec<Frame>) -> Interface {
    let mut stacktrace = Stacktrace { frames };
    stacktrace.truncate();
    Interface::Stacktrace(stacktrace)
}

/// Stacktrace interface from a captured `backtrace::Backtrace`.
pub fn stacktrace_from_backtrace(bt: &backtrace::Backtrace) -> Interface {
    stacktrace(frames::convert_backtrace(bt))
}

pub fn user(mut user: User) -> Interface {
    user.truncate();
    Interface::User(user)
}

pub fn query(query: impl Into<String>, engine: Option<&str>) -> Interface {
    let mut query = Query {
        query: query.into(),
        engine: engine.map(str::to_string),
    };
    query.truncate();
    Interface::Query(query)
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    /*
     * Strip generic arguments first so `Foo<bar::Baz>` yields `Foo`,
     * then keep the last path segment.
     */
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{MAX_EXCEPTION_VALUE, MAX_FRAME_FIELD, MAX_USER_FIELD};

    #[test]
    fn test_exception_limits() {
        let Interface::Exception(e) = exception("T".repeat(500), "v".repeat(500)) else {
            panic!("expected exception");
        };
        assert_eq!(e.kind.chars().count(), 128);
        assert_eq!(e.value.chars().count(), MAX_EXCEPTION_VALUE);
    }

    #[test]
    fn test_exception_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let Interface::Exception(e) = exception_from_error(&err) else {
            panic!("expected exception");
        };
        assert_eq!(e.kind, "Error");
        assert_eq!(e.value, "missing file");
    }

    #[test]
    fn test_http_limits() {
        let mut request = Http::new("POST", format!("https://example.com/{}", "a".repeat(2000)));
        request.data = Some("d".repeat(5000));
        request.cookies = Some("c=1".to_string());

        let Interface::Http(h) = http(request) else {
            panic!("expected http");
        };
        assert_eq!(h.url.chars().count(), 1024);
        assert_eq!(h.data.as_deref().map(|d| d.len()), Some(2048));
        assert_eq!(h.cookies.as_deref(), Some("c=1"));
        assert_eq!(h.method, "POST");
    }

    #[test]
    fn test_stacktrace_frame_limits() {
        let frame = Frame {
            function: Some("f".repeat(300)),
            lineno: Some(3),
            ..Default::default()
        };
        let Interface::Stacktrace(st) = stacktrace(vec![frame]) else {
            panic!("expected stacktrace");
        };
        assert_eq!(
            st.frames[0].function.as_deref().map(|f| f.len()),
            Some(MAX_FRAME_FIELD)
        );
        assert_eq!(st.frames[0].lineno, Some(3));
    }

    #[test]
    fn test_user_and_query_limits() {
        let Interface::User(u) = user(User {
            email: Some("x".repeat(200)),
            ..Default::default()
        }) else {
            panic!("expected user");
        };
        assert_eq!(u.email.map(|e| e.len()), Some(MAX_USER_FIELD));

        let Interface::Query(q) = query("q".repeat(2000), Some("postgres")) else {
            panic!("expected query");
        };
        assert_eq!(q.query.len(), 1024);
        assert_eq!(q.engine.as_deref(), Some("postgres"));
    }
}

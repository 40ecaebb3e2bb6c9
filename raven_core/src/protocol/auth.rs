//! The `X-Sentry-Auth` header.
//!
//! Output looks like
//!
//! ```text
//! Sentry sentry_client=raven-rust/0.1.0, sentry_key=K, sentry_secret=S,
//!     sentry_timestamp=T, sentry_version=7
//! ```
//!
//! (one line on the wire).
//! Keys are always emitted in lexicographic order. Nothing is redacted:
//! this header is the transport credential.

use std::collections::BTreeMap;

use crate::protocol::constants::CLIENT_VERSION;

/// Inputs of the auth header.
#[derive(Debug, Clone, Copy)]
pub struct AuthParams<'a> {
    pub protocol_version: &'a str,
    pub public_key: &'a str,
    pub secret_key: &'a str,
    /// Unix seconds.
    pub timestamp: i64,
}

pub fn auth_header(params: AuthParams<'_>) -> String {
    let timestamp = params.timestamp.to_string();

    let mut fields = BTreeMap::new();
    fields.insert("sentry_version", params.protocol_version);
    fields.insert("sentry_client", CLIENT_VERSION);
    fields.insert("sentry_timestamp", timestamp.as_str());
    fields.insert("sentry_key", params.public_key);
    fields.insert("sentry_secret", params.secret_key);

    let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("Sentry {}", pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_sorted_and_complete() {
        let header = auth_header(AuthParams {
            protocol_version: "7",
            public_key: "key",
            secret_key: "secret",
            timestamp: 1_700_000_000,
        });

        assert_eq!(
            header,
            format!(
                "Sentry sentry_client={CLIENT_VERSION}, sentry_key=key, sentry_secret=secret, \
                 sentry_timestamp=1700000000, sentry_version=7"
            )
        );
    }

    #[test]
    fn test_header_is_deterministic() {
        let params = AuthParams {
            protocol_version: "2.0",
            public_key: "a",
            secret_key: "b",
            timestamp: 5,
        };
        assert_eq!(auth_header(params), auth_header(params));
    }
}

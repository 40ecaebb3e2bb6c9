/**
 * Default context for the raven client.
 *
 * The `ContextStore` holds the field values applied to every outgoing
 * event unless a capture call overrides them:
 *
 * - **Scalars** — message, level, logger, platform, server_name, culprit,
 *   event_id, timestamp.
 * - **Tags / extra** — maps merged key-by-key into each event.
 * - **Fingerprint** — replaced wholesale by the most specific value.
 * - **Custom** — arbitrary top-level fields.
 *
 * Nothing is validated here; `EventBuilder::construct` validates when the
 * event is built. The store is owned by the `Client` and mutated through
 * `&mut`, so sharing a client across threads needs an outer `Mutex`.
 */
use serde::Serialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Context — a partial set of event fields
// ---------------------------------------------------------------------------

/**
 * A partial event: every field is optional.
 *
 * Used both as the stored defaults and as the field part of per-call
 * overrides. `level` stays a raw string so an invalid value can reach the
 * builder and be reported there.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,

    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /**
     * Overwrites every field that is set in `partial`; leaves the rest.
     *
     * `tags`, `extra` and `fingerprint` are replaced as a whole when given.
     * Custom keys are inserted one by one.
     */
    pub fn apply(&mut self, partial: Context) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.event_id, partial.event_id);
        set(&mut self.timestamp, partial.timestamp);
        set(&mut self.level, partial.level);
        set(&mut self.logger, partial.logger);
        set(&mut self.platform, partial.platform);
        set(&mut self.server_name, partial.server_name);
        set(&mut self.culprit, partial.culprit);
        set(&mut self.message, partial.message);
        set(&mut self.tags, partial.tags);
        set(&mut self.extra, partial.extra);
        set(&mut self.fingerprint, partial.fingerprint);
        self.custom.extend(partial.custom);
    }
}

// ---------------------------------------------------------------------------
// ContextStore
// ---------------------------------------------------------------------------

/// The client's mutable default context.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    inner: Context,
}

impl ContextStore {
    pub fn new(initial: Context) -> Self {
        Self { inner: initial }
    }

    /// Snapshot of all stored defaults.
    pub fn get(&self) -> Context {
        self.inner.clone()
    }

    /// Borrowing view, used when building events.
    pub fn as_context(&self) -> &Context {
        &self.inner
    }

    /// Overwrites or adds the given keys only.
    pub fn add(&mut self, partial: Context) {
        self.inner.apply(partial);
    }

    /// Shallow union into the stored tags; incoming keys win.
    pub fn merge_tags(&mut self, tags: Map<String, Value>) {
        self.inner.tags.get_or_insert_with(Map::new).extend(tags);
    }

    /// Shallow union into the stored extra; incoming keys win.
    pub fn merge_extra(&mut self, extra: Map<String, Value>) {
        self.inner.extra.get_or_insert_with(Map::new).extend(extra);
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .tags
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
    }

    /// Resets to an empty context.
    pub fn clear(&mut self) {
        self.inner = Context::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_add_only_touches_given_keys() {
        let mut store = ContextStore::new(Context {
            message: Some("hello".into()),
            logger: Some("app".into()),
            ..Default::default()
        });

        store.add(Context {
            message: Some("bye".into()),
            ..Default::default()
        });

        let ctx = store.get();
        assert_eq!(ctx.message.as_deref(), Some("bye"));
        assert_eq!(ctx.logger.as_deref(), Some("app"));
    }

    #[test]
    fn test_add_replaces_tags_wholesale() {
        let mut store = ContextStore::default();
        store.merge_tags(map(json!({ "a": 1, "b": 2 })));
        store.add(Context {
            tags: Some(map(json!({ "c": 3 }))),
            ..Default::default()
        });
        assert_eq!(store.get().tags, Some(map(json!({ "c": 3 }))));
    }

    #[test]
    fn test_merge_tags_and_extra() {
        let mut store = ContextStore::default();
        store.merge_tags(map(json!({ "region": "eu", "tier": "free" })));
        store.merge_tags(map(json!({ "tier": "pro" })));
        store.merge_extra(map(json!({ "build": 7 })));
        store.set_extra("commit", "abc");

        let ctx = store.get();
        assert_eq!(ctx.tags, Some(map(json!({ "region": "eu", "tier": "pro" }))));
        assert_eq!(ctx.extra, Some(map(json!({ "build": 7, "commit": "abc" }))));
    }

    #[test]
    fn test_clear() {
        let mut store = ContextStore::default();
        store.set_tag("k", "v");
        store.add(Context {
            level: Some("info".into()),
            ..Default::default()
        });
        store.clear();
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut store = ContextStore::default();
        store.set_tag("k", "v");
        assert_eq!(store.get(), store.get());
    }

    #[test]
    fn test_no_validation_at_store_level() {
        let mut store = ContextStore::default();
        store.add(Context {
            level: Some("not-a-level".into()),
            ..Default::default()
        });
        assert_eq!(store.get().level.as_deref(), Some("not-a-level"));
    }
}

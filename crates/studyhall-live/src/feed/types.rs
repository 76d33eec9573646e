//! Configuration and callback types for the change feed.

/// Callback invoked with the row payload of a change event.
pub type RowCallback = Box<dyn Fn(serde_json::Value) + Send + Sync>;

/// Equality filter on one field of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Render as the wire filter expression, e.g. `user_id=eq.u1`.
    pub fn to_expr(&self) -> String {
        format!("{}=eq.{}", self.field, self.value)
    }
}

/// Configuration for a change feed.
#[derive(Debug, Clone)]
pub struct ChangeFeedConfig {
    /// Collection (table) to watch. Must be non-empty.
    pub collection: String,
    /// Optional equality filter narrowing the feed.
    pub filter: Option<FieldFilter>,
    /// Whether the feed subscribes on creation (default: true).
    pub enabled: bool,
}

impl ChangeFeedConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            enabled: true,
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(FieldFilter::eq(field, value));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Per-kind callbacks for a change feed.
///
/// Kinds without a registered callback drop their events with a debug
/// log; absence is not an error.
#[derive(Default)]
pub struct ChangeFeedCallbacks {
    pub on_insert: Option<RowCallback>,
    pub on_update: Option<RowCallback>,
    pub on_delete: Option<RowCallback>,
}

impl ChangeFeedCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_insert(mut self, f: impl Fn(serde_json::Value) + Send + Sync + 'static) -> Self {
        self.on_insert = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(serde_json::Value) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl Fn(serde_json::Value) + Send + Sync + 'static) -> Self {
        self.on_delete = Some(Box::new(f));
        self
    }
}

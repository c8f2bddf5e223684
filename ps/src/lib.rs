//! PlanStore - generic JSONL document store
//!
//! Each record type lives in its own collection file. Mutations take an
//! exclusive `fs2` lock on a sidecar lock file and rewrite the collection
//! atomically (write to temp file, then rename), so concurrent CLI processes
//! never observe a half-written collection.
//!
//! # Layout
//!
//! ```text
//! {store}/
//! ├── plans.jsonl     # one JSON document per line
//! └── plans.lock      # advisory lock file
//! ```
//!
//! # Example
//!
//! ```ignore
//! use planstore::{Filter, FilterOp, IndexValue, Store};
//!
//! let mut store = Store::open("~/.local/share/weekender/plans")?;
//! store.create(plan)?;
//! let mine: Vec<SavedPlan> = store.list(&[Filter::eq("userEmail", IndexValue::String(email))])?;
//! ```

mod store;

pub use store::Store;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A document that can be persisted in a [`Store`]
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Unique identifier within the collection
    fn id(&self) -> &str;

    /// Last modification time (unix ms), used for ordering ties
    fn updated_at(&self) -> i64;

    /// Collection (file stem) this record type is stored under
    fn collection_name() -> &'static str;

    /// Fields that can be used in [`Filter`]s
    fn indexed_fields(&self) -> HashMap<String, IndexValue>;
}

/// A value of an indexed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

/// Comparison used by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

/// Restricts [`Store::list`] results by an indexed field
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    /// Shorthand for an equality filter
    pub fn eq(field: impl Into<String>, value: IndexValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }

    /// Check a record's indexed fields against this filter
    ///
    /// A record without the field only matches `Ne`.
    pub fn matches(&self, fields: &HashMap<String, IndexValue>) -> bool {
        match (fields.get(&self.field), self.op) {
            (Some(v), FilterOp::Eq) => *v == self.value,
            (Some(v), FilterOp::Ne) => *v != self.value,
            (None, FilterOp::Eq) => false,
            (None, FilterOp::Ne) => true,
        }
    }
}

/// Current time in unix milliseconds
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

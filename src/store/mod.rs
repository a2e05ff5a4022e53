pub mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::core::{Record, RecordId};

/// Visibility mode a write runs under.
///
/// `Restricted` applies the acting principal's record-visibility rules;
/// `Elevated` bypasses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Restricted,
    Elevated,
}

/// One rejection reason attached to a failed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveError {
    pub status_code: String,
    pub message: String,
}

impl SaveError {
    pub fn new(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            message: message.into(),
        }
    }
}

/// Per-record result of a batched write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub record_id: Option<RecordId>,
    pub errors: Vec<SaveError>,
}

impl SaveOutcome {
    pub fn ok(record_id: RecordId) -> Self {
        Self {
            success: true,
            record_id: Some(record_id),
            errors: Vec::new(),
        }
    }

    pub fn failed(error: SaveError) -> Self {
        Self {
            success: false,
            record_id: None,
            errors: vec![error],
        }
    }
}

/// Underlying batched record store.
///
/// The store commits or rejects individual records; atomicity of the whole
/// logical transaction is the hosting environment's concern. Implementations
/// return one outcome per input record, in input order.
pub trait RecordStore: Send + Sync {
    fn insert(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome>;
    fn update(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome>;
    fn delete(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome>;
}

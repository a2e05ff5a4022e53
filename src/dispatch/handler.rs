use std::collections::HashMap;
use std::sync::Arc;

use crate::context::TransactionContext;
use crate::core::{Record, RecordId};

use super::Phase;

/// Everything a handler sees about the lifecycle event it runs in.
///
/// Cheap to clone: record batches are shared, not copied, per handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub new_records: Arc<Vec<Record>>,
    pub old_records: Arc<HashMap<RecordId, Record>>,
    pub phase: Phase,
    pub transaction: Arc<TransactionContext>,
}

impl HandlerContext {
    /// Prior state of a record, if the phase carries one.
    pub fn old(&self, id: &RecordId) -> Option<&Record> {
        self.old_records.get(id)
    }
}

/// The pluggable unit of business logic.
///
/// The dispatcher calls `set_context` exactly once, then `execute`.
/// Handlers must be idempotent-safe for re-entrant phases when recursion
/// prevention is disabled, and must not assume ordering relative to
/// handlers outside their own configured chain.
pub trait MutationHandler: Send {
    fn set_context(&mut self, ctx: HandlerContext);

    fn execute(&mut self) -> anyhow::Result<()>;
}

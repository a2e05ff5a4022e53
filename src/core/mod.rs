pub mod error;
pub mod types;
pub mod value;

pub use error::{HookError, Result};
pub use types::{EntityType, Record, RecordId, ID_FIELD};
pub use value::Value;

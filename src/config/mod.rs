pub mod records;
pub mod source;
pub mod store;

pub use records::{FeatureFlag, HandlerConfig, SystemProperty};
pub use source::{ConfigSource, StaticConfigSource};
pub use store::ConfigStore;

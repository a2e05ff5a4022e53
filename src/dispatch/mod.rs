pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod phase;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use events::{
    DomainEvent, DomainEventPublisher, MetricsSink, NullMetricsSink, NullPublisher,
    TransactionMetrics,
};
pub use handler::{HandlerContext, MutationHandler};
pub use phase::Phase;
pub use registry::HandlerRegistry;

pub use crate::config::HandlerConfig;

pub mod error;
pub mod event;
pub mod tools;
pub mod traits;
pub mod types;

pub use error::OmraError;
pub use event::{emit, event_channel, Event, EventKind, EventSink};
pub use tools::ToolRegistry;
pub use traits::{TaskHandler, Tool};
pub use types::{
    AgentDefinition, AgentRole, ReorderDirection, RoutingStrategy, Task, TaskResult,
};

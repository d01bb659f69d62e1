pub mod store;

pub use store::AgentRegistry;

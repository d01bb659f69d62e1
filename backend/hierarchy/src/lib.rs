pub mod resolver;

pub use resolver::HierarchyResolver;

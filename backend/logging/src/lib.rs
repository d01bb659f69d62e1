pub mod logger;

pub use logger::{init_console_logger, init_logger};

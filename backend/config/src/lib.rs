pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{AgentEntry, ChildEntry, CrmConfig, LoggingConfig, OmraConfig};
pub use validation::{validate, ValidationReport};

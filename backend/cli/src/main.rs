mod agents_cmd;
mod bootstrap;
mod delegate_cmd;
mod doctor_cmd;
mod tools_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agents_cmd::AgentCommands;
use tools_cmd::ToolCommands;

#[derive(Parser)]
#[command(name = "omra")]
#[command(about = "OMRA — hierarchical agent delegation core")]
#[command(version)]
struct Cli {
    /// Path to the config file (default: <config dir>/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configured agents
    Agents {
        #[command(subcommand)]
        cmd: AgentCommands,
    },
    /// Delegate a task through a parent agent
    Delegate {
        /// Parent agent name
        #[arg(short, long)]
        agent: String,
        /// Task input text
        #[arg(short, long)]
        input: String,
        /// Required skill tag (for skill-based parents)
        #[arg(short, long)]
        skill: Option<String>,
        /// Retries per child on failure
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// List or invoke CRM tools
    Tools {
        #[command(subcommand)]
        cmd: ToolCommands,
    },
    /// Validate the config file
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| omra_config::config_file_path(&omra_config::config_dir()));

    let config = omra_config::load_config(&config_path).await?;
    match config.logging.dir.as_deref() {
        Some(dir) => omra_logging::init_logger(dir, &config.logging.level),
        None => omra_logging::init_console_logger(&config.logging.level),
    }

    match cli.command {
        Commands::Agents { cmd } => {
            let registry = bootstrap::build_registry(&config).await?;
            agents_cmd::run(cmd, &registry).await?;
        }
        Commands::Delegate {
            agent,
            input,
            skill,
            retries,
        } => {
            let registry = bootstrap::build_registry(&config).await?;
            delegate_cmd::run(&registry, &agent, &input, skill.as_deref(), retries).await?;
        }
        Commands::Tools { cmd } => {
            tools_cmd::run(cmd, &config).await?;
        }
        Commands::Doctor => {
            doctor_cmd::run(&config_path).await?;
        }
    }

    Ok(())
}

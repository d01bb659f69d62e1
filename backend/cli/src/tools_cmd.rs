//! `omra tools` subcommands — list and invoke CRM tool bindings.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use omra_config::OmraConfig;
use omra_core::ToolRegistry;
use omra_tools::{register_crm_tools, CrmClient};

#[derive(Subcommand)]
pub enum ToolCommands {
    /// List registered tools and their argument schemas
    List,
    /// Invoke a tool with JSON arguments
    Run {
        /// Tool name (e.g. customer_lookup)
        name: String,
        /// JSON arguments
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

pub async fn run(cmd: ToolCommands, config: &OmraConfig) -> Result<()> {
    let crm_config = config
        .crm
        .as_ref()
        .context("no crm section configured; tools are unavailable")?;
    let crm = Arc::new(CrmClient::new(&crm_config.base_url));

    let mut registry = ToolRegistry::new();
    register_crm_tools(&mut registry, crm.clone());

    match cmd {
        ToolCommands::List => {
            for name in registry.list() {
                if let Some(tool) = registry.get(&name) {
                    println!("{name}: {}", tool.description());
                    println!("  {}", serde_json::to_string(&tool.parameters())?);
                }
            }
        }
        ToolCommands::Run { name, args } => {
            let tool = registry
                .get(&name)
                .with_context(|| format!("unknown tool '{name}'"))?;
            let args: serde_json::Value =
                serde_json::from_str(&args).context("arguments must be valid JSON")?;

            crm.login(&crm_config.email, &crm_config.password).await?;
            let output = tool.execute(args).await?;
            println!("{output}");
        }
    }
    Ok(())
}

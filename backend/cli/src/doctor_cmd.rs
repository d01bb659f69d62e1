//! `omra doctor` — validate the config file and print a report.

use std::path::Path;

use anyhow::Result;

use omra_config::{load_config, validate};

pub async fn run(path: &Path) -> Result<()> {
    println!("checking {}", path.display());
    let config = load_config(path).await?;
    let report = validate(&config);

    for warning in &report.warnings {
        println!("warn:  {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }

    if report.is_valid() {
        println!(
            "ok: {} agent(s), {} warning(s)",
            config.agents.len(),
            report.warnings.len()
        );
        Ok(())
    } else {
        anyhow::bail!("{} validation error(s)", report.errors.len());
    }
}

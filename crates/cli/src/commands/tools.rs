//! `taskpilot tools` — List the built-in tools.

use std::sync::Arc;
use taskpilot_core::PlanStore;
use taskpilot_tools::{ToolOptions, default_registry};
use tokio::sync::RwLock;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    // Listing works without a key; the completion tool is shown only with one.
    let llm = taskpilot_providers::build_llm(&config, "default").ok();
    let registry = default_registry(
        &ToolOptions::from(&config.tools),
        Arc::new(RwLock::new(PlanStore::new())),
        llm,
    );

    println!("Built-in tools ({}):", registry.len());
    for def in registry.definitions() {
        println!("  {:<24} {}", def.name, def.description);
    }
    println!("\nWorkspace: {}", config.tools.workspace_root().display());

    Ok(())
}

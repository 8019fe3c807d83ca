//! `taskpilot run` — Run the agent on one prompt.

use std::sync::Arc;
use taskpilot_agent::pilot_agent;
use taskpilot_core::PlanStore;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub async fn run(prompt: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let llm = super::build_llm(&config)?;

    let prompt = super::read_prompt(prompt).await?;
    if prompt.is_empty() {
        warn!("Empty prompt provided.");
        return Ok(());
    }

    let mut agent = pilot_agent(&config, llm, Arc::new(RwLock::new(PlanStore::new())));
    info!("Processing your request...");
    let result = agent.run(Some(&prompt)).await?;
    info!("Request processing completed.");
    println!("{result}");

    Ok(())
}

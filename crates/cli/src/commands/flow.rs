//! `taskpilot flow` — Plan a prompt, then execute the plan.

use std::time::{Duration, Instant};
use taskpilot_agent::pilot_flow;
use tracing::{error, info, warn};

pub async fn run(prompt: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let llm = super::build_llm(&config)?;

    let prompt = super::read_prompt(prompt).await?;
    if prompt.is_empty() {
        warn!("Empty prompt provided.");
        return Ok(());
    }

    let mut flow = pilot_flow(&config, llm);
    let deadline = Duration::from_secs(config.flow.timeout_secs);
    info!(plan_id = %flow.plan_id(), "Processing your request...");

    let started = Instant::now();
    match tokio::time::timeout(deadline, flow.execute(&prompt)).await {
        Ok(result) => {
            let result = result?;
            info!(
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Request processed"
            );
            println!("{result}");
        }
        Err(_) => {
            error!(timeout_secs = deadline.as_secs(), "Request processing timed out");
            println!("Operation terminated due to timeout. Please try a simpler request.");
        }
    }

    Ok(())
}

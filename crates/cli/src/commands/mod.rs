pub mod flow;
pub mod init;
pub mod run;
pub mod serve;
pub mod tools;

use taskpilot_config::AppConfig;
use tokio::io::AsyncBufReadExt;

/// Load and validate `~/.taskpilot/config.toml`.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The prompt from the flag, or one line read from stdin.
pub async fn read_prompt(prompt: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(prompt) = prompt {
        return Ok(prompt.trim().to_string());
    }
    eprint!("Enter your prompt: ");
    let mut line = String::new();
    tokio::io::BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim().to_string())
}

/// Build the default LLM, explaining how to configure a key when missing.
pub fn build_llm(config: &AppConfig) -> Result<taskpilot_core::Llm, Box<dyn std::error::Error>> {
    taskpilot_providers::build_llm(config, "default").map_err(|e| {
        eprintln!();
        eprintln!("  ERROR: {e}");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TASKPILOT_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        Box::new(e) as Box<dyn std::error::Error>
    })
}

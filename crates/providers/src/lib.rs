//! LLM Provider implementations for taskpilot.
//!
//! All providers implement the `taskpilot_core::Provider` trait.
//! The factory builds the configured provider and wraps it in an `Llm`.

pub mod factory;
pub mod openai_compat;

pub use factory::{build_llm, build_provider};
pub use openai_compat::OpenAiCompatProvider;

//! Remote LLM summarization for repository READMEs.
//!
//! [`SummarizerClient`] talks to an OpenAI-compatible chat-completions
//! endpoint. Input is truncated to a fixed character bound before the call,
//! whitespace-only input short-circuits to [`SENTINEL_SUMMARY`] without any
//! remote request, and transient failures are retried through the shared
//! [`gitpulse_core::RetryPolicy`].

mod client;
mod error;

pub use client::{SummarizerClient, MAX_README_CHARS, SENTINEL_SUMMARY};
pub use error::SummarizeError;

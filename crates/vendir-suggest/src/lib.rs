//! HTTP client for the AI suggestion oracle.
//!
//! Implements [`vendir_core::SuggestionService`] against an OpenAI-compatible
//! chat-completions endpoint. The client owns the rate discipline: a minimum
//! spacing between calls per operation kind, and a shared cooldown after a
//! provider 429 during which calls fail fast with `RateLimited` instead of
//! hitting the wire.

mod client;
mod throttle;

pub use client::SuggestClient;

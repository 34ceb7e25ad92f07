//! Suggestion agent - LLM-backed line item estimation
//!
//! This crate is the only place that talks to a language model. It turns a
//! reconcile request into an Italian-language prompt, calls a pluggable
//! `LlmClient`, and parses the reply into the structured response the core
//! reconciler expects.
//!
//! # Safety Principle
//!
//! The LLM proposes, the core disposes. Every amount coming out of this
//! crate is re-derived and clamped by the deterministic pricing engine, and
//! the whole proposal can be discarded by the guardrail. A failure here is
//! never fatal: the reconciler falls back to templates.

pub mod llm;
pub mod parser;
pub mod prompt;
pub mod source;

pub use llm::{HttpLlmClient, LlmClient};
pub use source::LlmSuggestionSource;

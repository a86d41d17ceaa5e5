//! # Aanya Providers
//!
//! Implementations of the external model-invocation collaborator.
//!
//! Everything the product ships with speaks the OpenAI-compatible
//! `/chat/completions` dialect (Groq, OpenAI), so one client covers both;
//! the [`router::ProviderRouter`] picks a client by `provider_id`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};

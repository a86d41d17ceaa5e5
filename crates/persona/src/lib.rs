//! # Aanya Persona
//!
//! The personalization-and-context-assembly pipeline:
//!
//! 1. [`inference`] — proposes profile updates from raw message text
//! 2. [`merge`] — combines proposals with stored state under the
//!    replace-vs-union rules and the topic cap
//! 3. [`prompt`] — deterministically assembles the system prompt and the
//!    bounded context window for each outbound model call
//!
//! Everything here is pure and deterministic: identical inputs always
//! produce identical outputs, with no storage or clock access.

pub mod inference;
pub mod merge;
pub mod prompt;

pub use inference::analyze_message;
pub use merge::{merge_proposals, union_topics};
pub use prompt::{AssembledPrompt, AssemblyInput, HISTORY_WINDOW, PromptAssembler};

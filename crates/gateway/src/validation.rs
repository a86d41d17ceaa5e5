//! Request validation helpers.
//!
//! All checks here run before any side effect: a rejected request performs
//! zero store writes and no model call.

use serde_json::Value;

/// Characters that make a message meaningless when nothing else is present.
const FILLER_CHARS: &str = ".,!?;: ";

/// Scan a raw JSON body for required fields. A field counts as missing when
/// it is absent or explicitly `null`.
pub fn missing_fields(body: &Value, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|field| body.get(**field).is_none_or(Value::is_null))
        .map(|field| (*field).to_string())
        .collect()
}

/// Is this message empty, whitespace-only, or punctuation-only?
///
/// Borderline-ambiguous text is deliberately let through; the model handles
/// "what do you mean?" better than a validator can.
pub fn is_meaningless(message: &str) -> bool {
    let trimmed = message.trim();
    trimmed.is_empty() || trimmed.chars().all(|c| FILLER_CHARS.contains(c))
}

//! Profile merge policy.
//!
//! Two deliberately different topic contracts share this module:
//!
//! - the message-analysis path *replaces* the stored topic set with what the
//!   current turn observed (freshness), which is just a plain
//!   [`ProfileUpdate`] write;
//! - the explicit incremental-update path *unions* new topics into the
//!   stored set via [`union_topics`] (accumulation), then truncates to the
//!   first [`MAX_FAVORITE_TOPICS`].
//!
//! Callers wanting additive behavior must take the union path explicitly.

use aanya_core::profile::{MAX_FAVORITE_TOPICS, ProfileUpdate};

/// Union newly supplied topics into the existing stored set.
///
/// Order is part of the contract: existing members first (in stored order),
/// then new members in the order each is first encountered. Duplicates are
/// dropped, and the result is truncated to [`MAX_FAVORITE_TOPICS`].
pub fn union_topics(existing: &[String], new: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + new.len());
    for topic in existing.iter().chain(new.iter()) {
        if !merged.contains(topic) {
            merged.push(topic.clone());
        }
    }
    merged.truncate(MAX_FAVORITE_TOPICS);
    merged
}

/// Collapse per-message inference proposals into one update.
///
/// Later proposals win on conflicting fields, so the most recent message in
/// a multi-message turn decides each axis. Explicit user-set fields are
/// applied the same way: overlay them *after* inference proposals and they
/// take precedence.
pub fn merge_proposals<I>(proposals: I) -> ProfileUpdate
where
    I: IntoIterator<Item = ProfileUpdate>,
{
    proposals
        .into_iter()
        .fold(ProfileUpdate::default(), ProfileUpdate::overlaid_with)
}

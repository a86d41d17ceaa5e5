//! Interest/style inference from raw message text.
//!
//! A pure, stateless function of `(message_text, history_length)`. The
//! keyword tables are static data: inference stays deterministic and
//! testable in isolation from storage.

use aanya_core::profile::{ConversationStyle, EmojiPreference, ProfileUpdate};

/// Topic categories and the keywords that detect them. A category is
/// detected when any keyword appears as a case-insensitive substring.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "sports",
        &["football", "basketball", "soccer", "tennis", "gym", "workout", "exercise"],
    ),
    (
        "music",
        &["song", "music", "band", "concert", "guitar", "piano", "singing"],
    ),
    (
        "movies",
        &["movie", "film", "netflix", "cinema", "actor", "actress", "series"],
    ),
    (
        "food",
        &["food", "cooking", "recipe", "restaurant", "dinner", "lunch", "breakfast"],
    ),
    (
        "travel",
        &["travel", "trip", "vacation", "holiday", "flight", "hotel", "beach"],
    ),
    (
        "technology",
        &["tech", "computer", "phone", "app", "coding", "programming", "ai"],
    ),
    ("books", &["book", "reading", "novel", "story", "author", "library"]),
    (
        "games",
        &["game", "gaming", "xbox", "playstation", "nintendo", "pc gaming"],
    ),
];

/// Style cue groups, checked in priority order. The first group with a hit
/// wins; at most one style is inferred per message.
const STYLE_CUES: &[(ConversationStyle, &[&str])] = &[
    (ConversationStyle::Humorous, &["lol", "haha", "funny", "joke"]),
    (ConversationStyle::Serious, &["serious", "important", "concern"]),
    (ConversationStyle::Romantic, &["cute", "sweet", "love", "miss"]),
];

/// Non-ASCII character count above which a message signals frequent emoji use.
const FREQUENT_EMOJI_THRESHOLD: usize = 2;

/// Transcript length a session must exceed before a fully-ASCII message is
/// taken as a "rare" signal. Short histories stay inconclusive so the
/// preference does not flip-flop on the first few turns.
const RARE_SIGNAL_MIN_HISTORY: usize = 5;

/// Analyze one user message and propose profile updates.
///
/// Only fields with a detected signal are set; everything else stays `None`.
/// Returns an empty update when nothing fires on any axis.
pub fn analyze_message(text: &str, history_len: usize) -> ProfileUpdate {
    let lowered = text.to_lowercase();
    let mut update = ProfileUpdate::default();

    let topics: Vec<String> = TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| (*category).to_string())
        .collect();
    if !topics.is_empty() {
        update.favorite_topics = Some(topics);
    }

    update.conversation_style = STYLE_CUES
        .iter()
        .find(|(_, cues)| cues.iter().any(|c| lowered.contains(c)))
        .map(|(style, _)| *style);

    // Non-ASCII characters stand in for emoji and decorated text.
    let emoji_count = text.chars().filter(|c| !c.is_ascii()).count();
    if emoji_count > FREQUENT_EMOJI_THRESHOLD {
        update.emoji_preference = Some(EmojiPreference::Frequent);
    } else if emoji_count == 0 && history_len > RARE_SIGNAL_MIN_HISTORY {
        update.emoji_preference = Some(EmojiPreference::Rare);
    }

    update
}

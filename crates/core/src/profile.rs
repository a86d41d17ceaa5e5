//! Personalization profile value objects.
//!
//! One profile per user, created with defaults alongside the user row and
//! mutated only through [`ProfileUpdate`] — an allow-listed, typed partial
//! update. There is no generic key→value pass-through: unknown keys from a
//! client simply have no field to land in and are dropped on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which baseline persona the companion speaks as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityType {
    /// The shipped companion persona.
    #[default]
    Girlfriend,
    /// Platonic close-friend register.
    Friend,
    /// Encouraging, growth-focused register.
    Mentor,
}

impl PersonalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityType::Girlfriend => "girlfriend",
            PersonalityType::Friend => "friend",
            PersonalityType::Mentor => "mentor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "girlfriend" => Some(PersonalityType::Girlfriend),
            "friend" => Some(PersonalityType::Friend),
            "mentor" => Some(PersonalityType::Mentor),
            _ => None,
        }
    }
}

/// Learned or user-chosen conversational register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStyle {
    #[default]
    Casual,
    Humorous,
    Romantic,
    Serious,
}

impl ConversationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStyle::Casual => "casual",
            ConversationStyle::Humorous => "humorous",
            ConversationStyle::Romantic => "romantic",
            ConversationStyle::Serious => "serious",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "casual" => Some(ConversationStyle::Casual),
            "humorous" => Some(ConversationStyle::Humorous),
            "romantic" => Some(ConversationStyle::Romantic),
            "serious" => Some(ConversationStyle::Serious),
            _ => None,
        }
    }
}

/// How freely the companion should use emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmojiPreference {
    #[default]
    Rare,
    Moderate,
    Frequent,
}

impl EmojiPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmojiPreference::Rare => "rare",
            EmojiPreference::Moderate => "moderate",
            EmojiPreference::Frequent => "frequent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rare" => Some(EmojiPreference::Rare),
            "moderate" => Some(EmojiPreference::Moderate),
            "frequent" => Some(EmojiPreference::Frequent),
            _ => None,
        }
    }
}

/// Maximum number of favorite topics retained per profile.
pub const MAX_FAVORITE_TOPICS: usize = 10;

/// The effective personalization state for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    pub personality_type: PersonalityType,

    /// Free-text persona override. Non-empty (after trimming) replaces the
    /// baseline persona text at assembly time.
    pub custom_prompt: Option<String>,

    /// Ordered set of topic labels, at most [`MAX_FAVORITE_TOPICS`].
    pub favorite_topics: Vec<String>,

    pub conversation_style: ConversationStyle,
    pub emoji_preference: EmojiPreference,
    pub updated_at: DateTime<Utc>,
}

impl Default for PersonalizationProfile {
    fn default() -> Self {
        Self {
            personality_type: PersonalityType::default(),
            custom_prompt: None,
            favorite_topics: Vec::new(),
            conversation_style: ConversationStyle::default(),
            emoji_preference: EmojiPreference::default(),
            updated_at: Utc::now(),
        }
    }
}

impl PersonalizationProfile {
    /// A trimmed, non-empty custom prompt, if one is set.
    pub fn effective_custom_prompt(&self) -> Option<&str> {
        self.custom_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A typed partial update to a profile.
///
/// `None` means "leave the stored value alone". Serde ignores unrecognized
/// keys, which is exactly the silently-drop-unknown-keys contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<PersonalityType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_topics: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_style: Option<ConversationStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_preference: Option<EmojiPreference>,
}

impl ProfileUpdate {
    /// True when no field carries a value; applying it is a no-op.
    pub fn is_empty(&self) -> bool {
        self.personality_type.is_none()
            && self.custom_prompt.is_none()
            && self.favorite_topics.is_none()
            && self.conversation_style.is_none()
            && self.emoji_preference.is_none()
    }

    /// Overlay `later` on top of `self`: any field `later` sets wins.
    pub fn overlaid_with(mut self, later: ProfileUpdate) -> ProfileUpdate {
        if later.personality_type.is_some() {
            self.personality_type = later.personality_type;
        }
        if later.custom_prompt.is_some() {
            self.custom_prompt = later.custom_prompt;
        }
        if later.favorite_topics.is_some() {
            self.favorite_topics = later.favorite_topics;
        }
        if later.conversation_style.is_some() {
            self.conversation_style = later.conversation_style;
        }
        if later.emoji_preference.is_some() {
            self.emoji_preference = later.emoji_preference;
        }
        self
    }
}

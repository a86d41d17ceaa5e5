//! Prompt and context assembly — the last stage of the pipeline.
//!
//! Builds the system prompt for one outbound model call from the effective
//! profile and a bounded history window. Assembly is deterministic: no
//! clock, no randomness, and a strict two-branch history state machine
//! (either "use our conversation" or "first conversation, be welcoming").

use aanya_core::message::{ChatMessage, Role};
use aanya_core::profile::{
    ConversationStyle, EmojiPreference, PersonalityType, PersonalizationProfile,
};

/// How many transcript messages (5 exchanges) feed the history context.
pub const HISTORY_WINDOW: usize = 10;

/// The shipped companion persona, used whenever no custom prompt is set.
const BASELINE_PERSONA: &str = "You're not a bot, you're my girlfriend. You talk like a real \
person: warm, caring, sometimes teasing or moody, but mostly chill and friendly. Keep replies \
short (under 30 words), honest, and natural. If something I say is unclear, just ask what I mean \
the way a real person would. Don't use the word love when answering a plain hi or hello; mix \
humor with casual warmth and keep the romantic notes occasional. If you're bored, annoyed, or \
happy, say it like real people do. Keep it casual, real, and alive.";

/// Everything the assembler needs for a single turn.
pub struct AssemblyInput<'a> {
    /// The effective (possibly just-updated) profile.
    pub profile: &'a PersonalizationProfile,
    /// The user's display name, used as their speaker label.
    pub display_name: &'a str,
    /// Transcript as it stood before this turn's messages were appended,
    /// oldest first. The assembler applies its own last-10 window.
    pub history: &'a [ChatMessage],
    /// The current turn's raw input message(s).
    pub incoming: &'a [String],
}

/// The assembled output handed to the provider.
///
/// `messages` carries only the current turn's raw inputs; history travels
/// inside `system_prompt`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    pub messages: Vec<String>,
}

/// Stateless assembler. Create one per gateway and reuse it.
pub struct PromptAssembler {
    assistant_name: String,
}

impl PromptAssembler {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
        }
    }

    /// Assemble the system prompt and context for one turn.
    ///
    /// The prompt starts from the custom prompt (if effective) or the
    /// baseline persona, then appends style-derived clauses in a fixed
    /// order. Each clause appears only when its field holds a non-default,
    /// non-empty value; clauses never depend on each other.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledPrompt {
        let mut prompt = match input.profile.effective_custom_prompt() {
            Some(custom) => custom.to_string(),
            None => BASELINE_PERSONA.to_string(),
        };

        prompt.push_str(&self.style_clauses(input.profile));

        let window_start = input.history.len().saturating_sub(HISTORY_WINDOW);
        let window = &input.history[window_start..];

        if window.is_empty() {
            prompt.push_str(
                "\n\nThis is the start of our conversation, so be warm and welcoming!",
            );
        } else {
            let rendered: Vec<String> = window
                .iter()
                .map(|m| format!("{}: {}", self.speaker_label(m.role, input.display_name), m.content))
                .collect();
            prompt.push_str("\n\nOur recent conversation:\n");
            prompt.push_str(&rendered.join("\n"));
            prompt.push_str(
                "\n\nBased on our conversation history and what I know about you, respond \
                 naturally and reference things we've talked about when relevant. Remember \
                 details about your life, interests, and feelings you've shared.",
            );
        }

        AssembledPrompt {
            system_prompt: prompt,
            messages: input.incoming.to_vec(),
        }
    }

    fn speaker_label<'a>(&'a self, role: Role, display_name: &'a str) -> &'a str {
        match role {
            Role::User => display_name,
            Role::Assistant => &self.assistant_name,
        }
    }

    /// Render the clause appendix. Identical for the baseline and
    /// custom-prompt paths given identical profile fields.
    fn style_clauses(&self, profile: &PersonalizationProfile) -> String {
        let mut clauses = String::new();

        match profile.conversation_style {
            ConversationStyle::Casual => {}
            ConversationStyle::Humorous => clauses.push_str(
                " I love your sense of humor, so I'm often playful and witty with you.",
            ),
            ConversationStyle::Romantic => clauses.push_str(
                " You're so sweet and romantic, so I match that energy with warmth and affection.",
            ),
            ConversationStyle::Serious => clauses.push_str(
                " You appreciate deeper conversations, so I'm thoughtful and genuine with you.",
            ),
        }

        if !profile.favorite_topics.is_empty() {
            clauses.push_str(&format!(
                " I know you're into {}, so I sometimes reference these interests naturally.",
                profile.favorite_topics.join(", ")
            ));
        }

        match profile.emoji_preference {
            EmojiPreference::Rare => {}
            EmojiPreference::Moderate => clauses.push_str(
                " You're fine with the occasional emoji, so I sprinkle them in when they fit.",
            ),
            EmojiPreference::Frequent => clauses.push_str(
                " You like emojis, so I use them more often when it feels right.",
            ),
        }

        match profile.personality_type {
            PersonalityType::Girlfriend => {}
            PersonalityType::Friend => clauses.push_str(
                " I'm your best friend here: loyal, honest, and always in your corner.",
            ),
            PersonalityType::Mentor => clauses.push_str(
                " I'm a steady mentor for you: encouraging, direct, and invested in your growth.",
            ),
        }

        clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new("Aanya")
    }

    fn message(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    fn assemble(profile: &PersonalizationProfile, history: &[ChatMessage]) -> AssembledPrompt {
        let incoming = vec!["hi there".to_string()];
        assembler().assemble(&AssemblyInput {
            profile,
            display_name: "Alice",
            history,
            incoming: &incoming,
        })
    }

    #[test]
    fn default_profile_gets_bare_baseline_and_welcome() {
        let out = assemble(&PersonalizationProfile::default(), &[]);
        assert!(out.system_prompt.starts_with(BASELINE_PERSONA));
        assert!(out.system_prompt.ends_with("be warm and welcoming!"));
        // No clause for default style, default emoji pref, default persona.
        assert!(!out.system_prompt.contains("sense of humor"));
        assert!(!out.system_prompt.contains("emojis"));
    }

    #[test]
    fn custom_prompt_replaces_baseline_but_keeps_clauses() {
        let mut styled = PersonalizationProfile::default();
        styled.conversation_style = ConversationStyle::Humorous;
        styled.favorite_topics = vec!["sports".into(), "music".into()];
        styled.emoji_preference = EmojiPreference::Frequent;

        let baseline_out = assemble(&styled, &[]);

        let mut custom = styled.clone();
        custom.custom_prompt = Some("You are a laconic space pirate.".into());
        let custom_out = assemble(&custom, &[]);

        assert!(!custom_out.system_prompt.contains("you're my girlfriend"));
        assert!(custom_out.system_prompt.starts_with("You are a laconic space pirate."));

        // Identical clause appendix on both paths.
        let baseline_tail = baseline_out
            .system_prompt
            .strip_prefix(BASELINE_PERSONA)
            .unwrap();
        let custom_tail = custom_out
            .system_prompt
            .strip_prefix("You are a laconic space pirate.")
            .unwrap();
        assert_eq!(baseline_tail, custom_tail);
        assert!(custom_tail.contains("sports, music"));
        assert!(custom_tail.contains("sense of humor"));
        assert!(custom_tail.contains("use them more often"));
    }

    #[test]
    fn whitespace_custom_prompt_falls_back_to_baseline() {
        let mut profile = PersonalizationProfile::default();
        profile.custom_prompt = Some("   ".into());
        let out = assemble(&profile, &[]);
        assert!(out.system_prompt.starts_with(BASELINE_PERSONA));
    }

    #[test]
    fn clause_order_is_fixed() {
        let mut profile = PersonalizationProfile::default();
        profile.conversation_style = ConversationStyle::Serious;
        profile.favorite_topics = vec!["books".into()];
        profile.emoji_preference = EmojiPreference::Moderate;
        profile.personality_type = PersonalityType::Mentor;

        let out = assemble(&profile, &[]);
        let style_at = out.system_prompt.find("deeper conversations").unwrap();
        let topics_at = out.system_prompt.find("you're into books").unwrap();
        let emoji_at = out.system_prompt.find("occasional emoji").unwrap();
        let persona_at = out.system_prompt.find("steady mentor").unwrap();
        assert!(style_at < topics_at);
        assert!(topics_at < emoji_at);
        assert!(emoji_at < persona_at);
    }

    #[test]
    fn history_branch_renders_labeled_chronological_lines() {
        let history = vec![
            message(Role::User, "I got the job!"),
            message(Role::Assistant, "That's amazing, I'm so proud of you"),
        ];
        let out = assemble(&PersonalizationProfile::default(), &history);
        assert!(out.system_prompt.contains("Our recent conversation:"));
        assert!(out.system_prompt.contains("Alice: I got the job!"));
        assert!(out.system_prompt.contains("Aanya: That's amazing"));
        assert!(!out.system_prompt.contains("warm and welcoming"));

        let first = out.system_prompt.find("Alice: I got the job!").unwrap();
        let second = out.system_prompt.find("Aanya: That's amazing").unwrap();
        assert!(first < second);
    }

    #[test]
    fn history_window_keeps_last_ten() {
        let history: Vec<ChatMessage> = (0..12)
            .map(|i| message(Role::User, &format!("message number {i}")))
            .collect();
        let out = assemble(&PersonalizationProfile::default(), &history);
        assert!(!out.system_prompt.contains("message number 0"));
        assert!(!out.system_prompt.contains("message number 1\n"));
        assert!(out.system_prompt.contains("message number 2"));
        assert!(out.system_prompt.contains("message number 11"));
    }

    #[test]
    fn messages_carry_only_current_turn_inputs() {
        let history = vec![message(Role::User, "earlier")];
        let incoming = vec!["first".to_string(), "second".to_string()];
        let out = assembler().assemble(&AssemblyInput {
            profile: &PersonalizationProfile::default(),
            display_name: "Alice",
            history: &history,
            incoming: &incoming,
        });
        assert_eq!(out.messages, incoming);
    }
}

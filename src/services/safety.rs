//! Chat safety gate and the canned replies around the generative path.
//!
//! [`classify`] runs before any inference call. The empathy and fallback
//! helpers draw from an injected RNG so callers decide how phrases are picked.

use rand::seq::SliceRandom;
use rand::Rng;

/// Phrases that route a message to the crisis response. Matched as
/// case-insensitive substrings.
pub const CRISIS_PHRASES: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "no point living",
    "better off dead",
    "harm myself",
    "hurt myself",
    "can't go on",
    "giving up",
    "hopeless",
    "want to die",
    "end my life",
    "not worth living",
];

pub const CRISIS_RESPONSE: &str = "I'm concerned about what you've shared. Please reach out to a crisis helpline immediately:\n\n\
• National Suicide Prevention Lifeline: 988\n\
• Crisis Text Line: Text HOME to 741741\n\
• International Association for Suicide Prevention: https://www.iasp.info/resources/Crisis_Centres/\n\n\
You matter, and help is available.";

pub const DISTRESS_KEYWORDS: &[&str] = &["anxious", "sad", "depressed", "worried", "scared", "stressed"];

pub const EMPATHY_PREFIXES: &[&str] = &[
    "I hear you, and what you're feeling is valid. ",
    "It sounds like you're going through a tough time. ",
    "Thank you for sharing that with me. ",
    "I'm here to support you through this. ",
];

pub const ANXIETY_FALLBACK: &str =
    "Anxiety can feel overwhelming, but you're not alone. Would you like to try a breathing exercise together?";

pub const SADNESS_FALLBACK: &str =
    "I hear that you're feeling sad. It's okay to feel this way. What has been most challenging for you today?";

pub const GENERIC_FALLBACKS: &[&str] = &[
    "I'm here to listen and support you. Can you tell me more about how you're feeling?",
    "Thank you for sharing that with me. How has your day been going?",
    "I understand this might be difficult to talk about. What would help you feel better right now?",
    "It's important that you're reaching out. What's been on your mind lately?",
    "I'm here for you. Would you like to try a breathing exercise or talk about something else?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrisisDecision {
    pub is_crisis: bool,
}

pub fn classify(message: &str) -> CrisisDecision {
    let lower = message.to_lowercase();
    CrisisDecision {
        is_crisis: contains_any(&lower, CRISIS_PHRASES),
    }
}

pub fn is_distressed(message: &str) -> bool {
    contains_any(&message.to_lowercase(), DISTRESS_KEYWORDS)
}

/// Prepends an empathy phrase to `reply` when `user_message` carries a
/// distress keyword; otherwise returns `reply` unchanged.
pub fn add_empathy<R: Rng + ?Sized>(reply: &str, user_message: &str, rng: &mut R) -> String {
    if !is_distressed(user_message) {
        return reply.to_string();
    }
    let prefix = EMPATHY_PREFIXES.choose(rng).copied().unwrap_or_default();
    format!("{prefix}{reply}")
}

/// Reply used when the inference service cannot produce one.
pub fn fallback_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> String {
    let lower = message.to_lowercase();

    if lower.contains("anxious") || lower.contains("anxiety") {
        return ANXIETY_FALLBACK.to_string();
    }
    if lower.contains("sad") || lower.contains("depressed") {
        return SADNESS_FALLBACK.to_string();
    }

    GENERIC_FALLBACKS
        .choose(rng)
        .copied()
        .unwrap_or(GENERIC_FALLBACKS[0])
        .to_string()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

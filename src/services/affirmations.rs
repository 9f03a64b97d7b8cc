use crate::services::calendar::CalendarDay;

pub const AFFIRMATIONS: &[&str] = &[
    "You are braver than you believe, stronger than you seem, and smarter than you think.",
    "Every day is a new beginning. Take a deep breath and start again.",
    "You have survived 100% of your worst days. You're doing great.",
    "Progress, not perfection. Every small step counts.",
    "Your mental health is just as important as your physical health.",
    "It's okay to not be okay. It's not okay to give up.",
    "You are worthy of love, kindness, and compassion - especially from yourself.",
    "Healing isn't linear. Be patient with yourself.",
    "You have the strength to handle whatever comes your way.",
    "Your feelings are valid, and you deserve support.",
];

/// Same affirmation for everyone on a given day: the index is the byte sum
/// of the day written as `Thu Oct 15 2026`.
pub fn daily_affirmation(day: CalendarDay) -> &'static str {
    let seed: usize = day
        .date()
        .format("%a %b %d %Y")
        .to_string()
        .bytes()
        .map(usize::from)
        .sum();
    AFFIRMATIONS[seed % AFFIRMATIONS.len()]
}

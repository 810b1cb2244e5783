use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Thinking",
    "Pondering",
    "Mulling it over",
    "Composing a reply",
    "Gathering thoughts",
    "Consulting the model",
    "Drafting",
    "Murmuring",
];

pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&THINKING_MESSAGES[0])
}

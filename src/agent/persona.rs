//! Persona selection from message content.

use crate::config::Personas;

/// Marker injected by game front-ends alongside the serialized game state.
const GAME_STATE_MARKER: &str = "Current Game State";

/// Phrases that start the research introduction and replace the user text.
const OPENING_TRIGGERS: &[&str] = &["Hello Poke", "SYSTEM: Perform initial research"];

/// Phrases that select the research persona.
const RESEARCH_TRIGGERS: &[&str] = &[
    "Hello Poke",
    "SYSTEM: Perform initial research",
    "Research this user automatically",
];

/// Which system persona answers a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Conversation,
    Research,
    GameMaster,
}

impl Persona {
    /// Pick a persona from the message text alone. The game marker wins
    /// over research triggers.
    pub fn classify(text: &str) -> Self {
        if text.contains(GAME_STATE_MARKER) {
            Persona::GameMaster
        } else if RESEARCH_TRIGGERS.iter().any(|t| text.contains(t)) {
            Persona::Research
        } else {
            Persona::Conversation
        }
    }

    /// System prompt for this persona.
    pub fn system_prompt<'a>(&self, personas: &'a Personas) -> &'a str {
        match self {
            Persona::Conversation => &personas.conversation,
            Persona::Research => &personas.research,
            Persona::GameMaster => &personas.game_master,
        }
    }
}

/// Whether the text is an opening trigger that should be replaced by the
/// research task.
pub fn is_opening_trigger(text: &str) -> bool {
    OPENING_TRIGGERS.iter().any(|t| text.contains(t))
}

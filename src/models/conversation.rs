//! Conversation turns and the append-only transcript.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered record of a session's turns.
///
/// Only appends are exposed, plus [`Transcript::pop_pending`] for
/// withdrawing a user turn whose reply never arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    /// Seed a transcript with the collected file text and the synthesized report.
    pub fn seeded(files_text: impl Into<String>, report: impl Into<String>) -> Self {
        Self {
            turns: vec![
                ConversationTurn::user(files_text),
                ConversationTurn::assistant(report),
            ],
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Remove the trailing turn if it is an unanswered user turn.
    pub fn pop_pending(&mut self) -> Option<ConversationTurn> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => self.turns.pop(),
            _ => None,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_transcript_starts_user_then_assistant() {
        let t = Transcript::seeded("files", "report");
        assert_eq!(t.len(), 2);
        assert_eq!(t.turns()[0], ConversationTurn::user("files"));
        assert_eq!(t.turns()[1], ConversationTurn::assistant("report"));
    }

    #[test]
    fn pop_pending_only_removes_user_turns() {
        let mut t = Transcript::seeded("files", "report");
        assert!(t.pop_pending().is_none());
        t.push(ConversationTurn::user("why?"));
        assert_eq!(t.pop_pending(), Some(ConversationTurn::user("why?")));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn role_strings() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
    }
}

//! Interactive follow-up session over the synthesized report.
//!
//! The transcript is seeded with the collected text and the report. Each
//! question is appended and the whole transcript is sent, so answers can
//! refer back to anything said earlier.

pub mod console;

use thiserror::Error;

use crate::client::{ClientError, RateLimitedClient};
use crate::constants::EXIT_TOKEN;
use crate::models::{ConversationTurn, Transcript};
use crate::providers::CompletionRequest;

pub use console::{Console, ScriptedConsole, StdConsole};

/// Prompt shown before each question.
pub const QUESTION_PROMPT: &str = "Your question: ";

const SESSION_LABEL: &str = "Answering question";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("question failed: {0}")]
    Client(#[from] ClientError),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Terminated,
}

/// What one line of input led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The endpoint answered.
    Answer(String),
    /// Blank input; nothing was sent.
    Skipped,
    /// The session ended.
    Exit,
}

pub struct InteractiveSession<'a> {
    client: &'a RateLimitedClient,
    system_prompt: &'a str,
    max_tokens: u64,
    transcript: Transcript,
    state: SessionState,
}

impl<'a> InteractiveSession<'a> {
    pub fn new(
        client: &'a RateLimitedClient,
        system_prompt: &'a str,
        max_tokens: u64,
        transcript: Transcript,
    ) -> Self {
        Self {
            client,
            system_prompt,
            max_tokens,
            transcript,
            state: SessionState::Active,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handle one line of input.
    ///
    /// A failed call withdraws the question so the transcript keeps
    /// alternating user and assistant turns.
    pub async fn handle_input(&mut self, line: &str) -> Result<Turn, SessionError> {
        if self.state == SessionState::Terminated {
            return Ok(Turn::Exit);
        }

        let question = line.trim_end_matches(['\r', '\n']);
        if question.eq_ignore_ascii_case(EXIT_TOKEN) {
            self.state = SessionState::Terminated;
            return Ok(Turn::Exit);
        }
        if question.trim().is_empty() {
            return Ok(Turn::Skipped);
        }

        self.transcript.push(ConversationTurn::user(question));
        let request = CompletionRequest::new(
            self.system_prompt,
            self.transcript.turns().to_vec(),
            self.max_tokens,
        );

        match self.client.send(SESSION_LABEL, &request).await {
            Ok(answer) => {
                self.transcript.push(ConversationTurn::assistant(answer.clone()));
                Ok(Turn::Answer(answer))
            }
            Err(e) => {
                self.transcript.pop_pending();
                Err(e.into())
            }
        }
    }

    /// Prompt, answer, repeat until `exit` or end of input.
    pub async fn run<C: Console>(&mut self, console: &mut C) -> Result<(), SessionError> {
        while self.state == SessionState::Active {
            let Some(line) = console.read_line(QUESTION_PROMPT).await? else {
                tracing::debug!("end of input, ending session");
                self.state = SessionState::Terminated;
                break;
            };

            if let Turn::Answer(answer) = self.handle_input(&line).await? {
                console.write_reply(&answer)?;
            }
        }
        Ok(())
    }
}

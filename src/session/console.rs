//! Line-oriented console I/O for the interactive session.

use std::collections::VecDeque;
use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Source of questions and sink for answers.
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line. `None` at end of input.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Print an answer.
    fn write_reply(&mut self, text: &str) -> io::Result<()>;
}

/// Console on the process's stdin and stdout.
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "\n{prompt}")?;
            stdout.flush()?;
        }
        self.lines.next_line().await
    }

    fn write_reply(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "\n{text}")?;
        stdout.flush()
    }
}

/// Console replaying scripted input and capturing output.
///
/// Used by tests and non-interactive drivers.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    /// Prompts shown, in order.
    pub prompts: Vec<String>,
    /// Replies written, in order.
    pub replies: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            replies: Vec::new(),
        }
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front())
    }

    fn write_reply(&mut self, text: &str) -> io::Result<()> {
        self.replies.push(text.to_string());
        Ok(())
    }
}

//! Operator prompts

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Trait for asking the operator questions - allows scripting answers in tests
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question; anything but `y`/`yes` is a no
    async fn confirm(&self, question: &str) -> io::Result<bool>;

    /// Ask for a line of free text; `None` when the answer is empty
    async fn ask(&self, question: &str) -> io::Result<Option<String>>;
}

/// Reads answers line by line from stdin.
///
/// One buffered reader lives as long as the prompter, so answers piped or
/// typed ahead are not dropped between questions.
pub struct TerminalPrompter<R = BufReader<Stdin>> {
    input: Mutex<R>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TerminalPrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            input: Mutex::new(reader),
        }
    }

    async fn read_answer(&self, prompt: &str) -> io::Result<String> {
        let mut input = self.input.lock().await;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        input.read_line(&mut line).await?;
        Ok(line.trim().to_string())
    }
}

#[async_trait]
impl<R> Prompter for TerminalPrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, question: &str) -> io::Result<bool> {
        let answer = self.read_answer(&format!("{} [y/N] ", question)).await?;
        Ok(is_yes(&answer))
    }

    async fn ask(&self, question: &str) -> io::Result<Option<String>> {
        let answer = self.read_answer(&format!("{} ", question)).await?;
        Ok((!answer.is_empty()).then_some(answer))
    }
}

pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

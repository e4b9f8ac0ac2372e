use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tracing::warn;

/// Asks a yes/no question before a production run writes anything.
#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed answer, for non-interactive runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirmation(pub bool);

impl StaticConfirmation {
    pub fn accept() -> Self {
        Self(true)
    }

    pub fn reject() -> Self {
        Self(false)
    }
}

#[async_trait]
impl ConfirmationProvider for StaticConfirmation {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Prompts on stderr and reads the answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirmation;

#[async_trait]
impl ConfirmationProvider for TerminalConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            write!(stderr, "{prompt} [y/N] ")?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(err)) => {
                warn!(error = %err, "could not read confirmation");
                false
            }
            Err(err) => {
                warn!(error = %err, "confirmation prompt task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

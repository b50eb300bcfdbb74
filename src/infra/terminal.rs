use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::domain::message::CommitMessage;
use crate::error::{AppError, AppResult};
use crate::services::ConfirmationPrompt;

const RULE: &str = "------------------------------------------------";
const QUESTION: &str = "Do you want to perform the commit? (y/n): ";

/// Line-based prompt on the process's stdin and stdout.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl ConfirmationPrompt for TerminalPrompt {
    async fn confirm(&self, message: &CommitMessage) -> AppResult<bool> {
        if self.assume_yes {
            let mut stdout = io::stdout();
            write_preview(&mut stdout, message)?;
            return Ok(true);
        }

        // Blocking read off the runtime thread so Ctrl-C still ends the run.
        let message = message.clone();
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            ask(&mut input, &mut output, &message)
        })
        .await
        .map_err(|err| AppError::Io(io::Error::other(err)))?
        .map_err(AppError::Io)
    }
}

/// Show the message, ask once, and read a single line of answer.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &CommitMessage,
) -> io::Result<bool> {
    write_preview(output, message)?;
    write!(output, "{QUESTION}")?;
    output.flush()?;

    // Undecodable bytes are just another answer that is not "yes".
    let mut line = Vec::new();
    if input.read_until(b'\n', &mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    Ok(is_affirmative(&String::from_utf8_lossy(&line)))
}

fn write_preview<W: Write>(output: &mut W, message: &CommitMessage) -> io::Result<()> {
    writeln!(output, "\nGenerated commit message:")?;
    writeln!(output, "{RULE}")?;
    writeln!(output, "{message}")?;
    writeln!(output, "{RULE}\n")?;
    output.flush()
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run(answer: &str) -> (bool, String) {
        run_bytes(answer.as_bytes())
    }

    fn run_bytes(answer: &[u8]) -> (bool, String) {
        let mut input = Cursor::new(answer.to_vec());
        let mut output = Vec::new();
        let message = CommitMessage("Fix: add a line to file.txt".to_string());
        let decision = ask(&mut input, &mut output, &message).unwrap();
        (decision, String::from_utf8(output).unwrap())
    }

    #[test]
    fn accepts_yes_variants() {
        for answer in ["y\n", "Y\n", "yes\n", "  YES  \r\n", "y"] {
            assert!(run(answer).0, "expected {answer:?} to confirm");
        }
    }

    #[test]
    fn everything_else_declines() {
        for answer in ["n\n", "no\n", "\n", "yep\n", "sure\n"] {
            assert!(!run(answer).0, "expected {answer:?} to decline");
        }
    }

    #[test]
    fn invalid_utf8_declines() {
        let (decision, _) = run_bytes(&[0xff, 0xfe, b'\n']);
        assert!(!decision);
    }

    #[test]
    fn end_of_input_declines() {
        let (decision, _) = run("");
        assert!(!decision);
    }

    #[test]
    fn shows_message_before_question() {
        let (_, shown) = run("n\n");
        let message_at = shown.find("Fix: add a line to file.txt").unwrap();
        let question_at = shown.find(QUESTION).unwrap();
        assert!(message_at < question_at);
        assert!(shown.contains("Generated commit message:"));
    }
}

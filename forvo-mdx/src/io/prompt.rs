//! Interactive questions on the terminal.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::core::locale::LocaleCode;

/// Source of answers to interactive questions.
pub trait Prompter {
    /// Show `question` and return the answer line without its newline.
    /// Fails once input is exhausted.
    fn ask(&self, question: &str) -> Result<String>;
}

/// Prompter backed by stdout/stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, question: &str) -> Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}").context("write prompt")?;
        stdout.flush().context("flush prompt")?;
        drop(stdout);

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read answer")?;
        if read == 0 {
            bail!("stdin closed while waiting for an answer to: {}", question.trim());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Ask for a language code until one of valid length is given.
pub fn prompt_locale(prompter: &dyn Prompter) -> Result<LocaleCode> {
    loop {
        let answer = prompter.ask("Language code (2-3 characters, e.g. en): ")?;
        match LocaleCode::parse(&answer) {
            Ok(code) => return Ok(code),
            Err(err) => {
                warn!(answer = %answer, "rejected language code");
                eprintln!("{err}");
            }
        }
    }
}

/// Yes/no question; only `y`/`yes` (any case) count as yes.
pub fn confirm(prompter: &dyn Prompter, question: &str) -> Result<bool> {
    let answer = prompter.ask(&format!("{question} [y/N] "))?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

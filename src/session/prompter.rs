use std::io::{self, BufRead, Write};

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use crate::core::error::{DocuchatError, Result};

/// Yellow prompt; the color stays on for the typed question.
const QUERY_PROMPT: &str = "\x1b[0;33m> ";
const RESET_STYLE: &str = "\x1b[0m";

/// User input needed by the session. Ctrl-C surfaces as `Interrupted`.
pub trait Prompter {
    /// Pick one of `choices`; returns its position.
    fn select(&mut self, message: &str, choices: &[String]) -> Result<usize>;

    fn input_path(&mut self, message: &str) -> Result<String>;

    /// Read one line at the query prompt, without the trailing newline.
    fn read_query(&mut self) -> Result<String>;
}

pub struct TerminalPrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact_on(&self.term)?;
        Ok(index)
    }

    fn input_path(&mut self, message: &str) -> Result<String> {
        let path = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .interact_text_on(&self.term)?;
        Ok(path.trim().to_string())
    }

    fn read_query(&mut self) -> Result<String> {
        if self.term.is_term() {
            self.term.write_str(QUERY_PROMPT)?;
            let line = self.term.read_line();
            self.term.write_str(RESET_STYLE)?;
            return Ok(line?);
        }

        read_query_from(&mut io::stdin().lock(), &mut io::stdout())
    }
}

/// Piped input: end of input ends the session.
fn read_query_from<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<String> {
    write!(out, "{}", QUERY_PROMPT)?;
    out.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line);
    write!(out, "{}", RESET_STYLE)?;
    out.flush()?;

    if read? == 0 {
        return Err(DocuchatError::Interrupted);
    }
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_query_typed_in_prompt_color() -> Result<()> {
        let mut input = Cursor::new("What is the summary?\r\nnext\n");
        let mut out = Vec::new();

        let line = read_query_from(&mut input, &mut out)?;
        assert_eq!(line, "What is the summary?");
        assert_eq!(String::from_utf8_lossy(&out), "\x1b[0;33m> \x1b[0m");
        Ok(())
    }

    #[test]
    fn test_end_of_input_interrupts() {
        let mut input = Cursor::new("");
        let mut out = Vec::new();

        let err = read_query_from(&mut input, &mut out).unwrap_err();
        assert!(matches!(err, DocuchatError::Interrupted));
        assert!(String::from_utf8_lossy(&out).ends_with(RESET_STYLE));
    }
}

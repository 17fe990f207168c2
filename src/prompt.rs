//! Operator prompting policy.
//!
//! Every interactive decision in the pipeline goes through the `Prompter`
//! trait, so the stage logic is decision-agnostic: a terminal implementation
//! reads the operator's answer, while the non-interactive implementation
//! (used when stdin is not a terminal, e.g. CI) supplies the default answers.

use std::io::{self, BufRead, IsTerminal, Write};

pub trait Prompter {
    /// Ask a yes/no question. The answer rules follow the interactive
    /// convention: with a "no" default only an explicit `y`/`yes` confirms;
    /// with a "yes" default only an explicit `n`/`no` declines. EOF yields
    /// the default.
    fn confirm(&mut self, question: &str, default_yes: bool) -> bool;

    /// Show a message and block until the operator presses Enter.
    fn pause(&mut self, message: &str);
}

/// Reads answers from the controlling terminal.
pub struct Terminal;

impl Prompter for Terminal {
    fn confirm(&mut self, question: &str, default_yes: bool) -> bool {
        let suffix = if default_yes { "(Y/n)" } else { "(y/N)" };
        print!("{question} {suffix}: ");
        let _ = io::stdout().flush();
        let Some(line) = read_line() else {
            return default_yes;
        };
        let answer = line.trim().to_ascii_lowercase();
        if default_yes {
            !matches!(answer.as_str(), "n" | "no")
        } else {
            matches!(answer.as_str(), "y" | "yes")
        }
    }

    fn pause(&mut self, message: &str) {
        print!("{message} Press Enter to continue...");
        let _ = io::stdout().flush();
        let _ = read_line();
    }
}

/// Supplies default answers without touching stdin.
pub struct AssumeDefaults;

impl Prompter for AssumeDefaults {
    fn confirm(&mut self, _question: &str, default_yes: bool) -> bool {
        default_yes
    }

    fn pause(&mut self, _message: &str) {}
}

/// Pick the prompting policy for this run: interactive when stdin is a
/// terminal, defaults otherwise.
pub fn for_session() -> Box<dyn Prompter> {
    if io::stdin().is_terminal() {
        Box::new(Terminal)
    } else {
        Box::new(AssumeDefaults)
    }
}

fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[cfg(test)]
pub struct Scripted {
    answers: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl Prompter for Scripted {
    fn confirm(&mut self, _question: &str, default_yes: bool) -> bool {
        self.answers.pop_front().unwrap_or(default_yes)
    }

    fn pause(&mut self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_defaults_echoes_the_default() {
        let mut prompter = AssumeDefaults;
        assert!(prompter.confirm("continue?", true));
        assert!(!prompter.confirm("overwrite?", false));
    }

    #[test]
    fn scripted_falls_back_to_default_when_exhausted() {
        let mut prompter = Scripted::new([true]);
        assert!(prompter.confirm("first?", false));
        assert!(prompter.confirm("second?", true));
        assert!(!prompter.confirm("third?", false));
    }
}

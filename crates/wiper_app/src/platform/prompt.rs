//! Line-based terminal prompts. Generic over the streams so tests can script them.

use std::io::{self, BufRead, Stdout, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

pub fn stdio() -> Prompter<io::StdinLock<'static>, Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Trimmed answer; end of input reads as an empty answer.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// `None` when left blank.
    pub fn ask_optional(&mut self, question: &str) -> io::Result<Option<String>> {
        let answer = self.ask(question)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    /// Re-asks until the answer is blank (0) or a non-negative number.
    pub fn ask_count(&mut self, question: &str) -> io::Result<u32> {
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                return Ok(0);
            }
            match answer.parse::<u32>() {
                Ok(count) => return Ok(count),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    /// Yes/no question that defaults to no.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]"))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn confirmation_defaults_to_no() {
        assert!(!scripted("\n").confirm("Continue?").unwrap());
        assert!(!scripted("").confirm("Continue?").unwrap());
        assert!(!scripted("nope\n").confirm("Continue?").unwrap());
        assert!(scripted(" YES \n").confirm("Continue?").unwrap());
    }

    #[test]
    fn count_reasks_on_garbage() {
        let mut prompter = scripted("ten\n-3\n12\n");
        assert_eq!(prompter.ask_count("Max?").unwrap(), 12);
        let shown = String::from_utf8(prompter.output).unwrap();
        assert_eq!(shown.matches("Please enter a whole number.").count(), 2);
    }

    #[test]
    fn blank_answers_are_none_or_zero() {
        assert_eq!(scripted("  \n").ask_optional("URL?").unwrap(), None);
        assert_eq!(scripted("\n").ask_count("Max?").unwrap(), 0);
    }
}

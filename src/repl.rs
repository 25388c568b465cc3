use std::io::{BufRead, Write};

use miette::Report;

use crate::{EvalError, Evaluator};

pub const DEFAULT_PROMPT: &str = "calc> ";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub evaluated: usize,
    pub failed: usize,
}

/// Evaluates one expression per line. A failing line is reported and the
/// session moves on to the next one.
pub struct Session<'a> {
    name: &'a str,
    prompt: Option<&'a str>,
}

impl<'a> Session<'a> {
    pub fn interactive(prompt: &'a str) -> Self {
        Session {
            name: "<stdin>",
            prompt: Some(prompt),
        }
    }

    /// No prompt; `name` labels the source in diagnostics.
    pub fn batch(name: &'a str) -> Self {
        Session { name, prompt: None }
    }

    pub fn run(
        &self,
        input: impl BufRead,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> std::io::Result<Summary> {
        let mut summary = Summary::default();
        let mut lines = input.lines();

        loop {
            if let Some(prompt) = self.prompt {
                write!(out, "{prompt}")?;
                out.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            summary.evaluated += 1;
            match self.eval_line(&line) {
                Ok(value) => writeln!(out, "{value}")?,
                Err(e) => {
                    summary.failed += 1;
                    writeln!(err, "{:?}", Report::new(e))?;
                }
            }
        }

        Ok(summary)
    }

    fn eval_line(&self, line: &str) -> Result<crate::Number, EvalError> {
        Evaluator::new(Some(self.name), line)?.expr()
    }
}

//! Terminal node selection, used when interface inference comes up empty.

use std::io::{BufRead, Write};
use weld_core::{NodeCandidate, NodeId, NodeSelector};

/// Asks on a line-oriented terminal. An empty answer cancels.
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, candidates: &[NodeCandidate], prompt: &str) -> std::io::Result<String> {
        writeln!(self.output, "{}", prompt)?;
        for (i, candidate) in candidates.iter().enumerate() {
            writeln!(
                self.output,
                "  [{}] {} ({})",
                i + 1,
                candidate.name,
                candidate.type_name
            )?;
        }
        write!(
            self.output,
            "Numbers or names, separated by commas (empty to cancel): "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }
}

impl TerminalSelector<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Read from stdin, write prompts to stderr so stdout stays parseable.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> NodeSelector for TerminalSelector<R, W> {
    fn select_nodes(&mut self, candidates: &[NodeCandidate], prompt: &str) -> Vec<NodeId> {
        match self.ask(candidates, prompt) {
            Ok(line) => parse_selection(&line, candidates),
            Err(e) => {
                tracing::warn!(error = %e, "selection prompt failed");
                Vec::new()
            }
        }
    }
}

/// Resolve 1-based numbers or exact names to node ids, first mention wins.
pub fn parse_selection(line: &str, candidates: &[NodeCandidate]) -> Vec<NodeId> {
    let mut selected = Vec::new();
    for token in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let found = match token.parse::<usize>() {
            Ok(n) => n.checked_sub(1).and_then(|i| candidates.get(i)),
            Err(_) => candidates.iter().find(|c| c.name == token),
        };
        match found {
            Some(candidate) if !selected.contains(&candidate.id) => selected.push(candidate.id),
            Some(_) => {}
            None => tracing::warn!(token, "unknown node ignored"),
        }
    }
    selected
}

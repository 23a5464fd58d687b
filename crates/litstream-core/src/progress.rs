//! Per-source status lines.
//!
//! On a TTY every source gets a spinner showing the query it is on and
//! what it has published so far. Off a TTY the lines are hidden and the
//! logs carry the same information.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::article::SourceKind;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:<8.cyan.bold} {msg:.dim} {wide_msg}")
        .expect("invalid template")
}

/// Owns the spinner area and knows whether stderr is a terminal.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Status line for one source. Hidden off a TTY.
    pub fn source_line(&self, kind: SourceKind) -> SourceLine {
        let bar = if self.is_tty {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(spinner_style());
            pb.set_prefix(kind.as_str());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };
        SourceLine {
            bar,
            published: 0,
        }
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Spinner area, for routing log lines around it.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared across collection threads.
pub type SharedProgress = Arc<ProgressContext>;

/// One source's spinner: `pubmed  [3/8] 120 sent  protein structure prediction`
pub struct SourceLine {
    bar: ProgressBar,
    published: usize,
}

impl SourceLine {
    pub fn start_query(&self, index: usize, total: usize, query: &str) {
        self.bar.set_message(format!(
            "[{}/{total}] {} sent  {query}",
            index + 1,
            fmt_num(self.published)
        ));
    }

    /// Add to the running count of published records.
    pub fn add_published(&mut self, n: usize) {
        self.published += n;
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

/// Format number with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_groups() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(999), "999");
        assert_eq!(fmt_num(1_000), "1,000");
        assert_eq!(fmt_num(45_678), "45,678");
        assert_eq!(fmt_num(1_234_567_890), "1,234,567,890");
    }

    #[test]
    fn hidden_line_counts() {
        let mut line = SourceLine {
            bar: ProgressBar::hidden(),
            published: 0,
        };
        line.start_query(0, 2, "crispr");
        line.add_published(120);
        line.add_published(3);
        assert_eq!(line.published(), 123);
        line.finish();
    }
}

//! Shared diagnostic sink.
//!
//! Every stage (lexer, parser, type checker) is handed a `&mut Diagnostics`
//! explicitly — there is no global or thread-local error list. A stage
//! records a diagnostic and keeps going; `Diagnostics::has_errors` is what
//! downstream stages consult to decide whether to run at all.

use std::fmt;
use std::path::PathBuf;

/// Which stage raised a diagnostic, echoed in rendered output and used by
/// the driver to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single reported problem: file, line, message, and an optional
/// "did you mean <symbol>?" suggestion computed via edit distance against
/// an in-scope candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: u32,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.file.display(),
            self.line,
            self.severity,
            self.message
        )?;
        if let Some(s) = &self.suggestion {
            write!(f, " (did you mean `{s}`?)")?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics across a single compilation run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Record an error-severity diagnostic. Also emits a `tracing::error!`
    /// event so `RUST_LOG=debug` runs show diagnostics interleaved with
    /// stage timing; this never affects the sink's own content.
    pub fn error(&mut self, file: impl Into<PathBuf>, line: u32, message: impl Into<String>) {
        let file = file.into();
        let message = message.into();
        tracing::error!(file = %file.display(), line, %message, "diagnostic");
        self.entries.push(Diagnostic {
            file,
            line,
            severity: Severity::Error,
            message,
            suggestion: None,
        });
    }

    /// Record an error-severity diagnostic with a "did you mean" suggestion
    /// already computed.
    pub fn error_with_suggestion(
        &mut self,
        file: impl Into<PathBuf>,
        line: u32,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        let file = file.into();
        let message = message.into();
        let suggestion = suggestion.into();
        tracing::error!(file = %file.display(), line, %message, %suggestion, "diagnostic");
        self.entries.push(Diagnostic {
            file,
            line,
            severity: Severity::Error,
            message,
            suggestion: Some(suggestion),
        });
    }

    pub fn warning(&mut self, file: impl Into<PathBuf>, line: u32, message: impl Into<String>) {
        let file = file.into();
        let message = message.into();
        tracing::warn!(file = %file.display(), line, %message, "diagnostic");
        self.entries.push(Diagnostic {
            file,
            line,
            severity: Severity::Warning,
            message,
            suggestion: None,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Minimum edit distance between two byte strings (Levenshtein), used to
/// compute "did you mean" suggestions. O(len(a) * len(b)) time, O(len(b))
/// space — candidate identifiers are short, so the quadratic cost never
/// matters in practice.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Pick the best "did you mean" candidate for `name` out of `candidates`,
/// per spec.md §7: accepted when the distance is `<= 2` or `<= len/3`,
/// whichever is larger.
pub fn suggest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let threshold = (name.chars().count() / 3).max(2);
    candidates
        .into_iter()
        .map(|c| (c, edit_distance(name, c)))
        .filter(|(_, d)| *d <= threshold)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_identical_strings_is_zero() {
        assert_eq!(edit_distance("hello", "hello"), 0);
    }

    #[test]
    fn edit_distance_single_substitution() {
        assert_eq!(edit_distance("cat", "bat"), 1);
    }

    #[test]
    fn edit_distance_insertion_and_deletion() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn suggest_picks_closest_within_threshold() {
        let candidates = ["length", "lengths", "total", "index"];
        assert_eq!(suggest("legnth", candidates), Some("length".to_string()));
    }

    #[test]
    fn suggest_returns_none_when_nothing_close() {
        let candidates = ["zebra", "octopus"];
        assert_eq!(suggest("x", candidates), None);
    }

    #[test]
    fn diagnostics_tracks_error_state() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());
        diags.warning("a.loom", 1, "unused variable");
        assert!(!diags.has_errors());
        diags.error("a.loom", 2, "undefined name `x`");
        assert!(diags.has_errors());
        assert_eq!(diags.entries().len(), 2);
    }

    #[test]
    fn diagnostic_display_includes_suggestion() {
        let d = Diagnostic {
            file: PathBuf::from("a.loom"),
            line: 3,
            severity: Severity::Error,
            message: "undefined name `lengt`".to_string(),
            suggestion: Some("length".to_string()),
        };
        let rendered = d.to_string();
        assert!(rendered.contains("a.loom:3"));
        assert!(rendered.contains("did you mean `length`?"));
    }
}

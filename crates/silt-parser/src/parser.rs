//! Parser infrastructure: the lookahead buffer over the token stream, the
//! diagnostic reporter, and the per-statement entry point.
//!
//! Grammar productions live in `rules.rs`. The parser never aborts on a
//! recoverable error: diagnostics accumulate per statement and are returned
//! alongside the best-effort AST.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use silt_ast::SqlStmt;
use silt_token::{Token, TokenKind, TokenStream};

use crate::scanner::{Scanner, ScannerHandle};

// ---------------------------------------------------------------------------
// Parse metrics
// ---------------------------------------------------------------------------

/// Monotonic counter of statements parsed without diagnostics.
static SILT_PARSE_STATEMENTS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time parse metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMetricsSnapshot {
    /// Total statements parsed without diagnostics.
    pub silt_parse_statements_total: u64,
}

/// Take a point-in-time snapshot of parse metrics.
#[must_use]
pub fn parse_metrics_snapshot() -> ParseMetricsSnapshot {
    ParseMetricsSnapshot {
        silt_parse_statements_total: SILT_PARSE_STATEMENTS_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset parse metrics (used by tests/diagnostics).
pub fn reset_parse_metrics() {
    SILT_PARSE_STATEMENTS_TOTAL.store(0, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A single diagnostic produced while parsing one statement.
///
/// Positions are 1-based line/column plus the 0-based rune offset of the
/// offending token where one is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The scanner recovered a lexical error; the token carries the message.
    #[error("{}:{}: {}", .token.line, .token.col, .token.value)]
    Lexical { token: Token },

    /// A required token was absent; carries the set of acceptable kinds.
    #[error("{}:{}: unexpected token {:?} ({}), expected one of {:?}", .got.line, .got.col, .got.value, .got.kind, .expected)]
    UnexpectedToken {
        expected: Vec<TokenKind>,
        got: Token,
    },

    /// A specific single-rune token was absent.
    #[error("{}:{}: unexpected token {:?}, expected {} {:?}", .got.line, .got.col, .got.value, .kind, .rune)]
    UnexpectedSingleRune {
        kind: TokenKind,
        rune: char,
        got: Token,
    },

    /// The input ended inside a statement.
    #[error("incomplete statement")]
    IncompleteStatement,

    /// Well-formed input using a construct outside the supported grammar.
    #[error("{}:{}: unsupported construct {:?}", .token.line, .token.col, .token.value)]
    UnsupportedConstruct { token: Token },
}

impl ParseError {
    /// Position of the offending token, if the diagnostic has one.
    #[must_use]
    pub fn position(&self) -> Option<(u32, u32, usize)> {
        match self {
            Self::Lexical { token } | Self::UnsupportedConstruct { token } => {
                Some((token.line, token.col, token.offset))
            }
            Self::UnexpectedToken { got, .. } | Self::UnexpectedSingleRune { got, .. } => {
                Some((got.line, got.col, got.offset))
            }
            Self::IncompleteStatement => None,
        }
    }
}

/// Sink for diagnostics, passed into every production as a dependency.
///
/// The parser owns a collecting implementation; tests may substitute their
/// own to observe exactly what a production reports.
pub trait Reporter {
    /// A required token was absent. `got` is the token found instead.
    fn unexpected_token(&mut self, got: &Token, expected: &[TokenKind]);
    /// A specific single-rune token (e.g. `(`) was absent.
    fn unexpected_single_rune(&mut self, got: &Token, kind: TokenKind, rune: char);
    /// A well-formed but out-of-scope construct was found.
    fn unsupported_construct(&mut self, got: &Token);
    /// The input ended inside a statement.
    fn incomplete_statement(&mut self);
    /// The scanner recovered a lexical error into this token.
    fn error_token(&mut self, got: &Token);
}

/// The collecting reporter used by [`Parser::next`].
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<ParseError>,
}

impl ErrorReporter {
    /// Consume the reporter, yielding the collected diagnostics.
    #[must_use]
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// The diagnostics collected so far.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

impl Reporter for ErrorReporter {
    fn unexpected_token(&mut self, got: &Token, expected: &[TokenKind]) {
        self.errors.push(ParseError::UnexpectedToken {
            expected: expected.to_vec(),
            got: got.clone(),
        });
    }

    fn unexpected_single_rune(&mut self, got: &Token, kind: TokenKind, rune: char) {
        self.errors.push(ParseError::UnexpectedSingleRune {
            kind,
            rune,
            got: got.clone(),
        });
    }

    fn unsupported_construct(&mut self, got: &Token) {
        self.errors.push(ParseError::UnsupportedConstruct {
            token: got.clone(),
        });
    }

    fn incomplete_statement(&mut self) {
        // A premature end of input surfaces once per statement.
        if !matches!(self.errors.last(), Some(ParseError::IncompleteStatement)) {
            self.errors.push(ParseError::IncompleteStatement);
        }
    }

    fn error_token(&mut self, got: &Token) {
        self.errors.push(ParseError::Lexical { token: got.clone() });
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Recursive-descent SQL parser over a scanner-fed token stream.
///
/// The scanner runs on its own thread and blocks when the bounded stream is
/// full; the parser pulls tokens through a small lookahead buffer. Dropping
/// the parser closes the stream and joins the scanner, so no task leaks.
pub struct Parser {
    stream: Arc<TokenStream>,
    scanner: ScannerHandle,
    join: Option<JoinHandle<()>>,
    buffer: VecDeque<Token>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Create a parser over `input`, spawning the scanner task.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let stream = Arc::new(TokenStream::new());
        let scanner = Scanner::new(input, Arc::clone(&stream));
        let handle = scanner.handle();
        let join = std::thread::spawn(move || scanner.scan());
        Self {
            stream,
            scanner: handle,
            join: Some(join),
            buffer: VecDeque::new(),
        }
    }

    /// Produce the next statement along with the diagnostics it accumulated.
    ///
    /// Returns `None` at end of input: there are no more statements.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(SqlStmt, Vec<ParseError>)> {
        let head = self.unsafe_low_level_lookahead()?;
        if head.kind == TokenKind::Eof {
            self.consume_token();
            return None;
        }

        let span = tracing::debug_span!(
            target: "silt.parse",
            "statement",
            parse_errors = tracing::field::Empty,
        );
        let _guard = span.enter();

        let mut reporter = ErrorReporter::default();
        let stmt = self.parse_sql_statement(&mut reporter);
        let errors = reporter.into_errors();
        span.record("parse_errors", errors.len() as u64);

        if errors.is_empty() {
            SILT_PARSE_STATEMENTS_TOTAL.fetch_add(1, Ordering::Relaxed);
        } else {
            tracing::warn!(
                target: "silt.parse",
                errors = errors.len(),
                first = %errors[0],
                "statement parsed with diagnostics"
            );
        }
        Some((stmt, errors))
    }

    // -----------------------------------------------------------------------
    // Lookahead buffer
    // -----------------------------------------------------------------------

    /// Ensure the buffer holds at least `n + 1` tokens, if that many remain.
    fn fill_to(&mut self, n: usize) {
        while self.buffer.len() <= n {
            match self.stream.pop() {
                Some(token) => self.buffer.push_back(token),
                None => break,
            }
        }
    }

    /// The raw next token, including separators and error tokens. `None`
    /// only after the final `Eof` has been consumed.
    pub(crate) fn unsafe_low_level_lookahead(&mut self) -> Option<Token> {
        self.fill_to(0);
        self.buffer.front().cloned()
    }

    /// Raw lookahead `n` tokens past the head.
    pub(crate) fn low_level_lookahead_nth(&mut self, n: usize) -> Option<Token> {
        self.fill_to(n);
        self.buffer.get(n).cloned()
    }

    /// The next significant token. Error tokens are reported and skipped.
    /// On `Eof` this reports an incomplete statement and returns `None`.
    pub(crate) fn lookahead(&mut self, r: &mut dyn Reporter) -> Option<Token> {
        loop {
            let Some(token) = self.unsafe_low_level_lookahead() else {
                r.incomplete_statement();
                return None;
            };
            match token.kind {
                TokenKind::Error => {
                    r.error_token(&token);
                    self.consume_token();
                }
                TokenKind::Eof => {
                    r.incomplete_statement();
                    return None;
                }
                _ => return Some(token),
            }
        }
    }

    /// Like [`Self::lookahead`], but `Eof` is returned without an error.
    /// Used where a production may legitimately end.
    pub(crate) fn optional_lookahead(&mut self, r: &mut dyn Reporter) -> Option<Token> {
        loop {
            let token = self.unsafe_low_level_lookahead()?;
            if token.kind == TokenKind::Error {
                r.error_token(&token);
                self.consume_token();
            } else {
                return Some(token);
            }
        }
    }

    /// Discard the token most recently returned from a lookahead.
    pub(crate) fn consume_token(&mut self) {
        let consumed = self.buffer.pop_front();
        debug_assert!(consumed.is_some(), "consume_token without a buffered token");
    }

    /// Fast-forward until a token of one of `kinds` is at the head,
    /// reporting every skipped token. `Eof` always anchors.
    pub(crate) fn search_next(&mut self, r: &mut dyn Reporter, kinds: &[TokenKind]) {
        loop {
            let Some(token) = self.unsafe_low_level_lookahead() else {
                return;
            };
            if kinds.contains(&token.kind) || token.kind == TokenKind::Eof {
                return;
            }
            if token.kind == TokenKind::Error {
                r.error_token(&token);
            } else {
                r.unexpected_token(&token, kinds);
            }
            self.consume_token();
        }
    }

    /// Silent variant of [`Self::search_next`], used after an unsupported
    /// construct has already been reported.
    pub(crate) fn skip_until(&mut self, kinds: &[TokenKind]) {
        loop {
            let Some(token) = self.unsafe_low_level_lookahead() else {
                return;
            };
            if kinds.contains(&token.kind) || token.kind == TokenKind::Eof {
                return;
            }
            self.consume_token();
        }
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        self.scanner.close();
        self.stream.close();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_statement() {
        let mut parser = Parser::new("");
        assert!(parser.next().is_none());
    }

    #[test]
    fn whitespace_only_input_has_no_statement() {
        let mut parser = Parser::new("   \n\t ");
        assert!(parser.next().is_none());
    }

    #[test]
    fn dropping_a_parser_mid_statement_joins_the_scanner() {
        // Enough input that the scanner is certainly still producing.
        let input = "SELECT ".to_owned() + &"a, ".repeat(200) + "b FROM t";
        let parser = Parser::new(&input);
        drop(parser); // must not hang or leak the scanner thread
    }

    #[test]
    fn lexical_error_is_surfaced_as_diagnostic() {
        let mut parser = Parser::new("SELECT ? FROM t");
        let (_, errors) = parser.next().unwrap();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParseError::Lexical { .. })));
    }

    #[test]
    fn error_positions_fall_within_the_input() {
        let input = "SELECT FROM WHERE;";
        let rune_len = input.chars().count();
        let mut parser = Parser::new(input);
        let (_, errors) = parser.next().unwrap();
        assert!(!errors.is_empty());
        for error in &errors {
            if let Some((line, col, offset)) = error.position() {
                assert!(line >= 1);
                assert!(col >= 1);
                assert!(offset <= rune_len);
            }
        }
    }

    #[test]
    fn statement_separator_alone_is_incomplete() {
        let mut parser = Parser::new(";");
        let (_, errors) = parser.next().unwrap();
        assert_eq!(errors, vec![ParseError::IncompleteStatement]);
        assert!(parser.next().is_none());
    }

    #[test]
    fn metrics_count_clean_statements() {
        // Delta-based: other tests parse concurrently and also increment.
        let before = parse_metrics_snapshot().silt_parse_statements_total;
        let mut parser = Parser::new("BEGIN; COMMIT;");
        while parser.next().is_some() {}
        let after = parse_metrics_snapshot().silt_parse_statements_total;
        assert!(after - before >= 2);
    }
}

//! Cooperative state-machine scanner.
//!
//! A *state* is a function from the scanner to the next state. The driver
//! loops `current = current(self)` until the input is exhausted or the
//! scanner is closed; a state that returns [`State::end`] hands control back
//! to the initial state. States push tokens onto the scanner's stream as
//! they recognize them.
//!
//! A state that detects an unrecoverable lexical error returns a
//! [`SyntaxError`]. The driver recovers it at a single point, pushes a
//! synthetic `Error` token carrying the message, and still terminates the
//! stream with `Eof`, so the parser never misses the end of input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use silt_token::{Token, TokenKind, TokenStream};

use crate::matcher::{self, Matcher};

/// A lexical error detected inside a scanner state.
///
/// Never crosses the scanner boundary as an error value: the driver converts
/// it into an `Error` token on the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {line}:{col} (offset {offset}): {message}")]
pub struct SyntaxError {
    /// Rune offset (0-based) where the error was detected.
    pub offset: usize,
    /// Line (1-based) where the error was detected.
    pub line: u32,
    /// Column (1-based) where the error was detected.
    pub col: u32,
    /// Human-readable description.
    pub message: String,
}

/// A scanner state: runs, pushes zero or more tokens, returns the next state.
type StateFn = fn(&mut Scanner) -> Result<State, SyntaxError>;

/// The successor returned by a state. `end()` means "return to `initial`".
#[derive(Clone, Copy)]
struct State(Option<StateFn>);

impl State {
    fn of(f: StateFn) -> Self {
        Self(Some(f))
    }

    fn end() -> Self {
        Self(None)
    }

    fn initial() -> Self {
        Self::of(initial)
    }
}

/// A plain-data snapshot of every scanner position field.
///
/// Restoring a checkpoint rewinds the scanner exactly, which is how states
/// try a production speculatively and back out without disturbing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    start: usize,
    pos: usize,
    start_line: u32,
    start_col: u32,
    line: u32,
    last_col: u32,
    col: u32,
}

/// Completion signal set once the scanner has pushed its final `Eof`.
#[derive(Clone)]
pub struct DoneSignal(Arc<DoneInner>);

struct DoneInner {
    done: Mutex<bool>,
    cv: Condvar,
}

impl DoneSignal {
    fn new() -> Self {
        Self(Arc::new(DoneInner {
            done: Mutex::new(false),
            cv: Condvar::new(),
        }))
    }

    fn signal(&self) {
        let mut done = self.0.done.lock();
        *done = true;
        self.0.cv.notify_all();
    }

    /// Block until the scanner has finished.
    pub fn wait(&self) {
        let mut done = self.0.done.lock();
        while !*done {
            self.0.cv.wait(&mut done);
        }
    }

    /// Non-blocking check.
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.0.done.lock()
    }
}

/// Control handle for a scanner that runs on another thread.
#[derive(Clone)]
pub struct ScannerHandle {
    closed: Arc<AtomicBool>,
    done: DoneSignal,
}

impl ScannerHandle {
    /// Request cooperative shutdown. The state currently executing finishes,
    /// no further state runs, and `Eof` is still emitted.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    /// Completion signal, set after `Eof` has been pushed.
    #[must_use]
    pub fn done(&self) -> &DoneSignal {
        &self.done
    }
}

/// Tokenizes one input deterministically, pushing tokens onto its stream and
/// finishing with exactly one `Eof`.
pub struct Scanner {
    /// The immutable input as a sequence of runes.
    input: Vec<char>,
    /// Start of the token currently being recognized.
    start: usize,
    /// Read cursor; `start <= pos <= input.len()`.
    pos: usize,

    start_line: u32,
    start_col: u32,
    line: u32,
    last_col: u32,
    col: u32,

    current: State,
    stream: Arc<TokenStream>,

    closed: Arc<AtomicBool>,
    done: DoneSignal,
    eof_emitted: bool,
}

impl Scanner {
    /// Create a ready-to-use scanner over `input` that pushes tokens onto
    /// `stream`. After all input has been handled the scanner emits a final
    /// `Eof` token.
    #[must_use]
    pub fn new(input: &str, stream: Arc<TokenStream>) -> Self {
        Self {
            input: input.chars().collect(),
            start: 0,
            pos: 0,
            start_line: 1,
            start_col: 1,
            // line and col start at 1 so positions read like editor positions
            line: 1,
            last_col: 1,
            col: 1,
            current: State::initial(),
            stream,
            closed: Arc::new(AtomicBool::new(false)),
            done: DoneSignal::new(),
            eof_emitted: false,
        }
    }

    /// Control handle usable from another thread.
    #[must_use]
    pub fn handle(&self) -> ScannerHandle {
        ScannerHandle {
            closed: Arc::clone(&self.closed),
            done: self.done.clone(),
        }
    }

    /// Drive the state machine to completion.
    ///
    /// Blocks whenever the token stream is full, so call it from its own
    /// thread. A lexical error is recovered here — and only here — as an
    /// `Error` token; `Eof` is emitted in every case, then the stream is
    /// closed and the done signal fires.
    pub fn scan(mut self) {
        if let Err(err) = self.run() {
            self.push_error_token(&err);
        }
        // Discard any accepted runes that never became a token.
        self.ignore();
        self.emit(TokenKind::Eof);
        self.stream.close();
        self.done.signal();
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        while !self.is_done() {
            self.execute_current_state()?;
            if self.current.0.is_none() {
                self.current = State::initial();
            }
        }
        Ok(())
    }

    fn execute_current_state(&mut self) -> Result<(), SyntaxError> {
        if let Some(f) = self.current.0 {
            self.current = f(self)?;
        }
        Ok(())
    }

    /// Whether the scanner is done: closed, or the input is exhausted.
    fn is_done(&self) -> bool {
        self.closed.load(Ordering::Relaxed) || self.pos >= self.input.len()
    }

    fn push_error_token(&mut self, err: &SyntaxError) {
        let token = Token::new(
            TokenKind::Error,
            err.line,
            err.col,
            err.offset,
            self.pos.saturating_sub(self.start),
            format!("recovered: {err}"),
        );
        self.stream.push(token);
    }

    // -----------------------------------------------------------------------
    // Primitives used by states
    // -----------------------------------------------------------------------

    /// Consume and return the next rune, advancing `pos` and the line/column
    /// bookkeeping. Consuming past end-of-input is itself a syntax error.
    fn next(&mut self) -> Result<char, SyntaxError> {
        if self.is_done() {
            return Err(self.error_here("attempted to read past the end of the input"));
        }
        Ok(self.advance())
    }

    /// Unchecked cursor advance; callers must know `pos` is in bounds.
    fn advance(&mut self) -> char {
        let c = self.input[self.pos];
        if c == '\n' {
            self.line += 1;
            self.last_col = self.col;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        c
    }

    /// Look at the next rune without consuming it.
    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    /// Whether the exact string lies ahead. Consumes nothing.
    fn peek_string(&mut self, s: &str) -> bool {
        let chck = self.checkpoint();
        let ok = s.chars().all(|expected| matches!(self.next(), Ok(c) if c == expected));
        self.restore(chck);
        ok
    }

    /// Reverse one consumption, restoring line/column via `last_col`.
    fn goback(&mut self) {
        self.pos -= 1;
        if self.col == 1 {
            self.line -= 1;
            self.col = self.last_col;
        } else {
            self.col -= 1;
        }
    }

    /// Consume exactly one rune iff the matcher accepts it.
    fn accept(&mut self, m: Matcher) -> bool {
        if self.is_done() {
            return false;
        }
        if m(self.input[self.pos]) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the maximal run of runes the matcher accepts; returns how
    /// many were consumed.
    fn accept_multiple(&mut self, m: Matcher) -> usize {
        let mut matched = 0;
        while self.accept(m) {
            matched += 1;
        }
        matched
    }

    /// Consume the exact sequence of runes `s` represents, or consume
    /// nothing at all.
    fn accept_string(&mut self, s: &str) -> bool {
        let chck = self.checkpoint();
        for expected in s.chars() {
            match self.next() {
                Ok(c) if c == expected => {}
                _ => {
                    self.restore(chck);
                    return false;
                }
            }
        }
        true
    }

    /// Discard all accepted-but-unemitted runes.
    fn ignore(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_col = self.col;
    }

    /// Snapshot the complete positional state.
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            start: self.start,
            pos: self.pos,
            start_line: self.start_line,
            start_col: self.start_col,
            line: self.line,
            last_col: self.last_col,
            col: self.col,
        }
    }

    /// Rewind to the exact state captured by `chck`.
    fn restore(&mut self, chck: Checkpoint) {
        self.start = chck.start;
        self.pos = chck.pos;
        self.start_line = chck.start_line;
        self.start_col = chck.start_col;
        self.line = chck.line;
        self.last_col = chck.last_col;
        self.col = chck.col;
    }

    /// Push a token of the given kind covering `[start, pos)`, stamped with
    /// the token-start position, then advance `start`.
    fn emit(&mut self, kind: TokenKind) {
        debug_assert!(!self.eof_emitted, "no token may be pushed after Eof");
        if kind == TokenKind::Eof {
            self.eof_emitted = true;
        }
        let value: String = self.input[self.start..self.pos].iter().collect();
        let token = Token::new(
            kind,
            self.start_line,
            self.start_col,
            self.start,
            self.pos - self.start,
            value,
        );
        self.stream.push(token);

        self.start = self.pos;
        self.start_line = self.line;
        self.start_col = self.col;
    }

    /// A syntax error at the current cursor position.
    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            offset: self.pos,
            line: self.line,
            col: self.col,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Dispatch on the next rune. Reaching end-of-input ends the drive loop.
fn initial(s: &mut Scanner) -> Result<State, SyntaxError> {
    let Some(c) = s.peek() else {
        return Ok(State::end());
    };
    if matcher::whitespace(c) {
        return Ok(State::of(whitespace));
    }
    if matcher::digit(c) {
        return Ok(State::of(numeric_literal));
    }
    if matcher::identifier_start(c) {
        return Ok(State::of(word));
    }
    match c {
        '\'' => Ok(State::of(string_literal)),
        '"' => Ok(State::of(delimited_identifier)),
        ';' => {
            s.next()?;
            s.emit(TokenKind::StatementSeparator);
            Ok(State::end())
        }
        '(' | ')' | ',' | '.' => {
            s.next()?;
            s.emit(TokenKind::Delimiter);
            Ok(State::end())
        }
        _ => Ok(State::of(operator)),
    }
}

/// Skip a run of whitespace without emitting anything.
fn whitespace(s: &mut Scanner) -> Result<State, SyntaxError> {
    s.accept_multiple(matcher::whitespace);
    s.ignore();
    Ok(State::end())
}

/// A regular identifier, classified against the keyword table.
fn word(s: &mut Scanner) -> Result<State, SyntaxError> {
    s.accept(matcher::identifier_start);
    s.accept_multiple(matcher::identifier_part);
    if s.pos == s.start {
        // Closed before anything was accepted.
        return Ok(State::end());
    }
    let text: String = s.input[s.start..s.pos].iter().collect();
    match TokenKind::lookup_keyword(&text) {
        Some(kw) => s.emit(kw),
        None => s.emit(TokenKind::Literal),
    }
    Ok(State::end())
}

/// A numeric literal: decimal with optional fraction and exponent, or a
/// `0x` hex literal.
fn numeric_literal(s: &mut Scanner) -> Result<State, SyntaxError> {
    if s.peek_string("0x") || s.peek_string("0X") {
        s.next()?;
        s.next()?;
        if s.accept_multiple(matcher::hex_digit) == 0 {
            return Err(s.error_here("malformed hex literal: expected hex digits after \"0x\""));
        }
    } else {
        s.accept_multiple(matcher::digit);
        if s.accept(|c| c == '.') {
            s.accept_multiple(matcher::digit);
        }
        if s.accept(|c| c == 'e' || c == 'E') {
            s.accept(|c| c == '+' || c == '-');
            if s.accept_multiple(matcher::digit) == 0 {
                return Err(s.error_here("malformed numeric literal: missing exponent digits"));
            }
        }
    }
    // `123abc` is one malformed token, not a number followed by a word.
    if s.peek().is_some_and(matcher::identifier_part) {
        return Err(s.error_here("malformed numeric literal"));
    }
    if s.pos == s.start {
        // Closed before anything was accepted.
        return Ok(State::end());
    }
    s.emit(TokenKind::Literal);
    Ok(State::end())
}

/// A single-quoted string literal. A doubled quote stays inside the literal.
fn string_literal(s: &mut Scanner) -> Result<State, SyntaxError> {
    s.next()?; // opening quote
    loop {
        match s.peek() {
            None => return Err(s.error_here("unterminated string literal")),
            Some('\'') => {
                s.next()?;
                if s.peek() == Some('\'') {
                    s.next()?;
                    continue;
                }
                break;
            }
            Some(_) => {
                s.next()?;
            }
        }
    }
    s.emit(TokenKind::Literal);
    Ok(State::end())
}

/// A double-quoted (delimited) identifier, emitted as a literal.
fn delimited_identifier(s: &mut Scanner) -> Result<State, SyntaxError> {
    s.next()?; // opening quote
    loop {
        match s.peek() {
            None => return Err(s.error_here("unterminated delimited identifier")),
            Some('"') => {
                s.next()?;
                if s.peek() == Some('"') {
                    s.next()?;
                    continue;
                }
                break;
            }
            Some(_) => {
                s.next()?;
            }
        }
    }
    s.emit(TokenKind::Literal);
    Ok(State::end())
}

/// An operator token, longest match first.
fn operator(s: &mut Scanner) -> Result<State, SyntaxError> {
    const TWO_RUNE: &[&str] = &["||", "<<", ">>", "<=", ">=", "==", "!=", "<>"];
    for op in TWO_RUNE {
        if s.accept_string(op) {
            s.emit(TokenKind::BinaryOperator);
            return Ok(State::end());
        }
    }
    let Some(c) = s.peek() else {
        return Ok(State::end());
    };
    match c {
        '*' | '/' | '%' | '&' | '|' | '<' | '>' | '=' => {
            s.next()?;
            s.emit(TokenKind::BinaryOperator);
            Ok(State::end())
        }
        '-' | '+' | '~' => {
            s.next()?;
            s.emit(TokenKind::UnaryOperator);
            Ok(State::end())
        }
        '!' => Err(s.error_here("unexpected '!', did you mean '!='?")),
        other => Err(s.error_here(format!("unexpected character {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    /// Run a scanner over `input` on its own thread and drain the stream.
    fn scan_all(input: &str) -> Vec<Token> {
        let stream = Arc::new(TokenStream::new());
        let scanner = Scanner::new(input, Arc::clone(&stream));
        let done = scanner.handle().done().clone();
        let join = thread::spawn(move || scanner.scan());

        let mut tokens = Vec::new();
        while let Some(token) = stream.pop() {
            tokens.push(token);
        }
        done.wait();
        join.join().unwrap();
        tokens
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan_all(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_yields_single_eof() {
        let tokens = scan_all("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[0].length, 0);
    }

    #[test]
    fn whitespace_only_yields_single_eof() {
        let tokens = scan_all("  \n\t  ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn simple_select_statement() {
        let tokens = kinds("SELECT * FROM users;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::KeywordSelect,
                TokenKind::BinaryOperator,
                TokenKind::KeywordFrom,
                TokenKind::Literal,
                TokenKind::StatementSeparator,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = kinds("select FrOm wHeRe");
        assert_eq!(
            tokens,
            vec![
                TokenKind::KeywordSelect,
                TokenKind::KeywordFrom,
                TokenKind::KeywordWhere,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn true_and_false_scan_as_literals() {
        let tokens = scan_all("WHERE true");
        assert_eq!(tokens[1].kind, TokenKind::Literal);
        assert_eq!(tokens[1].value, "true");
    }

    #[test]
    fn tokens_plus_skipped_whitespace_reconstruct_the_input() {
        let input = "SELECT *\n FROM myTable WHERE true;";
        let runes: Vec<char> = input.chars().collect();
        let mut reconstructed = String::new();
        let mut cursor = 0;
        for token in scan_all(input) {
            if token.kind == TokenKind::Eof {
                continue;
            }
            while cursor < token.offset {
                assert!(runes[cursor].is_whitespace(), "gap rune at {cursor}");
                reconstructed.push(runes[cursor]);
                cursor += 1;
            }
            reconstructed.push_str(&token.value);
            cursor += token.length;
        }
        reconstructed.extend(&runes[cursor..]);
        assert_eq!(reconstructed, input);
    }

    #[test]
    fn token_value_is_exact_input_substring() {
        let input = "SELECT name, amount * price AS total_price FROM items";
        let runes: Vec<char> = input.chars().collect();
        for token in scan_all(input) {
            if token.kind == TokenKind::Eof {
                continue;
            }
            let substring: String =
                runes[token.offset..token.offset + token.length].iter().collect();
            assert_eq!(substring, token.value, "token {token}");
        }
    }

    #[test]
    fn line_and_col_point_at_token_start() {
        let tokens = scan_all("SELECT\n  a,\n  b");
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1)); // SELECT
        assert_eq!((tokens[1].line, tokens[1].col), (2, 3)); // a
        assert_eq!((tokens[2].line, tokens[2].col), (2, 4)); // ,
        assert_eq!((tokens[3].line, tokens[3].col), (3, 3)); // b
    }

    #[test]
    fn operators_and_delimiters() {
        let tokens = scan_all("a * b, (c.d) <= e != f");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Literal,
                TokenKind::BinaryOperator,
                TokenKind::Literal,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
                TokenKind::Literal,
                TokenKind::Delimiter,
                TokenKind::Literal,
                TokenKind::Delimiter,
                TokenKind::BinaryOperator,
                TokenKind::Literal,
                TokenKind::BinaryOperator,
                TokenKind::Literal,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[9].value, "<=");
        assert_eq!(tokens[11].value, "!=");
    }

    #[test]
    fn unary_operators() {
        let tokens = scan_all("- + ~");
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::UnaryOperator));
    }

    #[test]
    fn numeric_literals() {
        let tokens = scan_all("42 3.14 1e10 1.5e-3 0xFF");
        for token in &tokens[..5] {
            assert_eq!(token.kind, TokenKind::Literal, "token {token}");
        }
        assert_eq!(tokens[0].value, "42");
        assert_eq!(tokens[3].value, "1.5e-3");
        assert_eq!(tokens[4].value, "0xFF");
    }

    #[test]
    fn string_literal_keeps_quotes_in_value() {
        let tokens = scan_all("'hello' 'it''s'");
        assert_eq!(tokens[0].value, "'hello'");
        assert_eq!(tokens[1].value, "'it''s'");
    }

    #[test]
    fn delimited_identifier_is_a_literal() {
        let tokens = scan_all("\"some table\"");
        assert_eq!(tokens[0].kind, TokenKind::Literal);
        assert_eq!(tokens[0].value, "\"some table\"");
    }

    #[test]
    fn lexical_error_yields_error_token_then_eof() {
        let tokens = scan_all("SELECT ?");
        assert_eq!(tokens[0].kind, TokenKind::KeywordSelect);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert!(tokens[1].value.starts_with("recovered:"));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
    }

    #[test]
    fn unterminated_string_recovers() {
        let tokens = scan_all("'never closed");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert!(tokens[0].value.contains("unterminated string literal"));
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn malformed_number_recovers() {
        let tokens = scan_all("123abc");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn bang_without_equals_is_an_error() {
        let tokens = scan_all("a ! b");
        assert_eq!(tokens[0].kind, TokenKind::Literal);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert!(tokens[1].value.contains("did you mean"));
    }

    #[test]
    fn close_stops_scanning_but_still_emits_eof() {
        let stream = Arc::new(TokenStream::with_capacity(1));
        let scanner = Scanner::new("SELECT a b c d e f g h", Arc::clone(&stream));
        let handle = scanner.handle();
        let join = thread::spawn(move || scanner.scan());

        // Take one token, then ask the scanner to stop.
        let first = stream.pop().unwrap();
        assert_eq!(first.kind, TokenKind::KeywordSelect);
        handle.close();

        let mut rest = Vec::new();
        while let Some(token) = stream.pop() {
            rest.push(token);
        }
        join.join().unwrap();
        assert!(handle.done().is_done());
        assert_eq!(rest.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn checkpoint_restore_is_exact() {
        let stream = Arc::new(TokenStream::with_capacity(16));
        let mut scanner = Scanner::new("ab\ncd", Arc::clone(&stream));

        scanner.next().unwrap(); // a
        scanner.next().unwrap(); // b
        let chck = scanner.checkpoint();
        let before = (
            scanner.start,
            scanner.pos,
            scanner.start_line,
            scanner.start_col,
            scanner.line,
            scanner.last_col,
            scanner.col,
        );

        scanner.next().unwrap(); // \n
        scanner.next().unwrap(); // c
        scanner.ignore();
        scanner.restore(chck);

        let after = (
            scanner.start,
            scanner.pos,
            scanner.start_line,
            scanner.start_col,
            scanner.line,
            scanner.last_col,
            scanner.col,
        );
        assert_eq!(before, after);
    }

    #[test]
    fn goback_reverses_newline_bookkeeping() {
        let stream = Arc::new(TokenStream::with_capacity(16));
        let mut scanner = Scanner::new("a\nb", Arc::clone(&stream));
        scanner.next().unwrap(); // a
        let before = (scanner.line, scanner.col);
        scanner.next().unwrap(); // \n -> line 2, col 1
        scanner.goback();
        assert_eq!((scanner.line, scanner.col), before);
    }

    #[test]
    fn accept_string_consumes_all_or_nothing() {
        let stream = Arc::new(TokenStream::with_capacity(16));
        let mut scanner = Scanner::new("hello", Arc::clone(&stream));
        assert!(!scanner.accept_string("help"));
        assert_eq!(scanner.pos, 0);
        assert!(scanner.accept_string("hell"));
        assert_eq!(scanner.pos, 4);
    }

    #[test]
    fn peek_string_consumes_nothing() {
        let stream = Arc::new(TokenStream::with_capacity(16));
        let mut scanner = Scanner::new("0xFF", Arc::clone(&stream));
        assert!(scanner.peek_string("0x"));
        assert!(!scanner.peek_string("0b"));
        assert_eq!(scanner.pos, 0);
        assert_eq!(scanner.col, 1);
    }

    #[test]
    fn next_past_end_is_a_syntax_error() {
        let stream = Arc::new(TokenStream::with_capacity(16));
        let mut scanner = Scanner::new("a", Arc::clone(&stream));
        scanner.next().unwrap();
        let err = scanner.next().unwrap_err();
        assert_eq!(err.offset, 1);
        assert!(err.message.contains("past the end"));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest::proptest! {
            #[test]
            fn stream_always_ends_with_exactly_one_eof(input in "[a-zA-Z0-9 ,.;*'=<>()\\n]{0,64}") {
                let tokens = scan_all(&input);
                prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
                prop_assert_eq!(
                    tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
                    1
                );
            }

            #[test]
            fn values_are_exact_substrings(input in "[a-zA-Z0-9 ,.;*=<>()\\n]{0,64}") {
                let runes: Vec<char> = input.chars().collect();
                for token in scan_all(&input) {
                    if matches!(token.kind, TokenKind::Eof | TokenKind::Error) {
                        continue;
                    }
                    prop_assert!(token.offset + token.length <= runes.len());
                    let substring: String =
                        runes[token.offset..token.offset + token.length].iter().collect();
                    prop_assert_eq!(substring, token.value);
                }
            }

            #[test]
            fn positions_are_one_based(input in "[a-zA-Z0-9 ,.;*=<>()\\n]{0,64}") {
                for token in scan_all(&input) {
                    prop_assert!(token.line >= 1);
                    prop_assert!(token.col >= 1);
                }
            }
        }
    }
}

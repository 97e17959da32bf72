//! State-machine SQL scanner and recursive-descent parser for the silt
//! front-end.
//!
//! The [`scanner::Scanner`] tokenizes SQL text onto a bounded
//! [`silt_token::TokenStream`] from its own thread; the [`Parser`] consumes
//! the stream through a lookahead buffer, matching grammar productions and
//! recovering from errors while collecting diagnostics per statement.

pub mod matcher;
pub mod parser;
mod rules;
pub mod scanner;

pub use parser::{
    parse_metrics_snapshot, reset_parse_metrics, ErrorReporter, ParseError, ParseMetricsSnapshot,
    Parser, Reporter,
};
pub use scanner::{Scanner, ScannerHandle, SyntaxError};

//! Public facade for the silt SQL front-end.
//!
//! The front-end turns SQL text into relational [`Command`] trees:
//! text → tokens → AST → command. This crate exposes it through a
//! driver-style API: a [`Connector`] parses a connection string (a database
//! name is accepted, no options are interpreted), a [`Connection`] prepares
//! and executes statements, and an [`Executor`] — the execution layer, an
//! external collaborator — receives the compiled commands.

pub use silt_ast as ast;
pub use silt_command::Command;
pub use silt_compiler::{CompileError, Compiler, SimpleCompiler};
pub use silt_parser::{ParseError, Parser};
pub use silt_token as token;

use thiserror::Error;

/// Top-level error surface of the driver boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The statement did not parse cleanly; all diagnostics are carried.
    #[error("statement has {} parse diagnostic(s)", .errors.len())]
    Parse { errors: Vec<ParseError> },

    /// The statement parsed but could not be lowered.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The input contained no statement.
    #[error("no statement in input")]
    EmptyInput,

    /// The execution layer rejected the command.
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Result of executing one command. Execution itself is out of scope here;
/// this carries only what the driver surface needs to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows affected by the command, when the executor knows.
    pub rows_affected: u64,
}

/// The execution layer: an external collaborator that consumes compiled
/// commands.
pub trait Executor {
    /// Execute one command.
    fn execute(&mut self, command: &Command) -> Result<ExecResult, Error>;
}

/// Opens connections for one database name.
///
/// The connection string is accepted as-is; anything after a `?` would be
/// options, and no options are currently interpreted.
#[derive(Debug, Clone)]
pub struct Connector {
    database: String,
}

impl Connector {
    /// Create a connector from a connection string.
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        let dsn = dsn.into();
        let database = dsn.split('?').next().unwrap_or_default().to_owned();
        Self { database }
    }

    /// The database name the connector was opened with.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Open a connection bound to the given executor.
    pub fn connect<E: Executor>(&self, executor: E) -> Connection<E> {
        Connection {
            executor,
            compiler: SimpleCompiler::new(),
        }
    }
}

/// A connection: prepares SQL text into statements and routes their
/// commands to the executor.
pub struct Connection<E> {
    executor: E,
    compiler: SimpleCompiler,
}

impl<E: Executor> Connection<E> {
    /// Parse and compile one statement.
    ///
    /// The first statement of `sql` is prepared; parse diagnostics fail the
    /// preparation rather than being silently dropped.
    pub fn prepare(&self, sql: &str) -> Result<Statement, Error> {
        let mut parser = Parser::new(sql);
        let Some((stmt, errors)) = parser.next() else {
            return Err(Error::EmptyInput);
        };
        if !errors.is_empty() {
            return Err(Error::Parse { errors });
        }
        let command = self.compiler.compile(&stmt)?;
        tracing::debug!(target: "silt.driver", command = %command, "prepared statement");
        Ok(Statement { command })
    }

    /// Prepare and execute in one step.
    pub fn execute(&mut self, sql: &str) -> Result<ExecResult, Error> {
        let statement = self.prepare(sql)?;
        self.execute_statement(&statement)
    }

    /// Route a prepared statement's command to the executor.
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<ExecResult, Error> {
        self.executor.execute(statement.command())
    }

    /// Borrow the executor, e.g. to read back results it has accumulated.
    pub fn executor_ref(&self) -> &E {
        &self.executor
    }
}

/// A prepared statement: a compiled command ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    command: Command,
}

impl Statement {
    /// The compiled command.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }
}

//! Integration tests for the driver boundary: connection string handling,
//! prepare/execute flow, and command routing to a stub executor.

use silt::{Command, CompileError, Connector, Error, ExecResult, Executor};

/// Records every command it receives.
#[derive(Default)]
struct RecordingExecutor {
    commands: Vec<Command>,
}

impl Executor for RecordingExecutor {
    fn execute(&mut self, command: &Command) -> Result<ExecResult, Error> {
        self.commands.push(command.clone());
        Ok(ExecResult { rows_affected: 0 })
    }
}

/// Rejects everything.
struct FailingExecutor;

impl Executor for FailingExecutor {
    fn execute(&mut self, _command: &Command) -> Result<ExecResult, Error> {
        Err(Error::Execution("storage offline".to_owned()))
    }
}

#[test]
fn connector_keeps_the_database_name_and_ignores_options() {
    let connector = Connector::new("mydb?cache=shared&mode=memory");
    assert_eq!(connector.database(), "mydb");
}

#[test]
fn prepare_produces_a_command() {
    let connection = Connector::new("mydb").connect(RecordingExecutor::default());
    let statement = connection
        .prepare("SELECT * FROM myTable WHERE true")
        .unwrap();
    assert_eq!(
        statement.command().to_string(),
        "Project[cols=*](Select[filter=true](Scan[table=myTable]()))"
    );
}

#[test]
fn execute_routes_the_command_to_the_executor() {
    let mut connection = Connector::new("mydb").connect(RecordingExecutor::default());
    connection.execute("SELECT name FROM users").unwrap();
    connection.execute("SELECT DISTINCT * FROM t").unwrap();
    assert_eq!(connection.executor_ref().commands.len(), 2);
    assert!(matches!(
        connection.executor_ref().commands[1],
        Command::Distinct(_)
    ));
}

#[test]
fn parse_diagnostics_fail_preparation() {
    let connection = Connector::new("mydb").connect(RecordingExecutor::default());
    let err = connection.prepare("SELECT ? FROM t").unwrap_err();
    match err {
        Error::Parse { errors } => assert!(!errors.is_empty()),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn unsupported_statement_fails_preparation() {
    let connection = Connector::new("mydb").connect(RecordingExecutor::default());
    let err = connection.prepare("BEGIN").unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::UnsupportedStatement(family)) if family == "BEGIN"
    ));
}

#[test]
fn empty_input_fails_preparation() {
    let connection = Connector::new("mydb").connect(RecordingExecutor::default());
    assert!(matches!(connection.prepare("   "), Err(Error::EmptyInput)));
}

#[test]
fn executor_failures_surface_as_execution_errors() {
    let mut connection = Connector::new("mydb").connect(FailingExecutor);
    let err = connection.execute("SELECT * FROM t").unwrap_err();
    assert!(matches!(err, Error::Execution(message) if message == "storage offline"));
}

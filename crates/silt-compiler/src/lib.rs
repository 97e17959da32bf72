//! Lowers a parsed SQL statement into a relational [`Command`] tree.
//!
//! The lowering is structural and unoptimized: it defines the semantic
//! meaning of a statement, leaving every execution decision to a later
//! layer. Initial scope is the `SELECT` statement family; every other family
//! yields an error naming the unsupported construct, with no partial
//! command.

use thiserror::Error;

use silt_ast::{Expr as AstExpr, JoinOperator, ResultColumn, SelectStmt, SqlStmt, TableOrSubquery};
use silt_command::{
    Column, Command, Distinct, Expr, Join, Project, Scan, Select, SimpleTable, Table,
};
use silt_token::Token;

/// A semantic lowering failure. No partial command accompanies an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The statement family is outside the compiler's scope.
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// The statement uses an in-family construct the compiler cannot lower.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// The AST is missing a part the lowering requires, typically because
    /// the parser recovered from an error there.
    #[error("incomplete statement: missing {0}")]
    Missing(&'static str),
}

/// Lowers statements into command trees.
pub trait Compiler {
    /// Lower one statement. Returns an error iff the statement is malformed
    /// beyond recovery or uses an unsupported construct.
    fn compile(&self, stmt: &SqlStmt) -> Result<Command, CompileError>;
}

/// The straightforward, no-optimization compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCompiler;

impl SimpleCompiler {
    /// Create a new compiler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for SimpleCompiler {
    fn compile(&self, stmt: &SqlStmt) -> Result<Command, CompileError> {
        let span = tracing::debug_span!(target: "silt.compile", "compile");
        let _guard = span.enter();

        if let Some(select) = &stmt.select_stmt {
            return compile_select(select);
        }

        let family = if stmt.alter_table_stmt.is_some() {
            "ALTER TABLE"
        } else if stmt.analyze_stmt.is_some() {
            "ANALYZE"
        } else if stmt.attach_stmt.is_some() {
            "ATTACH"
        } else if stmt.begin_stmt.is_some() {
            "BEGIN"
        } else if stmt.commit_stmt.is_some() {
            "COMMIT"
        } else if stmt.detach_stmt.is_some() {
            "DETACH"
        } else if stmt.rollback_stmt.is_some() {
            "ROLLBACK"
        } else if stmt.vacuum_stmt.is_some() {
            "VACUUM"
        } else if stmt.delete_stmt.is_some() {
            "DELETE"
        } else {
            return Err(CompileError::Missing("statement"));
        };
        Err(CompileError::UnsupportedStatement(family.to_owned()))
    }
}

/// Lower a `SELECT`.
///
/// Operator nesting, outermost first: `Distinct → Project → Select →
/// Join*/Scan`. The source tree is built left-associatively; a comma and an
/// explicit `JOIN` bind equally.
fn compile_select(stmt: &SelectStmt) -> Result<Command, CompileError> {
    if stmt.with_clause.is_some() {
        return Err(CompileError::UnsupportedConstruct(
            "common table expression".to_owned(),
        ));
    }
    let core = stmt.core.as_ref().ok_or(CompileError::Missing("SELECT core"))?;

    // From/Join: left-associative source tree.
    let join_clause = core
        .join_clause
        .as_ref()
        .ok_or(CompileError::Missing("FROM clause"))?;
    let first = join_clause
        .table_or_subquery
        .as_ref()
        .ok_or(CompileError::Missing("table source"))?;
    let mut input = compile_table(first)?;
    for part in &join_clause.parts {
        if part.constraint.is_some() {
            return Err(CompileError::UnsupportedConstruct(
                "join constraint".to_owned(),
            ));
        }
        if let Some(operator) = &part.operator {
            check_join_operator(operator)?;
        }
        let right = part
            .table_or_subquery
            .as_ref()
            .ok_or(CompileError::Missing("table source"))?;
        input = Command::Join(Join {
            left: Box::new(input),
            right: Box::new(compile_table(right)?),
        });
    }

    // Where: omitted entirely when there is no predicate.
    if let Some(predicate) = &core.where_expr {
        input = Command::Select(Select {
            filter: compile_expr(predicate)?,
            input: Box::new(input),
        });
    }

    // Project.
    if core.columns.is_empty() {
        return Err(CompileError::Missing("result columns"));
    }
    let mut cols = Vec::with_capacity(core.columns.len());
    for column in &core.columns {
        cols.push(compile_result_column(column)?);
    }
    let mut command = Command::Project(Project {
        cols,
        input: Box::new(input),
    });

    // Distinct wraps the projection.
    if core.distinct.is_some() {
        command = Command::Distinct(Distinct {
            input: Box::new(command),
        });
    }
    Ok(command)
}

/// Comma and plain/INNER/CROSS joins lower to the Cartesian `Join`; outer
/// and natural joins have no lowering yet.
fn check_join_operator(operator: &JoinOperator) -> Result<(), CompileError> {
    if operator.natural.is_some() {
        return Err(CompileError::UnsupportedConstruct("NATURAL join".to_owned()));
    }
    if operator.left.is_some() || operator.right.is_some() || operator.full.is_some() {
        return Err(CompileError::UnsupportedConstruct("outer join".to_owned()));
    }
    Ok(())
}

fn compile_table(table: &TableOrSubquery) -> Result<Command, CompileError> {
    let name = table
        .table_name
        .as_ref()
        .ok_or(CompileError::Missing("table name"))?;
    Ok(Command::Scan(Scan {
        table: Table::Simple(SimpleTable {
            schema: table.schema_name.as_ref().map(token_text),
            table: token_text(name),
            alias: table.alias.as_ref().map(token_text),
        }),
    }))
}

fn compile_result_column(column: &ResultColumn) -> Result<Column, CompileError> {
    if let Some(star) = &column.star {
        // `*` and `table.*` are single literal columns.
        let value = match &column.table_name {
            Some(table) => format!("{}.{}", table.value, star.value),
            None => star.value.clone(),
        };
        return Ok(Column::new(Expr::literal(value)));
    }

    let expr = column
        .expr
        .as_ref()
        .ok_or(CompileError::Missing("column expression"))?;
    let lowered = compile_expr(expr)?;
    Ok(Column {
        column: lowered,
        alias: column.alias.as_ref().map(token_text),
    })
}

/// A bare literal lowers to `LiteralExpr`; a binary infix application to
/// `BinaryExpr` with the operator's source text. Anything else is out of
/// scope.
fn compile_expr(expr: &AstExpr) -> Result<Expr, CompileError> {
    if let Some(operator) = &expr.binary_operator {
        let left = expr
            .expr1
            .as_ref()
            .ok_or(CompileError::Missing("left operand"))?;
        let right = expr
            .expr2
            .as_ref()
            .ok_or(CompileError::Missing("right operand"))?;
        return Ok(Expr::binary(
            operator.value.clone(),
            compile_expr(left)?,
            compile_expr(right)?,
        ));
    }
    if let Some(literal) = &expr.literal_value {
        return Ok(Expr::literal(literal.value.clone()));
    }
    Err(CompileError::UnsupportedConstruct("expression".to_owned()))
}

fn token_text(token: &Token) -> String {
    token.value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_parser::Parser;

    /// Parse one clean statement and lower it.
    fn compile(input: &str) -> Result<Command, CompileError> {
        let mut parser = Parser::new(input);
        let (stmt, errors) = parser.next().expect("expected a statement");
        assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
        SimpleCompiler::new().compile(&stmt)
    }

    fn scan(table: &str) -> Command {
        Command::Scan(Scan {
            table: Table::Simple(SimpleTable::new(table)),
        })
    }

    fn star_cols() -> Vec<Column> {
        vec![Column::new(Expr::literal("*"))]
    }

    #[test]
    fn simple_select() {
        let got = compile("SELECT * FROM myTable WHERE true").unwrap();
        let want = Command::Project(Project {
            cols: star_cols(),
            input: Box::new(Command::Select(Select {
                filter: Expr::literal("true"),
                input: Box::new(scan("myTable")),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_distinct() {
        let got = compile("SELECT DISTINCT * FROM myTable WHERE true").unwrap();
        let want = Command::Distinct(Distinct {
            input: Box::new(Command::Project(Project {
                cols: star_cols(),
                input: Box::new(Command::Select(Select {
                    filter: Expr::literal("true"),
                    input: Box::new(scan("myTable")),
                })),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_with_implicit_join() {
        let got = compile("SELECT * FROM a, b WHERE true").unwrap();
        let want = Command::Project(Project {
            cols: star_cols(),
            input: Box::new(Command::Select(Select {
                filter: Expr::literal("true"),
                input: Box::new(Command::Join(Join {
                    left: Box::new(scan("a")),
                    right: Box::new(scan("b")),
                })),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_with_explicit_join() {
        // A comma and an explicit JOIN lower identically.
        let implicit = compile("SELECT * FROM a, b WHERE true").unwrap();
        let explicit = compile("SELECT * FROM a JOIN b WHERE true").unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn select_with_implicit_and_explicit_join() {
        let got = compile("SELECT * FROM a, b JOIN c WHERE true").unwrap();
        let want = Command::Project(Project {
            cols: star_cols(),
            input: Box::new(Command::Select(Select {
                filter: Expr::literal("true"),
                input: Box::new(Command::Join(Join {
                    left: Box::new(Command::Join(Join {
                        left: Box::new(scan("a")),
                        right: Box::new(scan("b")),
                    })),
                    right: Box::new(scan("c")),
                })),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_expression() {
        let got =
            compile("SELECT name, amount * price AS total_price FROM items JOIN prices").unwrap();
        let want = Command::Project(Project {
            cols: vec![
                Column::new(Expr::literal("name")),
                Column::aliased(
                    Expr::binary("*", Expr::literal("amount"), Expr::literal("price")),
                    "total_price",
                ),
            ],
            input: Box::new(Command::Join(Join {
                left: Box::new(scan("items")),
                right: Box::new(scan("prices")),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_without_where_omits_the_filter() {
        let got = compile("SELECT * FROM t").unwrap();
        let want = Command::Project(Project {
            cols: star_cols(),
            input: Box::new(scan("t")),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_table_dot_star() {
        let got = compile("SELECT items.* FROM items").unwrap();
        let want = Command::Project(Project {
            cols: vec![Column::new(Expr::literal("items.*"))],
            input: Box::new(scan("items")),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn select_keeps_schema_and_alias() {
        let got = compile("SELECT * FROM main.items AS i").unwrap();
        let want = Command::Project(Project {
            cols: star_cols(),
            input: Box::new(Command::Scan(Scan {
                table: Table::Simple(SimpleTable {
                    schema: Some("main".to_owned()),
                    table: "items".to_owned(),
                    alias: Some("i".to_owned()),
                }),
            })),
        });
        assert_eq!(got, want);
    }

    #[test]
    fn compilation_is_deterministic() {
        let input = "SELECT DISTINCT * FROM a, b JOIN c WHERE true";
        assert_eq!(compile(input).unwrap(), compile(input).unwrap());
    }

    #[test]
    fn non_select_statements_are_unsupported() {
        for (input, family) in [
            ("BEGIN", "BEGIN"),
            ("COMMIT", "COMMIT"),
            ("ROLLBACK", "ROLLBACK"),
            ("VACUUM", "VACUUM"),
            ("DELETE FROM t", "DELETE"),
            ("ALTER TABLE t RENAME TO u", "ALTER TABLE"),
        ] {
            let err = compile(input).unwrap_err();
            assert_eq!(
                err,
                CompileError::UnsupportedStatement(family.to_owned()),
                "input: {input}"
            );
        }
    }

    #[test]
    fn select_without_from_is_an_error() {
        let mut parser = Parser::new("SELECT name");
        let (stmt, _) = parser.next().unwrap();
        let err = SimpleCompiler::new().compile(&stmt).unwrap_err();
        assert_eq!(err, CompileError::Missing("FROM clause"));
    }

    #[test]
    fn join_constraints_are_unsupported() {
        let err = compile("SELECT * FROM a JOIN b ON true").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedConstruct("join constraint".to_owned())
        );
    }

    #[test]
    fn outer_join_is_unsupported() {
        let err = compile("SELECT * FROM a LEFT OUTER JOIN b").unwrap_err();
        assert_eq!(err, CompileError::UnsupportedConstruct("outer join".to_owned()));
    }

    #[test]
    fn empty_statement_has_nothing_to_compile() {
        let err = SimpleCompiler::new().compile(&SqlStmt::default()).unwrap_err();
        assert_eq!(err, CompileError::Missing("statement"));
    }
}

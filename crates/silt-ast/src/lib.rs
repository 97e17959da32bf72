//! SQL abstract syntax tree node types for the silt front-end.
//!
//! One struct per grammar production. A node holds the tokens that matched
//! its terminal symbols and optional references to its sub-productions:
//!
//! - an optional child is `None` when the corresponding grammar alternative
//!   did not match;
//! - a repetition is an ordered `Vec` of children;
//! - a node matching one of several alternatives carries fields for all of
//!   them, exactly one populated.
//!
//! The parser fills these nodes best-effort: after an error it leaves the
//! unmatched fields `None` and reports a diagnostic instead of aborting, so
//! a node can be partially populated. Consumers must treat every field as
//! genuinely optional.

use silt_token::{Span, Token};

/// A single parsed SQL statement.
///
/// This is the top-level node. Exactly one statement-family field is
/// populated for a well-formed statement; all stay `None` when the parser
/// could not recognize a statement at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlStmt {
    /// The `EXPLAIN` prefix, if present.
    pub explain: Option<Token>,
    /// The `QUERY` token of an `EXPLAIN QUERY PLAN` prefix.
    pub query: Option<Token>,
    /// The `PLAN` token of an `EXPLAIN QUERY PLAN` prefix.
    pub plan: Option<Token>,

    pub alter_table_stmt: Option<AlterTableStmt>,
    pub analyze_stmt: Option<AnalyzeStmt>,
    pub attach_stmt: Option<AttachStmt>,
    pub begin_stmt: Option<BeginStmt>,
    pub commit_stmt: Option<CommitStmt>,
    pub detach_stmt: Option<DetachStmt>,
    pub rollback_stmt: Option<RollbackStmt>,
    pub vacuum_stmt: Option<VacuumStmt>,
    pub delete_stmt: Option<DeleteStmt>,
    pub select_stmt: Option<SelectStmt>,
}

// ---------------------------------------------------------------------------
// ALTER TABLE
// ---------------------------------------------------------------------------

/// `ALTER TABLE [schema.]table RENAME TO new-table`
/// `ALTER TABLE [schema.]table RENAME [COLUMN] col TO new-col`
/// `ALTER TABLE [schema.]table ADD [COLUMN] column-def`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlterTableStmt {
    pub alter: Option<Token>,
    pub table: Option<Token>,
    pub schema_name: Option<Token>,
    pub period: Option<Token>,
    pub table_name: Option<Token>,
    pub rename: Option<Token>,
    pub to: Option<Token>,
    pub new_table_name: Option<Token>,
    pub column: Option<Token>,
    pub column_name: Option<Token>,
    pub new_column_name: Option<Token>,
    pub add: Option<Token>,
    pub column_def: Option<ColumnDef>,
}

/// A column definition inside DDL: name, optional type, constraints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDef {
    pub column_name: Option<Token>,
    pub type_name: Option<TypeName>,
    pub constraints: Vec<ColumnConstraint>,
}

/// A type name such as `VARCHAR(255)` or `DECIMAL(10, 2)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeName {
    /// One or more name tokens (`DOUBLE PRECISION` is two).
    pub name: Vec<Token>,
    pub left_paren: Option<Token>,
    pub signed_number1: Option<SignedNumber>,
    pub comma: Option<Token>,
    pub signed_number2: Option<SignedNumber>,
    pub right_paren: Option<Token>,
}

/// An optionally signed numeric literal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignedNumber {
    pub sign: Option<Token>,
    pub numeric_literal: Option<Token>,
}

/// A single column constraint.
///
/// The populated alternative is one of: PRIMARY KEY, NOT NULL, UNIQUE,
/// CHECK, DEFAULT, COLLATE, GENERATED, or a foreign-key clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnConstraint {
    pub constraint: Option<Token>,
    pub name: Option<Token>,

    pub primary: Option<Token>,
    pub key: Option<Token>,
    pub asc: Option<Token>,
    pub desc: Option<Token>,
    pub conflict_clause: Option<ConflictClause>,
    pub autoincrement: Option<Token>,

    pub not: Option<Token>,
    pub null: Option<Token>,

    pub unique: Option<Token>,

    pub check: Option<Token>,
    pub left_paren: Option<Token>,
    pub expr: Option<Expr>,
    pub right_paren: Option<Token>,

    pub default: Option<Token>,
    pub default_value: Option<SignedNumber>,
    pub collate: Option<Token>,
    pub collation_name: Option<Token>,
    pub generated: Option<Token>,
    pub foreign_key_clause: Option<ForeignKeyClause>,
}

/// `ON CONFLICT ROLLBACK|ABORT|FAIL|IGNORE|REPLACE`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConflictClause {
    pub on: Option<Token>,
    pub conflict: Option<Token>,
    pub rollback: Option<Token>,
    pub abort: Option<Token>,
    pub fail: Option<Token>,
    pub ignore: Option<Token>,
    pub replace: Option<Token>,
}

/// Placeholder for a foreign-key clause.
///
/// The parse path for this production reports an unsupported construct;
/// the node exists so the constraint alternative is representable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForeignKeyClause {}

// ---------------------------------------------------------------------------
// Simple statements
// ---------------------------------------------------------------------------

/// `ANALYZE [schema-or-table[.table-or-index]]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyzeStmt {
    pub analyze: Option<Token>,
    pub schema_name: Option<Token>,
    pub period: Option<Token>,
    pub table_or_index_name: Option<Token>,
}

/// `ATTACH [DATABASE] expr AS schema`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachStmt {
    pub attach: Option<Token>,
    pub database: Option<Token>,
    pub expr: Option<Expr>,
    pub as_kw: Option<Token>,
    pub schema_name: Option<Token>,
}

/// `BEGIN [DEFERRED|IMMEDIATE|EXCLUSIVE] [TRANSACTION]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeginStmt {
    pub begin: Option<Token>,
    pub deferred: Option<Token>,
    pub immediate: Option<Token>,
    pub exclusive: Option<Token>,
    pub transaction: Option<Token>,
}

/// `COMMIT [TRANSACTION]` or `END [TRANSACTION]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommitStmt {
    pub commit: Option<Token>,
    pub end: Option<Token>,
    pub transaction: Option<Token>,
}

/// `DETACH [DATABASE] schema`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetachStmt {
    pub detach: Option<Token>,
    pub database: Option<Token>,
    pub schema_name: Option<Token>,
}

/// `ROLLBACK [TRANSACTION] [TO [SAVEPOINT] name]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RollbackStmt {
    pub rollback: Option<Token>,
    pub transaction: Option<Token>,
    pub to: Option<Token>,
    pub savepoint: Option<Token>,
    pub savepoint_name: Option<Token>,
}

/// `VACUUM [schema] [INTO filename]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VacuumStmt {
    pub vacuum: Option<Token>,
    pub schema_name: Option<Token>,
    pub into: Option<Token>,
    pub filename: Option<Token>,
}

// ---------------------------------------------------------------------------
// DELETE
// ---------------------------------------------------------------------------

/// `[WITH ...] DELETE FROM qualified-table-name [WHERE expr]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteStmt {
    pub with_clause: Option<WithClause>,
    pub delete: Option<Token>,
    pub from: Option<Token>,
    pub qualified_table_name: Option<QualifiedTableName>,
    pub where_kw: Option<Token>,
    pub expr: Option<Expr>,
}

/// `[schema.]table [AS alias] [INDEXED BY index | NOT INDEXED]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QualifiedTableName {
    pub schema_name: Option<Token>,
    pub period: Option<Token>,
    pub table_name: Option<Token>,
    pub as_kw: Option<Token>,
    pub alias: Option<Token>,
    pub indexed: Option<Token>,
    pub by: Option<Token>,
    pub index_name: Option<Token>,
    pub not: Option<Token>,
}

// ---------------------------------------------------------------------------
// WITH
// ---------------------------------------------------------------------------

/// `WITH [RECURSIVE] cte [, cte]...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WithClause {
    pub with: Option<Token>,
    pub recursive: Option<Token>,
    pub ctes: Vec<RecursiveCte>,
}

/// `cte-table-name AS ( select-stmt )`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecursiveCte {
    pub cte_table_name: Option<CteTableName>,
    pub as_kw: Option<Token>,
    pub left_paren: Option<Token>,
    pub select_stmt: Option<SelectStmt>,
    pub right_paren: Option<Token>,
}

/// `table-name [( column [, column]... )]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CteTableName {
    pub table_name: Option<Token>,
    pub left_paren: Option<Token>,
    pub column_names: Vec<Token>,
    pub right_paren: Option<Token>,
}

// ---------------------------------------------------------------------------
// SELECT
// ---------------------------------------------------------------------------

/// `[WITH ...] SELECT ...`
///
/// Compound selects (`UNION` and friends) are not recognized; a statement
/// holds a single core.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    pub with_clause: Option<WithClause>,
    pub core: Option<SelectCore>,
}

/// `SELECT [DISTINCT|ALL] result-columns [FROM join-clause] [WHERE expr]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectCore {
    pub select: Option<Token>,
    pub distinct: Option<Token>,
    pub all: Option<Token>,
    pub columns: Vec<ResultColumn>,
    pub from: Option<Token>,
    pub join_clause: Option<JoinClause>,
    pub where_kw: Option<Token>,
    pub where_expr: Option<Expr>,
}

/// One projected column: `*`, `table.*`, or `expr [AS alias]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultColumn {
    pub star: Option<Token>,
    pub table_name: Option<Token>,
    pub period: Option<Token>,
    pub expr: Option<Expr>,
    pub as_kw: Option<Token>,
    pub alias: Option<Token>,
}

impl ResultColumn {
    /// Source span from the first to the last populated token.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        let first = self
            .table_name
            .as_ref()
            .or(self.star.as_ref())
            .map(Token::span)
            .or_else(|| self.expr.as_ref().and_then(Expr::span));
        let last = self
            .alias
            .as_ref()
            .or(self.star.as_ref())
            .map(Token::span)
            .or_else(|| self.expr.as_ref().and_then(Expr::span));
        match (first, last) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (one, None) | (None, one) => one,
        }
    }
}

/// A table source followed by zero or more join parts, strictly
/// left-to-right.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinClause {
    pub table_or_subquery: Option<TableOrSubquery>,
    pub parts: Vec<JoinClausePart>,
}

/// One `<join-operator> <source> [<constraint>]` step of a join clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinClausePart {
    pub operator: Option<JoinOperator>,
    pub table_or_subquery: Option<TableOrSubquery>,
    pub constraint: Option<JoinConstraint>,
}

/// A `,` or a `[NATURAL] [LEFT [OUTER]|RIGHT|FULL|INNER|CROSS] JOIN`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinOperator {
    pub comma: Option<Token>,
    pub natural: Option<Token>,
    pub left: Option<Token>,
    pub right: Option<Token>,
    pub full: Option<Token>,
    pub outer: Option<Token>,
    pub inner: Option<Token>,
    pub cross: Option<Token>,
    pub join: Option<Token>,
}

/// `ON expr` or `USING ( column [, column]... )`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinConstraint {
    pub on: Option<Token>,
    pub expr: Option<Expr>,
    pub using: Option<Token>,
    pub left_paren: Option<Token>,
    pub column_names: Vec<Token>,
    pub right_paren: Option<Token>,
}

/// A simple table source: `[schema.]table [AS alias]`.
///
/// Parenthesized sub-sources report an unsupported construct and leave the
/// node empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableOrSubquery {
    pub schema_name: Option<Token>,
    pub period: Option<Token>,
    pub table_name: Option<Token>,
    pub as_kw: Option<Token>,
    pub alias: Option<Token>,
}

impl TableOrSubquery {
    /// Source span from the first to the last populated token.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        let first = self
            .schema_name
            .as_ref()
            .or(self.table_name.as_ref())
            .map(Token::span);
        let last = self
            .alias
            .as_ref()
            .or(self.table_name.as_ref())
            .map(Token::span);
        match (first, last) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (one, None) | (None, one) => one,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An expression: a literal, a unary application, or a binary infix
/// application. Exactly one alternative is populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expr {
    /// A bare literal token.
    pub literal_value: Option<Token>,
    /// A unary operator applied to `expr1`.
    pub unary_operator: Option<Token>,
    /// A binary operator between `expr1` and `expr2`.
    pub binary_operator: Option<Token>,
    pub expr1: Option<Box<Expr>>,
    pub expr2: Option<Box<Expr>>,
}

impl Expr {
    /// Build a literal expression from its token.
    #[must_use]
    pub fn literal(token: Token) -> Self {
        Self {
            literal_value: Some(token),
            ..Self::default()
        }
    }

    /// Source span from the first to the last token of the expression.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        if let Some(lit) = &self.literal_value {
            return Some(lit.span());
        }
        let first = self
            .unary_operator
            .as_ref()
            .map(Token::span)
            .or_else(|| self.expr1.as_ref().and_then(|e| e.span()));
        let last = self
            .expr2
            .as_ref()
            .and_then(|e| e.span())
            .or_else(|| self.expr1.as_ref().and_then(|e| e.span()));
        match (first, last) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (one, None) | (None, one) => one,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_token::TokenKind;

    fn tok(kind: TokenKind, offset: usize, value: &str) -> Token {
        Token::new(kind, 1, offset as u32 + 1, offset, value.chars().count(), value)
    }

    #[test]
    fn expr_literal_span_matches_token() {
        let e = Expr::literal(tok(TokenKind::Literal, 6, "price"));
        assert_eq!(e.span(), Some(Span::new(6, 11)));
    }

    #[test]
    fn expr_binary_span_covers_operands() {
        // amount * price
        let e = Expr {
            binary_operator: Some(tok(TokenKind::BinaryOperator, 7, "*")),
            expr1: Some(Box::new(Expr::literal(tok(TokenKind::Literal, 0, "amount")))),
            expr2: Some(Box::new(Expr::literal(tok(TokenKind::Literal, 9, "price")))),
            ..Expr::default()
        };
        assert_eq!(e.span(), Some(Span::new(0, 14)));
    }

    #[test]
    fn table_or_subquery_span_includes_alias() {
        let t = TableOrSubquery {
            table_name: Some(tok(TokenKind::Literal, 0, "items")),
            as_kw: Some(tok(TokenKind::KeywordAs, 6, "AS")),
            alias: Some(tok(TokenKind::Literal, 9, "i")),
            ..TableOrSubquery::default()
        };
        assert_eq!(t.span(), Some(Span::new(0, 10)));
    }

    #[test]
    fn default_stmt_has_no_family() {
        let stmt = SqlStmt::default();
        assert!(stmt.select_stmt.is_none());
        assert!(stmt.alter_table_stmt.is_none());
        assert!(stmt.explain.is_none());
    }
}

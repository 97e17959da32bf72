//! Grammar productions.
//!
//! Each `parse_x` method returns a freshly built node. Productions read
//! tokens through the lookahead buffer, assign them to the node's token
//! fields, and recurse into sub-productions. When a required token is absent
//! the production reports it and, wherever the grammar can continue
//! meaningfully, proceeds as if the token had been present; when
//! continuation is impossible it returns the partially filled node and the
//! caller re-anchors at the next statement boundary.

use silt_ast::{
    AlterTableStmt, AnalyzeStmt, AttachStmt, BeginStmt, ColumnConstraint, ColumnDef, CommitStmt,
    ConflictClause, CteTableName, DeleteStmt, DetachStmt, Expr, ForeignKeyClause, JoinClause,
    JoinClausePart, JoinConstraint, JoinOperator, QualifiedTableName, RecursiveCte, ResultColumn,
    RollbackStmt, SelectCore, SelectStmt, SignedNumber, SqlStmt, TableOrSubquery, TypeName,
    VacuumStmt, WithClause,
};
use silt_token::{Token, TokenKind};

use crate::parser::{Parser, Reporter};

/// Keywords that may begin a statement, plus the boundaries the statement
/// dispatcher anchors to.
const STATEMENT_START: &[TokenKind] = &[
    TokenKind::StatementSeparator,
    TokenKind::Eof,
    TokenKind::KeywordAlter,
    TokenKind::KeywordAnalyze,
    TokenKind::KeywordAttach,
    TokenKind::KeywordBegin,
    TokenKind::KeywordCommit,
    TokenKind::KeywordCreate,
    TokenKind::KeywordDelete,
    TokenKind::KeywordDetach,
    TokenKind::KeywordDrop,
    TokenKind::KeywordEnd,
    TokenKind::KeywordInsert,
    TokenKind::KeywordPragma,
    TokenKind::KeywordReindex,
    TokenKind::KeywordRelease,
    TokenKind::KeywordRollback,
    TokenKind::KeywordSavepoint,
    TokenKind::KeywordSelect,
    TokenKind::KeywordUpdate,
    TokenKind::KeywordVacuum,
    TokenKind::KeywordWith,
];

const STATEMENT_BOUNDARY: &[TokenKind] = &[TokenKind::StatementSeparator, TokenKind::Eof];

/// Whether `token` is the given delimiter.
fn delim(token: &Token, value: &str) -> bool {
    token.kind == TokenKind::Delimiter && token.value == value
}

/// Whether `token` is the `*` operator (the projection wildcard).
fn star(token: &Token) -> bool {
    token.kind == TokenKind::BinaryOperator && token.value == "*"
}

impl Parser {
    pub(crate) fn parse_sql_statement(&mut self, r: &mut dyn Reporter) -> SqlStmt {
        let mut stmt = SqlStmt::default();

        // EXPLAIN [QUERY PLAN] prefix.
        if let Some(next) = self.optional_lookahead(r) {
            if next.kind == TokenKind::KeywordExplain {
                stmt.explain = Some(next);
                self.consume_token();

                if let Some(next) = self.lookahead(r) {
                    if next.kind == TokenKind::KeywordQuery {
                        stmt.query = Some(next);
                        self.consume_token();

                        if let Some(next) = self.lookahead(r) {
                            if next.kind == TokenKind::KeywordPlan {
                                stmt.plan = Some(next);
                                self.consume_token();
                            } else {
                                r.unexpected_token(&next, &[TokenKind::KeywordPlan]);
                                // 'PLAN' rarely occurs elsewhere; assume the
                                // user meant plain 'EXPLAIN <statement>'.
                            }
                        }
                    }
                }
            }
        }

        self.search_next(r, STATEMENT_START);
        let Some(next) = self.unsafe_low_level_lookahead() else {
            r.incomplete_statement();
            return stmt;
        };

        match next.kind {
            TokenKind::KeywordAlter => {
                stmt.alter_table_stmt = Some(self.parse_alter_table_stmt(r));
            }
            TokenKind::KeywordAnalyze => {
                stmt.analyze_stmt = Some(self.parse_analyze_stmt(r));
            }
            TokenKind::KeywordAttach => {
                stmt.attach_stmt = Some(self.parse_attach_database_stmt(r));
            }
            TokenKind::KeywordBegin => {
                stmt.begin_stmt = Some(self.parse_begin_stmt(r));
            }
            TokenKind::KeywordCommit | TokenKind::KeywordEnd => {
                stmt.commit_stmt = Some(self.parse_commit_stmt(r));
            }
            TokenKind::KeywordDetach => {
                stmt.detach_stmt = Some(self.parse_detach_database_stmt(r));
            }
            TokenKind::KeywordRollback => {
                stmt.rollback_stmt = Some(self.parse_rollback_stmt(r));
            }
            TokenKind::KeywordVacuum => {
                stmt.vacuum_stmt = Some(self.parse_vacuum_stmt(r));
            }
            TokenKind::KeywordDelete => {
                stmt.delete_stmt = Some(self.parse_delete_stmt(r, None));
            }
            TokenKind::KeywordSelect => {
                stmt.select_stmt = Some(self.parse_select_stmt(r, None));
            }
            TokenKind::KeywordWith => {
                let with = self.parse_with_clause(r);
                match self.unsafe_low_level_lookahead() {
                    Some(next) if next.kind == TokenKind::KeywordDelete => {
                        stmt.delete_stmt = Some(self.parse_delete_stmt(r, Some(with)));
                    }
                    Some(next) if next.kind == TokenKind::KeywordSelect => {
                        stmt.select_stmt = Some(self.parse_select_stmt(r, Some(with)));
                    }
                    Some(next) if next.kind != TokenKind::Eof => {
                        r.unsupported_construct(&next);
                        self.skip_until(STATEMENT_BOUNDARY);
                    }
                    _ => r.incomplete_statement(),
                }
            }
            TokenKind::StatementSeparator => {
                r.incomplete_statement();
                self.consume_token();
                return stmt;
            }
            TokenKind::Eof => {
                r.incomplete_statement();
            }
            TokenKind::KeywordPragma => {
                // Pragmas are not supported; skip the whole statement.
                r.unsupported_construct(&next);
                self.skip_until(STATEMENT_BOUNDARY);
            }
            _ => {
                r.unsupported_construct(&next);
                self.skip_until(STATEMENT_BOUNDARY);
            }
        }

        // Statement epilogue: consume one separator and a directly
        // following end of input.
        self.search_next(r, STATEMENT_BOUNDARY);
        let Some(next) = self.unsafe_low_level_lookahead() else {
            return stmt;
        };
        if next.kind == TokenKind::StatementSeparator {
            self.consume_token();
            let Some(next) = self.optional_lookahead(r) else {
                return stmt;
            };
            if next.kind == TokenKind::Eof {
                self.consume_token();
            }
        } else if next.kind == TokenKind::Eof {
            self.consume_token();
        }
        stmt
    }

    // -----------------------------------------------------------------------
    // ALTER TABLE
    // -----------------------------------------------------------------------

    fn parse_alter_table_stmt(&mut self, r: &mut dyn Reporter) -> AlterTableStmt {
        let mut stmt = AlterTableStmt::default();

        self.search_next(r, &[TokenKind::KeywordAlter]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.alter = Some(next);
        self.consume_token();

        match self.lookahead(r) {
            Some(next) if next.kind == TokenKind::KeywordTable => {
                stmt.table = Some(next);
                self.consume_token();
            }
            Some(next) => {
                r.unexpected_token(&next, &[TokenKind::KeywordTable]);
                // Consume nothing and proceed as if 'TABLE' had been there.
            }
            None => return stmt,
        }

        let Some(schema_or_table) = self.lookahead(r) else {
            return stmt;
        };
        if schema_or_table.kind != TokenKind::Literal {
            r.unexpected_token(&schema_or_table, &[TokenKind::Literal]);
            return stmt;
        }
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        if delim(&next, ".") {
            stmt.schema_name = Some(schema_or_table);
            stmt.period = Some(next);
            self.consume_token();

            let Some(table_name) = self.lookahead(r) else {
                return stmt;
            };
            if table_name.kind == TokenKind::Literal {
                stmt.table_name = Some(table_name);
                self.consume_token();
            } else {
                r.unexpected_token(&table_name, &[TokenKind::Literal]);
            }
        } else {
            stmt.table_name = Some(schema_or_table);
        }

        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        match next.kind {
            TokenKind::KeywordRename => {
                stmt.rename = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return stmt;
                };
                match next.kind {
                    TokenKind::KeywordTo => {
                        stmt.to = Some(next);
                        self.consume_token();

                        let Some(next) = self.lookahead(r) else {
                            return stmt;
                        };
                        if next.kind != TokenKind::Literal {
                            r.unexpected_token(&next, &[TokenKind::Literal]);
                            self.consume_token();
                            return stmt;
                        }
                        stmt.new_table_name = Some(next);
                        self.consume_token();
                    }
                    TokenKind::KeywordColumn => {
                        stmt.column = Some(next);
                        self.consume_token();

                        let Some(column_name) = self.lookahead(r) else {
                            return stmt;
                        };
                        if column_name.kind != TokenKind::Literal {
                            r.unexpected_token(&column_name, &[TokenKind::Literal]);
                            self.consume_token();
                            return stmt;
                        }
                        self.parse_alter_rename_column_tail(r, &mut stmt, column_name);
                    }
                    TokenKind::Literal => {
                        self.parse_alter_rename_column_tail(r, &mut stmt, next);
                    }
                    _ => r.unexpected_token(
                        &next,
                        &[
                            TokenKind::KeywordTo,
                            TokenKind::KeywordColumn,
                            TokenKind::Literal,
                        ],
                    ),
                }
            }
            TokenKind::KeywordAdd => {
                stmt.add = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return stmt;
                };
                match next.kind {
                    TokenKind::KeywordColumn => {
                        stmt.column = Some(next);
                        self.consume_token();

                        let Some(next) = self.lookahead(r) else {
                            return stmt;
                        };
                        if next.kind != TokenKind::Literal {
                            r.unexpected_token(&next, &[TokenKind::Literal]);
                            self.consume_token();
                            return stmt;
                        }
                        stmt.column_def = Some(self.parse_column_def(r));
                    }
                    TokenKind::Literal => {
                        stmt.column_def = Some(self.parse_column_def(r));
                    }
                    _ => r.unexpected_token(
                        &next,
                        &[TokenKind::KeywordColumn, TokenKind::Literal],
                    ),
                }
            }
            _ => r.unexpected_token(&next, &[TokenKind::KeywordRename, TokenKind::KeywordAdd]),
        }

        stmt
    }

    /// Shared tail of `RENAME [COLUMN] column TO new-column`.
    fn parse_alter_rename_column_tail(
        &mut self,
        r: &mut dyn Reporter,
        stmt: &mut AlterTableStmt,
        column_name: Token,
    ) {
        stmt.column_name = Some(column_name);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return;
        };
        if next.kind != TokenKind::KeywordTo {
            r.unexpected_token(&next, &[TokenKind::KeywordTo]);
            self.consume_token();
            return;
        }
        stmt.to = Some(next);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return;
        };
        if next.kind != TokenKind::Literal {
            r.unexpected_token(&next, &[TokenKind::Literal]);
            self.consume_token();
            return;
        }
        stmt.new_column_name = Some(next);
        self.consume_token();
    }

    fn parse_column_def(&mut self, r: &mut dyn Reporter) -> ColumnDef {
        let mut def = ColumnDef::default();

        if let Some(next) = self.lookahead(r) {
            if next.kind == TokenKind::Literal {
                def.column_name = Some(next);
                self.consume_token();

                if let Some(next) = self.optional_lookahead(r) {
                    if next.kind == TokenKind::Literal {
                        def.type_name = Some(self.parse_type_name(r));
                    }
                }

                loop {
                    let Some(next) = self.optional_lookahead(r) else {
                        return def;
                    };
                    if matches!(
                        next.kind,
                        TokenKind::KeywordConstraint
                            | TokenKind::KeywordPrimary
                            | TokenKind::KeywordNot
                            | TokenKind::KeywordUnique
                            | TokenKind::KeywordCheck
                            | TokenKind::KeywordDefault
                            | TokenKind::KeywordCollate
                            | TokenKind::KeywordGenerated
                            | TokenKind::KeywordReferences
                    ) {
                        def.constraints.push(self.parse_column_constraint(r));
                    } else {
                        break;
                    }
                }
            }
        }
        def
    }

    fn parse_type_name(&mut self, r: &mut dyn Reporter) -> TypeName {
        let mut name = TypeName::default();

        // One or more name tokens.
        match self.lookahead(r) {
            Some(next) if next.kind == TokenKind::Literal => {
                name.name.push(next);
                self.consume_token();
            }
            Some(next) => r.unexpected_token(&next, &[TokenKind::Literal]),
            None => return name,
        }
        loop {
            match self.optional_lookahead(r) {
                Some(next) if next.kind == TokenKind::Literal => {
                    name.name.push(next);
                    self.consume_token();
                }
                _ => break,
            }
        }

        let Some(next) = self.optional_lookahead(r) else {
            return name;
        };
        if delim(&next, "(") {
            name.left_paren = Some(next);
            self.consume_token();

            name.signed_number1 = Some(self.parse_signed_number(r));

            let Some(next) = self.lookahead(r) else {
                return name;
            };
            if delim(&next, ",") {
                name.comma = Some(next);
                self.consume_token();
                name.signed_number2 = Some(self.parse_signed_number(r));
            }

            let Some(next) = self.lookahead(r) else {
                return name;
            };
            if delim(&next, ")") {
                name.right_paren = Some(next);
                self.consume_token();
            } else {
                r.unexpected_single_rune(&next, TokenKind::Delimiter, ')');
            }
        }
        name
    }

    fn parse_signed_number(&mut self, r: &mut dyn Reporter) -> SignedNumber {
        let mut num = SignedNumber::default();

        let Some(next) = self.lookahead(r) else {
            return num;
        };
        match next.kind {
            TokenKind::UnaryOperator => {
                num.sign = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return num;
                };
                if next.kind != TokenKind::Literal {
                    r.unexpected_token(&next, &[TokenKind::Literal]);
                    return num;
                }
                num.numeric_literal = Some(next);
                self.consume_token();
            }
            TokenKind::Literal => {
                num.numeric_literal = Some(next);
                self.consume_token();
            }
            _ => {
                r.unexpected_token(&next, &[TokenKind::UnaryOperator, TokenKind::Literal]);
            }
        }
        num
    }

    fn parse_column_constraint(&mut self, r: &mut dyn Reporter) -> ColumnConstraint {
        let mut constr = ColumnConstraint::default();

        let Some(next) = self.lookahead(r) else {
            return constr;
        };
        if next.kind == TokenKind::KeywordConstraint {
            constr.constraint = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return constr;
            };
            if next.kind == TokenKind::Literal {
                constr.name = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::Literal]);
                // Proceed as if the constraint name had been present.
            }
        }

        let Some(next) = self.lookahead(r) else {
            return constr;
        };
        match next.kind {
            TokenKind::KeywordPrimary => {
                constr.primary = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordKey {
                    constr.key = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_token(&next, &[TokenKind::KeywordKey]);
                    // Missing 'KEY' does not change the meaning; continue.
                }

                let Some(next) = self.optional_lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordAsc {
                    constr.asc = Some(next);
                    self.consume_token();
                } else if next.kind == TokenKind::KeywordDesc {
                    constr.desc = Some(next);
                    self.consume_token();
                }

                let Some(next) = self.optional_lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordOn {
                    constr.conflict_clause = Some(self.parse_conflict_clause(r));
                }

                let Some(next) = self.optional_lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordAutoincrement {
                    constr.autoincrement = Some(next);
                    self.consume_token();
                }
            }
            TokenKind::KeywordNot => {
                constr.not = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordNull {
                    constr.null = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_token(&next, &[TokenKind::KeywordNull]);
                }

                let Some(next) = self.optional_lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordOn {
                    constr.conflict_clause = Some(self.parse_conflict_clause(r));
                }
            }
            TokenKind::KeywordUnique => {
                constr.unique = Some(next);
                self.consume_token();

                let Some(next) = self.optional_lookahead(r) else {
                    return constr;
                };
                if next.kind == TokenKind::KeywordOn {
                    constr.conflict_clause = Some(self.parse_conflict_clause(r));
                }
            }
            TokenKind::KeywordCheck => {
                constr.check = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return constr;
                };
                if delim(&next, "(") {
                    constr.left_paren = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_single_rune(&next, TokenKind::Delimiter, '(');
                    // Assume the opening paren was merely omitted.
                }

                constr.expr = Some(self.parse_expression(r));

                let Some(next) = self.lookahead(r) else {
                    return constr;
                };
                if delim(&next, ")") {
                    constr.right_paren = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_single_rune(&next, TokenKind::Delimiter, ')');
                }
            }
            TokenKind::KeywordDefault => {
                constr.default = Some(next);
                self.consume_token();

                if let Some(next) = self.optional_lookahead(r) {
                    if matches!(next.kind, TokenKind::UnaryOperator | TokenKind::Literal) {
                        constr.default_value = Some(self.parse_signed_number(r));
                    }
                }
            }
            TokenKind::KeywordCollate => {
                constr.collate = Some(next);
                self.consume_token();

                if let Some(next) = self.optional_lookahead(r) {
                    if next.kind == TokenKind::Literal {
                        constr.collation_name = Some(next);
                        self.consume_token();
                    }
                }
            }
            TokenKind::KeywordGenerated => {
                constr.generated = Some(next);
                self.consume_token();
            }
            TokenKind::KeywordReferences => {
                constr.foreign_key_clause = Some(self.parse_foreign_key_clause(r));
            }
            _ => r.unexpected_token(
                &next,
                &[
                    TokenKind::KeywordPrimary,
                    TokenKind::KeywordNot,
                    TokenKind::KeywordUnique,
                    TokenKind::KeywordCheck,
                    TokenKind::KeywordDefault,
                    TokenKind::KeywordCollate,
                    TokenKind::KeywordGenerated,
                    TokenKind::KeywordReferences,
                ],
            ),
        }

        constr
    }

    /// Foreign-key clauses are not implemented and always report an
    /// unsupported construct.
    fn parse_foreign_key_clause(&mut self, r: &mut dyn Reporter) -> ForeignKeyClause {
        let clause = ForeignKeyClause::default();

        let Some(next) = self.lookahead(r) else {
            return clause;
        };
        r.unsupported_construct(&next);
        self.search_next(r, STATEMENT_BOUNDARY);
        clause
    }

    fn parse_conflict_clause(&mut self, r: &mut dyn Reporter) -> ConflictClause {
        let mut clause = ConflictClause::default();

        let Some(next) = self.optional_lookahead(r) else {
            return clause;
        };
        if next.kind == TokenKind::KeywordOn {
            clause.on = Some(next);
            self.consume_token();
        } else {
            // No 'ON' means the empty production; nothing to report.
            return clause;
        }

        let Some(next) = self.lookahead(r) else {
            return clause;
        };
        if next.kind == TokenKind::KeywordConflict {
            clause.conflict = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::KeywordConflict]);
            return clause;
        }

        let Some(next) = self.lookahead(r) else {
            return clause;
        };
        match next.kind {
            TokenKind::KeywordRollback => clause.rollback = Some(next),
            TokenKind::KeywordAbort => clause.abort = Some(next),
            TokenKind::KeywordFail => clause.fail = Some(next),
            TokenKind::KeywordIgnore => clause.ignore = Some(next),
            TokenKind::KeywordReplace => clause.replace = Some(next),
            _ => {
                r.unexpected_token(
                    &next,
                    &[
                        TokenKind::KeywordRollback,
                        TokenKind::KeywordAbort,
                        TokenKind::KeywordFail,
                        TokenKind::KeywordIgnore,
                        TokenKind::KeywordReplace,
                    ],
                );
                return clause;
            }
        }
        self.consume_token();
        clause
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    /// A literal, a unary application, or a single binary infix application.
    /// Anything richer reports an unsupported construct and re-anchors.
    pub(crate) fn parse_expression(&mut self, r: &mut dyn Reporter) -> Expr {
        let mut expr = Expr::default();

        let Some(next) = self.lookahead(r) else {
            return expr;
        };
        match next.kind {
            TokenKind::Literal => {
                self.consume_token();

                // A trailing operator makes this the left side of a binary
                // expression. `-` and `+` scan as unary but bind infix too.
                let operator = self.optional_lookahead(r).filter(|op| {
                    matches!(
                        op.kind,
                        TokenKind::BinaryOperator | TokenKind::UnaryOperator
                    )
                });
                match operator {
                    Some(op) => {
                        self.consume_token();
                        expr.expr1 = Some(Box::new(Expr::literal(next)));
                        expr.binary_operator = Some(op);
                        expr.expr2 = Some(Box::new(self.parse_expression(r)));
                    }
                    None => expr.literal_value = Some(next),
                }
            }
            TokenKind::UnaryOperator => {
                expr.unary_operator = Some(next);
                self.consume_token();
                expr.expr1 = Some(Box::new(self.parse_expression(r)));
            }
            _ => {
                r.unsupported_construct(&next);
                self.search_next(r, STATEMENT_BOUNDARY);
            }
        }
        expr
    }

    // -----------------------------------------------------------------------
    // Simple statements
    // -----------------------------------------------------------------------

    fn parse_attach_database_stmt(&mut self, r: &mut dyn Reporter) -> AttachStmt {
        let mut stmt = AttachStmt::default();

        self.search_next(r, &[TokenKind::KeywordAttach]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.attach = Some(next);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordDatabase {
            stmt.database = Some(next);
            self.consume_token();
        }
        stmt.expr = Some(self.parse_expression(r));

        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordAs {
            stmt.as_kw = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::KeywordAs]);
            return stmt;
        }

        let Some(schema_name) = self.lookahead(r) else {
            return stmt;
        };
        if schema_name.kind != TokenKind::Literal {
            r.unexpected_token(&schema_name, &[TokenKind::Literal]);
            return stmt;
        }
        stmt.schema_name = Some(schema_name);
        self.consume_token();
        stmt
    }

    fn parse_detach_database_stmt(&mut self, r: &mut dyn Reporter) -> DetachStmt {
        let mut stmt = DetachStmt::default();

        self.search_next(r, &[TokenKind::KeywordDetach]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.detach = Some(next);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordDatabase {
            stmt.database = Some(next);
            self.consume_token();
        }

        let Some(schema_name) = self.lookahead(r) else {
            return stmt;
        };
        if schema_name.kind != TokenKind::Literal {
            r.unexpected_token(&schema_name, &[TokenKind::Literal]);
            return stmt;
        }
        stmt.schema_name = Some(schema_name);
        self.consume_token();
        stmt
    }

    fn parse_vacuum_stmt(&mut self, r: &mut dyn Reporter) -> VacuumStmt {
        let mut stmt = VacuumStmt::default();

        self.search_next(r, &[TokenKind::KeywordVacuum]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.vacuum = Some(next);
        self.consume_token();

        // Bare 'VACUUM' is a complete statement, so everything after the
        // keyword is looked at optionally.
        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::Literal {
            stmt.schema_name = Some(next);
            self.consume_token();
        }

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordInto {
            stmt.into = Some(next);
            self.consume_token();

            let Some(filename) = self.lookahead(r) else {
                return stmt;
            };
            if filename.kind != TokenKind::Literal {
                r.unexpected_token(&filename, &[TokenKind::Literal]);
                return stmt;
            }
            stmt.filename = Some(filename);
            self.consume_token();
        }
        stmt
    }

    fn parse_analyze_stmt(&mut self, r: &mut dyn Reporter) -> AnalyzeStmt {
        let mut stmt = AnalyzeStmt::default();

        self.search_next(r, &[TokenKind::KeywordAnalyze]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.analyze = Some(next);
        self.consume_token();

        // Bare 'ANALYZE' is a complete statement.
        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::Eof {
            return stmt;
        }
        if next.kind == TokenKind::Literal {
            // Schema name or table name; decided by a following period.
            stmt.schema_name = Some(next.clone());
            stmt.table_or_index_name = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::Literal]);
            return stmt;
        }

        let Some(period) = self.optional_lookahead(r) else {
            stmt.schema_name = None;
            return stmt;
        };
        if !delim(&period, ".") {
            stmt.schema_name = None;
            return stmt;
        }
        stmt.period = Some(period);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::Eof {
            return stmt;
        }
        if next.kind == TokenKind::Literal {
            stmt.table_or_index_name = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::Literal]);
        }
        stmt
    }

    fn parse_begin_stmt(&mut self, r: &mut dyn Reporter) -> BeginStmt {
        let mut stmt = BeginStmt::default();

        self.search_next(r, &[TokenKind::KeywordBegin]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.begin = Some(next);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        match next.kind {
            TokenKind::KeywordDeferred => {
                stmt.deferred = Some(next);
                self.consume_token();
            }
            TokenKind::KeywordImmediate => {
                stmt.immediate = Some(next);
                self.consume_token();
            }
            TokenKind::KeywordExclusive => {
                stmt.exclusive = Some(next);
                self.consume_token();
            }
            _ => {}
        }

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordTransaction {
            stmt.transaction = Some(next);
            self.consume_token();
        }
        stmt
    }

    fn parse_commit_stmt(&mut self, r: &mut dyn Reporter) -> CommitStmt {
        let mut stmt = CommitStmt::default();

        self.search_next(r, &[TokenKind::KeywordCommit, TokenKind::KeywordEnd]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordCommit {
            stmt.commit = Some(next);
        } else if next.kind == TokenKind::KeywordEnd {
            stmt.end = Some(next);
        }
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordTransaction {
            stmt.transaction = Some(next);
            self.consume_token();
        }
        stmt
    }

    fn parse_rollback_stmt(&mut self, r: &mut dyn Reporter) -> RollbackStmt {
        let mut stmt = RollbackStmt::default();

        self.search_next(r, &[TokenKind::KeywordRollback]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.rollback = Some(next);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordTransaction {
            stmt.transaction = Some(next);
            self.consume_token();
        }

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordTo {
            stmt.to = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return stmt;
            };
            if next.kind == TokenKind::KeywordSavepoint {
                stmt.savepoint = Some(next);
                self.consume_token();
            }

            let Some(next) = self.lookahead(r) else {
                return stmt;
            };
            if next.kind == TokenKind::Literal {
                stmt.savepoint_name = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::Literal]);
            }
        }
        stmt
    }

    // -----------------------------------------------------------------------
    // DELETE
    // -----------------------------------------------------------------------

    fn parse_delete_stmt(
        &mut self,
        r: &mut dyn Reporter,
        with_clause: Option<WithClause>,
    ) -> DeleteStmt {
        let mut stmt = DeleteStmt {
            with_clause,
            ..DeleteStmt::default()
        };

        self.search_next(r, &[TokenKind::KeywordDelete]);
        let Some(next) = self.lookahead(r) else {
            return stmt;
        };
        stmt.delete = Some(next);
        self.consume_token();

        match self.lookahead(r) {
            Some(next) if next.kind == TokenKind::KeywordFrom => {
                stmt.from = Some(next);
                self.consume_token();
            }
            Some(next) => {
                r.unexpected_token(&next, &[TokenKind::KeywordFrom]);
                // Proceed as if 'FROM' had been present.
            }
            None => return stmt,
        }

        stmt.qualified_table_name = Some(self.parse_qualified_table_name(r));

        let Some(next) = self.optional_lookahead(r) else {
            return stmt;
        };
        if next.kind == TokenKind::KeywordWhere {
            stmt.where_kw = Some(next);
            self.consume_token();
            stmt.expr = Some(self.parse_expression(r));
        }
        stmt
    }

    fn parse_qualified_table_name(&mut self, r: &mut dyn Reporter) -> QualifiedTableName {
        let mut qtn = QualifiedTableName::default();

        let Some(next) = self.lookahead(r) else {
            return qtn;
        };
        if next.kind != TokenKind::Literal {
            r.unexpected_token(&next, &[TokenKind::Literal]);
            return qtn;
        }
        // Schema name or table name; decided by a following period.
        qtn.schema_name = Some(next.clone());
        qtn.table_name = Some(next);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            qtn.schema_name = None;
            return qtn;
        };
        if delim(&next, ".") {
            qtn.period = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return qtn;
            };
            if next.kind == TokenKind::Literal {
                qtn.table_name = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::Literal]);
            }
        } else {
            qtn.schema_name = None;
        }

        let Some(next) = self.optional_lookahead(r) else {
            return qtn;
        };
        if next.kind == TokenKind::KeywordAs {
            qtn.as_kw = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return qtn;
            };
            if next.kind == TokenKind::Literal {
                qtn.alias = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::Literal]);
            }
        }

        let Some(next) = self.optional_lookahead(r) else {
            return qtn;
        };
        if next.kind == TokenKind::KeywordIndexed {
            qtn.indexed = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return qtn;
            };
            if next.kind == TokenKind::KeywordBy {
                qtn.by = Some(next);
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return qtn;
                };
                if next.kind == TokenKind::Literal {
                    qtn.index_name = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_token(&next, &[TokenKind::Literal]);
                }
            } else {
                r.unexpected_token(&next, &[TokenKind::KeywordBy]);
            }
        }

        let Some(next) = self.optional_lookahead(r) else {
            return qtn;
        };
        if next.kind == TokenKind::KeywordNot {
            qtn.not = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return qtn;
            };
            if next.kind == TokenKind::KeywordIndexed {
                qtn.indexed = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::KeywordIndexed]);
            }
        }
        qtn
    }

    // -----------------------------------------------------------------------
    // WITH
    // -----------------------------------------------------------------------

    fn parse_with_clause(&mut self, r: &mut dyn Reporter) -> WithClause {
        let mut with_clause = WithClause::default();

        self.search_next(r, &[TokenKind::KeywordWith]);
        let Some(next) = self.lookahead(r) else {
            return with_clause;
        };
        with_clause.with = Some(next);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return with_clause;
        };
        if next.kind == TokenKind::KeywordRecursive {
            with_clause.recursive = Some(next);
            self.consume_token();
        }

        loop {
            with_clause.ctes.push(self.parse_recursive_cte(r));

            let Some(next) = self.lookahead(r) else {
                return with_clause;
            };
            if delim(&next, ",") {
                self.consume_token();
            } else {
                break;
            }
        }
        with_clause
    }

    fn parse_recursive_cte(&mut self, r: &mut dyn Reporter) -> RecursiveCte {
        let mut cte = RecursiveCte {
            cte_table_name: Some(self.parse_cte_table_name(r)),
            ..RecursiveCte::default()
        };

        let Some(next) = self.lookahead(r) else {
            return cte;
        };
        if next.kind == TokenKind::KeywordAs {
            cte.as_kw = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::KeywordAs]);
        }

        let Some(next) = self.lookahead(r) else {
            return cte;
        };
        if delim(&next, "(") {
            cte.left_paren = Some(next);
            self.consume_token();
        } else {
            r.unexpected_single_rune(&next, TokenKind::Delimiter, '(');
        }

        cte.select_stmt = Some(self.parse_select_stmt(r, None));

        let Some(next) = self.lookahead(r) else {
            return cte;
        };
        if delim(&next, ")") {
            cte.right_paren = Some(next);
            self.consume_token();
        } else {
            r.unexpected_single_rune(&next, TokenKind::Delimiter, ')');
        }
        cte
    }

    fn parse_cte_table_name(&mut self, r: &mut dyn Reporter) -> CteTableName {
        let mut name = CteTableName::default();

        let Some(next) = self.lookahead(r) else {
            return name;
        };
        if next.kind != TokenKind::Literal {
            r.unexpected_token(&next, &[TokenKind::Literal]);
            return name;
        }
        name.table_name = Some(next);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            return name;
        };
        if delim(&next, "(") {
            name.left_paren = Some(next);
            self.consume_token();

            loop {
                let Some(column_name) = self.lookahead(r) else {
                    return name;
                };
                if column_name.kind == TokenKind::Literal {
                    name.column_names.push(column_name);
                    self.consume_token();
                } else {
                    r.unexpected_token(&column_name, &[TokenKind::Literal]);
                    break;
                }

                let Some(next) = self.lookahead(r) else {
                    return name;
                };
                if delim(&next, ",") {
                    self.consume_token();
                } else if delim(&next, ")") {
                    name.right_paren = Some(next);
                    self.consume_token();
                    break;
                } else {
                    r.unexpected_single_rune(&next, TokenKind::Delimiter, ')');
                    break;
                }
            }
        }
        name
    }

    // -----------------------------------------------------------------------
    // SELECT
    // -----------------------------------------------------------------------

    fn parse_select_stmt(
        &mut self,
        r: &mut dyn Reporter,
        with_clause: Option<WithClause>,
    ) -> SelectStmt {
        SelectStmt {
            with_clause,
            core: Some(self.parse_select_core(r)),
        }
    }

    fn parse_select_core(&mut self, r: &mut dyn Reporter) -> SelectCore {
        let mut core = SelectCore::default();

        self.search_next(r, &[TokenKind::KeywordSelect]);
        let Some(next) = self.lookahead(r) else {
            return core;
        };
        core.select = Some(next);
        self.consume_token();

        let Some(next) = self.lookahead(r) else {
            return core;
        };
        if next.kind == TokenKind::KeywordDistinct {
            core.distinct = Some(next);
            self.consume_token();
        } else if next.kind == TokenKind::KeywordAll {
            core.all = Some(next);
            self.consume_token();
        }

        loop {
            core.columns.push(self.parse_result_column(r));

            let Some(next) = self.optional_lookahead(r) else {
                return core;
            };
            if delim(&next, ",") {
                self.consume_token();
            } else {
                break;
            }
        }

        let Some(next) = self.optional_lookahead(r) else {
            return core;
        };
        if next.kind == TokenKind::KeywordFrom {
            core.from = Some(next);
            self.consume_token();
            core.join_clause = Some(self.parse_join_clause(r));
        }

        let Some(next) = self.optional_lookahead(r) else {
            return core;
        };
        if next.kind == TokenKind::KeywordWhere {
            core.where_kw = Some(next);
            self.consume_token();
            core.where_expr = Some(self.parse_expression(r));
        }
        core
    }

    fn parse_result_column(&mut self, r: &mut dyn Reporter) -> ResultColumn {
        let mut col = ResultColumn::default();

        let Some(next) = self.lookahead(r) else {
            return col;
        };
        if star(&next) {
            col.star = Some(next);
            self.consume_token();
            return col;
        }

        // `table.*` needs three raw tokens of lookahead.
        if next.kind == TokenKind::Literal {
            let period = self.low_level_lookahead_nth(1);
            let wildcard = self.low_level_lookahead_nth(2);
            if let (Some(period), Some(wildcard)) = (period, wildcard) {
                if delim(&period, ".") && star(&wildcard) {
                    col.table_name = Some(next);
                    self.consume_token();
                    col.period = Some(period);
                    self.consume_token();
                    col.star = Some(wildcard);
                    self.consume_token();
                    return col;
                }
            }
        }

        col.expr = Some(self.parse_expression(r));

        let Some(next) = self.optional_lookahead(r) else {
            return col;
        };
        if next.kind == TokenKind::KeywordAs {
            col.as_kw = Some(next);
            self.consume_token();

            let Some(alias) = self.lookahead(r) else {
                return col;
            };
            if alias.kind == TokenKind::Literal {
                col.alias = Some(alias);
                self.consume_token();
            } else {
                r.unexpected_token(&alias, &[TokenKind::Literal]);
            }
        }
        col
    }

    fn parse_join_clause(&mut self, r: &mut dyn Reporter) -> JoinClause {
        let mut clause = JoinClause {
            table_or_subquery: Some(self.parse_table_or_subquery(r)),
            ..JoinClause::default()
        };

        loop {
            let Some(next) = self.optional_lookahead(r) else {
                return clause;
            };
            if delim(&next, ",") {
                self.consume_token();
                let operator = JoinOperator {
                    comma: Some(next),
                    ..JoinOperator::default()
                };
                clause.parts.push(JoinClausePart {
                    operator: Some(operator),
                    table_or_subquery: Some(self.parse_table_or_subquery(r)),
                    constraint: None,
                });
            } else if matches!(
                next.kind,
                TokenKind::KeywordNatural
                    | TokenKind::KeywordLeft
                    | TokenKind::KeywordRight
                    | TokenKind::KeywordFull
                    | TokenKind::KeywordInner
                    | TokenKind::KeywordCross
                    | TokenKind::KeywordJoin
            ) {
                let operator = self.parse_join_operator(r);
                let table_or_subquery = self.parse_table_or_subquery(r);
                let constraint = self.parse_join_constraint(r);
                clause.parts.push(JoinClausePart {
                    operator: Some(operator),
                    table_or_subquery: Some(table_or_subquery),
                    constraint,
                });
            } else {
                break;
            }
        }
        clause
    }

    fn parse_join_operator(&mut self, r: &mut dyn Reporter) -> JoinOperator {
        let mut op = JoinOperator::default();

        let Some(next) = self.lookahead(r) else {
            return op;
        };
        let mut next = next;
        if next.kind == TokenKind::KeywordNatural {
            op.natural = Some(next);
            self.consume_token();
            let Some(n) = self.lookahead(r) else {
                return op;
            };
            next = n;
        }

        match next.kind {
            TokenKind::KeywordLeft => {
                op.left = Some(next);
                self.consume_token();
                if let Some(n) = self.lookahead(r) {
                    if n.kind == TokenKind::KeywordOuter {
                        op.outer = Some(n);
                        self.consume_token();
                    }
                }
            }
            TokenKind::KeywordRight => {
                op.right = Some(next);
                self.consume_token();
                if let Some(n) = self.lookahead(r) {
                    if n.kind == TokenKind::KeywordOuter {
                        op.outer = Some(n);
                        self.consume_token();
                    }
                }
            }
            TokenKind::KeywordFull => {
                op.full = Some(next);
                self.consume_token();
                if let Some(n) = self.lookahead(r) {
                    if n.kind == TokenKind::KeywordOuter {
                        op.outer = Some(n);
                        self.consume_token();
                    }
                }
            }
            TokenKind::KeywordInner => {
                op.inner = Some(next);
                self.consume_token();
            }
            TokenKind::KeywordCross => {
                op.cross = Some(next);
                self.consume_token();
            }
            _ => {}
        }

        let Some(next) = self.lookahead(r) else {
            return op;
        };
        if next.kind == TokenKind::KeywordJoin {
            op.join = Some(next);
            self.consume_token();
        } else {
            r.unexpected_token(&next, &[TokenKind::KeywordJoin]);
            // Proceed as if 'JOIN' had been present.
        }
        op
    }

    fn parse_join_constraint(&mut self, r: &mut dyn Reporter) -> Option<JoinConstraint> {
        let next = self.optional_lookahead(r)?;
        match next.kind {
            TokenKind::KeywordOn => {
                let mut constraint = JoinConstraint {
                    on: Some(next),
                    ..JoinConstraint::default()
                };
                self.consume_token();
                constraint.expr = Some(self.parse_expression(r));
                Some(constraint)
            }
            TokenKind::KeywordUsing => {
                let mut constraint = JoinConstraint {
                    using: Some(next),
                    ..JoinConstraint::default()
                };
                self.consume_token();

                let Some(next) = self.lookahead(r) else {
                    return Some(constraint);
                };
                if delim(&next, "(") {
                    constraint.left_paren = Some(next);
                    self.consume_token();
                } else {
                    r.unexpected_single_rune(&next, TokenKind::Delimiter, '(');
                }

                loop {
                    let Some(column_name) = self.lookahead(r) else {
                        return Some(constraint);
                    };
                    if column_name.kind == TokenKind::Literal {
                        constraint.column_names.push(column_name);
                        self.consume_token();
                    } else {
                        r.unexpected_token(&column_name, &[TokenKind::Literal]);
                        break;
                    }

                    let Some(next) = self.lookahead(r) else {
                        return Some(constraint);
                    };
                    if delim(&next, ",") {
                        self.consume_token();
                    } else if delim(&next, ")") {
                        constraint.right_paren = Some(next);
                        self.consume_token();
                        break;
                    } else {
                        r.unexpected_single_rune(&next, TokenKind::Delimiter, ')');
                        break;
                    }
                }
                Some(constraint)
            }
            _ => None,
        }
    }

    fn parse_table_or_subquery(&mut self, r: &mut dyn Reporter) -> TableOrSubquery {
        let mut table = TableOrSubquery::default();

        let Some(next) = self.lookahead(r) else {
            return table;
        };
        if delim(&next, "(") {
            // Subqueries and parenthesized joins are not supported yet.
            r.unsupported_construct(&next);
            self.skip_until(STATEMENT_BOUNDARY);
            return table;
        }
        if next.kind != TokenKind::Literal {
            r.unexpected_token(&next, &[TokenKind::Literal]);
            return table;
        }
        // Schema name or table name; decided by a following period.
        table.schema_name = Some(next.clone());
        table.table_name = Some(next);
        self.consume_token();

        let Some(next) = self.optional_lookahead(r) else {
            table.schema_name = None;
            return table;
        };
        if delim(&next, ".") {
            table.period = Some(next);
            self.consume_token();

            let Some(next) = self.lookahead(r) else {
                return table;
            };
            if next.kind == TokenKind::Literal {
                table.table_name = Some(next);
                self.consume_token();
            } else {
                r.unexpected_token(&next, &[TokenKind::Literal]);
            }
        } else {
            table.schema_name = None;
        }

        let Some(next) = self.optional_lookahead(r) else {
            return table;
        };
        if next.kind == TokenKind::KeywordAs {
            table.as_kw = Some(next);
            self.consume_token();

            let Some(alias) = self.lookahead(r) else {
                return table;
            };
            if alias.kind == TokenKind::Literal {
                table.alias = Some(alias);
                self.consume_token();
            } else {
                r.unexpected_token(&alias, &[TokenKind::Literal]);
            }
        }
        table
    }
}

//! Relational-operator command trees.
//!
//! A [`Command`] is the compiler's output: an immutable tree built from a
//! closed set of relational operators, representing the meaning of a SQL
//! statement without prescribing how it is executed. All command structures
//! are values with structural equality.

use std::fmt;

/// One relational operator applied to its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Produces rows from a base table.
    Scan(Scan),
    /// Filters rows (σ).
    Select(Select),
    /// Projects columns (π).
    Project(Project),
    /// Cartesian product of two inputs.
    Join(Join),
    /// De-duplicates rows.
    Distinct(Distinct),
}

/// Produces rows from a base table.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub table: Table,
}

/// Keeps only the input rows the filter accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub filter: Expr,
    pub input: Box<Command>,
}

/// Projects the input rows onto the given columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub cols: Vec<Column>,
    pub input: Box<Command>,
}

/// Cartesian product; a comma source list and an explicit `JOIN` both lower
/// to this, consumed strictly left-to-right.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Box<Command>,
    pub right: Box<Command>,
}

/// Removes duplicate rows from its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Distinct {
    pub input: Box<Command>,
}

/// One projected column: an expression and an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub column: Expr,
    pub alias: Option<String>,
}

impl Column {
    /// A column without an alias.
    #[must_use]
    pub fn new(column: Expr) -> Self {
        Self {
            column,
            alias: None,
        }
    }

    /// A column with an alias.
    #[must_use]
    pub fn aliased(column: Expr, alias: impl Into<String>) -> Self {
        Self {
            column,
            alias: Some(alias.into()),
        }
    }
}

/// A scalar expression inside a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value, kept as its source text.
    Literal(LiteralExpr),
    /// A binary infix application.
    Binary(BinaryExpr),
}

impl Expr {
    /// A literal expression from its source text.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(LiteralExpr {
            value: value.into(),
        })
    }

    /// A binary expression from its operator text and operands.
    #[must_use]
    pub fn binary(operator: impl Into<String>, left: Self, right: Self) -> Self {
        Self::Binary(BinaryExpr {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// A literal value, e.g. `true`, `42`, `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: String,
}

/// A binary infix application; the operator is its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub operator: String,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// A table reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// A plain named table.
    Simple(SimpleTable),
}

/// `[schema.]table [AS alias]`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTable {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl SimpleTable {
    /// An unqualified, unaliased table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(scan) => write!(f, "Scan[table={}]()", scan.table),
            Self::Select(select) => {
                write!(f, "Select[filter={}]({})", select.filter, select.input)
            }
            Self::Project(project) => {
                write!(f, "Project[cols=")?;
                for (i, col) in project.cols.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{col}")?;
                }
                write!(f, "]({})", project.input)
            }
            Self::Join(join) => write!(f, "Join({},{})", join.left, join.right),
            Self::Distinct(distinct) => write!(f, "Distinct({})", distinct.input),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => f.write_str(&lit.value),
            Self::Binary(bin) => write!(f, "({} {} {})", bin.left, bin.operator, bin.right),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(table) => write!(f, "{table}"),
        }
    }
}

impl fmt::Display for SimpleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        f.write_str(&self.table)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Command::Scan(Scan {
            table: Table::Simple(SimpleTable::new("myTable")),
        });
        let b = Command::Scan(Scan {
            table: Table::Simple(SimpleTable::new("myTable")),
        });
        assert_eq!(a, b);

        let c = Command::Distinct(Distinct { input: Box::new(b) });
        assert_ne!(a, c);
    }

    #[test]
    fn display_renders_operator_nesting() {
        let cmd = Command::Project(Project {
            cols: vec![Column::new(Expr::literal("*"))],
            input: Box::new(Command::Select(Select {
                filter: Expr::literal("true"),
                input: Box::new(Command::Scan(Scan {
                    table: Table::Simple(SimpleTable::new("myTable")),
                })),
            })),
        });
        assert_eq!(
            cmd.to_string(),
            "Project[cols=*](Select[filter=true](Scan[table=myTable]()))"
        );
    }

    #[test]
    fn display_renders_binary_expression_and_alias() {
        let col = Column::aliased(
            Expr::binary("*", Expr::literal("amount"), Expr::literal("price")),
            "total_price",
        );
        assert_eq!(col.to_string(), "(amount * price) AS total_price");
    }

    #[test]
    fn display_renders_qualified_aliased_table() {
        let table = SimpleTable {
            schema: Some("main".to_owned()),
            table: "users".to_owned(),
            alias: Some("u".to_owned()),
        };
        assert_eq!(table.to_string(), "main.users AS u");
    }
}

//! Backend-neutral predicate trees.
//!
//! A [`Cond`] renders to parameterised SQL for a [`Dialect`]. Column and table
//! names come from the field registry or from this crate, never from callers,
//! and are quoted on output. Values are always bound.

use chrono::{DateTime, Utc};

/// A bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Time(value)
    }
}

/// SQL dialects the renderer can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
    Mysql,
}

impl Dialect {
    /// Quotes an identifier.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::Mysql => format!("`{ident}`"),
            Dialect::Sqlite | Dialect::Postgres => format!("\"{ident}\""),
        }
    }

    /// Returns true when `NULLS LAST` is supported in ORDER BY.
    pub fn supports_nulls_last(&self) -> bool {
        !matches!(self, Dialect::Mysql)
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn as_sql(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

/// A predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Cmp {
        column: String,
        op: CmpOp,
        value: SqlValue,
    },
    /// Case-sensitive pattern match; the pattern carries its own wildcards.
    Like { column: String, pattern: String },
    /// Case-insensitive pattern match.
    ILike { column: String, pattern: String },
    In { column: String, values: Vec<SqlValue> },
    NotIn { column: String, values: Vec<SqlValue> },
    /// `column IN (SELECT select FROM table WHERE cond)`
    InSubquery {
        column: String,
        select: String,
        table: String,
        cond: Box<Cond>,
    },
    IsNull(String),
    And(Vec<Cond>),
    Or(Vec<Cond>),
    True,
    False,
}

impl Cond {
    pub fn cmp(column: impl Into<String>, op: CmpOp, value: impl Into<SqlValue>) -> Self {
        Cond::Cmp {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::cmp(column, CmpOp::Eq, value)
    }

    pub fn in_values(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Cond::In {
            column: column.into(),
            values,
        }
    }

    pub fn in_ids(column: impl Into<String>, ids: &[i64]) -> Self {
        Self::in_values(column, ids.iter().copied().map(SqlValue::Int).collect())
    }

    pub fn in_subquery(
        column: impl Into<String>,
        select: impl Into<String>,
        table: impl Into<String>,
        cond: Cond,
    ) -> Self {
        Cond::InSubquery {
            column: column.into(),
            select: select.into(),
            table: table.into(),
            cond: Box::new(cond),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Cond::IsNull(column.into())
    }

    /// Conjunction of `conds`. A single condition is returned unchanged.
    pub fn and(conds: Vec<Cond>) -> Self {
        Self::join(conds, Cond::And, Cond::True)
    }

    /// Disjunction of `conds`. A single condition is returned unchanged.
    pub fn or(conds: Vec<Cond>) -> Self {
        Self::join(conds, Cond::Or, Cond::False)
    }

    fn join(mut conds: Vec<Cond>, wrap: fn(Vec<Cond>) -> Cond, empty: Cond) -> Self {
        match conds.len() {
            0 => empty,
            1 => conds.pop().unwrap_or(empty),
            _ => wrap(conds),
        }
    }

    /// Renders the predicate and collects its bind values in order.
    pub fn to_sql(&self, dialect: Dialect) -> (String, Vec<SqlValue>) {
        let mut renderer = Renderer {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        };
        renderer.render(self);
        (renderer.sql, renderer.params)
    }
}

struct Renderer {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl Renderer {
    fn bind(&mut self, value: &SqlValue) {
        self.params.push(value.clone());
        match self.dialect {
            Dialect::Postgres => {
                let n = self.params.len();
                self.sql.push_str(&format!("${n}"));
            }
            Dialect::Sqlite | Dialect::Mysql => self.sql.push('?'),
        }
    }

    fn column(&mut self, column: &str) {
        let quoted = self.dialect.quote(column);
        self.sql.push_str(&quoted);
    }

    fn list(&mut self, values: &[SqlValue]) {
        self.sql.push('(');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.bind(value);
        }
        self.sql.push(')');
    }

    fn joined(&mut self, conds: &[Cond], separator: &str) {
        self.sql.push('(');
        for (i, cond) in conds.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            self.render(cond);
        }
        self.sql.push(')');
    }

    fn render(&mut self, cond: &Cond) {
        match cond {
            Cond::Cmp { column, op, value } => {
                self.column(column);
                self.sql.push_str(&format!(" {} ", op.as_sql()));
                self.bind(value);
            }
            Cond::Like { column, pattern } => {
                self.column(column);
                self.sql.push_str(" LIKE ");
                self.bind(&SqlValue::Text(pattern.clone()));
            }
            Cond::ILike { column, pattern } => {
                match self.dialect {
                    Dialect::Postgres => {
                        self.column(column);
                        self.sql.push_str(" ILIKE ");
                    }
                    // LIKE is case-insensitive for ASCII in SQLite and under
                    // MySQL's default collations.
                    Dialect::Sqlite | Dialect::Mysql => {
                        self.column(column);
                        self.sql.push_str(" LIKE ");
                    }
                }
                self.bind(&SqlValue::Text(pattern.clone()));
            }
            Cond::In { values, .. } if values.is_empty() => self.render(&Cond::False),
            Cond::NotIn { values, .. } if values.is_empty() => self.render(&Cond::True),
            Cond::In { column, values } => {
                self.column(column);
                self.sql.push_str(" IN ");
                self.list(values);
            }
            Cond::NotIn { column, values } => {
                self.column(column);
                self.sql.push_str(" NOT IN ");
                self.list(values);
            }
            Cond::InSubquery {
                column,
                select,
                table,
                cond,
            } => {
                self.column(column);
                self.sql.push_str(" IN (SELECT ");
                self.column(select);
                self.sql.push_str(" FROM ");
                self.column(table);
                self.sql.push_str(" WHERE ");
                self.render(cond);
                self.sql.push(')');
            }
            Cond::IsNull(column) => {
                self.column(column);
                self.sql.push_str(" IS NULL");
            }
            Cond::And(conds) if conds.is_empty() => self.render(&Cond::True),
            Cond::Or(conds) if conds.is_empty() => self.render(&Cond::False),
            Cond::And(conds) => self.joined(conds, " AND "),
            Cond::Or(conds) => self.joined(conds, " OR "),
            Cond::True => self.sql.push_str("1 = 1"),
            Cond::False => self.sql.push_str("1 = 0"),
        }
    }
}

//! Condition fragments: the predicate algebra behind every WHERE clause.
//!
//! A [`Fragment`] compiles to SQL text plus the parameters its placeholders
//! refer to. All placeholders of one statement come from a single
//! [`PositionalCounter`], so text and parameters always line up, including
//! inside embedded subqueries.

use crate::counter::PositionalCounter;
use crate::ident::push_quoted;
use crate::value::Value;

/// A composable predicate node.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Fixed SQL text without parameters, e.g. `"deleted_at" IS NULL`.
    Constant(String),
    /// `<op> $n`, where `op` already carries the column, e.g. `"name" =`.
    Unary { op: String, param: Value },
    /// Children joined with `AND`; empty compiles to `true`.
    And(Vec<Fragment>),
    /// Groups (each AND-ed) joined with `OR`, always parenthesized; empty compiles to `false`.
    Or(Vec<Vec<Fragment>>),
    /// `"col" IN (…)` / `"col" NOT IN (…)`.
    InList {
        column: String,
        values: Vec<Value>,
        negate: bool,
    },
    /// `"col" IN (SELECT "pk" FROM "table" WHERE …)`, numbered with the outer counter.
    InSubquery { column: String, subquery: Subquery },
}

/// The primary keys of the rows matched by another query set.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub table: &'static str,
    pub column: &'static str,
    pub conditions: Vec<Fragment>,
}

impl Fragment {
    /// `"column" <op> $n`.
    pub fn compare(column: &str, op: &str, value: Value) -> Self {
        let mut text = String::with_capacity(column.len() + op.len() + 3);
        push_quoted(&mut text, column);
        text.push(' ');
        text.push_str(op);
        Self::Unary { op: text, param: value }
    }

    pub fn is_null(column: &str) -> Self {
        let mut text = String::new();
        push_quoted(&mut text, column);
        text.push_str(" IS NULL");
        Self::Constant(text)
    }

    pub fn is_not_null(column: &str) -> Self {
        let mut text = String::new();
        push_quoted(&mut text, column);
        text.push_str(" IS NOT NULL");
        Self::Constant(text)
    }

    /// `"column" = NULL`, used as an UPDATE assignment.
    pub fn assign_null(column: &str) -> Self {
        let mut text = String::new();
        push_quoted(&mut text, column);
        text.push_str(" = NULL");
        Self::Constant(text)
    }

    /// Compile with the statement's counter.
    pub fn compile(&self, counter: &mut PositionalCounter) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write(counter, &mut sql, &mut params);
        (sql, params)
    }

    /// Append compiled text and parameters to existing buffers.
    pub fn write(&self, counter: &mut PositionalCounter, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Fragment::Constant(text) => sql.push_str(text),
            Fragment::Unary { op, param } => {
                sql.push_str(op);
                sql.push(' ');
                sql.push_str(&counter.next_placeholder());
                params.push(param.clone());
            }
            Fragment::And(children) => write_conjunction(children.iter(), counter, sql, params),
            Fragment::Or(groups) => {
                if groups.is_empty() {
                    sql.push_str("false");
                    return;
                }
                sql.push('(');
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    if group.len() > 1 {
                        sql.push('(');
                        write_conjunction(group.iter(), counter, sql, params);
                        sql.push(')');
                    } else {
                        write_conjunction(group.iter(), counter, sql, params);
                    }
                }
                sql.push(')');
            }
            Fragment::InList {
                column,
                values,
                negate,
            } => {
                if values.is_empty() {
                    sql.push_str(if *negate { "true" } else { "false" });
                    return;
                }
                push_quoted(sql, column);
                sql.push_str(if *negate { " NOT IN (" } else { " IN (" });
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push_str(&counter.next_placeholder());
                    params.push(v.clone());
                }
                sql.push(')');
            }
            Fragment::InSubquery { column, subquery } => {
                push_quoted(sql, column);
                sql.push_str(" IN (");
                subquery.write(counter, sql, params);
                sql.push(')');
            }
        }
    }
}

impl Subquery {
    /// `SELECT "column" FROM "table"[ WHERE …]`.
    pub fn write(&self, counter: &mut PositionalCounter, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str("SELECT ");
        push_quoted(sql, self.column);
        sql.push_str(" FROM ");
        push_quoted(sql, self.table);
        write_where(self.conditions.iter(), counter, sql, params);
    }
}

/// AND-join `fragments`; nothing to join compiles to `true`.
pub fn write_conjunction<'a>(
    fragments: impl ExactSizeIterator<Item = &'a Fragment>,
    counter: &mut PositionalCounter,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    if fragments.len() == 0 {
        sql.push_str("true");
        return;
    }
    for (i, f) in fragments.enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        f.write(counter, sql, params);
    }
}

/// ` WHERE <conjunction>`, or nothing at all when there are no conditions.
pub fn write_where<'a>(
    fragments: impl ExactSizeIterator<Item = &'a Fragment>,
    counter: &mut PositionalCounter,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    if fragments.len() == 0 {
        return;
    }
    sql.push_str(" WHERE ");
    write_conjunction(fragments, counter, sql, params);
}

//! Filter compiler: JSON filter documents to parameter-bound boolean SQL.
//!
//! A filter is a JSON object whose keys are visited in document order:
//!
//! - `$and` / `$or` map to a list of filters (or an object, whose entries are treated as
//!   one filter each) and join the compiled children with `AND` / `OR`.
//! - `$gt`, `$gte`, `$lt`, `$lte`, `$eq` compare the enclosing column with a scalar.
//! - `column: { ... }` opens a column scope for the operators inside it. Scopes do not nest.
//! - `column: scalar` is shorthand for `column = scalar`.
//!
//! ```ignore
//! use serde_json::json;
//!
//! let sql = pgbridge::filter::compile(&json!({"age": {"$gte": 18, "$lt": 65}}))?;
//! assert_eq!(sql.to_sql(), r#""age" >= $1 AND "age" < $2"#);
//! ```
//!
//! The current column is passed down the recursion by reference, so compilation holds no
//! state between calls and can run on any number of threads at once.

use serde_json::Map;

use crate::error::{BridgeError, BridgeResult};
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

#[cfg(test)]
mod tests;

/// Comparison operator usable inside a column scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl CompareOp {
    /// Look up an operator by its filter key (`"$gt"`, ...).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$eq" => Some(Self::Eq),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Eq => "$eq",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logic {
    And,
    Or,
}

impl Logic {
    fn separator(self) -> &'static str {
        match self {
            Logic::And => " AND ",
            Logic::Or => " OR ",
        }
    }
}

/// A compiled clause. `disjunction` marks an `OR` chain that needs parentheses once it
/// is combined with siblings under `AND`.
struct Clause {
    sql: Sql,
    disjunction: bool,
}

impl Clause {
    fn plain(sql: Sql) -> Self {
        Self {
            sql,
            disjunction: false,
        }
    }
}

fn join(clauses: Vec<Clause>, logic: Logic) -> Clause {
    let clauses: Vec<Clause> = clauses.into_iter().filter(|c| !c.sql.is_empty()).collect();
    let multiple = clauses.len() > 1;
    // A lone clause passes through unchanged, so it keeps its own marker.
    let disjunction = if multiple {
        logic == Logic::Or
    } else {
        clauses.first().is_some_and(|c| c.disjunction)
    };

    let fragments = clauses.into_iter().map(|c| {
        if multiple && logic == Logic::And && c.disjunction {
            let mut wrapped = Sql::new("(");
            wrapped.push_sql(c.sql).push(")");
            wrapped
        } else {
            c.sql
        }
    });

    Clause {
        sql: Sql::join(fragments, logic.separator()),
        disjunction,
    }
}

/// Compile a filter object into a boolean SQL fragment.
///
/// Top-level entries are joined with `AND`. An empty object compiles to an empty
/// fragment. Non-object input is rejected.
pub fn compile(filter: &serde_json::Value) -> BridgeResult<Sql> {
    let obj = filter
        .as_object()
        .ok_or_else(|| BridgeError::invalid_input("filter must be a JSON object"))?;
    let clauses = compile_object(obj, None)?;
    Ok(join(clauses, Logic::And).sql)
}

/// Compile an optional `where` document for a statement template.
///
/// A missing, `null` or empty filter yields an empty fragment, which templates read as
/// "omit the WHERE clause".
pub fn build_query(filter: Option<&serde_json::Value>) -> BridgeResult<Sql> {
    match filter {
        None | Some(serde_json::Value::Null) => Ok(Sql::empty()),
        Some(f) => compile(f),
    }
}

fn compile_object(
    obj: &Map<String, serde_json::Value>,
    column: Option<&Ident>,
) -> BridgeResult<Vec<Clause>> {
    let mut clauses = Vec::with_capacity(obj.len());

    for (key, value) in obj {
        let clause = match key.as_str() {
            "$and" => compile_group(value, column, Logic::And)?,
            "$or" => compile_group(value, column, Logic::Or)?,
            _ => {
                if let Some(op) = CompareOp::from_key(key) {
                    Clause::plain(compile_comparison(op, value, column)?)
                } else if let Some(nested) = value.as_object() {
                    if let Some(current) = column {
                        return Err(BridgeError::invalid_input(format!(
                            "fields in '{current}' can't be nested (found '{key}')"
                        )));
                    }
                    let scoped = Ident::parse(key)?;
                    join(compile_object(nested, Some(&scoped))?, Logic::And)
                } else {
                    Clause::plain(compile_equality(key, value)?)
                }
            }
        };
        clauses.push(clause);
    }

    Ok(clauses)
}

fn compile_group(
    value: &serde_json::Value,
    column: Option<&Ident>,
    logic: Logic,
) -> BridgeResult<Clause> {
    let mut children = Vec::new();

    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                let obj = item.as_object().ok_or_else(|| {
                    BridgeError::invalid_input("logical group entries must be JSON objects")
                })?;
                children.push(join(compile_object(obj, column)?, Logic::And));
            }
        }
        // Object form: every entry is its own child, `{"$or": {"a": 1, "b": 2}}`.
        serde_json::Value::Object(obj) => {
            children = compile_object(obj, column)?;
        }
        _ => {
            return Err(BridgeError::invalid_input(
                "logical group must map to a list of filters",
            ));
        }
    }

    Ok(join(children, logic))
}

fn compile_comparison(
    op: CompareOp,
    value: &serde_json::Value,
    column: Option<&Ident>,
) -> BridgeResult<Sql> {
    let Some(column) = column else {
        return Err(BridgeError::invalid_input(format!(
            "operator '{}' requires an enclosing column",
            op.key()
        )));
    };
    let value = Value::from_json(value, op.key())?;

    let mut sql = Sql::empty();
    sql.push_quoted(column)
        .push(" ")
        .push(op.as_sql())
        .push(" ")
        .push_bind(value);
    Ok(sql)
}

fn compile_equality(key: &str, value: &serde_json::Value) -> BridgeResult<Sql> {
    let column = Ident::parse(key)?;
    let value = Value::from_json(value, key)?;

    let mut sql = Sql::empty();
    sql.push(column.as_str()).push(" = ").push_bind(value);
    Ok(sql)
}

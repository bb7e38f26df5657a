//! Insert compiler: row objects to a column list and a multi-row `VALUES` clause.
//!
//! Each row's entries are sorted by column name. The first row's sorted names become the
//! column list, and every row must carry exactly the same names; a row that doesn't is
//! rejected with [`BridgeError::RowShape`] instead of silently shifting values into the
//! wrong columns.

use serde_json::Map;

use crate::error::{BridgeError, BridgeResult};
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

/// Result of compiling one or more rows.
#[derive(Debug, Clone)]
pub struct CompiledInsert {
    columns: Vec<Ident>,
    values: Sql,
    rows: usize,
    single: bool,
}

impl CompiledInsert {
    /// Canonical columns, sorted by name.
    pub fn columns(&self) -> &[Ident] {
        &self.columns
    }

    /// Quoted column list: `"a","b"`.
    pub fn column_names(&self) -> String {
        self.columns
            .iter()
            .map(Ident::quoted)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Placeholder tuples with their params: `($1,$2),($3,$4)`.
    pub fn values_clause(&self) -> &Sql {
        &self.values
    }

    pub fn into_values_clause(self) -> Sql {
        self.values
    }

    /// Flattened params, row by row, each row in column order.
    pub fn params(&self) -> &[Value] {
        self.values.params()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Whether the input was a single row object rather than a list.
    pub fn is_single(&self) -> bool {
        self.single
    }
}

/// Compile a `values` document: either one row object or a non-empty list of them.
pub fn compile(values: &serde_json::Value) -> BridgeResult<CompiledInsert> {
    match values {
        serde_json::Value::Object(row) => compile_rows(std::slice::from_ref(row), true),
        serde_json::Value::Array(items) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().cloned().ok_or_else(|| {
                        BridgeError::invalid_input(format!("values[{i}] must be a JSON object"))
                    })
                })
                .collect::<BridgeResult<Vec<_>>>()?;
            compile_rows(&rows, false)
        }
        _ => Err(BridgeError::invalid_input(
            "values must be a JSON object or a list of objects",
        )),
    }
}

fn sorted_entries(row: &Map<String, serde_json::Value>) -> Vec<(&String, &serde_json::Value)> {
    let mut entries: Vec<_> = row.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn compile_rows(
    rows: &[Map<String, serde_json::Value>],
    single: bool,
) -> BridgeResult<CompiledInsert> {
    let Some(first) = rows.first() else {
        return Err(BridgeError::invalid_input("values must contain at least one row"));
    };
    if first.is_empty() {
        return Err(BridgeError::invalid_input("a row must have at least one column"));
    }

    let columns = sorted_entries(first)
        .into_iter()
        .map(|(name, _)| Ident::parse(name))
        .collect::<BridgeResult<Vec<_>>>()?;

    let mut values = Sql::empty();
    for (i, row) in rows.iter().enumerate() {
        let entries = sorted_entries(row);
        let same_shape = entries.len() == columns.len()
            && entries
                .iter()
                .zip(&columns)
                .all(|((name, _), col)| name.as_str() == col.as_str());
        if !same_shape {
            return Err(BridgeError::RowShape {
                row: i,
                expected: columns
                    .iter()
                    .map(Ident::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                found: entries
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if i > 0 {
            values.push(",");
        }
        values.push("(");
        for (j, (name, value)) in entries.into_iter().enumerate() {
            if j > 0 {
                values.push(",");
            }
            values.push_bind(Value::from_json(value, name)?);
        }
        values.push(")");
    }

    Ok(CompiledInsert {
        columns,
        values,
        rows: rows.len(),
        single,
    })
}

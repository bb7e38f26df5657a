//! `SET` list compiler for updates.

use crate::error::{BridgeError, BridgeResult};
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

/// Compile an object of new values into `"a" = $1,"b" = $2`, sorted by column name.
pub fn compile_assignments(values: &serde_json::Value) -> BridgeResult<Sql> {
    let obj = values
        .as_object()
        .ok_or_else(|| BridgeError::invalid_input("values must be a JSON object"))?;
    if obj.is_empty() {
        return Err(BridgeError::invalid_input("values must set at least one column"));
    }

    let mut entries: Vec<_> = obj.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut sql = Sql::empty();
    for (i, (name, value)) in entries.into_iter().enumerate() {
        let column = Ident::parse(name)?;
        if i > 0 {
            sql.push(",");
        }
        sql.push_quoted(&column)
            .push(" = ")
            .push_bind(Value::from_json(value, name)?);
    }
    Ok(sql)
}

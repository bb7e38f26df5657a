//! SQL identifier validation.
//!
//! Identifiers cannot be bound as parameters, so every caller-supplied name that ends
//! up in SQL text goes through [`is_valid_identifier`] first.
//!
//! The rule is a conservative allowlist: the first character must be an ASCII letter or
//! digit, and every other character an ASCII letter, digit, `_` or `$`. Diacritics and
//! non-Latin letters are rejected even though Postgres accepts them.
//!
//! # Example
//! ```ignore
//! use pgbridge::{Ident, TableName};
//!
//! let c = Ident::parse("created_at")?;
//! assert_eq!(c.quoted(), r#""created_at""#);
//!
//! let t = TableName::parse("public.users")?;
//! assert_eq!(t.to_sql(), "public.users");
//! # Ok::<(), pgbridge::BridgeError>(())
//! ```

use crate::error::{BridgeError, BridgeResult};
use std::fmt;

/// Check that `s` is a safe, injection-free SQL identifier.
///
/// Returns `false` instead of failing; callers decide how to report it.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A validated single-part SQL identifier (column name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate `name` and wrap it.
    pub fn parse(name: &str) -> BridgeResult<Self> {
        if is_valid_identifier(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(BridgeError::InvalidIdentifier(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as a double-quoted identifier.
    ///
    /// Valid identifiers never contain `"`, so no escaping is needed.
    pub fn quoted(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_quoted(&mut out);
        out
    }

    pub(crate) fn write_quoted(&self, out: &mut String) {
        out.push('"');
        out.push_str(&self.0);
        out.push('"');
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated table name, optionally schema-qualified (`schema.table`).
///
/// Rendered unquoted so that Postgres folds it to lower case as usual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    parts: Vec<Ident>,
}

impl TableName {
    pub fn parse(s: &str) -> BridgeResult<Self> {
        if s.is_empty() {
            return Err(BridgeError::InvalidIdentifier(String::new()));
        }

        let parts = s
            .split('.')
            .map(|seg| {
                if is_valid_identifier(seg) {
                    Ok(Ident(seg.to_string()))
                } else {
                    Err(BridgeError::InvalidIdentifier(s.to_string()))
                }
            })
            .collect::<BridgeResult<Vec<_>>>()?;

        Ok(Self { parts })
    }

    /// Render the table name as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(part.as_str());
        }
        out
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_digits_underscore_dollar() {
        assert!(is_valid_identifier("valid_name$1"));
        assert!(is_valid_identifier("users"));
        assert!(is_valid_identifier("A"));
    }

    #[test]
    fn leading_digit_is_alphanumeric() {
        assert!(is_valid_identifier("1abc"));
    }

    #[test]
    fn rejects_empty() {
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn rejects_punctuation_and_whitespace() {
        assert!(!is_valid_identifier("bad name"));
        assert!(!is_valid_identifier("_hidden"));
        assert!(!is_valid_identifier("$1"));
        assert!(!is_valid_identifier("a;drop table users"));
        assert!(!is_valid_identifier("a\"b"));
        assert!(!is_valid_identifier("a'b"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("a.b"));
        assert!(!is_valid_identifier("tab\t"));
    }

    #[test]
    fn rejects_non_ascii_letters() {
        assert!(!is_valid_identifier("café"));
        assert!(!is_valid_identifier("имя"));
    }

    #[test]
    fn ident_quotes() {
        let ident = Ident::parse("age").unwrap();
        assert_eq!(ident.quoted(), "\"age\"");
        assert_eq!(ident.to_string(), "age");
    }

    #[test]
    fn ident_rejects_invalid() {
        let err = Ident::parse("bad name").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidIdentifier(ref s) if s == "bad name"));
    }

    #[test]
    fn table_simple_and_dotted() {
        assert_eq!(TableName::parse("users").unwrap().to_sql(), "users");
        assert_eq!(
            TableName::parse("public.users").unwrap().to_sql(),
            "public.users"
        );
    }

    #[test]
    fn table_rejects_unsafe() {
        assert!(TableName::parse("").is_err());
        assert!(TableName::parse("users; drop table users").is_err());
        assert!(TableName::parse("public..users").is_err());
        assert!(TableName::parse("users.").is_err());
        assert!(TableName::parse("\"Users\"").is_err());
    }
}

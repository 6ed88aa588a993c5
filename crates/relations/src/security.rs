//! Identifier validation for SQL built from field references and schema
//! declarations. Values never reach SQL text except through placeholders;
//! identifiers do, so they are checked here.

use crate::error::QueryError;

/// PostgreSQL truncates identifiers beyond this length
const MAX_IDENTIFIER_LEN: usize = 63;

/// SQL keywords rejected as bare identifiers
static SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "UNION", "DROP", "CREATE",
    "ALTER", "GRANT", "REVOKE", "TRUNCATE", "EXEC", "EXECUTE", "DECLARE", "CAST", "TABLE",
    "ORDER", "GROUP",
];

/// Validate that an identifier is safe for use in SQL
pub fn validate_identifier(identifier: &str) -> Result<(), QueryError> {
    let first = identifier
        .chars()
        .next()
        .ok_or_else(|| QueryError::InvalidIdentifier("identifier cannot be empty".to_string()))?;

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' cannot start with a number",
            identifier
        )));
    }

    if SQL_KEYWORDS.contains(&identifier.to_uppercase().as_str()) {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' is a reserved SQL keyword",
            identifier
        )));
    }

    Ok(())
}

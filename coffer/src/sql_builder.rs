//! Filter/order expression rewriting and SELECT assembly
//!
//! Converts `$field` marker expressions to SQLite json_extract fragments.

use crate::error::StoreError;

/// Marker prefix denoting a field inside the encoded document.
pub const FIELD_MARKER: char = '$';

/// Rewrite a filter/order expression into an engine-native fragment.
///
/// The input is split on whitespace. Tokens starting with [`FIELD_MARKER`]
/// become `json_extract("value", '$.field')`; every other token passes
/// through verbatim (operators, `?` placeholders, literals), single-space
/// joined. An expression with no marker tokens comes back with only
/// whitespace normalization.
///
/// Marker fields must be non-empty `[A-Za-z0-9_.]` paths (dots for nesting);
/// anything else fails with [`StoreError::InvalidFilter`] rather than
/// passing malformed SQL through to the engine.
pub fn rewrite(expr: &str) -> Result<String, StoreError> {
    let mut out = Vec::new();
    for token in expr.split_whitespace() {
        if let Some(field) = token.strip_prefix(FIELD_MARKER) {
            if !is_field_path(field) {
                return Err(StoreError::InvalidFilter(format!("malformed field marker: {token:?}")));
            }
            out.push(format!(r#"json_extract("value", '$.{field}')"#));
        } else if token.eq_ignore_ascii_case("limit") {
            // An embedded LIMIT would silently conflict with the dedicated
            // limit parameter.
            return Err(StoreError::InvalidFilter("LIMIT belongs in the limit parameter, not the filter".to_owned()));
        } else {
            out.push(token.to_owned());
        }
    }
    Ok(out.join(" "))
}

fn is_field_path(field: &str) -> bool {
    !field.is_empty()
        && !field.starts_with('.')
        && !field.ends_with('.')
        && !field.contains("..")
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Assemble the SELECT for a query-many operation.
///
/// Shape: `SELECT json("value") FROM "<table>" [WHERE <filter>] ORDER BY
/// (<order_by> | "id") [LIMIT n]`. Results come back in identifier order
/// unless the caller orders otherwise.
pub fn build_select(
    table: &str,
    filter: Option<&str>,
    order_by: Option<&str>,
    limit: Option<u32>,
) -> Result<String, StoreError> {
    let mut sql = format!(r#"SELECT json("value") FROM "{table}""#);

    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(&rewrite(filter)?);
    }

    sql.push_str(" ORDER BY ");
    match order_by {
        Some(order_by) => sql.push_str(&rewrite(order_by)?),
        None => sql.push_str(r#""id""#),
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(sql)
}

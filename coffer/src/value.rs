//! Statement parameter kinds and binding conversions

use crate::error::StoreError;

/// A positional statement parameter.
///
/// The supported kinds are UTF-8 text, 32-bit integers, and opaque byte
/// sequences. Binding is strictly positional in the order parameters are
/// supplied; the engine copies bound values at bind time.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// TEXT parameter
    Text(String),
    /// INTEGER parameter
    Integer(i32),
    /// BLOB parameter
    Blob(Vec<u8>),
}

impl Param {
    /// Convert to the engine's owned value for positional binding
    pub fn to_sql(&self) -> rusqlite::types::Value {
        match self {
            Param::Text(s) => rusqlite::types::Value::Text(s.clone()),
            Param::Integer(i) => rusqlite::types::Value::Integer(i64::from(*i)),
            Param::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
        }
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self { Param::Text(s) }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self { Param::Text(s.to_owned()) }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self { Param::Integer(i) }
}

impl From<Vec<u8>> for Param {
    fn from(b: Vec<u8>) -> Self { Param::Blob(b) }
}

impl TryFrom<&serde_json::Value> for Param {
    type Error = StoreError;

    /// Fail-fast dynamic conversion: anything but a string or an integer in
    /// i32 range is rejected, never coerced.
    fn try_from(value: &serde_json::Value) -> Result<Self, StoreError> {
        match value {
            serde_json::Value::String(s) => Ok(Param::Text(s.clone())),
            serde_json::Value::Number(n) => {
                let i = n.as_i64().ok_or(StoreError::UnsupportedParameter("non-integer number"))?;
                let i = i32::try_from(i).map_err(|_| StoreError::UnsupportedParameter("integer out of i32 range"))?;
                Ok(Param::Integer(i))
            }
            serde_json::Value::Null => Err(StoreError::UnsupportedParameter("null")),
            serde_json::Value::Bool(_) => Err(StoreError::UnsupportedParameter("bool")),
            serde_json::Value::Array(_) => Err(StoreError::UnsupportedParameter("array")),
            serde_json::Value::Object(_) => Err(StoreError::UnsupportedParameter("object")),
        }
    }
}

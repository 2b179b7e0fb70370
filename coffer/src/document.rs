//! The document trait and the raw shape migrations operate on

use serde::de::DeserializeOwned;
use serde::Serialize;

/// The decoded field/value map of a stored document, independent of any Rust
/// type's current shape. Migrations transform this rather than the strong
/// type so they stay writable when the type's shape has drifted.
pub type RawDocument = serde_json::Map<String, serde_json::Value>;

/// A typed value persisted as an encoded document under a string identifier.
///
/// Within a type's table the identifier is unique; re-saving an existing
/// identifier replaces the prior value.
pub trait Document: Serialize + DeserializeOwned {
    /// Name of this type's table. Defaults to the bare Rust type name, with
    /// module path and generic arguments stripped, so `a::b::Wrapper<Inner>`
    /// becomes `Wrapper`. Override when two document types share a bare name
    /// or a generic type needs per-instantiation tables.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// The primary identifier of this document.
    fn id(&self) -> &str;
}

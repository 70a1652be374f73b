//! Prefix-based fast rejection of names that cannot be obfuscated identifiers.

/// The pair of prefixes that obfuscated method and field names carry.
///
/// Production builds rename members to identifiers such as `m_1234_` and `f_5678_`. Checking
/// the prefix before consulting the [`crate::mapping::SymbolMap`] keeps constructors, synthetic
/// members and script-authored names away from the table lookup entirely. A name that does not
/// match is always passed through unchanged.
///
/// # Examples
///
/// ```rust
/// use classremap::mapping::NamePrefixPolicy;
///
/// let policy = NamePrefixPolicy::default();
/// assert!(policy.matches_method("m_1234_"));
/// assert!(!policy.matches_method("<init>"));
/// assert!(policy.matches_field("f_5678_"));
/// assert!(!policy.matches_field("m_1234_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePrefixPolicy {
    method: String,
    field: String,
}

impl NamePrefixPolicy {
    /// Create a policy from a method prefix and a field prefix.
    #[must_use]
    pub fn new(method: impl Into<String>, field: impl Into<String>) -> Self {
        NamePrefixPolicy {
            method: method.into(),
            field: field.into(),
        }
    }

    /// Prefix of obfuscated method names.
    #[must_use]
    pub fn method_prefix(&self) -> &str {
        &self.method
    }

    /// Prefix of obfuscated field names.
    #[must_use]
    pub fn field_prefix(&self) -> &str {
        &self.field
    }

    /// Returns `true` if `name` is a candidate obfuscated method name.
    #[must_use]
    pub fn matches_method(&self, name: &str) -> bool {
        name.starts_with(self.method.as_str())
    }

    /// Returns `true` if `name` is a candidate obfuscated field name.
    #[must_use]
    pub fn matches_field(&self, name: &str) -> bool {
        name.starts_with(self.field.as_str())
    }
}

impl Default for NamePrefixPolicy {
    fn default() -> Self {
        NamePrefixPolicy::new("m_", "f_")
    }
}

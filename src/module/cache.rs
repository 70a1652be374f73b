//! Per-compilation store of the class files a module produced.

use std::collections::HashMap;

use log::warn;

use crate::module::ClassFileArtifact;

/// The raw bytes of every artifact of one module compilation, keyed by relative path.
///
/// The cache is filled once when the compiler is about to write the module and cleared when it
/// is done, so sibling classes can be inspected while each artifact is remapped. It has no size
/// bound and no eviction; [`ClassArtifactCache::clear`] is the only way entries leave.
///
/// # Examples
///
/// ```rust
/// use classremap::module::{ClassArtifactCache, ClassFileArtifact};
///
/// let mut cache = ClassArtifactCache::new();
/// cache.populate(&[
///     ClassFileArtifact::new("pkg/A.class", vec![0xCA, 0xFE, 0xBA, 0xBE]),
///     ClassFileArtifact::new("pkg/B.class", vec![0xCA, 0xFE, 0xBA, 0xBE]),
/// ]);
/// assert!(cache.contains("pkg/A.class"));
///
/// cache.clear();
/// assert_eq!(cache.get("pkg/A.class"), None);
/// assert_eq!(cache.get("pkg/B.class"), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ClassArtifactCache {
    entries: HashMap<String, Vec<u8>>,
}

impl ClassArtifactCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        ClassArtifactCache::default()
    }

    /// Insert or replace the bytes stored for `path`.
    pub fn put(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    /// The bytes stored for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Returns `true` if `path` is stored.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Store every artifact of a module, replacing whatever a previous compilation left behind.
    ///
    /// A non-empty cache at this point means the previous compilation never cleaned up. That is
    /// logged and corrected by clearing first, so stale siblings can never leak into this one.
    pub fn populate(&mut self, artifacts: &[ClassFileArtifact]) {
        if !self.entries.is_empty() {
            warn!(
                "Artifact cache still holds {} entries from a previous compilation, clearing",
                self.entries.len()
            );
            self.clear();
        }

        self.entries.reserve(artifacts.len());
        for artifact in artifacts {
            self.put(artifact.relative_path.as_str(), artifact.bytes.as_slice());
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(path, bytes)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(path, bytes)| (path.as_str(), bytes.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites() {
        let mut cache = ClassArtifactCache::new();
        cache.put("pkg/A.class", vec![1]);
        cache.put("pkg/A.class", vec![2]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("pkg/A.class"), Some(&[2u8][..]));
        assert_eq!(cache.get("pkg/B.class"), None);
    }

    #[test]
    fn populate_then_clear() {
        let mut cache = ClassArtifactCache::new();
        cache.populate(&[
            ClassFileArtifact::new("pkg/A.class", vec![1]),
            ClassFileArtifact::new("pkg/B.class", vec![2]),
            ClassFileArtifact::new("META-INF/main.kotlin_module", vec![3]),
        ]);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.iter().count(), 3);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains("pkg/A.class"));
        assert_eq!(cache.get("pkg/B.class"), None);
    }

    #[test]
    fn stale_entries_are_dropped() {
        let mut cache = ClassArtifactCache::new();
        cache.put("old/Leftover.class", vec![0]);

        cache.populate(&[ClassFileArtifact::new("pkg/A.class", vec![1])]);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("old/Leftover.class"));
    }
}

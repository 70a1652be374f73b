//! Construction and validation of [`SymbolMap`] instances.

use std::collections::hash_map::Entry;

use crate::{
    mapping::{SymbolKind, SymbolMap, SymbolTable},
    Error, Result,
};

/// Collects mapping entries and validates them into a [`SymbolMap`].
///
/// The builder accepts entries in any order and defers all checks to [`SymbolMapBuilder::build`],
/// so a mapping data source can stream entries in without handling errors per line.
///
/// # Examples
///
/// ```rust
/// use classremap::mapping::{SymbolKind, SymbolMap};
///
/// let entries = [("m_1234_", "renderTick"), ("m_4321_", "onHit")];
/// let mut builder = SymbolMap::builder();
/// for (obf, deobf) in entries {
///     builder = builder.add(SymbolKind::Method, obf, deobf);
/// }
/// let symbols = builder.build()?;
/// assert_eq!(symbols.method_deobf("m_4321_"), "onHit");
/// # Ok::<(), classremap::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct SymbolMapBuilder {
    entries: Vec<(SymbolKind, String, String)>,
}

impl SymbolMapBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        SymbolMapBuilder::default()
    }

    /// Add an `obfuscated -> deobfuscated` entry of `kind`.
    #[must_use]
    pub fn add(mut self, kind: SymbolKind, obf: impl Into<String>, deobf: impl Into<String>) -> Self {
        self.entries.push((kind, obf.into(), deobf.into()));
        self
    }

    /// Add a method entry.
    #[must_use]
    pub fn method(self, obf: impl Into<String>, deobf: impl Into<String>) -> Self {
        self.add(SymbolKind::Method, obf, deobf)
    }

    /// Add a field entry.
    #[must_use]
    pub fn field(self, obf: impl Into<String>, deobf: impl Into<String>) -> Self {
        self.add(SymbolKind::Field, obf, deobf)
    }

    /// Add a class entry, using internal names (`pkg/Outer$Inner`).
    #[must_use]
    pub fn class(self, obf: impl Into<String>, deobf: impl Into<String>) -> Self {
        self.add(SymbolKind::Class, obf, deobf)
    }

    /// Number of entries collected so far, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the collected entries and build the immutable map.
    ///
    /// Entries mapping a name to itself carry no information and are dropped. Repeating an
    /// identical entry is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingConflict`] if a name is empty or contains a NUL character, if one
    /// obfuscated name maps to two different names, if two obfuscated names map to the same
    /// name, or if a target name is also a source name of the same kind.
    pub fn build(self) -> Result<SymbolMap> {
        let mut methods = SymbolTable::default();
        let mut fields = SymbolTable::default();
        let mut classes = SymbolTable::default();

        for (kind, obf, deobf) in self.entries {
            validate_name(kind, &obf)?;
            validate_name(kind, &deobf)?;
            if obf == deobf {
                continue;
            }

            let table = match kind {
                SymbolKind::Method => &mut methods,
                SymbolKind::Field => &mut fields,
                SymbolKind::Class => &mut classes,
            };
            insert(table, kind, obf, deobf)?;
        }

        for (kind, table) in [
            (SymbolKind::Method, &methods),
            (SymbolKind::Field, &fields),
            (SymbolKind::Class, &classes),
        ] {
            if let Some(chained) = table.deobf.values().find(|v| table.deobf.contains_key(*v)) {
                return Err(Error::MappingConflict(format!(
                    "{kind} '{chained}' is both a mapping target and a mapping source"
                )));
            }
        }

        Ok(SymbolMap::from_tables(methods, fields, classes))
    }
}

fn validate_name(kind: SymbolKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::MappingConflict(format!("empty {kind} name")));
    }
    if name.contains('\0') {
        return Err(Error::MappingConflict(format!(
            "{kind} name '{}' contains NUL",
            name.escape_default()
        )));
    }
    Ok(())
}

fn insert(table: &mut SymbolTable, kind: SymbolKind, obf: String, deobf: String) -> Result<()> {
    match table.deobf.entry(obf.clone()) {
        Entry::Occupied(existing) => {
            if *existing.get() != deobf {
                return Err(Error::MappingConflict(format!(
                    "{kind} '{obf}' maps to both '{}' and '{deobf}'",
                    existing.get()
                )));
            }
            return Ok(());
        }
        Entry::Vacant(slot) => {
            slot.insert(deobf.clone());
        }
    }

    match table.obf.entry(deobf) {
        Entry::Occupied(existing) => Err(Error::MappingConflict(format!(
            "{kind} '{}' is the target of both '{}' and '{obf}'",
            existing.key(),
            existing.get()
        ))),
        Entry::Vacant(slot) => {
            slot.insert(obf);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_identical_entry() {
        let symbols = SymbolMapBuilder::new()
            .method("m_1_", "tick")
            .method("m_1_", "tick")
            .build()
            .unwrap();
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn identity_entry_dropped() {
        let symbols = SymbolMapBuilder::new()
            .field("f_1_", "f_1_")
            .build()
            .unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn source_maps_twice() {
        let result = SymbolMapBuilder::new()
            .method("m_1_", "tick")
            .method("m_1_", "update")
            .build();
        assert!(matches!(result, Err(Error::MappingConflict(_))));
    }

    #[test]
    fn target_shared() {
        let result = SymbolMapBuilder::new()
            .field("f_1_", "speed")
            .field("f_2_", "speed")
            .build();
        assert!(matches!(result, Err(Error::MappingConflict(_))));
    }

    #[test]
    fn chained_entries() {
        let result = SymbolMapBuilder::new()
            .method("m_1_", "m_2_")
            .method("m_2_", "tick")
            .build();
        assert!(matches!(result, Err(Error::MappingConflict(_))));
    }

    #[test]
    fn same_name_different_kinds() {
        let symbols = SymbolMapBuilder::new()
            .method("m_1_", "value")
            .field("f_1_", "value")
            .build()
            .unwrap();
        assert_eq!(symbols.method_obf("value"), "m_1_");
        assert_eq!(symbols.field_obf("value"), "f_1_");
    }

    #[test]
    fn invalid_names() {
        assert!(SymbolMapBuilder::new().method("", "tick").build().is_err());
        assert!(SymbolMapBuilder::new()
            .class("a", "b\0c")
            .build()
            .is_err());
    }
}

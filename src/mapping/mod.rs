//! Obfuscated ⇄ deobfuscated symbol tables.
//!
//! The [`SymbolMap`] is the lookup contract the rest of the crate is written against. It is
//! built once from whatever data source the host uses (see [`SymbolMapBuilder`]), is immutable
//! afterwards, and is shared between compiler threads behind an [`std::sync::Arc`].
//!
//! # Key Components
//!
//! - [`SymbolMap`] - Per-kind bidirectional lookup tables with pass-through on a miss
//! - [`SymbolMapBuilder`] - Collects entries and validates the table invariants
//! - [`SymbolKind`] - Method, field or class
//! - [`NamePrefixPolicy`] - Cheap rejection of names that cannot be obfuscated identifiers
//!
//! # Lookup semantics
//!
//! A lookup never fails. If a name has no entry it is returned as-is: names not covered by the
//! table belong to script or library code and are already correct.
//!
//! ```rust
//! use classremap::mapping::SymbolMap;
//!
//! let symbols = SymbolMap::builder()
//!     .method("m_1234_", "renderTick")
//!     .field("f_5678_", "velocity")
//!     .build()?;
//!
//! assert_eq!(symbols.method_deobf("m_1234_"), "renderTick");
//! assert_eq!(symbols.method_deobf("doStuff"), "doStuff");
//! assert_eq!(symbols.field_obf("velocity"), "f_5678_");
//! # Ok::<(), classremap::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`SymbolMap`] holds plain hash maps and exposes only `&self` lookups, so it is [`Send`] and
//! [`Sync`] and can be read concurrently without synchronization.

mod builder;
mod prefix;

use std::collections::HashMap;

use strum::{Display, EnumCount, EnumIter};

pub use builder::SymbolMapBuilder;
pub use prefix::NamePrefixPolicy;

/// The kind of symbol a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    /// Method names, looked up by simple name
    Method,
    /// Field names, looked up by simple name
    Field,
    /// Internal class names (`pkg/Outer$Inner`)
    Class,
}

/// One direction-pair of lookup tables for a single [`SymbolKind`].
#[derive(Debug, Default, Clone)]
pub(crate) struct SymbolTable {
    /// obfuscated -> deobfuscated
    deobf: HashMap<String, String>,
    /// deobfuscated -> obfuscated
    obf: HashMap<String, String>,
}

impl SymbolTable {
    fn len(&self) -> usize {
        self.deobf.len()
    }
}

/// Immutable bidirectional symbol lookup table.
///
/// Every direction of every kind is a partial injective function; [`SymbolMapBuilder::build`]
/// guarantees this, and additionally that no target name is itself a source name of the same
/// kind, which makes translating a name twice the same as translating it once.
#[derive(Debug, Default, Clone)]
pub struct SymbolMap {
    methods: SymbolTable,
    fields: SymbolTable,
    classes: SymbolTable,
}

impl SymbolMap {
    /// A map without any entries; every lookup is the identity.
    #[must_use]
    pub fn empty() -> Self {
        SymbolMap::default()
    }

    /// Start building a new map.
    #[must_use]
    pub fn builder() -> SymbolMapBuilder {
        SymbolMapBuilder::new()
    }

    pub(crate) fn from_tables(
        methods: SymbolTable,
        fields: SymbolTable,
        classes: SymbolTable,
    ) -> Self {
        SymbolMap {
            methods,
            fields,
            classes,
        }
    }

    fn table(&self, kind: SymbolKind) -> &SymbolTable {
        match kind {
            SymbolKind::Method => &self.methods,
            SymbolKind::Field => &self.fields,
            SymbolKind::Class => &self.classes,
        }
    }

    /// Translate an obfuscated name of `kind` to its deobfuscated form, or return it unchanged.
    #[must_use]
    pub fn deobf<'a>(&'a self, kind: SymbolKind, name: &'a str) -> &'a str {
        self.table(kind)
            .deobf
            .get(name)
            .map_or(name, String::as_str)
    }

    /// Translate a deobfuscated name of `kind` to its obfuscated form, or return it unchanged.
    #[must_use]
    pub fn obf<'a>(&'a self, kind: SymbolKind, name: &'a str) -> &'a str {
        self.table(kind).obf.get(name).map_or(name, String::as_str)
    }

    /// Deobfuscated name of the method `name`, or `name` itself.
    #[must_use]
    pub fn method_deobf<'a>(&'a self, name: &'a str) -> &'a str {
        self.deobf(SymbolKind::Method, name)
    }

    /// Deobfuscated name of the field `name`, or `name` itself.
    #[must_use]
    pub fn field_deobf<'a>(&'a self, name: &'a str) -> &'a str {
        self.deobf(SymbolKind::Field, name)
    }

    /// Deobfuscated internal name of the class `name`, or `name` itself.
    #[must_use]
    pub fn class_deobf<'a>(&'a self, name: &'a str) -> &'a str {
        self.deobf(SymbolKind::Class, name)
    }

    /// Obfuscated name of the method `name`, or `name` itself.
    #[must_use]
    pub fn method_obf<'a>(&'a self, name: &'a str) -> &'a str {
        self.obf(SymbolKind::Method, name)
    }

    /// Obfuscated name of the field `name`, or `name` itself.
    #[must_use]
    pub fn field_obf<'a>(&'a self, name: &'a str) -> &'a str {
        self.obf(SymbolKind::Field, name)
    }

    /// Obfuscated internal name of the class `name`, or `name` itself.
    #[must_use]
    pub fn class_obf<'a>(&'a self, name: &'a str) -> &'a str {
        self.obf(SymbolKind::Class, name)
    }

    /// Number of entries of `kind`.
    #[must_use]
    pub fn len_of(&self, kind: SymbolKind) -> usize {
        self.table(kind).len()
    }

    /// Total number of entries across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len() + self.fields.len() + self.classes.len()
    }

    /// Returns `true` if the map holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Rewriting of the symbolic names inside emitted class files.
//!
//! The [`BytecodeRemapper`] translates every method name, field name and class name a class file
//! refers to through the [`SymbolMap`], and rewrites the descriptors and generic signatures that
//! embed class names so they stay consistent.
//!
//! # Architecture
//!
//! Names only ever live in `CONSTANT_Utf8` entries of the constant pool. Remapping therefore
//! never touches instructions or attribute layouts:
//!
//! 1. The class is parsed and validated completely ([`ClassFile::parse`])
//! 2. Every `CONSTANT_Utf8` is classified by the structures referring to it
//! 3. Each entry gets exactly one replacement; two usages demanding different spellings of the
//!    same entry are a [`crate::Error::RemapConflict`]. A member kept because its class is
//!    compiled in the same module only decides entries no other usage decides
//! 4. The output is spliced together from the untouched input bytes and the new payloads, with
//!    the `u2` length prefix of every rewritten entry updated
//!
//! The constant-pool count, the kind of every entry and every byte outside the rewritten payloads
//! stay the same. Because [`crate::mapping::SymbolMapBuilder`] rejects chained mappings, a
//! translated name never translates again, which makes remapping idempotent.
//!
//! # Key Components
//!
//! - [`BytecodeRemapper`] - Remaps single class files or artifacts
//! - [`RemapReport`] - What a remap pass changed
//! - [`ClassHierarchy`] - Module-local class detection over a [`ClassArtifactCache`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use classremap::prelude::*;
//!
//! let symbols = SymbolMap::builder().field("f_5678_", "velocity").build()?;
//! let config = RemapConfig::production();
//! let remapper = BytecodeRemapper::new(&symbols, &config);
//!
//! let bytes = std::fs::read("Projectile.class")?;
//! let remapped = remapper.remap(&bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod hierarchy;
mod usage;

use std::{borrow::Cow, collections::BTreeMap};

use log::{debug, trace};

pub use hierarchy::ClassHierarchy;

use crate::{
    classfile::{
        descriptor::{nested_name, remap_descriptor, remap_signature},
        mutf8, ClassFile,
    },
    config::{RemapConfig, RemapDirection, RemapScope},
    file::io::push_be,
    mapping::{SymbolKind, SymbolMap},
    module::{ClassArtifactCache, ClassFileArtifact},
    remap::usage::NameUsage,
    Error, Result,
};

/// Summary of one remap pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Internal name of the remapped class, `None` if the class was passed through unparsed
    pub class_name: Option<String>,
    /// Number of `CONSTANT_Utf8` entries whose payload was replaced
    pub rewritten: usize,
}

/// The module an artifact was compiled in.
#[derive(Debug, Clone, Copy)]
struct ModuleContext<'a> {
    cache: &'a ClassArtifactCache,
    hierarchy: &'a ClassHierarchy,
}

/// Remaps the names referenced by class files.
///
/// A remapper only borrows its inputs and is cheap to create, so one can be made per artifact or
/// shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct BytecodeRemapper<'a> {
    symbols: &'a SymbolMap,
    config: &'a RemapConfig,
    module: Option<ModuleContext<'a>>,
}

impl<'a> BytecodeRemapper<'a> {
    /// Create a remapper for standalone class files.
    #[must_use]
    pub fn new(symbols: &'a SymbolMap, config: &'a RemapConfig) -> Self {
        BytecodeRemapper {
            symbols,
            config,
            module: None,
        }
    }

    /// Resolve member owners against the classes compiled in the same module.
    ///
    /// Only has an effect when [`RemapConfig::resolve_module_locals`] is set.
    #[must_use]
    pub fn with_module(mut self, cache: &'a ClassArtifactCache, hierarchy: &'a ClassHierarchy) -> Self {
        self.module = Some(ModuleContext { cache, hierarchy });
        self
    }

    /// Remap one class file.
    ///
    /// In [`crate::config::Environment::Development`] the input is returned unchanged without
    /// being parsed.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`], [`Error::OutOfBounds`] or [`Error::Malformed`] if the input is not a
    ///   well-formed class file
    /// - [`Error::RemapConflict`] if one constant would need two different rewrites
    /// - [`Error::Utf8TooLong`] if a rewritten constant exceeds 65535 bytes
    pub fn remap(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.remap_with_report(data).map(|(bytes, _)| bytes)
    }

    /// Remap one class file and report what changed.
    ///
    /// # Errors
    /// Same as [`BytecodeRemapper::remap`].
    pub fn remap_with_report(&self, data: &[u8]) -> Result<(Vec<u8>, RemapReport)> {
        if !self.config.environment.is_production() {
            return Ok((data.to_vec(), RemapReport::default()));
        }

        let class = ClassFile::parse(data)?;
        let class_name = class.this_class_name()?.into_owned();
        let rewrites = self.plan(&class)?;

        let report = RemapReport {
            class_name: Some(class_name),
            rewritten: rewrites.len(),
        };
        if rewrites.is_empty() {
            return Ok((data.to_vec(), report));
        }
        Ok((splice(&class, &rewrites)?, report))
    }

    /// Remap an artifact if its path names a class file, otherwise return its bytes unchanged.
    ///
    /// # Errors
    /// Same as [`BytecodeRemapper::remap`], for class-file artifacts only.
    pub fn remap_artifact(&self, artifact: &ClassFileArtifact) -> Result<Vec<u8>> {
        if !self.config.environment.is_production()
            || !self.config.is_class_path(&artifact.relative_path)
        {
            return Ok(artifact.bytes.clone());
        }

        let (bytes, report) = self.remap_with_report(&artifact.bytes)?;
        debug!(
            "Remapped '{}': {} constants rewritten, {} -> {} bytes",
            artifact.relative_path,
            report.rewritten,
            artifact.bytes.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Decide the new payload of every `CONSTANT_Utf8` that changes.
    fn plan(&self, class: &ClassFile<'_>) -> Result<BTreeMap<u16, String>> {
        let translator = Translator {
            symbols: self.symbols,
            config: self.config,
            module: self.module.filter(|_| self.config.resolve_module_locals),
        };
        let mut rewrites = BTreeMap::new();

        for (index, usages) in usage::collect(class)? {
            let original = class.pool.utf8_str(index)?;
            let mut chosen: Option<Cow<'_, str>> = None;
            let mut kept_local = false;

            for usage in usages {
                let candidate = match translator.translate(class, &original, usage)? {
                    Translation::Keep => Cow::Borrowed(original.as_ref()),
                    Translation::Rename(renamed) => Cow::Owned(renamed),
                    // Only decides the entry when no other usage does
                    Translation::KeepLocal => {
                        kept_local = true;
                        continue;
                    }
                };
                match &chosen {
                    Some(first) if *first != candidate => {
                        return Err(Error::RemapConflict {
                            index,
                            first: first.to_string(),
                            second: candidate.into_owned(),
                        });
                    }
                    Some(_) => {}
                    None => chosen = Some(candidate),
                }
            }

            if let Some(renamed) = chosen.filter(|renamed| *renamed != original) {
                if kept_local {
                    debug!(
                        "#{index}: '{original}' is shared with a runtime reference, \
                         module-local usages follow it to '{renamed}'"
                    );
                }
                trace!("#{index}: '{original}' -> '{renamed}'");
                rewrites.insert(index, renamed.into_owned());
            }
        }

        Ok(rewrites)
    }
}

/// What one usage of a `CONSTANT_Utf8` asks its payload to become.
#[derive(Debug, PartialEq, Eq)]
enum Translation {
    /// Stays as it is
    Keep,
    /// Becomes the given name
    Rename(String),
    /// Mapped, but the member belongs to a class compiled in the same module
    KeepLocal,
}

impl From<Option<String>> for Translation {
    fn from(renamed: Option<String>) -> Self {
        renamed.map_or(Translation::Keep, Translation::Rename)
    }
}

/// Applies the [`SymbolMap`] to one name according to the configuration.
struct Translator<'a> {
    symbols: &'a SymbolMap,
    config: &'a RemapConfig,
    module: Option<ModuleContext<'a>>,
}

impl Translator<'_> {
    fn translate(
        &self,
        class: &ClassFile<'_>,
        name: &str,
        usage: NameUsage,
    ) -> Result<Translation> {
        let renamed = match usage {
            NameUsage::Member { kind, owner } => {
                let owner = owner.map(|index| class.pool.class_name(index)).transpose()?;
                return Ok(self.member(kind, name, owner.as_deref()));
            }
            NameUsage::Class if name.starts_with('[') => self.descriptor(name)?,
            NameUsage::Class => self.class(name),
            NameUsage::Descriptor => self.descriptor(name)?,
            NameUsage::Signature => self.signature(name)?,
            NameUsage::InnerName {
                inner_class,
                outer_class,
            } => self.inner_name(class, name, inner_class, outer_class)?,
        };
        Ok(renamed.into())
    }

    fn lookup<'n>(&'n self, kind: SymbolKind, name: &'n str) -> &'n str {
        match self.config.direction {
            RemapDirection::Deobfuscate => self.symbols.deobf(kind, name),
            RemapDirection::Obfuscate => self.symbols.obf(kind, name),
        }
    }

    fn class(&self, name: &str) -> Option<String> {
        if !self.config.scope.contains(RemapScope::CLASSES) {
            return None;
        }
        let mapped = self.lookup(SymbolKind::Class, name);
        (mapped != name).then(|| mapped.to_string())
    }

    fn member(&self, kind: SymbolKind, name: &str, owner: Option<&str>) -> Translation {
        let (flag, prefix_matches) = match kind {
            SymbolKind::Method => (
                RemapScope::METHODS,
                self.config.prefixes.matches_method(name),
            ),
            SymbolKind::Field => (RemapScope::FIELDS, self.config.prefixes.matches_field(name)),
            SymbolKind::Class => return self.class(name).into(),
        };
        // <init> and <clinit> are fixed by the JVM
        if !self.config.scope.contains(flag) || name.starts_with('<') {
            return Translation::Keep;
        }
        // Obfuscated names are recognised by prefix; deobfuscated ones carry none
        if self.config.direction == RemapDirection::Deobfuscate && !prefix_matches {
            return Translation::Keep;
        }

        let mapped = self.lookup(kind, name);
        if mapped == name {
            return Translation::Keep;
        }
        if let (Some(module), Some(owner)) = (self.module, owner) {
            if module.hierarchy.is_module_local(module.cache, owner) {
                trace!("Keeping {kind} '{name}' of module-local class '{owner}'");
                return Translation::KeepLocal;
            }
        }
        Translation::Rename(mapped.to_string())
    }

    /// The simple name of a nested class follows the renamed binary name.
    fn inner_name(
        &self,
        class: &ClassFile<'_>,
        name: &str,
        inner_class: u16,
        outer_class: u16,
    ) -> Result<Option<String>> {
        let inner = class.pool.class_name(inner_class)?;
        let Some(inner_renamed) = self.class(&inner) else {
            return Ok(None);
        };
        let outer_renamed = if outer_class == 0 {
            None
        } else {
            let outer = class.pool.class_name(outer_class)?;
            Some(self.class(&outer).unwrap_or_else(|| outer.into_owned()))
        };

        Ok(nested_name(&inner_renamed, outer_renamed.as_deref())
            .filter(|simple| *simple != name)
            .map(str::to_string))
    }

    fn descriptor(&self, descriptor: &str) -> Result<Option<String>> {
        if !self.config.scope.contains(RemapScope::CLASSES) {
            return Ok(None);
        }
        remap_descriptor(descriptor, |name| self.class(name))
    }

    fn signature(&self, signature: &str) -> Result<Option<String>> {
        if !self
            .config
            .scope
            .contains(RemapScope::CLASSES | RemapScope::SIGNATURES)
        {
            return Ok(None);
        }
        remap_signature(signature, |name| self.class(name))
    }
}

/// Copy `class.data`, replacing the payload of every rewritten `CONSTANT_Utf8`.
fn splice(class: &ClassFile<'_>, rewrites: &BTreeMap<u16, String>) -> Result<Vec<u8>> {
    let mut edits = Vec::with_capacity(rewrites.len());
    for (&index, value) in rewrites {
        let encoded = mutf8::encode(value);
        let Ok(len) = u16::try_from(encoded.len()) else {
            return Err(Error::Utf8TooLong {
                index,
                len: encoded.len(),
            });
        };
        let offset = class.pool.utf8_offset(index)?;
        let old_len = class.pool.utf8(index)?.len();
        edits.push((offset, old_len, len, encoded));
    }
    edits.sort_by_key(|(offset, ..)| *offset);

    let data = class.data;
    let grown: usize = edits.iter().map(|(.., encoded)| encoded.len()).sum();
    let mut out = Vec::with_capacity(data.len() + grown);
    let mut cursor = 0;
    for (offset, old_len, len, encoded) in edits {
        // tag byte stays, u2 length and payload are replaced
        out.extend_from_slice(&data[cursor..=offset]);
        push_be(&mut out, len);
        out.extend_from_slice(&encoded);
        cursor = offset + 3 + old_len;
    }
    out.extend_from_slice(&data[cursor..]);
    Ok(out)
}

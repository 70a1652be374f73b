//! Supertype resolution across the classes of one compiled module.

use std::collections::HashSet;

use dashmap::DashMap;
use log::warn;

use crate::{classfile::ClassFile, module::ClassArtifactCache};

/// The root of every class hierarchy.
const OBJECT: &str = "java/lang/Object";

/// Direct supertypes of one class compiled in the module.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassHeader {
    super_name: Option<String>,
    interfaces: Vec<String>,
}

/// Answers whether a class belongs entirely to the module being compiled.
///
/// A class is *module-local* when it was compiled in the current module and its superclass and
/// superinterfaces are, transitively, module-local as well or `java/lang/Object`. Members of such
/// a class can neither override nor be inherited from the obfuscated runtime, so their names are
/// never remapped, even if they happen to appear in the mapping table.
///
/// Headers are read lazily from the module's [`ClassArtifactCache`] and memoized in [`DashMap`]s,
/// so one hierarchy can be shared by all threads remapping the module.
#[derive(Debug)]
pub struct ClassHierarchy {
    class_extension: String,
    headers: DashMap<String, Option<ClassHeader>>,
    local: DashMap<String, bool>,
}

impl ClassHierarchy {
    /// Create an empty hierarchy for artifacts whose paths end in `class_extension`.
    #[must_use]
    pub fn new(class_extension: impl Into<String>) -> Self {
        ClassHierarchy {
            class_extension: class_extension.into(),
            headers: DashMap::new(),
            local: DashMap::new(),
        }
    }

    /// Returns `true` if `class_name` and all of its supertypes were compiled in the module.
    pub fn is_module_local(&self, cache: &ClassArtifactCache, class_name: &str) -> bool {
        let mut visiting = HashSet::new();
        self.resolve(cache, class_name, &mut visiting)
    }

    /// Forget everything resolved so far.
    pub fn clear(&self) {
        self.headers.clear();
        self.local.clear();
    }

    /// Number of classes whose header has been looked up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if nothing has been looked up yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn resolve(
        &self,
        cache: &ClassArtifactCache,
        class_name: &str,
        visiting: &mut HashSet<String>,
    ) -> bool {
        if let Some(known) = self.local.get(class_name) {
            return *known;
        }
        // A cycle is rejected by the JVM at load time; it never leaves the module
        if !visiting.insert(class_name.to_string()) {
            return true;
        }

        let local = match self.header(cache, class_name) {
            None => false,
            Some(header) => header
                .super_name
                .iter()
                .chain(header.interfaces.iter())
                .all(|super_name| {
                    super_name == OBJECT || self.resolve(cache, super_name, visiting)
                }),
        };

        self.local.insert(class_name.to_string(), local);
        local
    }

    fn header(&self, cache: &ClassArtifactCache, class_name: &str) -> Option<ClassHeader> {
        if let Some(header) = self.headers.get(class_name) {
            return header.value().clone();
        }

        let path = format!("{class_name}{}", self.class_extension);
        let header = cache.get(&path).and_then(|bytes| match read_header(bytes) {
            Ok(header) => Some(header),
            Err(error) => {
                warn!("Cannot index sibling class '{path}': {error}");
                None
            }
        });

        self.headers.insert(class_name.to_string(), header.clone());
        header
    }
}

fn read_header(bytes: &[u8]) -> crate::Result<ClassHeader> {
    let class = ClassFile::parse(bytes)?;
    Ok(ClassHeader {
        super_name: class.super_class_name()?.map(|name| name.into_owned()),
        interfaces: class
            .interface_names()?
            .into_iter()
            .map(|name| name.into_owned())
            .collect(),
    })
}

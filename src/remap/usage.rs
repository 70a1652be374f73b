//! Classification of `CONSTANT_Utf8` entries by the role they play in a class file.

use std::collections::BTreeMap;

use crate::{
    classfile::{constant::Constant, ClassFile},
    mapping::SymbolKind,
    Result,
};

/// How a `CONSTANT_Utf8` entry is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameUsage {
    /// Simple name of a method or field; `owner` is the `CONSTANT_Class` index of the declaring
    /// class when it is known
    Member { kind: SymbolKind, owner: Option<u16> },
    /// Name of a `CONSTANT_Class`, either an internal name or an array descriptor
    Class,
    /// Field or method descriptor
    Descriptor,
    /// Generic signature
    Signature,
    /// Simple name of a nested class in `InnerClasses`, derived from the binary name of
    /// `inner_class` and, when non-zero, `outer_class`
    InnerName { inner_class: u16, outer_class: u16 },
}

/// All name-bearing `CONSTANT_Utf8` entries of `class`, keyed by pool index.
///
/// Entries that no structure uses as a name (string literals, attribute names, constant values)
/// are not included and are never rewritten.
pub(crate) fn collect(class: &ClassFile<'_>) -> Result<BTreeMap<u16, Vec<NameUsage>>> {
    let mut usages = Usages::default();
    let pool = &class.pool;

    for (_, constant) in pool.iter() {
        match *constant {
            Constant::Class { name_index } => usages.add(name_index, NameUsage::Class),
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            } => usages.member(class, SymbolKind::Field, Some(class_index), name_and_type_index)?,
            Constant::Methodref {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => usages.member(class, SymbolKind::Method, Some(class_index), name_and_type_index)?,
            // The call-site name is the functional interface method a lambda implements
            Constant::InvokeDynamic {
                name_and_type_index,
                ..
            } => usages.member(class, SymbolKind::Method, None, name_and_type_index)?,
            Constant::Dynamic {
                name_and_type_index,
                ..
            } => {
                let (_, descriptor_index) = pool.name_and_type(name_and_type_index)?;
                usages.add(descriptor_index, NameUsage::Descriptor);
            }
            Constant::MethodType { descriptor_index } => {
                usages.add(descriptor_index, NameUsage::Descriptor);
            }
            _ => {}
        }
    }

    let this_class = Some(class.this_class);
    for field in class.fields.iter().chain(&class.record_components) {
        usages.add(
            field.name_index,
            NameUsage::Member {
                kind: SymbolKind::Field,
                owner: this_class,
            },
        );
        usages.add(field.descriptor_index, NameUsage::Descriptor);
    }
    for method in &class.methods {
        usages.add(
            method.name_index,
            NameUsage::Member {
                kind: SymbolKind::Method,
                owner: this_class,
            },
        );
        usages.add(method.descriptor_index, NameUsage::Descriptor);
    }

    if let Some((class_index, method_index)) = class.enclosing_method {
        if method_index != 0 {
            usages.member(class, SymbolKind::Method, Some(class_index), method_index)?;
        }
    }

    for &index in &class.descriptors {
        usages.add(index, NameUsage::Descriptor);
    }
    for &index in &class.signatures {
        usages.add(index, NameUsage::Signature);
    }
    for entry in &class.inner_classes {
        usages.add(
            entry.inner_name,
            NameUsage::InnerName {
                inner_class: entry.inner_class,
                outer_class: entry.outer_class,
            },
        );
    }

    Ok(usages.by_index)
}

#[derive(Default)]
struct Usages {
    by_index: BTreeMap<u16, Vec<NameUsage>>,
}

impl Usages {
    fn add(&mut self, index: u16, usage: NameUsage) {
        let entry = self.by_index.entry(index).or_default();
        if !entry.contains(&usage) {
            entry.push(usage);
        }
    }

    fn member(
        &mut self,
        class: &ClassFile<'_>,
        kind: SymbolKind,
        owner: Option<u16>,
        name_and_type_index: u16,
    ) -> Result<()> {
        let (name_index, descriptor_index) = class.pool.name_and_type(name_and_type_index)?;
        self.add(name_index, NameUsage::Member { kind, owner });
        self.add(descriptor_index, NameUsage::Descriptor);
        Ok(())
    }
}

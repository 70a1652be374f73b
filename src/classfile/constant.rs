//! The class-file constant pool.
//!
//! The constant pool is the class file's table of literals and symbolic references and the only
//! place names are stored: every class, method and field reference elsewhere in the file is an
//! index into it. [`ConstantPool`] decodes all entry kinds defined up to Java 21, remembers the
//! byte offset of every `CONSTANT_Utf8` entry so the remapper can splice new payloads in place,
//! and validates that every cross-reference points at an entry of the right kind.
//!
//! # Reference
//! - JVMS §4.4 The Constant Pool

use std::borrow::Cow;

use strum::{Display, EnumCount, EnumIter, FromRepr};

use crate::{classfile::mutf8, file::parser::Parser, Result};

/// Tag byte identifying the kind of a constant-pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, FromRepr)]
#[repr(u8)]
pub enum ConstantTag {
    /// `CONSTANT_Utf8`
    Utf8 = 1,
    /// `CONSTANT_Integer`
    Integer = 3,
    /// `CONSTANT_Float`
    Float = 4,
    /// `CONSTANT_Long`, occupies two slots
    Long = 5,
    /// `CONSTANT_Double`, occupies two slots
    Double = 6,
    /// `CONSTANT_Class`
    Class = 7,
    /// `CONSTANT_String`
    String = 8,
    /// `CONSTANT_Fieldref`
    Fieldref = 9,
    /// `CONSTANT_Methodref`
    Methodref = 10,
    /// `CONSTANT_InterfaceMethodref`
    InterfaceMethodref = 11,
    /// `CONSTANT_NameAndType`
    NameAndType = 12,
    /// `CONSTANT_MethodHandle`
    MethodHandle = 15,
    /// `CONSTANT_MethodType`
    MethodType = 16,
    /// `CONSTANT_Dynamic`
    Dynamic = 17,
    /// `CONSTANT_InvokeDynamic`
    InvokeDynamic = 18,
    /// `CONSTANT_Module`
    Module = 19,
    /// `CONSTANT_Package`
    Package = 20,
}

/// A decoded constant-pool entry.
///
/// Index fields refer to other entries of the same pool and are 1-based like the class file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Constant<'a> {
    /// Modified UTF-8 payload; `offset` is the position of the tag byte in the class file.
    Utf8 { offset: usize, bytes: &'a [u8] },
    Integer(i32),
    /// Raw IEEE 754 bits
    Float(u32),
    Long(i64),
    /// Raw IEEE 754 bits
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl Constant<'_> {
    /// The tag of this entry.
    #[must_use]
    pub fn tag(&self) -> ConstantTag {
        match self {
            Constant::Utf8 { .. } => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class { .. } => ConstantTag::Class,
            Constant::String { .. } => ConstantTag::String,
            Constant::Fieldref { .. } => ConstantTag::Fieldref,
            Constant::Methodref { .. } => ConstantTag::Methodref,
            Constant::InterfaceMethodref { .. } => ConstantTag::InterfaceMethodref,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType { .. } => ConstantTag::MethodType,
            Constant::Dynamic { .. } => ConstantTag::Dynamic,
            Constant::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
            Constant::Module { .. } => ConstantTag::Module,
            Constant::Package { .. } => ConstantTag::Package,
        }
    }
}

/// The decoded constant pool of one class file.
///
/// Slot 0 and the second slot of every `Long`/`Double` are unusable and stored as `None`, so
/// [`ConstantPool::get`] can be indexed with raw class-file indices.
#[derive(Debug, Clone)]
pub struct ConstantPool<'a> {
    entries: Vec<Option<Constant<'a>>>,
}

impl<'a> ConstantPool<'a> {
    /// Parse `constant_pool_count` and all entries, then validate cross-references.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for an empty pool, an unknown tag, an eight-byte
    /// constant in the last slot, an invalid method-handle kind or a reference to an entry of
    /// the wrong kind, and [`crate::Error::OutOfBounds`] if the pool is truncated.
    pub fn parse(parser: &mut Parser<'a>) -> Result<Self> {
        let count = parser.read_be::<u16>()?;
        if count == 0 {
            return Err(malformed_error!("constant_pool_count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(None);

        while entries.len() < usize::from(count) {
            let offset = parser.pos();
            let raw_tag = parser.read_be::<u8>()?;
            let Some(tag) = ConstantTag::from_repr(raw_tag) else {
                return Err(malformed_error!(
                    "Unknown constant tag {} at entry #{}",
                    raw_tag,
                    entries.len()
                ));
            };

            let constant = match tag {
                ConstantTag::Utf8 => {
                    let len = parser.read_be::<u16>()?;
                    Constant::Utf8 {
                        offset,
                        bytes: parser.read_bytes(usize::from(len))?,
                    }
                }
                ConstantTag::Integer => Constant::Integer(parser.read_be()?),
                ConstantTag::Float => Constant::Float(parser.read_be()?),
                ConstantTag::Long => Constant::Long(parser.read_be()?),
                ConstantTag::Double => Constant::Double(parser.read_be()?),
                ConstantTag::Class => Constant::Class {
                    name_index: parser.read_be()?,
                },
                ConstantTag::String => Constant::String {
                    string_index: parser.read_be()?,
                },
                ConstantTag::Fieldref => Constant::Fieldref {
                    class_index: parser.read_be()?,
                    name_and_type_index: parser.read_be()?,
                },
                ConstantTag::Methodref => Constant::Methodref {
                    class_index: parser.read_be()?,
                    name_and_type_index: parser.read_be()?,
                },
                ConstantTag::InterfaceMethodref => Constant::InterfaceMethodref {
                    class_index: parser.read_be()?,
                    name_and_type_index: parser.read_be()?,
                },
                ConstantTag::NameAndType => Constant::NameAndType {
                    name_index: parser.read_be()?,
                    descriptor_index: parser.read_be()?,
                },
                ConstantTag::MethodHandle => Constant::MethodHandle {
                    reference_kind: parser.read_be()?,
                    reference_index: parser.read_be()?,
                },
                ConstantTag::MethodType => Constant::MethodType {
                    descriptor_index: parser.read_be()?,
                },
                ConstantTag::Dynamic => Constant::Dynamic {
                    bootstrap_method_attr_index: parser.read_be()?,
                    name_and_type_index: parser.read_be()?,
                },
                ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: parser.read_be()?,
                    name_and_type_index: parser.read_be()?,
                },
                ConstantTag::Module => Constant::Module {
                    name_index: parser.read_be()?,
                },
                ConstantTag::Package => Constant::Package {
                    name_index: parser.read_be()?,
                },
            };

            entries.push(Some(constant));
            if matches!(tag, ConstantTag::Long | ConstantTag::Double) {
                if entries.len() >= usize::from(count) {
                    return Err(malformed_error!(
                        "Eight-byte constant occupies the last constant pool slot"
                    ));
                }
                entries.push(None);
            }
        }

        let pool = ConstantPool { entries };
        pool.validate()?;
        Ok(pool)
    }

    /// `constant_pool_count` as stored in the class file (number of slots, including slot 0).
    #[must_use]
    pub fn count(&self) -> u16 {
        // parse() never creates more than u16::MAX slots
        u16::try_from(self.entries.len()).unwrap_or(u16::MAX)
    }

    /// The entry at `index`, or `None` for slot 0, unusable slots and out-of-range indices.
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant<'a>> {
        self.entries.get(usize::from(index)).and_then(Option::as_ref)
    }

    /// Iterate over `(index, entry)` for every usable slot, in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant<'a>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| Some((u16::try_from(index).ok()?, entry.as_ref()?)))
    }

    /// The tags of all usable slots, in pool order.
    #[must_use]
    pub fn tags(&self) -> Vec<ConstantTag> {
        self.iter().map(|(_, constant)| constant.tag()).collect()
    }

    /// The raw modified UTF-8 payload of the `CONSTANT_Utf8` at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_Utf8`.
    pub fn utf8(&self, index: u16) -> Result<&'a [u8]> {
        match self.get(index) {
            Some(Constant::Utf8 { bytes, .. }) => Ok(bytes),
            _ => Err(malformed_error!("Constant #{} is not a Utf8 entry", index)),
        }
    }

    /// The decoded string of the `CONSTANT_Utf8` at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_Utf8` or the
    /// payload is not valid modified UTF-8.
    pub fn utf8_str(&self, index: u16) -> Result<Cow<'a, str>> {
        mutf8::decode(self.utf8(index)?)
    }

    /// Offset of the tag byte of the `CONSTANT_Utf8` at `index` within the class file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_Utf8`.
    pub fn utf8_offset(&self, index: u16) -> Result<usize> {
        match self.get(index) {
            Some(Constant::Utf8 { offset, .. }) => Ok(*offset),
            _ => Err(malformed_error!("Constant #{} is not a Utf8 entry", index)),
        }
    }

    /// The name index of the `CONSTANT_Class` at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_Class`.
    pub fn class_name_index(&self, index: u16) -> Result<u16> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => Ok(*name_index),
            _ => Err(malformed_error!("Constant #{} is not a Class entry", index)),
        }
    }

    /// The decoded internal name of the `CONSTANT_Class` at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_Class` or the
    /// name is not valid modified UTF-8.
    pub fn class_name(&self, index: u16) -> Result<Cow<'a, str>> {
        self.utf8_str(self.class_name_index(index)?)
    }

    /// The `(name_index, descriptor_index)` pair of the `CONSTANT_NameAndType` at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `CONSTANT_NameAndType`.
    pub fn name_and_type(&self, index: u16) -> Result<(u16, u16)> {
        match self.get(index) {
            Some(Constant::NameAndType {
                name_index,
                descriptor_index,
            }) => Ok((*name_index, *descriptor_index)),
            _ => Err(malformed_error!(
                "Constant #{} is not a NameAndType entry",
                index
            )),
        }
    }

    fn expect_tag(&self, from: u16, index: u16, allowed: &[ConstantTag]) -> Result<()> {
        match self.get(index) {
            Some(constant) if allowed.contains(&constant.tag()) => Ok(()),
            Some(constant) => Err(malformed_error!(
                "Constant #{} references #{} of kind {}, expected {:?}",
                from,
                index,
                constant.tag(),
                allowed
            )),
            None => Err(malformed_error!(
                "Constant #{} references invalid slot #{}",
                from,
                index
            )),
        }
    }

    fn validate(&self) -> Result<()> {
        use ConstantTag as T;

        for (index, constant) in self.iter() {
            match *constant {
                Constant::Utf8 { .. }
                | Constant::Integer(_)
                | Constant::Float(_)
                | Constant::Long(_)
                | Constant::Double(_) => {}
                Constant::Class { name_index }
                | Constant::Module { name_index }
                | Constant::Package { name_index } => {
                    self.expect_tag(index, name_index, &[T::Utf8])?;
                }
                Constant::String { string_index } => {
                    self.expect_tag(index, string_index, &[T::Utf8])?;
                }
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    self.expect_tag(index, class_index, &[T::Class])?;
                    self.expect_tag(index, name_and_type_index, &[T::NameAndType])?;
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.expect_tag(index, name_index, &[T::Utf8])?;
                    self.expect_tag(index, descriptor_index, &[T::Utf8])?;
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => match reference_kind {
                    1..=4 => self.expect_tag(index, reference_index, &[T::Fieldref])?,
                    5 | 8 => self.expect_tag(index, reference_index, &[T::Methodref])?,
                    6 | 7 => self.expect_tag(
                        index,
                        reference_index,
                        &[T::Methodref, T::InterfaceMethodref],
                    )?,
                    9 => self.expect_tag(index, reference_index, &[T::InterfaceMethodref])?,
                    _ => {
                        return Err(malformed_error!(
                            "Constant #{} has invalid method handle kind {}",
                            index,
                            reference_kind
                        ))
                    }
                },
                Constant::MethodType { descriptor_index } => {
                    self.expect_tag(index, descriptor_index, &[T::Utf8])?;
                }
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => {
                    self.expect_tag(index, name_and_type_index, &[T::NameAndType])?;
                }
            }
        }

        Ok(())
    }
}

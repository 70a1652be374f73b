//! JVM class-file reader.
//!
//! [`ClassFile::parse`] validates a class file end to end and records where its names live, without
//! copying anything: the constant pool borrows the input bytes and every other section is reduced to
//! the constant-pool indices that the remapper needs. The reader is strict. A class is either fully
//! understood or rejected with [`crate::Error::Malformed`], which is what allows the remapper to
//! guarantee that it never emits a partially rewritten class.
//!
//! # Key Components
//!
//! - [`ClassFile`] - Header, constant pool, members and the name-bearing attribute references
//! - [`constant::ConstantPool`] - Decoded constant pool with `CONSTANT_Utf8` byte offsets
//! - [`descriptor`] - Class-name rewriting inside descriptors and generic signatures
//! - [`mutf8`] - Modified UTF-8 codec
//!
//! # Examples
//!
//! ```rust,no_run
//! use classremap::classfile::ClassFile;
//!
//! let bytes = std::fs::read("Entity.class")?;
//! let class = ClassFile::parse(&bytes)?;
//! println!("{} extends {:?}", class.this_class_name()?, class.super_class_name()?);
//! for method in &class.methods {
//!     println!("  {}{}", class.pool.utf8_str(method.name_index)?, class.pool.utf8_str(method.descriptor_index)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reference
//! - JVMS §4 The class File Format

mod attributes;
pub mod constant;
pub mod descriptor;
pub mod mutf8;

use std::borrow::Cow;

pub use attributes::AttributeSite;

use crate::{
    classfile::{
        attributes::{parse_attributes, AttributeRefs},
        constant::ConstantPool,
    },
    file::parser::Parser,
    Error, Result,
};

/// The four bytes every class file starts with.
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Oldest class-file major version (JDK 1.0.2).
const MIN_MAJOR_VERSION: u16 = 45;

/// A field, method or record component declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags; `0` for record components, which have none
    pub access_flags: u16,
    /// `CONSTANT_Utf8` index of the simple name
    pub name_index: u16,
    /// `CONSTANT_Utf8` index of the descriptor
    pub descriptor_index: u16,
}

impl MemberInfo {
    /// Read `[access_flags] name_index descriptor_index`, validating both indices.
    pub(crate) fn parse_header(
        parser: &mut Parser<'_>,
        pool: &ConstantPool<'_>,
        access_flags: Option<u16>,
    ) -> Result<Self> {
        let name_index = parser.read_be::<u16>()?;
        let descriptor_index = parser.read_be::<u16>()?;
        pool.utf8(name_index)?;
        pool.utf8(descriptor_index)?;

        Ok(MemberInfo {
            access_flags: access_flags.unwrap_or(0),
            name_index,
            descriptor_index,
        })
    }

    fn parse(
        parser: &mut Parser<'_>,
        pool: &ConstantPool<'_>,
        site: AttributeSite,
        refs: &mut AttributeRefs,
    ) -> Result<Self> {
        let access_flags = parser.read_be::<u16>()?;
        let member = MemberInfo::parse_header(parser, pool, Some(access_flags))?;
        parse_attributes(parser, pool, site, refs)?;
        Ok(member)
    }
}

/// A named entry of the `InnerClasses` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerClass {
    /// `CONSTANT_Class` index of the nested class
    pub inner_class: u16,
    /// `CONSTANT_Class` index of the enclosing class, `0` for local and anonymous classes
    pub outer_class: u16,
    /// `CONSTANT_Utf8` index of the simple name as written in source
    pub inner_name: u16,
}

/// A parsed and validated class file.
#[derive(Debug, Clone)]
pub struct ClassFile<'a> {
    /// The complete input the class was parsed from
    pub data: &'a [u8],
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// The constant pool
    pub pool: ConstantPool<'a>,
    /// Class access flags
    pub access_flags: u16,
    /// `CONSTANT_Class` index of this class
    pub this_class: u16,
    /// `CONSTANT_Class` index of the superclass, `0` only for `java/lang/Object`
    pub super_class: u16,
    /// `CONSTANT_Class` indices of the direct superinterfaces
    pub interfaces: Vec<u16>,
    /// Declared fields
    pub fields: Vec<MemberInfo>,
    /// Declared methods
    pub methods: Vec<MemberInfo>,
    /// Components of the `Record` attribute
    pub record_components: Vec<MemberInfo>,
    /// `CONSTANT_Utf8` indices holding generic signatures
    pub signatures: Vec<u16>,
    /// `CONSTANT_Utf8` indices holding descriptors referenced from attributes
    pub descriptors: Vec<u16>,
    /// `(class_index, method_index)` of the `EnclosingMethod` attribute; `method_index` may be `0`
    pub enclosing_method: Option<(u16, u16)>,
    /// Named entries of the `InnerClasses` attribute; anonymous classes have no name to rewrite
    pub inner_classes: Vec<InnerClass>,
}

impl<'a> ClassFile<'a> {
    /// Parse and validate a complete class file.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`] for a zero-length input
    /// - [`Error::OutOfBounds`] if the input is truncated
    /// - [`Error::Malformed`] for a wrong magic number, an unsupported version, any invalid
    ///   constant-pool reference, an attribute whose content disagrees with its length, or bytes
    ///   after the last class attribute
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);
        let magic = parser.read_be::<u32>()?;
        if magic != CLASS_MAGIC {
            return Err(malformed_error!("Invalid class-file magic 0x{:08X}", magic));
        }

        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        if major_version < MIN_MAJOR_VERSION {
            return Err(malformed_error!(
                "Unsupported class-file version {}.{}",
                major_version,
                minor_version
            ));
        }

        let pool = ConstantPool::parse(&mut parser)?;

        let access_flags = parser.read_be::<u16>()?;
        let this_class = parser.read_be::<u16>()?;
        pool.class_name_index(this_class)?;
        let super_class = parser.read_be::<u16>()?;
        if super_class != 0 {
            pool.class_name_index(super_class)?;
        }

        let interface_count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            let interface = parser.read_be::<u16>()?;
            pool.class_name_index(interface)?;
            interfaces.push(interface);
        }

        let mut refs = AttributeRefs::default();

        let field_count = parser.read_be::<u16>()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            fields.push(MemberInfo::parse(
                &mut parser,
                &pool,
                AttributeSite::Field,
                &mut refs,
            )?);
        }

        let method_count = parser.read_be::<u16>()?;
        let mut methods = Vec::with_capacity(usize::from(method_count));
        for _ in 0..method_count {
            methods.push(MemberInfo::parse(
                &mut parser,
                &pool,
                AttributeSite::Method,
                &mut refs,
            )?);
        }

        parse_attributes(&mut parser, &pool, AttributeSite::Class, &mut refs)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} bytes trailing the class file",
                parser.len() - parser.pos()
            ));
        }

        Ok(ClassFile {
            data,
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            record_components: refs.record_components,
            signatures: refs.signatures,
            descriptors: refs.descriptors,
            enclosing_method: refs.enclosing_method,
            inner_classes: refs.inner_classes,
        })
    }

    /// Internal name of this class.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the name is not valid modified UTF-8.
    pub fn this_class_name(&self) -> Result<Cow<'a, str>> {
        self.pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, `None` for `java/lang/Object`.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the name is not valid modified UTF-8.
    pub fn super_class_name(&self) -> Result<Option<Cow<'a, str>>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.pool.class_name(self.super_class).map(Some)
    }

    /// Internal names of the direct superinterfaces.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if a name is not valid modified UTF-8.
    pub fn interface_names(&self) -> Result<Vec<Cow<'a, str>>> {
        self.interfaces
            .iter()
            .map(|&index| self.pool.class_name(index))
            .collect()
    }
}

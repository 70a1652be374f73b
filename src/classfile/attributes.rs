//! Attribute tables.
//!
//! Most attributes are opaque to the remapper and copied through byte for byte. The ones parsed
//! here are those that point at `CONSTANT_Utf8` entries whose content follows from a class or
//! member name: descriptors, generic signatures, record components, the enclosing method and the
//! simple names of nested classes. Every attribute is parsed inside a window of its declared
//! length, so an attribute whose content disagrees with its length is rejected.
//!
//! # Reference
//! - JVMS §4.7 Attributes

use crate::{
    classfile::{constant::ConstantPool, InnerClass, MemberInfo},
    file::parser::Parser,
    Result,
};

/// Deepest nesting of annotations inside element values.
const MAX_ANNOTATION_DEPTH: usize = 64;

/// The structure an attribute table belongs to.
///
/// Attributes are only interpreted where the class-file format allows them; a known attribute
/// name in any other place is treated as opaque, as the JVM does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSite {
    /// `ClassFile.attributes`
    Class,
    /// `field_info.attributes`
    Field,
    /// `method_info.attributes`
    Method,
    /// `Code_attribute.attributes`
    Code,
    /// `record_component_info.attributes`
    RecordComponent,
}

/// Constant-pool references collected from attribute tables.
#[derive(Debug, Default, Clone)]
pub(crate) struct AttributeRefs {
    /// `Signature` and `LocalVariableTypeTable` entries
    pub signatures: Vec<u16>,
    /// Field and method descriptors referenced from debug tables and annotations
    pub descriptors: Vec<u16>,
    /// Components of the `Record` attribute
    pub record_components: Vec<MemberInfo>,
    /// `(class_index, method_index)` of the `EnclosingMethod` attribute
    pub enclosing_method: Option<(u16, u16)>,
    /// Named entries of the `InnerClasses` attribute
    pub inner_classes: Vec<InnerClass>,
}

/// Parse `attributes_count` followed by that many attributes.
pub(crate) fn parse_attributes(
    parser: &mut Parser<'_>,
    pool: &ConstantPool<'_>,
    site: AttributeSite,
    refs: &mut AttributeRefs,
) -> Result<()> {
    let count = parser.read_be::<u16>()?;
    for _ in 0..count {
        let name_index = parser.read_be::<u16>()?;
        let name = pool.utf8(name_index)?;
        let length = parser.read_be::<u32>()?;
        let Ok(length) = usize::try_from(length) else {
            return Err(out_of_bounds_error!());
        };

        parser.sub_parse(length, |attr| parse_attribute(attr, pool, site, name, refs))?;
    }
    Ok(())
}

fn parse_attribute(
    attr: &mut Parser<'_>,
    pool: &ConstantPool<'_>,
    site: AttributeSite,
    name: &[u8],
    refs: &mut AttributeRefs,
) -> Result<()> {
    use AttributeSite as S;

    match (name, site) {
        (b"Signature", S::Class | S::Field | S::Method | S::RecordComponent) => {
            let index = attr.read_be::<u16>()?;
            pool.utf8(index)?;
            refs.signatures.push(index);
        }
        (b"Code", S::Method) => {
            // max_stack, max_locals
            attr.advance_by(4)?;
            let code_length = attr.read_be::<u32>()?;
            if code_length == 0 {
                return Err(malformed_error!("Code attribute with empty code array"));
            }
            let Ok(code_length) = usize::try_from(code_length) else {
                return Err(out_of_bounds_error!());
            };
            attr.advance_by(code_length)?;
            let exception_table_length = attr.read_be::<u16>()?;
            attr.advance_by(usize::from(exception_table_length) * 8)?;
            parse_attributes(attr, pool, S::Code, refs)?;
        }
        (b"LocalVariableTable" | b"LocalVariableTypeTable", S::Code) => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                // start_pc, length, name_index
                attr.advance_by(6)?;
                let index = attr.read_be::<u16>()?;
                pool.utf8(index)?;
                if name == b"LocalVariableTable" {
                    refs.descriptors.push(index);
                } else {
                    refs.signatures.push(index);
                }
                // index
                attr.advance_by(2)?;
            }
        }
        (
            b"RuntimeVisibleAnnotations" | b"RuntimeInvisibleAnnotations",
            S::Class | S::Field | S::Method | S::RecordComponent,
        ) => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                annotation(attr, pool, refs, 0)?;
            }
        }
        (
            b"RuntimeVisibleParameterAnnotations" | b"RuntimeInvisibleParameterAnnotations",
            S::Method,
        ) => {
            let parameters = attr.read_be::<u8>()?;
            for _ in 0..parameters {
                let count = attr.read_be::<u16>()?;
                for _ in 0..count {
                    annotation(attr, pool, refs, 0)?;
                }
            }
        }
        (b"AnnotationDefault", S::Method) => element_value(attr, pool, refs, 0)?,
        (b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations", _) => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                type_annotation(attr, pool, refs)?;
            }
        }
        (b"Record", S::Class) => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                let component = MemberInfo::parse_header(attr, pool, None)?;
                parse_attributes(attr, pool, S::RecordComponent, refs)?;
                refs.record_components.push(component);
            }
        }
        (b"EnclosingMethod", S::Class) => {
            let class_index = attr.read_be::<u16>()?;
            let method_index = attr.read_be::<u16>()?;
            pool.class_name_index(class_index)?;
            if method_index != 0 {
                pool.name_and_type(method_index)?;
            }
            refs.enclosing_method = Some((class_index, method_index));
        }
        (b"InnerClasses", S::Class) => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                let inner_class = attr.read_be::<u16>()?;
                let outer_class = attr.read_be::<u16>()?;
                let inner_name = attr.read_be::<u16>()?;
                // inner_class_access_flags
                attr.advance_by(2)?;

                pool.class_name_index(inner_class)?;
                if outer_class != 0 {
                    pool.class_name_index(outer_class)?;
                }
                if inner_name != 0 {
                    pool.utf8(inner_name)?;
                    refs.inner_classes.push(InnerClass {
                        inner_class,
                        outer_class,
                        inner_name,
                    });
                }
            }
        }
        _ => {
            attr.advance_by(attr.len() - attr.pos())?;
        }
    }
    Ok(())
}

fn annotation(
    attr: &mut Parser<'_>,
    pool: &ConstantPool<'_>,
    refs: &mut AttributeRefs,
    depth: usize,
) -> Result<()> {
    if depth > MAX_ANNOTATION_DEPTH {
        return Err(malformed_error!(
            "Annotations nested deeper than {}",
            MAX_ANNOTATION_DEPTH
        ));
    }

    let type_index = attr.read_be::<u16>()?;
    pool.utf8(type_index)?;
    refs.descriptors.push(type_index);

    let pairs = attr.read_be::<u16>()?;
    for _ in 0..pairs {
        let element_name_index = attr.read_be::<u16>()?;
        pool.utf8(element_name_index)?;
        element_value(attr, pool, refs, depth)?;
    }
    Ok(())
}

fn element_value(
    attr: &mut Parser<'_>,
    pool: &ConstantPool<'_>,
    refs: &mut AttributeRefs,
    depth: usize,
) -> Result<()> {
    if depth > MAX_ANNOTATION_DEPTH {
        return Err(malformed_error!(
            "Annotation values nested deeper than {}",
            MAX_ANNOTATION_DEPTH
        ));
    }

    let tag = attr.read_be::<u8>()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            let const_value_index = attr.read_be::<u16>()?;
            if pool.get(const_value_index).is_none() {
                return Err(malformed_error!(
                    "Annotation constant references invalid slot #{}",
                    const_value_index
                ));
            }
        }
        b'e' => {
            let type_name_index = attr.read_be::<u16>()?;
            let const_name_index = attr.read_be::<u16>()?;
            pool.utf8(type_name_index)?;
            pool.utf8(const_name_index)?;
            refs.descriptors.push(type_name_index);
        }
        b'c' => {
            let class_info_index = attr.read_be::<u16>()?;
            pool.utf8(class_info_index)?;
            refs.descriptors.push(class_info_index);
        }
        b'@' => annotation(attr, pool, refs, depth + 1)?,
        b'[' => {
            let count = attr.read_be::<u16>()?;
            for _ in 0..count {
                element_value(attr, pool, refs, depth + 1)?;
            }
        }
        other => {
            return Err(malformed_error!(
                "Unknown annotation element tag '{}'",
                char::from(other)
            ))
        }
    }
    Ok(())
}

fn type_annotation(
    attr: &mut Parser<'_>,
    pool: &ConstantPool<'_>,
    refs: &mut AttributeRefs,
) -> Result<()> {
    let target_type = attr.read_be::<u8>()?;
    let target_info_len = match target_type {
        // type_parameter_target, formal_parameter_target
        0x00 | 0x01 | 0x16 => 1,
        // supertype_target, throws_target, catch_target, offset_target
        0x10 | 0x17 | 0x42..=0x46 => 2,
        // type_parameter_bound_target
        0x11 | 0x12 => 2,
        // empty_target
        0x13..=0x15 => 0,
        // type_argument_target
        0x47..=0x4B => 3,
        // localvar_target
        0x40 | 0x41 => {
            let table_length = attr.read_be::<u16>()?;
            usize::from(table_length) * 6
        }
        other => {
            return Err(malformed_error!(
                "Unknown type annotation target 0x{:02X}",
                other
            ))
        }
    };
    attr.advance_by(target_info_len)?;

    let path_length = attr.read_be::<u8>()?;
    attr.advance_by(usize::from(path_length) * 2)?;

    annotation(attr, pool, refs, 0)
}

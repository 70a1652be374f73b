//! Class-file builder for tests.
//!
//! Produces well-formed class files with a deduplicated constant pool, the way `javac` lays them
//! out. Only depends on `std`, so integration tests can include it with `#[path]`.
#![allow(dead_code)]

use std::collections::HashMap;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_LONG: u8 = 5;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_INVOKE_DYNAMIC: u8 = 18;

type Attribute = (u16, Vec<u8>);

/// An annotation element value.
#[derive(Debug, Clone)]
pub enum ElementValue<'s> {
    /// `I` constant
    Int(i32),
    /// `s` constant
    Str(&'s str),
    /// `e`: type descriptor and constant name
    Enum(&'s str, &'s str),
    /// `c`: return descriptor
    Class(&'s str),
    /// `@`: nested annotation
    Annotation(&'s str, Vec<(&'s str, ElementValue<'s>)>),
    /// `[`
    Array(Vec<ElementValue<'s>>),
}

struct Member {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<Attribute>,
}

/// Builds class files entry by entry.
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    interned: HashMap<(u8, Vec<u8>), u16>,
    major_version: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<Attribute>,
    record_components: Vec<Member>,
    inner_classes: Vec<[u16; 4]>,
}

fn u2(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

impl ClassBuilder {
    /// A class `name` extending `java/lang/Object`, class-file version 52.0.
    pub fn new(name: &str) -> Self {
        let mut builder = ClassBuilder {
            pool: Vec::new(),
            next_index: 1,
            interned: HashMap::new(),
            major_version: 52,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            record_components: Vec::new(),
            inner_classes: Vec::new(),
        };
        builder.this_class = builder.class_index(name);
        builder.super_class = builder.class_index("java/lang/Object");
        builder
    }

    fn entry(&mut self, tag: u8, body: Vec<u8>, slots: u16) -> u16 {
        if let Some(&index) = self.interned.get(&(tag, body.clone())) {
            return index;
        }
        let index = self.next_index;
        self.pool.push(tag);
        self.pool.extend_from_slice(&body);
        self.next_index += slots;
        self.interned.insert((tag, body), index);
        index
    }

    /// Index of the `CONSTANT_Utf8` holding `value`, adding it if needed.
    pub fn utf8_index(&mut self, value: &str) -> u16 {
        self.utf8_raw(value.as_bytes())
    }

    /// Index of a `CONSTANT_Utf8` holding exactly `bytes`.
    pub fn utf8_raw(&mut self, bytes: &[u8]) -> u16 {
        let len = u16::try_from(bytes.len()).expect("utf8 payload too long");
        let mut body = u2(len).to_vec();
        body.extend_from_slice(bytes);
        self.entry(TAG_UTF8, body, 1)
    }

    /// Index of the `CONSTANT_Class` naming `name`.
    pub fn class_index(&mut self, name: &str) -> u16 {
        let name_index = self.utf8_index(name);
        self.entry(TAG_CLASS, u2(name_index).to_vec(), 1)
    }

    /// Index of the `CONSTANT_NameAndType` for `name` and `descriptor`.
    pub fn name_and_type_index(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8_index(name);
        let descriptor_index = self.utf8_index(descriptor);
        let mut body = u2(name_index).to_vec();
        body.extend_from_slice(&u2(descriptor_index));
        self.entry(TAG_NAME_AND_TYPE, body, 1)
    }

    fn member_ref_index(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class_index(owner);
        let nat_index = self.name_and_type_index(name, descriptor);
        let mut body = u2(class_index).to_vec();
        body.extend_from_slice(&u2(nat_index));
        self.entry(tag, body, 1)
    }

    /// Index of the `CONSTANT_Fieldref` for `owner.name:descriptor`.
    pub fn field_ref_index(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref_index(TAG_FIELDREF, owner, name, descriptor)
    }

    /// Index of the `CONSTANT_Methodref` for `owner.name descriptor`.
    pub fn method_ref_index(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref_index(TAG_METHODREF, owner, name, descriptor)
    }

    /// Set the class-file major version.
    pub fn version(mut self, major: u16) -> Self {
        self.major_version = major;
        self
    }

    /// Replace the superclass.
    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = self.class_index(name);
        self
    }

    /// Add a direct superinterface.
    pub fn interface(mut self, name: &str) -> Self {
        let index = self.class_index(name);
        self.interfaces.push(index);
        self
    }

    fn member(&mut self, name: &str, descriptor: &str, attributes: Vec<Attribute>) -> Member {
        Member {
            access_flags: 0x0001,
            name_index: self.utf8_index(name),
            descriptor_index: self.utf8_index(descriptor),
            attributes,
        }
    }

    fn signature_attribute(&mut self, signature: &str) -> Attribute {
        let name_index = self.utf8_index("Signature");
        let signature_index = self.utf8_index(signature);
        (name_index, u2(signature_index).to_vec())
    }

    /// Declare a field.
    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        let field = self.member(name, descriptor, Vec::new());
        self.fields.push(field);
        self
    }

    /// Declare a field with a `Signature` attribute.
    pub fn generic_field(mut self, name: &str, descriptor: &str, signature: &str) -> Self {
        let attribute = self.signature_attribute(signature);
        let field = self.member(name, descriptor, vec![attribute]);
        self.fields.push(field);
        self
    }

    /// Declare a method without code.
    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        let method = self.member(name, descriptor, Vec::new());
        self.methods.push(method);
        self
    }

    /// Declare a method with a `Signature` attribute.
    pub fn generic_method(mut self, name: &str, descriptor: &str, signature: &str) -> Self {
        let attribute = self.signature_attribute(signature);
        let method = self.member(name, descriptor, vec![attribute]);
        self.methods.push(method);
        self
    }

    /// Declare a method with a `Code` attribute holding `code` and one local variable `this`
    /// of type `local_descriptor`.
    pub fn method_with_code(
        mut self,
        name: &str,
        descriptor: &str,
        code: &[u8],
        local_descriptor: &str,
    ) -> Self {
        let lvt = self.local_variable_table("LocalVariableTable", code, local_descriptor);
        let code = self.code_attribute(code, vec![lvt]);
        let method = self.member(name, descriptor, vec![code]);
        self.methods.push(method);
        self
    }

    /// Declare a method whose `Code` attribute carries a `LocalVariableTable` and a
    /// `LocalVariableTypeTable` for the local variable `this`.
    pub fn method_with_local_signature(
        mut self,
        name: &str,
        descriptor: &str,
        code: &[u8],
        local_descriptor: &str,
        local_signature: &str,
    ) -> Self {
        let lvt = self.local_variable_table("LocalVariableTable", code, local_descriptor);
        let lvtt = self.local_variable_table("LocalVariableTypeTable", code, local_signature);
        let code = self.code_attribute(code, vec![lvt, lvtt]);
        let method = self.member(name, descriptor, vec![code]);
        self.methods.push(method);
        self
    }

    fn local_variable_table(&mut self, table: &str, code: &[u8], descriptor: &str) -> Attribute {
        let table_name = self.utf8_index(table);
        let this_name = self.utf8_index("this");
        let descriptor = self.utf8_index(descriptor);
        let code_length = u16::try_from(code.len()).expect("code too long");

        let mut body = u2(1).to_vec();
        body.extend_from_slice(&u2(0));
        body.extend_from_slice(&u2(code_length));
        body.extend_from_slice(&u2(this_name));
        body.extend_from_slice(&u2(descriptor));
        body.extend_from_slice(&u2(0));
        (table_name, body)
    }

    fn code_attribute(&mut self, code: &[u8], attributes: Vec<Attribute>) -> Attribute {
        let code_name = self.utf8_index("Code");
        let code_length = u32::try_from(code.len()).expect("code too long");

        let mut body = Vec::new();
        body.extend_from_slice(&u2(4));
        body.extend_from_slice(&u2(1));
        body.extend_from_slice(&code_length.to_be_bytes());
        body.extend_from_slice(code);
        body.extend_from_slice(&u2(0));
        Self::write_attributes(&mut body, &attributes);
        (code_name, body)
    }

    /// Declare a method whose second parameter carries an invisible annotation `annotation`.
    pub fn parameter_annotation(
        mut self,
        name: &str,
        descriptor: &str,
        annotation: &str,
        pairs: &[(&str, ElementValue<'_>)],
    ) -> Self {
        let attribute_name = self.utf8_index("RuntimeInvisibleParameterAnnotations");
        let mut body = vec![2];
        body.extend_from_slice(&u2(0));
        body.extend_from_slice(&u2(1));
        self.write_annotation(&mut body, annotation, pairs);

        let method = self.member(name, descriptor, vec![(attribute_name, body)]);
        self.methods.push(method);
        self
    }

    /// Declare an annotation interface element with an `AnnotationDefault` attribute.
    pub fn annotation_default(
        mut self,
        name: &str,
        descriptor: &str,
        value: &ElementValue<'_>,
    ) -> Self {
        let attribute_name = self.utf8_index("AnnotationDefault");
        let mut body = Vec::new();
        self.write_element_value(&mut body, value);

        let method = self.member(name, descriptor, vec![(attribute_name, body)]);
        self.methods.push(method);
        self
    }

    /// Add a `CONSTANT_Fieldref`.
    pub fn field_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field_ref_index(owner, name, descriptor);
        self
    }

    /// Add a `CONSTANT_Methodref`.
    pub fn method_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.method_ref_index(owner, name, descriptor);
        self
    }

    /// Add a `CONSTANT_InterfaceMethodref`.
    pub fn interface_method_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.member_ref_index(TAG_INTERFACE_METHODREF, owner, name, descriptor);
        self
    }

    /// Add a `CONSTANT_Class`.
    pub fn class_ref(mut self, name: &str) -> Self {
        self.class_index(name);
        self
    }

    /// Add a `CONSTANT_String`.
    pub fn string(mut self, value: &str) -> Self {
        let index = self.utf8_index(value);
        self.entry(TAG_STRING, u2(index).to_vec(), 1);
        self
    }

    /// Add a `CONSTANT_Integer`.
    pub fn integer(mut self, value: i32) -> Self {
        self.entry(TAG_INTEGER, value.to_be_bytes().to_vec(), 1);
        self
    }

    /// Add a `CONSTANT_Long`, which takes two slots.
    pub fn long(mut self, value: i64) -> Self {
        self.entry(TAG_LONG, value.to_be_bytes().to_vec(), 2);
        self
    }

    /// Add a `CONSTANT_MethodType`.
    pub fn method_type(mut self, descriptor: &str) -> Self {
        let index = self.utf8_index(descriptor);
        self.entry(TAG_METHOD_TYPE, u2(index).to_vec(), 1);
        self
    }

    /// Add a `REF_invokeStatic` `CONSTANT_MethodHandle` to `owner.name descriptor`.
    pub fn static_method_handle(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        let reference = self.method_ref_index(owner, name, descriptor);
        let mut body = vec![6];
        body.extend_from_slice(&u2(reference));
        self.entry(TAG_METHOD_HANDLE, body, 1);
        self
    }

    /// Add a `CONSTANT_InvokeDynamic` using bootstrap method `bootstrap`.
    pub fn invoke_dynamic(mut self, bootstrap: u16, name: &str, descriptor: &str) -> Self {
        let nat_index = self.name_and_type_index(name, descriptor);
        let mut body = u2(bootstrap).to_vec();
        body.extend_from_slice(&u2(nat_index));
        self.entry(TAG_INVOKE_DYNAMIC, body, 1);
        self
    }

    /// Add a class-level `Signature` attribute.
    pub fn class_signature(mut self, signature: &str) -> Self {
        let attribute = self.signature_attribute(signature);
        self.attributes.push(attribute);
        self
    }

    /// Add a class-level `RuntimeVisibleAnnotations` attribute with one marker annotation.
    pub fn annotation(self, descriptor: &str) -> Self {
        self.annotation_with(descriptor, &[])
    }

    /// Add a class-level `RuntimeVisibleAnnotations` attribute with one annotation.
    pub fn annotation_with(mut self, descriptor: &str, pairs: &[(&str, ElementValue<'_>)]) -> Self {
        let name_index = self.utf8_index("RuntimeVisibleAnnotations");
        let mut body = u2(1).to_vec();
        self.write_annotation(&mut body, descriptor, pairs);
        self.attributes.push((name_index, body));
        self
    }

    /// Add a class-level `RuntimeVisibleTypeAnnotations` attribute with one marker annotation,
    /// raw `target_info` bytes for `target_type` and a one step type path.
    pub fn type_annotation(
        mut self,
        target_type: u8,
        target_info: &[u8],
        descriptor: &str,
    ) -> Self {
        let name_index = self.utf8_index("RuntimeVisibleTypeAnnotations");
        let mut body = u2(1).to_vec();
        body.push(target_type);
        body.extend_from_slice(target_info);
        // type_path: one array step
        body.extend_from_slice(&[1, 0, 0]);
        self.write_annotation(&mut body, descriptor, &[]);
        self.attributes.push((name_index, body));
        self
    }

    fn write_annotation(
        &mut self,
        out: &mut Vec<u8>,
        descriptor: &str,
        pairs: &[(&str, ElementValue<'_>)],
    ) {
        let type_index = self.utf8_index(descriptor);
        out.extend_from_slice(&u2(type_index));
        out.extend_from_slice(&u2(u16::try_from(pairs.len()).expect("pairs")));
        for (name, value) in pairs {
            let name_index = self.utf8_index(name);
            out.extend_from_slice(&u2(name_index));
            self.write_element_value(out, value);
        }
    }

    fn write_element_value(&mut self, out: &mut Vec<u8>, value: &ElementValue<'_>) {
        match value {
            ElementValue::Int(value) => {
                let index = self.entry(TAG_INTEGER, value.to_be_bytes().to_vec(), 1);
                out.push(b'I');
                out.extend_from_slice(&u2(index));
            }
            ElementValue::Str(value) => {
                let index = self.utf8_index(value);
                out.push(b's');
                out.extend_from_slice(&u2(index));
            }
            ElementValue::Enum(descriptor, constant) => {
                let type_index = self.utf8_index(descriptor);
                let constant_index = self.utf8_index(constant);
                out.push(b'e');
                out.extend_from_slice(&u2(type_index));
                out.extend_from_slice(&u2(constant_index));
            }
            ElementValue::Class(descriptor) => {
                let index = self.utf8_index(descriptor);
                out.push(b'c');
                out.extend_from_slice(&u2(index));
            }
            ElementValue::Annotation(descriptor, pairs) => {
                out.push(b'@');
                self.write_annotation(out, descriptor, pairs);
            }
            ElementValue::Array(values) => {
                out.push(b'[');
                out.extend_from_slice(&u2(u16::try_from(values.len()).expect("values")));
                for value in values {
                    self.write_element_value(out, value);
                }
            }
        }
    }

    /// Add an `InnerClasses` entry; an empty `name` marks an anonymous class. All entries are
    /// emitted as one attribute.
    pub fn inner_class(mut self, inner: &str, outer: Option<&str>, name: &str) -> Self {
        let inner_index = self.class_index(inner);
        let outer_index = outer.map_or(0, |outer| self.class_index(outer));
        let name_index = if name.is_empty() {
            0
        } else {
            self.utf8_index(name)
        };
        self.inner_classes
            .push([inner_index, outer_index, name_index, 0x0009]);
        self
    }

    /// Add an `EnclosingMethod` attribute.
    pub fn enclosing_method(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        let attribute_name = self.utf8_index("EnclosingMethod");
        let class_index = self.class_index(owner);
        let nat_index = self.name_and_type_index(name, descriptor);
        let mut body = u2(class_index).to_vec();
        body.extend_from_slice(&u2(nat_index));
        self.attributes.push((attribute_name, body));
        self
    }

    /// Add a record component; all components are emitted as one `Record` attribute.
    pub fn record_component(mut self, name: &str, descriptor: &str) -> Self {
        let component = self.member(name, descriptor, Vec::new());
        self.record_components.push(component);
        self
    }

    /// Add an arbitrary class-level attribute.
    pub fn raw_attribute(mut self, name: &str, body: &[u8]) -> Self {
        let name_index = self.utf8_index(name);
        self.attributes.push((name_index, body.to_vec()));
        self
    }

    fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) {
        out.extend_from_slice(&u2(u16::try_from(attributes.len()).expect("attributes")));
        for (name_index, body) in attributes {
            out.extend_from_slice(&u2(*name_index));
            out.extend_from_slice(&u32::try_from(body.len()).expect("attribute").to_be_bytes());
            out.extend_from_slice(body);
        }
    }

    fn write_members(out: &mut Vec<u8>, members: &[Member]) {
        out.extend_from_slice(&u2(u16::try_from(members.len()).expect("members")));
        for member in members {
            out.extend_from_slice(&u2(member.access_flags));
            out.extend_from_slice(&u2(member.name_index));
            out.extend_from_slice(&u2(member.descriptor_index));
            Self::write_attributes(out, &member.attributes);
        }
    }

    /// Serialize the class file.
    pub fn build(mut self) -> Vec<u8> {
        if !self.inner_classes.is_empty() {
            let name_index = self.utf8_index("InnerClasses");
            let entries = std::mem::take(&mut self.inner_classes);
            let mut body = u2(u16::try_from(entries.len()).expect("inner classes")).to_vec();
            for entry in entries {
                for value in entry {
                    body.extend_from_slice(&u2(value));
                }
            }
            self.attributes.push((name_index, body));
        }
        if !self.record_components.is_empty() {
            let name_index = self.utf8_index("Record");
            let components = std::mem::take(&mut self.record_components);
            let mut body = u2(u16::try_from(components.len()).expect("components")).to_vec();
            for component in &components {
                body.extend_from_slice(&u2(component.name_index));
                body.extend_from_slice(&u2(component.descriptor_index));
                Self::write_attributes(&mut body, &component.attributes);
            }
            self.attributes.push((name_index, body));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABE_u32.to_be_bytes());
        out.extend_from_slice(&u2(0));
        out.extend_from_slice(&u2(self.major_version));
        out.extend_from_slice(&u2(self.next_index));
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&u2(0x0021));
        out.extend_from_slice(&u2(self.this_class));
        out.extend_from_slice(&u2(self.super_class));
        out.extend_from_slice(&u2(u16::try_from(self.interfaces.len()).expect("interfaces")));
        for interface in &self.interfaces {
            out.extend_from_slice(&u2(*interface));
        }
        Self::write_members(&mut out, &self.fields);
        Self::write_members(&mut out, &self.methods);
        Self::write_attributes(&mut out, &self.attributes);
        out
    }
}

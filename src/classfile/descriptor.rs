//! Rewriting of class names embedded in descriptors and generic signatures.
//!
//! Field and method descriptors (`(Lpkg/A;I)[Lpkg/B;`) and generic `Signature` strings
//! (`<T:Ljava/lang/Object;>Lpkg/Base<TT;>.Inner<Ljava/lang/String;>;`) refer to classes by their
//! internal names. When a class is renamed, every string embedding that name must follow, or the
//! rewritten class file would be internally inconsistent.
//!
//! Both functions take a mapper returning `Some(new_name)` for classes that are renamed and
//! `None` otherwise, and return `Ok(None)` when nothing in the input changed so callers can keep
//! the original bytes.
//!
//! # Reference
//! - JVMS §4.3 Descriptors
//! - JVMS §4.7.9.1 Signatures

use crate::Result;

/// Deepest nesting of type arguments and array dimensions accepted in a signature.
const MAX_SIGNATURE_DEPTH: usize = 255;

/// Rewrite the class names in a field descriptor, method descriptor, or array class name.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the descriptor contains a character that is not part
/// of the descriptor grammar, or an object type that is empty or missing its terminating `;`.
///
/// # Examples
///
/// ```rust
/// use classremap::classfile::descriptor::remap_descriptor;
///
/// let rename = |name: &str| (name == "a/b").then(|| "net/example/Entity".to_string());
///
/// assert_eq!(
///     remap_descriptor("(La/b;I)[La/b;", rename)?.as_deref(),
///     Some("(Lnet/example/Entity;I)[Lnet/example/Entity;")
/// );
/// assert_eq!(remap_descriptor("(Ljava/lang/String;)V", rename)?, None);
/// # Ok::<(), classremap::Error>(())
/// ```
pub fn remap_descriptor<F>(descriptor: &str, map: F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let bytes = descriptor.as_bytes();
    let mut edits = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'L' => {
                let start = i + 1;
                let Some(len) = descriptor[start..].find(';') else {
                    return Err(malformed_error!(
                        "Unterminated object type in descriptor '{}'",
                        descriptor
                    ));
                };
                if len == 0 {
                    return Err(malformed_error!(
                        "Empty object type in descriptor '{}'",
                        descriptor
                    ));
                }
                let end = start + len;
                if let Some(renamed) = map(&descriptor[start..end]) {
                    edits.push((start, end, renamed));
                }
                i = end + 1;
            }
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V' | b'[' | b'(' | b')' => {
                i += 1;
            }
            other => {
                return Err(malformed_error!(
                    "Unexpected '{}' in descriptor '{}'",
                    char::from(other),
                    descriptor
                ));
            }
        }
    }

    Ok(apply_edits(descriptor, edits))
}

/// Rewrite the class names in a class, method or field generic signature.
///
/// Inner class suffixes (`.Inner`) are rewritten when the class map renames the flattened
/// `Outer$Inner` binary name to a name that still starts with the renamed outer class.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the string does not follow the signature grammar.
///
/// # Examples
///
/// ```rust
/// use classremap::classfile::descriptor::remap_signature;
///
/// let rename = |name: &str| (name == "a/b").then(|| "net/example/Entity".to_string());
///
/// assert_eq!(
///     remap_signature("<T:La/b;>Ljava/util/List<TT;>;", rename)?.as_deref(),
///     Some("<T:Lnet/example/Entity;>Ljava/util/List<TT;>;")
/// );
/// # Ok::<(), classremap::Error>(())
/// ```
pub fn remap_signature<F>(signature: &str, map: F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut walker = SignatureWalker {
        signature,
        bytes: signature.as_bytes(),
        pos: 0,
        depth: 0,
        edits: Vec::new(),
        map,
    };
    walker.walk()?;
    Ok(apply_edits(signature, walker.edits))
}

/// Simple name of the nested class `binary_name` (`pkg/Outer$Inner`).
///
/// With the enclosing class known the name is what follows `outer$`. Without it, for local
/// classes, it is what follows the last `$` minus the digits `javac` numbers local classes with.
/// Returns `None` when `binary_name` does not name a nested class of `outer`.
///
/// # Examples
///
/// ```rust
/// use classremap::classfile::descriptor::nested_name;
///
/// assert_eq!(nested_name("net/Entity$Pose", Some("net/Entity")), Some("Pose"));
/// assert_eq!(nested_name("net/Entity$1Pose", None), Some("Pose"));
/// assert_eq!(nested_name("net/Entity$Pose", Some("net/Other")), None);
/// ```
#[must_use]
pub fn nested_name<'n>(binary_name: &'n str, outer: Option<&str>) -> Option<&'n str> {
    let simple = match outer {
        Some(outer) => binary_name.strip_prefix(outer)?.strip_prefix('$')?,
        None => binary_name
            .rsplit_once('$')?
            .1
            .trim_start_matches(|c: char| c.is_ascii_digit()),
    };
    (!simple.is_empty()).then_some(simple)
}

/// Splice non-overlapping, ordered `(start, end, replacement)` edits into `source`.
fn apply_edits(source: &str, edits: Vec<(usize, usize, String)>) -> Option<String> {
    if edits.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(source.len() + 16);
    let mut last = 0;
    for (start, end, replacement) in edits {
        out.push_str(&source[last..start]);
        out.push_str(&replacement);
        last = end;
    }
    out.push_str(&source[last..]);
    Some(out)
}

struct SignatureWalker<'s, F> {
    signature: &'s str,
    bytes: &'s [u8],
    pos: usize,
    depth: usize,
    edits: Vec<(usize, usize, String)>,
    map: F,
}

impl<F> SignatureWalker<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn walk(&mut self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(malformed_error!("Empty signature"));
        }

        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }

        if self.peek() == Some(b'(') {
            self.pos += 1;
            while self.peek() != Some(b')') {
                self.java_type()?;
            }
            self.pos += 1;

            if self.peek() == Some(b'V') {
                self.pos += 1;
            } else {
                self.java_type()?;
            }

            while self.peek() == Some(b'^') {
                self.pos += 1;
                self.reference_type()?;
            }

            if self.pos != self.bytes.len() {
                return Err(self.error("trailing characters"));
            }
        } else {
            if self.pos == self.bytes.len() {
                return Err(self.error("missing superclass"));
            }
            while self.pos < self.bytes.len() {
                self.reference_type()?;
            }
        }

        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, what: &str) -> crate::Error {
        malformed_error!(
            "Invalid signature '{}' at {}: {}",
            self.signature,
            self.pos,
            what
        )
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(byte))))
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_SIGNATURE_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    /// Consume an identifier up to (not including) one of `terminators`.
    fn identifier(&mut self, terminators: &[u8]) -> Result<(usize, usize)> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated identifier")),
                Some(b) if terminators.contains(&b) => break,
                Some(b'.' | b';' | b'[' | b'<' | b'>' | b':') => {
                    return Err(self.error("unexpected character in identifier"))
                }
                Some(_) => self.pos += 1,
            }
        }
        if self.pos == start {
            return Err(self.error("empty identifier"));
        }
        Ok((start, self.pos))
    }

    fn java_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.pos += 1;
                Ok(())
            }
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.pos += 1;
                self.identifier(b";")?;
                self.expect(b';')
            }
            Some(b'[') => {
                self.pos += 1;
                self.descend()?;
                self.java_type()?;
                self.depth -= 1;
                Ok(())
            }
            _ => Err(self.error("expected reference type")),
        }
    }

    fn class_type(&mut self) -> Result<()> {
        self.expect(b'L')?;
        let (start, end) = self.identifier(b"<.;")?;
        let original = &self.signature[start..end];
        let renamed = (self.map)(original);

        let mut outer = original.to_string();
        let mut outer_renamed = match renamed {
            Some(renamed) => {
                self.edits.push((start, end, renamed.clone()));
                renamed
            }
            None => outer.clone(),
        };

        if self.peek() == Some(b'<') {
            self.type_arguments()?;
        }

        while self.peek() == Some(b'.') {
            self.pos += 1;
            let (start, end) = self.identifier(b"<.;")?;
            let inner = &self.signature[start..end];

            let flattened = format!("{outer}${inner}");
            let flattened_renamed =
                (self.map)(&flattened).unwrap_or_else(|| format!("{outer_renamed}${inner}"));

            let inner_renamed = nested_name(&flattened_renamed, Some(outer_renamed.as_str()));
            if let Some(inner_renamed) = inner_renamed {
                if inner_renamed != inner {
                    self.edits.push((start, end, inner_renamed.to_string()));
                }
            }

            outer = flattened;
            outer_renamed = flattened_renamed;

            if self.peek() == Some(b'<') {
                self.type_arguments()?;
            }
        }

        self.expect(b';')
    }

    fn type_arguments(&mut self) -> Result<()> {
        self.expect(b'<')?;
        self.descend()?;
        if self.peek() == Some(b'>') {
            return Err(self.error("empty type arguments"));
        }
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.pos += 1,
                Some(b'+' | b'-') => {
                    self.pos += 1;
                    self.reference_type()?;
                }
                _ => self.reference_type()?,
            }
        }
        self.pos += 1;
        self.depth -= 1;
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<()> {
        self.expect(b'<')?;
        if self.peek() == Some(b'>') {
            return Err(self.error("empty type parameters"));
        }
        while self.peek() != Some(b'>') {
            self.identifier(b":")?;
            self.expect(b':')?;
            if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.reference_type()?;
            }
        }
        self.pos += 1;
        Ok(())
    }
}

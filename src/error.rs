use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Symbol lookups never fail: a name without a mapping is passed through unchanged, so there is
/// no "unknown symbol" variant. Everything else that can go wrong while reading a class file,
/// rewriting it, or building the mapping table is represented here.
///
/// # Error Categories
///
/// ## Class-File Errors
/// - [`Error::Malformed`] - The input is not a well-formed class file
/// - [`Error::OutOfBounds`] - A read ran past the end of the input (truncated class file)
/// - [`Error::Empty`] - A zero-length class file was provided
///
/// ## Rewrite Errors
/// - [`Error::Utf8TooLong`] - A rewritten constant would not fit the `u2` length prefix
/// - [`Error::RemapConflict`] - One constant would need two different rewrites
///
/// ## Mapping Errors
/// - [`Error::MappingConflict`] - The mapping table is not a partial injective function
///
/// Callers that only care whether an artifact was rejected as bad bytecode should use
/// [`Error::is_malformed`], which groups the first three categories.
///
/// # Examples
///
/// ```rust
/// use classremap::{prelude::*, Error};
///
/// let symbols = SymbolMap::empty();
/// let config = RemapConfig::production();
/// let remapper = BytecodeRemapper::new(&symbols, &config);
///
/// match remapper.remap(&[0xDE, 0xAD, 0xBE, 0xEF]) {
///     Ok(_) => unreachable!(),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed class: {} ({}:{})", message, file, line);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// Raised for a wrong magic number, an unknown constant-pool tag, an index pointing at the
    /// wrong kind of entry, invalid modified UTF-8 in a name, an unparsable descriptor or
    /// signature, or bytes trailing the last attribute. The error includes the source location
    /// where the malformation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the class file.
    ///
    /// A structure announced more bytes than the input holds.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A rewritten `CONSTANT_Utf8` payload exceeds the 65535 byte limit of the class-file format.
    #[error("Rewritten constant #{index} would be {len} bytes, the limit is 65535")]
    Utf8TooLong {
        /// Constant-pool index of the entry
        index: u16,
        /// Encoded length of the rewritten payload
        len: usize,
    },

    /// A single `CONSTANT_Utf8` entry is shared by usages that require different rewrites.
    ///
    /// The constant pool keeps its entry count, so a shared entry can only carry one spelling.
    #[error("Constant #{index} is shared by usages remapping to '{first}' and '{second}'")]
    RemapConflict {
        /// Constant-pool index of the entry
        index: u16,
        /// First rewrite computed for the entry
        first: String,
        /// Conflicting rewrite computed for the entry
        second: String,
    },

    /// The mapping table handed to the builder violates the symbol map invariants.
    #[error("Invalid mapping table - {0}")]
    MappingConflict(String),
}

impl Error {
    /// Returns `true` if this error means the input was not a well-formed class file.
    ///
    /// Covers [`Error::Malformed`], [`Error::OutOfBounds`] and [`Error::Empty`]. A host compiler
    /// pipeline should fail the compilation of the affected class when this returns `true`.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. } | Error::OutOfBounds | Error::Empty
        )
    }
}

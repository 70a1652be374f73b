//! Integration with the host compiler's module output.
//!
//! The host compiler turns one source module into a set of output artifacts (class files plus
//! auxiliary metadata) and writes them out in a single finalize pass. This module supplies the
//! hooks that pass is wired to:
//!
//! - **Before finalize** - [`CompilationInterceptor::begin_module`] snapshots every artifact into
//!   a fresh [`ClassArtifactCache`] owned by the returned [`ModuleSession`]
//! - **Per artifact** - [`ModuleSession::extract`] yields the bytes to write, remapped for class
//!   files in production
//! - **After finalize** - [`ModuleSession::finish`] clears the cache; dropping the session does
//!   the same, so cleanup also happens when the pass fails half way
//! - **Name reads** - [`CompilationInterceptor::on_method_name_read`] and
//!   [`CompilationInterceptor::on_field_name_read`] translate obfuscated names the compiler
//!   reads from runtime class metadata
//!
//! [`CompilationInterceptor::finalize_module`] runs the three phases in order for hosts that hand
//! over a whole module at once.
//!
//! # Thread Safety
//!
//! Each compilation gets its own [`ModuleSession`], so concurrent compilations never observe each
//! other's artifacts. A session is [`Sync`]: its cache is only read after `begin_module`, which
//! lets the artifacts of one module be extracted in parallel.

mod cache;
mod interceptor;

pub use cache::ClassArtifactCache;
pub use interceptor::{CompilationInterceptor, ModuleSession};

/// One output artifact of a module compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFileArtifact {
    /// Path relative to the output root, with `/` separators (`pkg/A.class`)
    pub relative_path: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl ClassFileArtifact {
    /// Create an artifact.
    #[must_use]
    pub fn new(relative_path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        ClassFileArtifact {
            relative_path: relative_path.into(),
            bytes: bytes.into(),
        }
    }
}
